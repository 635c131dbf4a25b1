//! Default configuration values

/// Default external image builder program
pub const DEFAULT_IMAGE_BUILDER: &str = "build_image";

/// Environment variable overriding the image builder program
pub const ENV_IMAGE_BUILDER: &str = "IMG_FROM_TARGET_FILES_BUILDER";

/// Name of the user configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Metadata file holding the build configuration dictionary
pub const MISC_INFO_PATH: &str = "META/misc_info.txt";

/// Recovery mount table inside the extracted tree
pub const RECOVERY_FSTAB_PATH: &str = "RECOVERY/RAMDISK/etc/recovery.fstab";

/// SELinux file contexts inside the extracted boot ramdisk
pub const FILE_CONTEXTS_PATH: &str = "BOOT/RAMDISK/file_contexts";

/// Manifest copied verbatim into the output
pub const ANDROID_INFO_PATH: &str = "OTA/android-info.txt";

/// Radio firmware subtree
pub const RADIO_DIR: &str = "RADIO";

/// Partition-to-device mapping inside the radio subtree
pub const FILESMAP_NAME: &str = "filesmap";

/// Archive entry names
pub mod entries {
    pub const BOOT: &str = "boot.img";
    pub const RECOVERY: &str = "recovery.img";
    pub const SYSTEM: &str = "system.img";
    pub const VENDOR: &str = "vendor.img";
    pub const USERDATA: &str = "userdata.img";
    pub const CACHE: &str = "cache.img";
    pub const ANDROID_INFO: &str = "android-info.txt";
    pub const FLASH_RADIO: &str = "flash-radio.sh";
}

/// Partition name used for the extra userdata image when none is configured
pub const DEFAULT_USERDATA_EXTRA_NAME: &str = "extra";

/// Directories searched for prebuilt boot and recovery images
pub const PREBUILT_IMAGE_DIRS: &[&str] = &["BOOTABLE_IMAGES", "IMAGES"];

/// Image usage (percent of the partition) that aborts the run
pub const SIZE_ERROR_PERCENT: f64 = 99.0;

/// Image usage (percent of the partition) that prints a warning
pub const SIZE_WARNING_PERCENT: f64 = 95.0;

/// yaffs2 page size and per-page spare area
pub const YAFFS2_PAGE_SIZE: u64 = 2048;
pub const YAFFS2_SPARE_SIZE: u64 = 64;
