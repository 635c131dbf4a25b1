//! Per-partition image properties
//!
//! Derives the property set handed to the image builder for one partition
//! from the global info dictionary, with the recovery mount table taking
//! precedence for the filesystem type. Resolution also decides whether the
//! build asked for the partition image at all.

use std::collections::BTreeMap;
use std::fmt;

use super::info_dict::{parse_size, InfoDict};

/// Keys copied for every partition when present
const COMMON_PROPS: &[&str] = &[
    "extfs_sparse_flag",
    "mkyaffs2_extra_flags",
    "selinux_fc",
    "skip_fsck",
    "verity",
    "verity_key",
    "verity_signer_cmd",
];

/// Filesystem type prefix of formats that cannot be sized automatically
const EXT_FAMILY_PREFIX: &str = "ext";

/// Partition images assembled from the target files, in archive order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// System image, built from the SYSTEM subtree
    System,
    /// Vendor image, built from the VENDOR subtree or empty
    Vendor,
    /// Empty userdata image
    Userdata,
    /// Empty secondary userdata image
    UserdataExtra,
    /// Empty cache image
    Cache,
}

impl Partition {
    /// All partitions in the order they are written to the archive
    pub const ALL: [Partition; 5] = [
        Self::System,
        Self::Vendor,
        Self::Userdata,
        Self::UserdataExtra,
        Self::Cache,
    ];

    /// Key used for property lookup and as the image `mount_point`
    pub fn key(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Vendor => "vendor",
            Self::Userdata => "data",
            Self::UserdataExtra => "data_extra",
            Self::Cache => "cache",
        }
    }

    /// Mount point looked up in the recovery fstab
    pub fn fstab_mount_point(self) -> &'static str {
        match self {
            Self::System => "/system",
            Self::Vendor => "/vendor",
            Self::Userdata | Self::UserdataExtra => "/data",
            Self::Cache => "/cache",
        }
    }

    /// Whether the image is an empty container rather than built from content
    pub fn is_empty_image(self) -> bool {
        matches!(self, Self::Userdata | Self::UserdataExtra | Self::Cache)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Vendor => write!(f, "vendor"),
            Self::Userdata => write!(f, "userdata"),
            Self::UserdataExtra => write!(f, "userdata_extra"),
            Self::Cache => write!(f, "cache"),
        }
    }
}

/// Property set for one image build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageProperties {
    values: BTreeMap<String, String>,
}

impl ImageProperties {
    /// Create a property set for `mount_point`
    pub fn new(mount_point: &str) -> Self {
        let mut props = Self::default();
        props.insert("mount_point", mount_point);
        props
    }

    /// Set a value
    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Filesystem type, if any
    pub fn fs_type(&self) -> Option<&str> {
        self.get("fs_type")
    }

    /// Whether a partition size is configured at all, zero included
    pub fn has_partition_size(&self) -> bool {
        self.get("partition_size").is_some_and(|size| !size.trim().is_empty())
    }

    /// Partition size in bytes; missing, unparseable and zero sizes are `None`
    pub fn partition_size(&self) -> Option<u64> {
        self.get("partition_size")
            .and_then(parse_size)
            .filter(|&size| size > 0)
    }

    /// Configured partition name
    pub fn partition_name(&self) -> Option<&str> {
        self.get("partition_name").filter(|name| !name.is_empty())
    }

    /// Render as sorted `key=value` lines
    pub fn to_prop_file(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect()
    }

    fn copy_from(&mut self, info: &InfoDict, src: &str, dest: &str) {
        if let Some(value) = info.get(src) {
            self.insert(dest, value);
        }
    }
}

/// Why a partition image is not produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The build did not configure a filesystem type for the partition
    NotRequested,
    /// ext-family images need an explicit partition size
    ExtWithoutSize {
        /// Resolved filesystem type
        fs_type: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => write!(f, "no fs_type configured"),
            Self::ExtWithoutSize { fs_type } => {
                write!(f, "{fs_type} image requested without a partition size")
            }
        }
    }
}

/// Outcome of resolving a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Build the image with these properties
    Included(ImageProperties),
    /// Produce nothing for this partition
    Skipped(SkipReason),
}

/// Resolves image properties from the info dictionary
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'a> {
    info: &'a InfoDict,
}

impl<'a> PropertyResolver<'a> {
    /// Create a resolver over `info`
    pub fn new(info: &'a InfoDict) -> Self {
        Self { info }
    }

    /// Property set for `partition`, without the inclusion policy
    ///
    /// The recovery fstab entry for the partition's mount point, when
    /// present, overrides any statically configured `fs_type`.
    pub fn properties(&self, partition: Partition) -> ImageProperties {
        let mut props = self.static_properties(partition);

        if let Some(entry) = self
            .info
            .fstab()
            .and_then(|fstab| fstab.get(partition.fstab_mount_point()))
        {
            props.insert("fs_type", &entry.fs_type);
        }

        props
    }

    /// Resolve `partition` into an inclusion decision
    ///
    /// vendor and cache are only built when the build configured a
    /// filesystem type for them; a recovery fstab entry changes the type of
    /// an included image but never requests one on its own. userdata images
    /// in an ext-family format are only built when a partition size is
    /// configured, and a configured size of zero still counts.
    pub fn resolve(&self, partition: Partition) -> Resolution {
        match partition {
            Partition::Vendor | Partition::Cache => {
                if !self.static_properties(partition).contains("fs_type") {
                    return Resolution::Skipped(SkipReason::NotRequested);
                }
            }
            Partition::Userdata | Partition::UserdataExtra => {
                let props = self.properties(partition);
                if let Some(fs_type) = props.fs_type() {
                    if fs_type.starts_with(EXT_FAMILY_PREFIX) && !props.has_partition_size() {
                        return Resolution::Skipped(SkipReason::ExtWithoutSize {
                            fs_type: fs_type.to_string(),
                        });
                    }
                }
                return Resolution::Included(props);
            }
            Partition::System => {}
        }

        Resolution::Included(self.properties(partition))
    }

    fn static_properties(&self, partition: Partition) -> ImageProperties {
        let info = self.info;
        let mut props = ImageProperties::new(partition.key());

        for key in COMMON_PROPS {
            props.copy_from(info, key, key);
        }

        match partition {
            Partition::System => {
                props.copy_from(info, "fs_type", "fs_type");
                props.copy_from(info, "system_size", "partition_size");
                props.copy_from(info, "system_verity_block_device", "verity_block_device");
            }
            Partition::Vendor => {
                props.copy_from(info, "vendor_fs_type", "fs_type");
                props.copy_from(info, "vendor_size", "partition_size");
                props.copy_from(info, "vendor_verity_block_device", "verity_block_device");
            }
            Partition::Userdata => {
                // generic type first, the userdata-specific one wins
                props.copy_from(info, "fs_type", "fs_type");
                props.copy_from(info, "userdata_fs_type", "fs_type");
                props.copy_from(info, "userdata_size", "partition_size");
            }
            Partition::UserdataExtra => {
                props.copy_from(info, "fs_type", "fs_type");
                props.copy_from(info, "userdataextra_size", "partition_size");
                props.copy_from(info, "userdataextra_name", "partition_name");
            }
            Partition::Cache => {
                props.copy_from(info, "cache_fs_type", "fs_type");
                props.copy_from(info, "cache_size", "partition_size");
            }
        }

        props
    }
}
