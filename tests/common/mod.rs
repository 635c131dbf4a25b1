//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a builder
//! for target-files archives and a stand-in image builder program.

#![allow(dead_code)]

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use img_from_target_files::infra::archive::OutputArchive;
use tempfile::TempDir;

/// Build configuration with system and both userdata images
pub const SAMPLE_MISC_INFO: &str = "\
fs_type=ext4
system_size=1048576
userdata_size=1048576
userdataextra_size=1048576
extfs_sparse_flag=-s
";

/// filesmap mapping two radio images to block devices
pub const SAMPLE_FILESMAP: &str = "\
NON-HLOS.bin /dev/block/platform/msm_sdcc.1/by-name/modem
sbl1.mbn /dev/block/platform/msm_sdcc.1/by-name/sbl1
# not a mapping
";

/// Target-files archive under construction
///
/// Files are collected first and written to a zip in a temporary
/// directory by [`TestTargetFiles::build`].
pub struct TestTargetFiles {
    /// Temporary directory holding the input and output archives
    pub dir: TempDir,
    files: Vec<(String, Vec<u8>)>,
}

impl TestTargetFiles {
    /// Start an empty target-files archive
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            files: Vec::new(),
        }
    }

    /// Target files with boot, system, misc info and android-info
    pub fn sample() -> Self {
        Self::new()
            .with_file("META/misc_info.txt", SAMPLE_MISC_INFO)
            .with_file("BOOT/boot.img", "boot image")
            .with_file("SYSTEM/build.prop", "ro.build.id=TEST\n")
            .with_file("SYSTEM/bin/sh", "shell")
            .with_file("OTA/android-info.txt", "require board=test\n")
    }

    /// Add a file to the archive
    pub fn with_file(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.retain(|(existing, _)| existing != name);
        self.files.push((name.to_string(), content.as_ref().to_vec()));
        self
    }

    /// Drop a file from the archive
    pub fn without_file(mut self, name: &str) -> Self {
        self.files.retain(|(existing, _)| existing != name);
        self
    }

    /// Write the archive and return its path
    pub fn build(&self) -> PathBuf {
        let path = self.dir.path().join("target_files.zip");
        let mut zip = OutputArchive::create(&path).expect("Failed to create target files");
        for (name, content) in &self.files {
            zip.write_bytes(name, content)
                .expect("Failed to write target files entry");
        }
        zip.finish().expect("Failed to finish target files");
        path
    }

    /// Path of the output archive inside the test directory
    pub fn output(&self) -> PathBuf {
        self.dir.path().join("img.zip")
    }
}

impl Default for TestTargetFiles {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one entry of a zip archive
pub fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
    let file = File::open(archive).expect("Failed to open archive");
    let mut zip = zip::ZipArchive::new(file).expect("Failed to read archive");
    let mut entry = zip.by_name(name).expect("Entry not found");
    let mut content = Vec::new();
    entry
        .read_to_end(&mut content)
        .expect("Failed to read entry");
    content
}

/// Unix mode bits of one entry of a zip archive
pub fn entry_mode(archive: &Path, name: &str) -> Option<u32> {
    let file = File::open(archive).expect("Failed to open archive");
    let mut zip = zip::ZipArchive::new(file).expect("Failed to read archive");
    let entry = zip.by_name(name).expect("Entry not found");
    entry.unix_mode()
}

/// Write an image builder script into `dir`
///
/// The script copies the property file to the output image, then pads the
/// image with as many bytes as `FAKE_IMAGE_SIZE_<mount_point>` asks for.
#[cfg(unix)]
pub fn write_builder_script(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake_build_image");
    let script = r#"#!/bin/sh
set -e
mount_point=$(sed -n 's/^mount_point=//p' "$2")
cat "$2" > "$3"
eval "pad=\${FAKE_IMAGE_SIZE_${mount_point}:-0}"
if [ "$pad" -gt 0 ]; then
    head -c "$pad" /dev/zero >> "$3"
fi
"#;
    std::fs::write(&path, script).expect("Failed to write builder script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make builder script executable");
    path
}
