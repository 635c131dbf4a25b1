//! Build configuration dictionary
//!
//! The info dictionary is read once from the unpacked target files
//! (`META/misc_info.txt`) together with the recovery mount table, and is
//! read-only for the rest of the run.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::defaults::{FILE_CONTEXTS_PATH, MISC_INFO_PATH, RECOVERY_FSTAB_PATH};
use crate::error::InfoDictError;
use crate::infra::filesystem;

/// Key selecting the recovery fstab format
const FSTAB_VERSION_KEY: &str = "fstab_version";

/// Key pointing the image builder at the SELinux file contexts
const SELINUX_FC_KEY: &str = "selinux_fc";

/// One mount table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsTabEntry {
    /// Mount point, e.g. `/system`
    pub mount_point: String,
    /// Filesystem type, e.g. `ext4`
    pub fs_type: String,
    /// Block device backing the mount point
    pub device: String,
    /// Secondary device (version 1 tables only)
    pub device2: Option<String>,
}

/// Mount table keyed by mount point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsTab {
    entries: BTreeMap<String, FsTabEntry>,
}

impl FsTab {
    /// Create an empty mount table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a recovery fstab in the given format version
    ///
    /// Version 1 lines are `<mount_point> <fs_type> <device> [<device2>] [<options>]`,
    /// version 2 lines are `<device> <mount_point> <fs_type> <mnt_flags> <fs_mgr_flags>`.
    /// Lines that do not have the expected shape are skipped.
    pub fn parse(content: &str, version: u32) -> Result<Self, InfoDictError> {
        let mut fstab = Self::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let pieces: Vec<&str> = line.split_whitespace().collect();
            let entry = match version {
                1 => parse_v1(&pieces),
                2 => parse_v2(&pieces),
                other => {
                    return Err(InfoDictError::UnknownFstabVersion {
                        version: other.to_string(),
                    })
                }
            };

            match entry {
                Some(entry) => fstab.insert(entry),
                None => tracing::debug!("Skipping recovery.fstab line: {}", line),
            }
        }

        Ok(fstab)
    }

    /// Add or replace an entry
    pub fn insert(&mut self, entry: FsTabEntry) {
        self.entries.insert(entry.mount_point.clone(), entry);
    }

    /// Look up the entry for a mount point
    pub fn get(&self, mount_point: &str) -> Option<&FsTabEntry> {
        self.entries.get(mount_point)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_v1(pieces: &[&str]) -> Option<FsTabEntry> {
    if !(3..=5).contains(&pieces.len()) {
        return None;
    }

    // The fourth column is either a second device or the options string.
    let device2 = pieces
        .get(3)
        .filter(|p| p.starts_with('/'))
        .map(|p| (*p).to_string());

    Some(FsTabEntry {
        mount_point: pieces[0].to_string(),
        fs_type: pieces[1].to_string(),
        device: pieces[2].to_string(),
        device2,
    })
}

fn parse_v2(pieces: &[&str]) -> Option<FsTabEntry> {
    if pieces.len() != 5 {
        return None;
    }

    // vold owns these, they never get an image
    if pieces[4].contains("voldmanaged=") {
        return None;
    }

    Some(FsTabEntry {
        mount_point: pieces[1].to_string(),
        fs_type: pieces[2].to_string(),
        device: pieces[0].to_string(),
        device2: None,
    })
}

/// Global build configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoDict {
    values: BTreeMap<String, String>,
    fstab: Option<FsTab>,
}

impl InfoDict {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` lines
    ///
    /// Blank lines and `#` comments are ignored, as are lines without `=`.
    /// Later duplicates win.
    pub fn from_lines(content: &str) -> Self {
        let mut dict = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                dict.insert(key.trim(), value.trim());
            }
        }
        dict
    }

    /// Load the dictionary from an unpacked target-files tree
    ///
    /// A missing `misc_info.txt` yields an empty dictionary and a missing
    /// recovery fstab yields no mount table.
    pub fn load(root: &Path) -> Result<Self, InfoDictError> {
        let misc_info_path = root.join(MISC_INFO_PATH);
        let mut dict = match read_optional(&misc_info_path)? {
            Some(content) => Self::from_lines(&content),
            None => {
                tracing::info!("No {} in target files, using defaults", MISC_INFO_PATH);
                Self::new()
            }
        };

        if !dict.contains(FSTAB_VERSION_KEY) {
            dict.insert(FSTAB_VERSION_KEY, "1");
        }

        // The image builder needs the file contexts from the extracted
        // ramdisk, not the build-time path recorded in misc_info.
        if dict.contains(SELINUX_FC_KEY) {
            let fc = root.join(FILE_CONTEXTS_PATH);
            dict.insert(SELINUX_FC_KEY, &fc.to_string_lossy());
        }

        let fstab_path = root.join(RECOVERY_FSTAB_PATH);
        if let Some(content) = read_optional(&fstab_path)? {
            let version = dict.fstab_version()?;
            let fstab = FsTab::parse(&content, version)?;
            tracing::debug!("Loaded {} recovery.fstab entries", fstab.len());
            dict.fstab = Some(fstab);
        }

        Ok(dict)
    }

    /// Attach a mount table
    #[must_use]
    pub fn with_fstab(mut self, fstab: FsTab) -> Self {
        self.fstab = Some(fstab);
        self
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

    /// The recovery mount table, if the target files carry one
    pub fn fstab(&self) -> Option<&FsTab> {
        self.fstab.as_ref()
    }

    fn fstab_version(&self) -> Result<u32, InfoDictError> {
        let raw = self.get(FSTAB_VERSION_KEY).unwrap_or("1");
        raw.parse()
            .map_err(|_| InfoDictError::UnknownFstabVersion {
                version: raw.to_string(),
            })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, InfoDictError> {
    filesystem::read_optional(path).map_err(|e| InfoDictError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Parse a size value, accepting decimal or `0x` hexadecimal
pub fn parse_size(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}
