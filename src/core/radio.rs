//! Radio firmware bundling
//!
//! Radio blobs are copied flat into the output archive. When the radio
//! subtree carries a `filesmap` mapping images to `by-name` block devices,
//! a `flash-radio.sh` script is generated from it.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::config::defaults::{entries, FILESMAP_NAME, RADIO_DIR};
use crate::error::{PackError, RadioError};
use crate::infra::archive::OutputArchive;
use crate::infra::filesystem;

/// `<image> <anything>/by-name/<partition>`
const FILESMAP_PATTERN: &str = r"^(\S+)\s+.*/by-name/(\S+)";

/// Header of the generated flash script
///
/// Interpreter line and a blank line; not part of [`FlashScript::commands`].
const SCRIPT_HEADER: &str = "#!/bin/sh\n\n";

/// Mode of the generated flash script inside the archive
const SCRIPT_MODE: u32 = 0o755;

fn filesmap_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FILESMAP_PATTERN).expect("Invalid filesmap pattern"))
}

/// One usable `filesmap` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesMapEntry {
    /// Radio image file name (first column)
    pub image: String,
    /// Partition name taken after `/by-name/`
    pub partition: String,
}

/// Parse `filesmap` content, skipping lines that do not match
pub fn parse_filesmap(content: &str) -> Vec<FilesMapEntry> {
    let re = filesmap_regex();
    content
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line)?;
            Some(FilesMapEntry {
                image: caps[1].to_string(),
                partition: caps[2].to_string(),
            })
        })
        .collect()
}

/// Shell script flashing radio images with fastboot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashScript {
    commands: Vec<String>,
}

impl FlashScript {
    /// Generate the script from `filesmap` content
    ///
    /// Returns `None` when no line maps an image to a partition.
    pub fn generate(filesmap: &str) -> Option<Self> {
        let commands: Vec<String> = parse_filesmap(filesmap)
            .into_iter()
            .map(|entry| format!("fastboot flash {} {}", entry.partition, entry.image))
            .collect();

        if commands.is_empty() {
            None
        } else {
            Some(Self { commands })
        }
    }

    /// The `fastboot flash` lines, in input order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Full script text with interpreter line
    pub fn render(&self) -> String {
        let mut script = String::from(SCRIPT_HEADER);
        for command in &self.commands {
            script.push_str(command);
            script.push('\n');
        }
        script
    }
}

/// What was added from the radio subtree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadioOutcome {
    /// Archive entries written for radio files
    pub files: Vec<String>,
    /// Radio files dropped because an entry of the same name already existed
    pub collisions: Vec<PathBuf>,
    /// Whether `flash-radio.sh` was written
    pub flash_script: bool,
}

/// Copy radio files from `root` into `archive` and add the flash script
///
/// Files are added by base name in sorted walk order. When two files share
/// a base name the first one wins and the rest are reported as collisions.
pub fn add_radio(root: &Path, archive: &mut OutputArchive) -> Result<RadioOutcome, PackError> {
    let radio_dir = root.join(RADIO_DIR);
    let mut outcome = RadioOutcome::default();

    if !radio_dir.is_dir() {
        tracing::debug!("No {} subtree", RADIO_DIR);
        return Ok(outcome);
    }

    for entry in WalkDir::new(&radio_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| RadioError::Walk {
            path: radio_dir.clone(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if archive.contains(&name) {
            tracing::warn!(
                "Radio file {} collides with existing entry {}, skipping",
                entry.path().display(),
                name
            );
            outcome.collisions.push(entry.path().to_path_buf());
            continue;
        }

        archive.write_file(&name, entry.path())?;
        outcome.files.push(name);
    }

    let filesmap_path = radio_dir.join(FILESMAP_NAME);
    if filesmap_path.is_file() {
        tracing::info!("Creating {}", entries::FLASH_RADIO);
        let content = filesystem::read_file(&filesmap_path)?;
        match FlashScript::generate(&content) {
            Some(script) => {
                archive.write_bytes_with_mode(
                    entries::FLASH_RADIO,
                    script.render().as_bytes(),
                    SCRIPT_MODE,
                )?;
                outcome.flash_script = true;
            }
            None => tracing::info!("{} is empty, skipping", entries::FLASH_RADIO),
        }
    }

    Ok(outcome)
}
