//! Image archive packing
//!
//! Sequences a run: unpack the target files, load the info dictionary,
//! copy boot and recovery, then (unless only bootable images are wanted)
//! assemble every partition image, copy `android-info.txt` and bundle the
//! radio files. The output archive only appears at its destination when
//! the whole run succeeds, and the staging root is removed on every path.

use std::path::PathBuf;

use serde::Serialize;

use super::assembler::{AssemblyOutcome, PartitionAssembler};
use super::bootable::add_bootable_images;
use super::info_dict::InfoDict;
use super::properties::{Partition, PropertyResolver};
use super::radio::add_radio;
use super::staging::StagingRoot;
use crate::config::defaults::{entries, ANDROID_INFO_PATH};
use crate::error::{FilesystemError, ImageBuildError, PackError};
use crate::infra::archive::{self, ArchiveEntry, OutputArchive};
use crate::infra::image_builder::ImageBuilder;

/// Run configuration, built once from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackConfig {
    /// Input target-files archive
    pub input: PathBuf,
    /// Output image archive
    pub output: PathBuf,
    /// Only carry boot.img and recovery.img
    pub bootable_only: bool,
}

impl PackConfig {
    /// Create a configuration for a full run
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            bootable_only: false,
        }
    }

    /// Restrict the output to bootable images
    #[must_use]
    pub fn with_bootable_only(mut self, bootable_only: bool) -> Self {
        self.bootable_only = bootable_only;
        self
    }
}

/// Progress reporting for long-running steps
pub trait Progress {
    /// A step started
    fn begin(&self, message: &str);
    /// The current step finished
    fn end(&self);
}

/// Progress sink that reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn begin(&self, _message: &str) {}
    fn end(&self) {}
}

/// A partition that produced no image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPartition {
    /// Partition name
    pub partition: String,
    /// Why it was skipped
    pub reason: String,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackSummary {
    /// Output archive path
    pub output: PathBuf,
    /// Whether only bootable images were packed
    pub bootable_only: bool,
    /// Archive entries in write order
    pub entries: Vec<ArchiveEntry>,
    /// Partitions that were not requested
    pub skipped: Vec<SkippedPartition>,
    /// Radio files dropped because of name collisions
    pub radio_collisions: Vec<PathBuf>,
}

/// Drives one packing run
pub struct Packer<'a> {
    config: &'a PackConfig,
    builder: Option<&'a dyn ImageBuilder>,
    progress: &'a dyn Progress,
}

impl<'a> Packer<'a> {
    /// Create a packer without an image builder
    pub fn new(config: &'a PackConfig) -> Self {
        Self {
            config,
            builder: None,
            progress: &NoProgress,
        }
    }

    /// Use `builder` for partition images
    #[must_use]
    pub fn with_builder(mut self, builder: &'a dyn ImageBuilder) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Report progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the packing
    pub fn run(&self) -> Result<PackSummary, PackError> {
        let builder = match (self.config.bootable_only, self.builder) {
            (true, _) => None,
            (false, Some(builder)) => Some(builder),
            (false, None) => return Err(ImageBuildError::NotConfigured.into()),
        };

        let staging = StagingRoot::create()?;
        tracing::info!("Unzipping {}", self.config.input.display());
        self.progress.begin("Unpacking target files");
        let unpacked = archive::unpack(&self.config.input, staging.path());
        self.progress.end();
        unpacked?;

        let info = InfoDict::load(staging.path())?;

        let mut output = OutputArchive::create(&self.config.output)?;
        add_bootable_images(staging.path(), &mut output)?;

        let mut skipped = Vec::new();
        let mut radio_collisions = Vec::new();

        if let Some(builder) = builder {
            let assembler =
                PartitionAssembler::new(&staging, PropertyResolver::new(&info), builder);

            for partition in Partition::ALL {
                self.progress.begin(&format!("Building {partition} image"));
                let outcome = assembler.assemble(partition, &mut output);
                self.progress.end();

                if let AssemblyOutcome::Skipped(reason) = outcome? {
                    skipped.push(SkippedPartition {
                        partition: partition.to_string(),
                        reason: reason.to_string(),
                    });
                }
            }

            let android_info = staging.path().join(ANDROID_INFO_PATH);
            if !android_info.is_file() {
                return Err(FilesystemError::NotFound { path: android_info }.into());
            }
            output.write_file(entries::ANDROID_INFO, &android_info)?;

            let radio = add_radio(staging.path(), &mut output)?;
            radio_collisions = radio
                .collisions
                .iter()
                .filter_map(|p| p.strip_prefix(staging.path()).ok())
                .map(PathBuf::from)
                .collect();
        } else {
            tracing::info!("Bootable images only, skipping partition images");
        }

        tracing::info!("Cleaning up");
        let entries = output.finish()?;
        staging.close()?;

        Ok(PackSummary {
            output: self.config.output.clone(),
            bootable_only: self.config.bootable_only,
            entries,
            skipped,
            radio_collisions,
        })
    }
}

/// Pack `config.input` into `config.output`
pub fn pack(config: &PackConfig, builder: &dyn ImageBuilder) -> Result<PackSummary, PackError> {
    Packer::new(config).with_builder(builder).run()
}
