//! Partition image assembly
//!
//! Each partition goes through the same steps: resolve its properties,
//! stage its source directory, build the image, check the image against
//! the partition size and write it into the output archive.

use std::path::Path;

use super::properties::{ImageProperties, Partition, PropertyResolver, Resolution, SkipReason};
use super::size_check::check_size;
use super::staging::StagingRoot;
use crate::config::defaults::{entries, DEFAULT_USERDATA_EXTRA_NAME};
use crate::error::{AssemblyError, FilesystemError, PackError};
use crate::infra::archive::OutputArchive;
use crate::infra::image_builder::ImageBuilder;

/// Result of assembling one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyOutcome {
    /// Image written to the archive
    Written {
        /// Archive entry name
        name: String,
        /// Image size in bytes
        size: u64,
    },
    /// Partition not requested, nothing written
    Skipped(SkipReason),
}

/// Archive entry name of a partition image
pub fn image_name(partition: Partition, properties: &ImageProperties) -> String {
    match partition {
        Partition::System => entries::SYSTEM.to_string(),
        Partition::Vendor => entries::VENDOR.to_string(),
        Partition::Userdata => entries::USERDATA.to_string(),
        Partition::UserdataExtra => format!(
            "userdata_{}.img",
            properties
                .partition_name()
                .unwrap_or(DEFAULT_USERDATA_EXTRA_NAME)
        ),
        Partition::Cache => entries::CACHE.to_string(),
    }
}

/// Builds partition images and writes them into the output archive
pub struct PartitionAssembler<'a> {
    staging: &'a StagingRoot,
    resolver: PropertyResolver<'a>,
    builder: &'a dyn ImageBuilder,
}

impl<'a> PartitionAssembler<'a> {
    /// Create an assembler
    pub fn new(
        staging: &'a StagingRoot,
        resolver: PropertyResolver<'a>,
        builder: &'a dyn ImageBuilder,
    ) -> Self {
        Self {
            staging,
            resolver,
            builder,
        }
    }

    /// Assemble `partition` into `archive`
    ///
    /// Build failures and oversized images are errors, except that the
    /// extra userdata image is never size checked.
    pub fn assemble(
        &self,
        partition: Partition,
        archive: &mut OutputArchive,
    ) -> Result<AssemblyOutcome, PackError> {
        let properties = match self.resolver.resolve(partition) {
            Resolution::Included(properties) => properties,
            Resolution::Skipped(reason) => {
                tracing::info!("Skipping {}: {}", partition, reason);
                return Ok(AssemblyOutcome::Skipped(reason));
            }
        };

        let name = image_name(partition, &properties);
        tracing::info!("Creating {}", name);
        tracing::debug!("{} properties:\n{}", name, properties.to_prop_file());

        let staging_err = |source: FilesystemError| AssemblyError::Staging {
            image: name.clone(),
            source,
        };

        let source = self.staging.prepare_source(partition).map_err(staging_err)?;

        let scratch = tempfile::Builder::new()
            .prefix("image-")
            .tempdir()
            .map_err(|e| {
                staging_err(FilesystemError::TempDir {
                    error: e.to_string(),
                })
            })?;
        let image_path = scratch.path().join(&name);

        self.build(&name, source.path(), &properties, &image_path)?;

        let size = std::fs::metadata(&image_path)
            .map_err(|e| {
                staging_err(FilesystemError::ReadFile {
                    path: image_path.clone(),
                    error: e.to_string(),
                })
            })?
            .len();

        if partition == Partition::UserdataExtra {
            tracing::debug!("Not size checking {}", name);
        } else {
            check_size(&name, size, &properties)?;
        }

        archive.write_file(&name, &image_path)?;

        // scratch space goes away before the next partition starts
        drop(source);
        drop(scratch);

        Ok(AssemblyOutcome::Written { name, size })
    }

    fn build(
        &self,
        name: &str,
        source_dir: &Path,
        properties: &ImageProperties,
        output: &Path,
    ) -> Result<(), AssemblyError> {
        self.builder
            .build_image(source_dir, properties, output)
            .map_err(|source| AssemblyError::BuildFailed {
                image: name.to_string(),
                source,
            })
    }
}
