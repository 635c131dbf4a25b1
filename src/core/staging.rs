//! Staging of partition source directories
//!
//! The staging root holds the unpacked target files. Image builders care
//! about the name of the directory they are given, so content partitions
//! are exposed under lowercase names next to the uppercase extracted
//! subtrees, and empty partitions get a freshly named directory in their
//! own scratch space.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::properties::Partition;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Prefix of the staging root directory
const STAGING_PREFIX: &str = "targetfiles-";

/// Prefix of per-partition scratch directories
const SCRATCH_PREFIX: &str = "partition-";

/// Temporary directory holding the unpacked target files
///
/// Removed when dropped, whether the run succeeded or not.
#[derive(Debug)]
pub struct StagingRoot {
    dir: TempDir,
}

impl StagingRoot {
    /// Allocate a new, empty staging root in the system temp directory
    pub fn create() -> Result<Self, FilesystemError> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .map_err(|e| FilesystemError::TempDir {
                error: e.to_string(),
            })?;
        tracing::debug!("Staging root at {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Path of the staging root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Locate or create the source directory for `partition`
    ///
    /// - system links `SYSTEM` to `system`; the subtree must exist.
    /// - vendor links `VENDOR` to `vendor`, or creates an empty `vendor`.
    /// - userdata, userdata_extra and cache get an empty directory inside a
    ///   new scratch directory owned by the returned [`SourceDir`].
    pub fn prepare_source(&self, partition: Partition) -> Result<SourceDir, FilesystemError> {
        match partition {
            Partition::System => {
                let extracted = self.path().join("SYSTEM");
                if !extracted.is_dir() {
                    return Err(FilesystemError::NotFound { path: extracted });
                }
                let link = filesystem::link_dir(&extracted, &self.path().join("system"))?;
                Ok(SourceDir::borrowed(link))
            }
            Partition::Vendor => {
                let extracted = self.path().join("VENDOR");
                let lowered = self.path().join("vendor");
                if extracted.is_dir() {
                    let link = filesystem::link_dir(&extracted, &lowered)?;
                    Ok(SourceDir::borrowed(link))
                } else {
                    tracing::info!("No VENDOR subtree, building an empty vendor image");
                    filesystem::create_dir_all(&lowered)?;
                    Ok(SourceDir::borrowed(lowered))
                }
            }
            Partition::Userdata | Partition::UserdataExtra | Partition::Cache => {
                SourceDir::empty(partition.key())
            }
        }
    }

    /// Remove the staging root, reporting failures
    pub fn close(self) -> Result<(), FilesystemError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| FilesystemError::RemoveDir {
            path,
            error: e.to_string(),
        })
    }
}

/// Source directory handed to the image builder
///
/// Empty-partition sources own their scratch directory, which is removed
/// when this value is dropped.
#[derive(Debug)]
pub struct SourceDir {
    path: PathBuf,
    scratch: Option<TempDir>,
}

impl SourceDir {
    fn borrowed(path: PathBuf) -> Self {
        Self {
            path,
            scratch: None,
        }
    }

    fn empty(name: &str) -> Result<Self, FilesystemError> {
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| FilesystemError::TempDir {
                error: e.to_string(),
            })?;
        let path = scratch.path().join(name);
        filesystem::create_dir_all(&path)?;
        Ok(Self {
            path,
            scratch: Some(scratch),
        })
    }

    /// Directory to build the image from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scratch directory owned by this source, if any
    pub fn scratch(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }
}
