//! Error types for img-from-target-files
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to create a symlink
    #[error("Failed to link '{link}' to '{target}': {error}")]
    Symlink {
        target: PathBuf,
        link: PathBuf,
        error: String,
    },

    /// Expected path does not exist
    #[error("'{path}' does not exist")]
    NotFound { path: PathBuf },

    /// Failed to allocate a temporary directory
    #[error("Failed to create temporary directory: {error}")]
    TempDir { error: String },
}

/// Input and output archive errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Input archive could not be opened or read
    #[error("Failed to open archive '{path}': {error}")]
    Open { path: PathBuf, error: String },

    /// Input archive could not be extracted
    #[error("Failed to extract '{path}' into '{dest}': {error}")]
    Extract {
        path: PathBuf,
        dest: PathBuf,
        error: String,
    },

    /// Output archive could not be created
    #[error("Failed to create output archive '{path}': {error}")]
    Create { path: PathBuf, error: String },

    /// Entry already present in the output archive
    #[error("Duplicate archive entry '{name}'")]
    DuplicateEntry { name: String },

    /// Failed to write an entry
    #[error("Failed to write archive entry '{name}': {error}")]
    WriteEntry { name: String, error: String },

    /// Failed to finalize the output archive
    #[error("Failed to finalize output archive '{path}': {error}")]
    Finish { path: PathBuf, error: String },
}

/// Info dictionary loading errors
#[derive(Error, Debug)]
pub enum InfoDictError {
    /// Failed to read a metadata file
    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Unsupported recovery fstab version
    #[error("Unknown fstab_version '{version}'")]
    UnknownFstabVersion { version: String },
}

/// External image builder errors
#[derive(Error, Debug)]
pub enum ImageBuildError {
    /// Builder program not found
    #[error("Image builder '{program}' not found in PATH")]
    NotFound { program: String },

    /// No builder available for a full run
    #[error("No image builder configured")]
    NotConfigured,

    /// Builder could not be started
    #[error("Failed to run image builder '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Builder exited unsuccessfully
    #[error("Image builder failed for '{source_dir}': {stderr}")]
    Failed { source_dir: PathBuf, stderr: String },

    /// Builder reported success without producing an image
    #[error("Image builder produced no image at '{path}'")]
    MissingOutput { path: PathBuf },
}

/// Partition image assembly errors
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// External image build failed
    #[error("build {image} image failed")]
    BuildFailed {
        image: String,
        #[source]
        source: ImageBuildError,
    },

    /// Built image does not fit its partition
    #[error("{image} size ({size}) is {percent:.2}% of limit ({limit})")]
    SizeExceeded {
        image: String,
        size: u64,
        limit: u64,
        percent: f64,
    },

    /// Staging the partition source failed
    #[error("Failed to stage {image}")]
    Staging {
        image: String,
        #[source]
        source: FilesystemError,
    },
}

/// Boot and recovery image errors
#[derive(Error, Debug)]
pub enum BootableImageError {
    /// Required prebuilt image not found
    #[error("{name} not found in target files (searched: {})", searched.join(", "))]
    Missing { name: String, searched: Vec<String> },
}

/// Radio bundling errors
#[derive(Error, Debug)]
pub enum RadioError {
    /// Failed to walk the radio directory
    #[error("Failed to read radio files under '{path}': {error}")]
    Walk { path: PathBuf, error: String },
}

/// Top-level packing error type
#[derive(Error, Debug)]
pub enum PackError {
    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Archive error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Info dictionary error
    #[error(transparent)]
    InfoDict(#[from] InfoDictError),

    /// Assembly error
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// Boot or recovery error
    #[error(transparent)]
    Bootable(#[from] BootableImageError),

    /// Radio error
    #[error(transparent)]
    Radio(#[from] RadioError),

    /// Image builder setup error
    #[error(transparent)]
    Builder(#[from] ImageBuildError),
}
