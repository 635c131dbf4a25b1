//! img-from-target-files - flashable image archives from target files
//!
//! This library turns a device build's target-files archive into the image
//! archive a fastboot-style flashing tool consumes: boot and recovery
//! images, per-partition filesystem images, `android-info.txt` and the
//! radio firmware, plus an optional radio flashing script.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Packing policy: partition selection, properties, staging
//! - [`infra`] - Infrastructure layer (archives, filesystem, image builder)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
