//! Infrastructure layer
//!
//! Handles I/O operations: archives, filesystem, and external processes.

pub mod archive;
pub mod dirs;
pub mod filesystem;
pub mod image_builder;
