//! External filesystem image builder
//!
//! Turning a directory into a filesystem image is delegated to an external
//! program. It is invoked as
//! `<program> [args...] <source_dir> <prop_file> <output_image>`, where
//! `prop_file` holds the image properties as sorted `key=value` lines.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::properties::ImageProperties;
use crate::error::ImageBuildError;

/// Builds a filesystem image from a source directory
pub trait ImageBuilder {
    /// Build `output` from `source_dir` using `properties`
    fn build_image(
        &self,
        source_dir: &Path,
        properties: &ImageProperties,
        output: &Path,
    ) -> Result<(), ImageBuildError>;
}

/// Image builder backed by an external program
#[derive(Debug, Clone)]
pub struct CommandImageBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandImageBuilder {
    /// Create a builder for an already resolved program path
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Resolve `program` through `PATH` (or as a path) and create a builder
    pub fn resolve(program: &str, args: Vec<String>) -> Result<Self, ImageBuildError> {
        let resolved = which::which(program).map_err(|_| ImageBuildError::NotFound {
            program: program.to_string(),
        })?;
        tracing::debug!("Using image builder {}", resolved.display());
        Ok(Self::new(resolved, args))
    }
}

impl ImageBuilder for CommandImageBuilder {
    fn build_image(
        &self,
        source_dir: &Path,
        properties: &ImageProperties,
        output: &Path,
    ) -> Result<(), ImageBuildError> {
        let program = self.program.display().to_string();
        let spawn_err = |e: std::io::Error| ImageBuildError::Spawn {
            program: program.clone(),
            error: e.to_string(),
        };

        let mut prop_file = tempfile::Builder::new()
            .prefix("image-props-")
            .suffix(".txt")
            .tempfile()
            .map_err(spawn_err)?;
        prop_file
            .write_all(properties.to_prop_file().as_bytes())
            .and_then(|()| prop_file.flush())
            .map_err(spawn_err)?;

        tracing::debug!(
            "Running {} {:?} {} {} {}",
            program,
            self.args,
            source_dir.display(),
            prop_file.path().display(),
            output.display()
        );

        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(source_dir)
            .arg(prop_file.path())
            .arg(output)
            .output()
            .map_err(spawn_err)?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(ImageBuildError::Failed {
                source_dir: source_dir.to_path_buf(),
                stderr: if stderr.is_empty() {
                    format!("exited with {}", result.status)
                } else {
                    stderr
                },
            });
        }

        if !output.is_file() {
            return Err(ImageBuildError::MissingOutput {
                path: output.to_path_buf(),
            });
        }

        Ok(())
    }
}
