//! User configuration management
//!
//! Reads settings from `config.toml` in the config directory. The file is
//! optional; it selects the image builder program and default output
//! preferences.

use crate::config::defaults::DEFAULT_IMAGE_BUILDER;
use crate::infra::dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// User configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// User configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Image builder settings
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputPrefs,
}

/// Image builder configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Builder program name or path
    pub program: Option<String>,

    /// Extra arguments placed before the source directory
    pub args: Option<Vec<String>>,
}

/// Output preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputPrefs {
    /// Enable quiet mode
    pub quiet: Option<bool>,

    /// Enable JSON output
    pub json: Option<bool>,
}

impl GlobalConfig {
    /// Load configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the config file exists but
    /// contains invalid TOML.
    pub fn load(dirs: &AppDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Get the effective image builder program
    ///
    /// A program given on the command line (or its environment variable)
    /// wins over the config file.
    #[must_use]
    pub fn builder_program(&self, cli: Option<&str>) -> String {
        if let Some(program) = cli.filter(|p| !p.is_empty()) {
            return program.to_string();
        }
        self.builder
            .program
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_BUILDER.to_string())
    }

    /// Get the extra builder arguments
    #[must_use]
    pub fn builder_args(&self) -> Vec<String> {
        self.builder.args.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = GlobalConfig::default();
        assert!(config.builder.program.is_none());
        assert!(config.builder_args().is_empty());
        assert!(config.output.json.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = GlobalConfig::load_from_path(&config_path).unwrap();
        assert!(config.builder.program.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let content = r#"
[builder]
program = "/opt/tools/build_image.py"
args = ["--verbose"]

[output]
json = true
"#;
        fs::write(&config_path, content).unwrap();

        let config = GlobalConfig::load_from_path(&config_path).unwrap();
        assert_eq!(
            config.builder.program,
            Some("/opt/tools/build_image.py".to_string())
        );
        assert_eq!(config.builder_args(), vec!["--verbose".to_string()]);
        assert_eq!(config.output.json, Some(true));
    }

    #[test]
    fn test_load_through_dirs() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config.toml"),
            "[output]\nquiet = true\n",
        )
        .unwrap();

        let dirs = AppDirs::with_config_dir(temp_dir.path().to_path_buf());
        let config = GlobalConfig::load(&dirs).unwrap();
        assert_eq!(config.output.quiet, Some(true));
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        fs::write(&config_path, "invalid toml [[[").unwrap();

        let result = GlobalConfig::load_from_path(&config_path);
        assert!(matches!(result, Err(GlobalConfigError::ParseError { .. })));
    }

    #[test]
    fn test_cli_builder_wins() {
        let config = GlobalConfig {
            builder: BuilderConfig {
                program: Some("from-config".to_string()),
                args: None,
            },
            output: OutputPrefs::default(),
        };
        assert_eq!(config.builder_program(Some("from-cli")), "from-cli");
    }
}
