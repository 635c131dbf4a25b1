//! Platform-specific directory lookup
//!
//! Only the configuration directory is needed. It follows the XDG Base
//! Directory Specification on Linux and standard locations on macOS, and
//! can be overridden with `IMG_FROM_TARGET_FILES_CONFIG_DIR`.

use std::env;
use std::path::PathBuf;

use crate::config::defaults::CONFIG_FILE_NAME;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "IMG_FROM_TARGET_FILES_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "img-from-target-files";

/// Platform-specific directory provider
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
}

impl AppDirs {
    /// Create a new `AppDirs` instance
    ///
    /// Checks the environment first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Use an explicit config directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Path to `config.toml` in the config directory
    ///
    /// - Linux: `$XDG_CONFIG_HOME/img-from-target-files` or `~/.config/img-from-target-files`
    /// - macOS: `~/Library/Application Support/img-from-target-files`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for AppDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_names_config_file() {
        let dirs = AppDirs::new();
        assert!(dirs.config_path().ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_config_path_is_under_config_dir() {
        let dirs = AppDirs::with_config_dir(PathBuf::from("/tmp/imgcfg"));
        assert_eq!(dirs.config_path(), PathBuf::from("/tmp/imgcfg/config.toml"));
    }
}
