//! Configuration management for framepack.
//!
//! Configuration is loaded from the platform config directory
//! (`~/.config/framepack/config.toml` on Linux) with sensible defaults.
//! Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for framepack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// External codec settings
    pub encoder: EncoderConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.framepack.framepack/config.toml
    /// - Linux: ~/.config/framepack/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\framepack\config\config.toml
    ///
    /// Falls back to ~/.framepack/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "framepack", "framepack")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".framepack").join("config.toml")
            })
    }

    /// Get the resolved parent for working directories (with ~ expansion).
    ///
    /// `None` means the system temp directory.
    pub fn work_dir(&self) -> Option<PathBuf> {
        self.general.work_dir.as_ref().map(|dir| {
            let path_str = dir.to_string_lossy();
            let expanded = shellexpand::tilde(&path_str);
            PathBuf::from(expanded.into_owned())
        })
    }

    /// Get the resolved container path (with ~ expansion).
    pub fn output_path(&self) -> PathBuf {
        let path_str = self.encoder.output.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Create a fresh working directory owned by one pack or unpack run.
    pub fn create_work_dir(&self, prefix: &str) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        match self.work_dir() {
            Some(parent) => {
                std::fs::create_dir_all(&parent)?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
