//! Configuration management for tagflow.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults; every section struct implements `Default` so a missing file or
//! missing section still yields a runnable configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for tagflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model selection and artifact base
    pub model: ModelConfig,

    /// Timeouts for worker waits
    pub limits: LimitsConfig,

    /// Worker channel settings
    pub worker: WorkerConfig,

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
    /// Uses platform-appropriate directories, falling back to
    /// `~/.tagflow/config.toml` if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tagflow", "tagflow")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tagflow").join("config.toml")
            })
    }

    /// The resolved model artifact base: URLs pass through untouched,
    /// filesystem paths get tilde expansion.
    pub fn model_base(&self) -> String {
        let base = self.model.base.as_str();
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            shellexpand::tilde(base).into_owned()
        }
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "default");
        assert_eq!(config.limits.load_timeout_ms, 30_000);
        assert_eq!(config.worker.channel_capacity, 16);
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[model]\nname = \"mobilenet-ssd\"\nbase = \"https://models.example.com/tagflow\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model.name, "mobilenet-ssd");
        // Omitted sections fall back to defaults.
        assert_eq!(config.limits.execute_timeout_ms, 10_000);
    }

    #[test]
    fn test_model_base_url_passthrough() {
        let mut config = Config::default();
        config.model.base = "https://models.example.com/tagflow/".to_string();
        assert_eq!(config.model_base(), "https://models.example.com/tagflow/");
    }

    #[test]
    fn test_model_base_tilde_expansion() {
        let mut config = Config::default();
        config.model.base = "~/.tagflow/models".to_string();
        assert!(!config.model_base().starts_with('~'));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.model.name, config.model.name);
        assert_eq!(parsed.logging.level, config.logging.level);
    }
}
