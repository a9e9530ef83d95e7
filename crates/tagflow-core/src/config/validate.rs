//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "model.name must not be empty".into(),
            ));
        }
        if self.model.base.is_empty() {
            return Err(ConfigError::ValidationError(
                "model.base must not be empty".into(),
            ));
        }
        if self.limits.load_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.load_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.execute_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.execute_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.max_megapixels == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_megapixels must be > 0".into(),
            ));
        }
        if self.worker.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "worker.channel_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }
}
