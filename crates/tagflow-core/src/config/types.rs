//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};

/// Which model to load and where its artifacts live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name; artifacts are `<name>.json` plus the format's
    /// topology/weights files
    pub name: String,

    /// Artifact base: a directory path or an `http(s)://` URL
    pub base: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base: "~/.tagflow/models".to_string(),
        }
    }
}

/// Bounded waits for worker responses and resource limits on submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max time to wait for worker init and model load, in milliseconds
    pub load_timeout_ms: u64,

    /// Max time to wait for one classification, in milliseconds
    pub execute_timeout_ms: u64,

    /// Max decoded pixel-buffer size in megapixels; larger uploads are
    /// rejected before any tensor work
    pub max_megapixels: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 30_000,
            execute_timeout_ms: 10_000,
            max_megapixels: 64,
        }
    }
}

/// Worker channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Capacity of each direction of the host/worker channel pair.
    /// Senders block when full, providing backpressure.
    pub channel_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Output format ("pretty" or "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
