//! Error types for the tagflow classification pipeline.
//!
//! Errors are organized per stage: model loading, inference, and the
//! host/worker protocol each have their own enum so failures carry the
//! context of the stage that produced them.

use thiserror::Error;

/// Top-level error type for tagflow operations.
#[derive(Error, Debug)]
pub enum TagflowError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model fetch/parse/build errors
    #[error("Model load error: {0}")]
    ModelLoad(#[from] ModelLoadError),

    /// Classification errors for a single request
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Host/worker protocol errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize configuration back to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors while fetching artifacts and building a model.
///
/// Any of these leaves the engine without a usable model (state Unloaded).
#[derive(Error, Debug)]
pub enum ModelLoadError {
    /// An artifact fetch failed (network error, non-2xx status, missing file)
    #[error("Failed to fetch {artifact}: {message}")]
    Fetch { artifact: String, message: String },

    /// The descriptor JSON could not be parsed or failed sanity checks
    #[error("Malformed descriptor for model {model}: {message}")]
    Descriptor { model: String, message: String },

    /// The descriptor declares a format this build does not support
    #[error("Unsupported model format: {format}")]
    UnsupportedFormat { format: String },

    /// Network construction from topology/weights failed
    #[error("Failed to build {format} network: {message}")]
    NetworkBuild { format: String, message: String },
}

/// Errors while classifying a single request.
///
/// These fail the in-flight request only; the loaded model stays usable.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Classification was attempted with no model loaded
    #[error("No model is loaded")]
    ModelNotLoaded,

    /// The submitted pixel buffer does not describe a valid image
    #[error("Malformed image buffer: {message}")]
    MalformedImage { message: String },

    /// The decoded image exceeds the configured pixel budget
    #[error("Image too large: {width}x{height} exceeds {max_megapixels} megapixel limit")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_megapixels: u32,
    },

    /// The forward pass itself failed
    #[error("Forward pass failed: {message}")]
    Forward { message: String },

    /// The raw output buffer cannot be walked as fixed-size records
    #[error("Malformed output buffer: {message}")]
    MalformedOutput { message: String },

    /// A record's class value does not resolve to a tag
    #[error("Class index {value} out of range for {tag_count} tags")]
    ClassIndex { value: f32, tag_count: usize },
}

/// Errors on the host side of the worker protocol.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The worker task is gone (channel closed)
    #[error("Worker channel closed")]
    ChannelClosed,

    /// A bounded wait for a worker response expired
    #[error("Timed out waiting for {waiting_for} after {timeout_ms}ms")]
    Timeout { waiting_for: String, timeout_ms: u64 },

    /// The worker reported a failed model load
    #[error("Model load failed: {0}")]
    LoadFailed(String),

    /// The message stream violated the request/response contract
    #[error("Protocol violation: {0}")]
    Protocol(String),
}

/// Convenience type alias for tagflow results.
pub type Result<T> = std::result::Result<T, TagflowError>;
