//! Tagflow core - asynchronous image auto-tagging pipeline.
//!
//! Tagflow classifies uploaded images by running a neural-network model
//! inside an isolated worker task and feeding the resulting labels back into
//! tag entry fields.
//!
//! # Architecture
//!
//! ```text
//! Upload → Coordinator (enqueue + dispatch)
//!        → Worker (message) → Engine (load / infer / decode)
//!        → Worker (message) → Coordinator (dequeue + correlate)
//!        → Tag fields
//! ```
//!
//! The host and the worker are independent cooperative contexts joined only
//! by typed, ordered message channels; the worker owns the model exclusively
//! and processes at most one classification at a time.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tagflow_core::{
//!     ClassificationCoordinator, Config, FsModelStore, InferenceEngine, TagField, UploadEvent,
//! };
//!
//! #[tokio::main]
//! async fn main() -> tagflow_core::Result<()> {
//!     let config = Config::load()?;
//!     let engine = InferenceEngine::new(FsModelStore::new(config.model_base()));
//!     let worker = tagflow_core::worker::spawn(engine, config.worker.channel_capacity);
//!
//!     let mut coordinator = ClassificationCoordinator::new(worker, config.limits.clone());
//!     coordinator.add_field(TagField::new("tags"));
//!     coordinator.start(&config.model.name).await?;
//!     coordinator.submit(UploadEvent::from_path("photo.jpg".as_ref())?).await?;
//!     coordinator.drain().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod model;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenient access
pub use config::Config;
pub use coordinator::ClassificationCoordinator;
pub use engine::InferenceEngine;
pub use error::{
    ConfigError, InferenceError, ModelLoadError, Result, TagflowError, WorkerError,
};
pub use model::{
    FsModelStore, HttpModelStore, ModelDescriptor, ModelFormat, ModelStore, Network,
    NetworkFactory,
};
pub use types::{ClassificationRequest, ClassificationResult, TagField, UploadEvent};
pub use worker::{WorkerHandle, WorkerRequest, WorkerResponse};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
