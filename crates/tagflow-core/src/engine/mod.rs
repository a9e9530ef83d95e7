//! The inference engine: model loading and forward classification.
//!
//! The engine is a two-state machine. `load_model` moves it to Ready on
//! success and back to Unloaded on any failure; `classify` never changes
//! state. A reload replaces the previous model wholesale.

pub mod decode;
pub mod preprocess;

use std::time::Instant;

use crate::error::{InferenceError, ModelLoadError};
use crate::model::{ModelDescriptor, ModelStore, Network, NetworkFactory, OrtNetworkFactory};
use crate::types::ClassificationRequest;

/// A fully loaded model: descriptor plus its built network.
struct LoadedModel {
    descriptor: ModelDescriptor,
    network: Box<dyn Network>,
}

/// Loads named models from a store and classifies prepared pixel buffers.
pub struct InferenceEngine<S: ModelStore> {
    store: S,
    factory: Box<dyn NetworkFactory>,
    loaded: Option<LoadedModel>,
}

impl<S: ModelStore> InferenceEngine<S> {
    /// Create an engine backed by the default ONNX Runtime factory.
    pub fn new(store: S) -> Self {
        Self::with_factory(store, Box::new(OrtNetworkFactory))
    }

    /// Create an engine with a custom network factory.
    pub fn with_factory(store: S, factory: Box<dyn NetworkFactory>) -> Self {
        Self {
            store,
            factory,
            loaded: None,
        }
    }

    /// Whether a model is loaded and classification requests are accepted.
    pub fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    /// Fetch the named model's artifacts and build its network.
    ///
    /// The descriptor is fetched and parsed first so the topology and weights
    /// file names come from the declared format. The three fetches are
    /// sequential; any failure short-circuits the rest and leaves the engine
    /// Unloaded, even if a model was previously loaded.
    pub async fn load_model(&mut self, name: &str) -> Result<(), ModelLoadError> {
        self.loaded = None;
        let start = Instant::now();

        let descriptor_bytes = self.store.fetch(&format!("{name}.json")).await?;
        let descriptor = ModelDescriptor::parse(name, &descriptor_bytes)?;

        let (topology_ext, weights_ext) = descriptor.format.artifact_extensions();
        let topology = self.store.fetch(&format!("{name}.{topology_ext}")).await?;
        let weights = self.store.fetch(&format!("{name}.{weights_ext}")).await?;

        let network = self.factory.build(descriptor.format, &topology, &weights)?;

        tracing::debug!(
            "Loaded model {:?} ({}, {} tags) in {:?}",
            name,
            descriptor.format.as_str(),
            descriptor.tags.len(),
            start.elapsed()
        );

        self.loaded = Some(LoadedModel {
            descriptor,
            network,
        });
        Ok(())
    }

    /// Classify one request against the loaded model, returning its
    /// deduplicated labels.
    pub fn classify(&mut self, request: &ClassificationRequest) -> Result<Vec<String>, InferenceError> {
        let model = self.loaded.as_mut().ok_or(InferenceError::ModelNotLoaded)?;

        let start = Instant::now();
        let input = preprocess::input_tensor(request, &model.descriptor.image)?;
        let output = model.network.forward(&input)?;
        let labels = decode::decode_labels(&output, &model.descriptor.output, &model.descriptor.tags)?;

        tracing::debug!(
            "Classified {}x{} image into {} label(s) in {:?}",
            request.width,
            request.height,
            labels.len(),
            start.elapsed()
        );
        Ok(labels)
    }
}
