//! Network construction and forward execution.
//!
//! The engine is generic over two seams: `Network`, one forward pass over a
//! prepared NCHW tensor, and `NetworkFactory`, which builds a network from a
//! format's topology and weights artifacts. The default factory runs every
//! supported format through an ONNX Runtime session; tests substitute stubs.

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::{InferenceError, ModelLoadError};
use crate::model::descriptor::ModelFormat;

/// An in-memory network executing forward inference.
///
/// `forward` takes `&mut self` because the underlying session requires
/// exclusive access; the worker owns the network exclusively, so no locking
/// is needed.
pub trait Network: Send {
    /// Run a forward pass over an NCHW input tensor and return the flat
    /// raw output buffer.
    fn forward(&mut self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

/// Builds a network from a format's topology and weights artifacts.
pub trait NetworkFactory: Send + Sync {
    fn build(
        &self,
        format: ModelFormat,
        topology: &[u8],
        weights: &[u8],
    ) -> Result<Box<dyn Network>, ModelLoadError>;
}

/// Default factory: an ONNX Runtime session per model.
///
/// The session graph is self-contained in the weights artifact; the topology
/// artifact is validated as present by the load sequence but not consumed
/// here.
pub struct OrtNetworkFactory;

impl NetworkFactory for OrtNetworkFactory {
    fn build(
        &self,
        format: ModelFormat,
        _topology: &[u8],
        weights: &[u8],
    ) -> Result<Box<dyn Network>, ModelLoadError> {
        let network = OrtNetwork::from_weights(format, weights)?;
        Ok(Box::new(network))
    }
}

/// Wraps an ONNX Runtime session.
pub struct OrtNetwork {
    session: Session,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl OrtNetwork {
    fn from_weights(format: ModelFormat, weights: &[u8]) -> Result<Self, ModelLoadError> {
        let build_err = |message: String| ModelLoadError::NetworkBuild {
            format: format.as_str().to_string(),
            message,
        };

        let session = Session::builder()
            .map_err(|e| build_err(format!("Failed to create session builder: {e}")))?
            .commit_from_memory(weights)
            .map_err(|e| build_err(format!("Failed to load network: {e}")))?;

        // Detect the input tensor name from model metadata.
        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::debug!(
            "Built {} network (input: {:?}, outputs: {:?})",
            format.as_str(),
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session,
            input_name,
        })
    }
}

impl Network for OrtNetwork {
    fn forward(&mut self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let forward_err = |message: String| InferenceError::Forward { message };

        // Convert ndarray to (shape, flat_data) for ort.
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = input.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| forward_err(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| forward_err(format!("Inference failed: {e}")))?;

        // The detection head is the first (usually only) output.
        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| forward_err("Network produced no outputs".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| forward_err(format!("Failed to extract output tensor: {e}")))?;

        Ok(data.to_vec())
    }
}
