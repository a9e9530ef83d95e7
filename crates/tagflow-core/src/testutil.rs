//! Shared fixtures for engine, worker, and coordinator tests.

use std::collections::HashMap;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

use crate::error::{InferenceError, ModelLoadError};
use crate::model::{ModelFormat, ModelStore, Network, NetworkFactory};
use crate::types::ClassificationRequest;

/// In-memory model store keyed by artifact file name.
pub(crate) struct MapStore {
    files: HashMap<String, Vec<u8>>,
}

impl MapStore {
    /// A store holding a complete artifact set for `name`: the given
    /// descriptor plus placeholder topology/weights files for both formats.
    pub(crate) fn with_model(name: &str, descriptor: &str) -> Self {
        let mut files = HashMap::new();
        files.insert(format!("{name}.json"), descriptor.as_bytes().to_vec());
        for ext in ["pbtxt", "pb", "prototxt", "caffemodel"] {
            files.insert(format!("{name}.{ext}"), b"artifact".to_vec());
        }
        Self { files }
    }

    pub(crate) fn remove(&mut self, file: &str) {
        self.files.remove(file);
    }
}

#[async_trait]
impl ModelStore for MapStore {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, ModelLoadError> {
        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| ModelLoadError::Fetch {
                artifact: file.to_string(),
                message: "not in store".to_string(),
            })
    }
}

/// Network returning a canned output buffer.
pub(crate) struct StubNetwork {
    output: Vec<f32>,
}

impl Network for StubNetwork {
    fn forward(&mut self, _input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        Ok(self.output.clone())
    }
}

/// Factory producing `StubNetwork`s with a fixed output buffer.
pub(crate) struct StubFactory {
    output: Vec<f32>,
}

impl StubFactory {
    pub(crate) fn new(output: Vec<f32>) -> Self {
        Self { output }
    }
}

impl NetworkFactory for StubFactory {
    fn build(
        &self,
        _format: ModelFormat,
        _topology: &[u8],
        _weights: &[u8],
    ) -> Result<Box<dyn Network>, ModelLoadError> {
        Ok(Box::new(StubNetwork {
            output: self.output.clone(),
        }))
    }
}

/// Factory that always fails, for load-failure paths.
pub(crate) struct FailingFactory;

impl NetworkFactory for FailingFactory {
    fn build(
        &self,
        format: ModelFormat,
        _topology: &[u8],
        _weights: &[u8],
    ) -> Result<Box<dyn Network>, ModelLoadError> {
        Err(ModelLoadError::NetworkBuild {
            format: format.as_str().to_string(),
            message: "stub build failure".to_string(),
        })
    }
}

/// A descriptor matching the 3-tag, 4-float-record layout used across tests.
pub(crate) fn descriptor_json(format: &str) -> String {
    format!(
        r#"{{
            "type": "{format}",
            "image": {{
                "scale": 1.0,
                "size": [2, 2],
                "normalization": [0.0, 0.0, 0.0],
                "swap_colors": false
            }},
            "tags": ["cat", "dog", "bird"],
            "output": {{
                "data_interval": 4,
                "recognition_offset": 2,
                "recognition_threshold": 0.5,
                "class_offset": 3
            }}
        }}"#
    )
}

/// A small well-formed classification request.
pub(crate) fn solid_image_request() -> ClassificationRequest {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([128, 64, 32])));
    ClassificationRequest::from_image(&img)
}
