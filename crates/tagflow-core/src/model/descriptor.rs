//! Model descriptor parsing.
//!
//! The descriptor is the JSON artifact bundled with every model. It names the
//! network format, how raw pixels become the input tensor, the tag list
//! (index = class id), and how to walk the flat output buffer.

use serde::Deserialize;

use crate::error::ModelLoadError;

/// The closed set of network formats a model may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Tensorflow,
    Caffe,
}

impl ModelFormat {
    /// `(topology, weights)` artifact file extensions for this format.
    pub fn artifact_extensions(&self) -> (&'static str, &'static str) {
        match self {
            ModelFormat::Tensorflow => ("pbtxt", "pb"),
            ModelFormat::Caffe => ("prototxt", "caffemodel"),
        }
    }

    /// The descriptor spelling of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Tensorflow => "tensorflow",
            ModelFormat::Caffe => "caffe",
        }
    }

    fn parse(name: &str) -> Result<Self, ModelLoadError> {
        match name {
            "tensorflow" => Ok(ModelFormat::Tensorflow),
            "caffe" => Ok(ModelFormat::Caffe),
            other => Err(ModelLoadError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// How raw pixels become the network's input tensor.
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessConfig {
    /// Multiplier applied after offset subtraction
    pub scale: f32,

    /// Input tensor size as `[width, height]`
    pub size: [u32; 2],

    /// Per-channel offsets, in the tensor's channel order
    pub normalization: Vec<f32>,

    /// Swap the R and B channels (BGR input networks)
    #[serde(default)]
    pub swap_colors: bool,
}

/// How to walk the flat raw-output buffer.
///
/// The buffer is an array of records of `data_interval` floats; within each
/// record, `recognition_offset` holds a confidence score and `class_offset`
/// holds a class index into the tag list.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputLayout {
    pub data_interval: usize,
    pub recognition_offset: usize,
    pub recognition_threshold: f32,
    pub class_offset: usize,
}

/// Parsed model descriptor. Immutable once loaded; a reload replaces it
/// wholesale.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub format: ModelFormat,
    pub image: PreprocessConfig,
    pub tags: Vec<String>,
    pub output: OutputLayout,
}

/// Wire shape of the descriptor; `type` stays a string so an unknown format
/// is reported as `UnsupportedFormat` rather than a parse error.
#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(rename = "type")]
    format: String,
    image: PreprocessConfig,
    tags: Vec<String>,
    output: OutputLayout,
}

impl ModelDescriptor {
    /// Parse and sanity-check a descriptor fetched for `model`.
    pub fn parse(model: &str, bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let raw: RawDescriptor =
            serde_json::from_slice(bytes).map_err(|e| ModelLoadError::Descriptor {
                model: model.to_string(),
                message: e.to_string(),
            })?;
        let format = ModelFormat::parse(&raw.format)?;

        let descriptor = Self {
            format,
            image: raw.image,
            tags: raw.tags,
            output: raw.output,
        };
        descriptor.check(model)?;
        Ok(descriptor)
    }

    fn check(&self, model: &str) -> Result<(), ModelLoadError> {
        let fail = |message: String| ModelLoadError::Descriptor {
            model: model.to_string(),
            message,
        };

        if self.tags.is_empty() {
            return Err(fail("tag list is empty".into()));
        }
        if self.image.size[0] == 0 || self.image.size[1] == 0 {
            return Err(fail(format!("invalid input size {:?}", self.image.size)));
        }
        if self.image.normalization.len() != 3 {
            return Err(fail(format!(
                "image.normalization has {} offsets, expected one per RGB channel",
                self.image.normalization.len()
            )));
        }
        if self.output.data_interval == 0 {
            return Err(fail("output.data_interval must be > 0".into()));
        }
        if self.output.recognition_offset >= self.output.data_interval {
            return Err(fail(format!(
                "output.recognition_offset {} outside record of length {}",
                self.output.recognition_offset, self.output.data_interval
            )));
        }
        if self.output.class_offset >= self.output.data_interval {
            return Err(fail(format!(
                "output.class_offset {} outside record of length {}",
                self.output.class_offset, self.output.data_interval
            )));
        }
        Ok(())
    }
}
