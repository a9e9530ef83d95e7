//! Core data types for the tagflow classification pipeline.

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// One file emitted by the upload source.
///
/// The coordinator only acts on events whose MIME type starts with `image/`.
#[derive(Debug, Clone)]
pub struct UploadEvent {
    /// MIME type of the uploaded file
    pub mime: String,

    /// Reference back to the source (file path, URL) used to correlate
    /// the eventual result with the image that produced it
    pub source: String,

    /// Raw encoded file bytes
    pub bytes: Vec<u8>,
}

impl UploadEvent {
    /// Build an upload event from a file on disk, detecting the MIME type
    /// from the file extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let mime = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        let bytes = std::fs::read(path)?;
        Ok(Self {
            mime,
            source: path.display().to_string(),
            bytes,
        })
    }
}

/// Decoded RGBA pixels for one classification request.
///
/// Submitted once per image and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Interleaved RGBA bytes, `width * height * 4` of them
    pub rgba: Vec<u8>,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,
}

impl ClassificationRequest {
    /// Build a request from a decoded image.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            rgba: rgba.into_raw(),
            width,
            height,
        }
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) into a request.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InferenceError> {
        let image = image::load_from_memory(bytes).map_err(|e| InferenceError::MalformedImage {
            message: e.to_string(),
        })?;
        Ok(Self::from_image(&image))
    }
}

/// The labels produced for one classification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Source reference from the originating upload event
    pub source: String,

    /// Deduplicated labels; empty on failure
    pub labels: Vec<String>,

    /// Failure reason, if the request did not classify cleanly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A host-side tag entry target.
///
/// Filled at most once per field, so a later drain never overwrites
/// manual edits.
#[derive(Debug, Clone)]
pub struct TagField {
    id: String,
    value: Option<String>,
}

impl TagField {
    /// Create an empty tag field with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
        }
    }

    /// The field's identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The published label string, if the field has been filled.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether the field has already been filled.
    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Write a comma-joined label list into the field. No-op if the field
    /// was already filled.
    pub(crate) fn fill(&mut self, labels: &[String]) {
        if self.value.is_none() {
            self.value = Some(labels.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_request_from_image_strides() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(3, 2));
        let request = ClassificationRequest::from_image(&img);
        assert_eq!(request.width, 3);
        assert_eq!(request.height, 2);
        assert_eq!(request.rgba.len(), 3 * 2 * 4);
    }

    #[test]
    fn test_request_from_bytes_rejects_garbage() {
        let err = ClassificationRequest::from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, InferenceError::MalformedImage { .. }));
    }

    #[test]
    fn test_tag_field_fills_once() {
        let mut field = TagField::new("field-0");
        assert!(!field.is_filled());

        field.fill(&["cat".to_string(), "dog".to_string()]);
        assert_eq!(field.value(), Some("cat, dog"));

        // A second fill must not overwrite the first.
        field.fill(&["bird".to_string()]);
        assert_eq!(field.value(), Some("cat, dog"));
    }

    #[test]
    fn test_tag_field_fill_with_no_labels_still_marks_filled() {
        let mut field = TagField::new("field-0");
        field.fill(&[]);
        assert!(field.is_filled());
        assert_eq!(field.value(), Some(""));
    }
}
