//! Decoding the flat inference output into tag labels.

use crate::error::InferenceError;
use crate::model::OutputLayout;

/// Walk the raw output buffer as records of `data_interval` floats and
/// resolve every above-threshold class index to its tag.
///
/// Returns labels deduplicated in first-seen order. An out-of-range or
/// non-integral class index is a decode error, as is a buffer that does not
/// divide into whole records.
pub fn decode_labels(
    output: &[f32],
    layout: &OutputLayout,
    tags: &[String],
) -> Result<Vec<String>, InferenceError> {
    if layout.data_interval == 0
        || layout.recognition_offset >= layout.data_interval
        || layout.class_offset >= layout.data_interval
    {
        return Err(InferenceError::MalformedOutput {
            message: format!(
                "output layout offsets ({}, {}) outside record of length {}",
                layout.recognition_offset, layout.class_offset, layout.data_interval
            ),
        });
    }
    if output.len() % layout.data_interval != 0 {
        return Err(InferenceError::MalformedOutput {
            message: format!(
                "output length {} is not a multiple of record length {}",
                output.len(),
                layout.data_interval
            ),
        });
    }

    let mut labels: Vec<String> = Vec::new();
    for record in output.chunks_exact(layout.data_interval) {
        let confidence = record[layout.recognition_offset];
        if confidence > layout.recognition_threshold {
            let index = class_index(record[layout.class_offset], tags.len())?;
            let tag = &tags[index];
            if !labels.iter().any(|l| l == tag) {
                labels.push(tag.clone());
            }
        }
    }
    Ok(labels)
}

/// Resolve a record's raw class value to a tag index.
fn class_index(value: f32, tag_count: usize) -> Result<usize, InferenceError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(InferenceError::ClassIndex { value, tag_count });
    }
    let index = value as usize;
    if index >= tag_count {
        return Err(InferenceError::ClassIndex { value, tag_count });
    }
    Ok(index)
}
