//! Input tensor construction from RGBA pixel buffers.
//!
//! Mirrors the blobFromImage convention: strip alpha, pick the channel order
//! the network expects, resize to the declared input size, then apply
//! `(pixel - normalization[c]) * scale` per channel into an NCHW tensor.

use image::RgbaImage;
use ndarray::Array4;

use crate::error::InferenceError;
use crate::model::PreprocessConfig;
use crate::types::ClassificationRequest;

/// Number of color channels after alpha stripping.
const CHANNELS: usize = 3;

/// Build the network input tensor for one request.
pub fn input_tensor(
    request: &ClassificationRequest,
    config: &PreprocessConfig,
) -> Result<Array4<f32>, InferenceError> {
    if request.width == 0 || request.height == 0 {
        return Err(InferenceError::MalformedImage {
            message: format!("zero-sized image {}x{}", request.width, request.height),
        });
    }
    let expected = request.width as usize * request.height as usize * 4;
    if request.rgba.len() != expected {
        return Err(InferenceError::MalformedImage {
            message: format!(
                "pixel buffer length {} does not match {}x{} RGBA ({expected} bytes)",
                request.rgba.len(),
                request.width,
                request.height
            ),
        });
    }

    // The length check above guarantees from_raw succeeds.
    let rgba = RgbaImage::from_raw(request.width, request.height, request.rgba.clone())
        .ok_or_else(|| InferenceError::MalformedImage {
            message: "pixel buffer does not form an RGBA image".to_string(),
        })?;
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    let [width, height] = config.size;
    let resized = image::imageops::resize(
        &rgb,
        width,
        height,
        image::imageops::FilterType::Triangle,
    );

    let (width, height) = (width as usize, height as usize);
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, height, width));

    // Fill the tensor from the raw byte slice directly; freshly allocated
    // Array4 storage is contiguous.
    let tensor_data = tensor.as_slice_mut().unwrap();
    for (i, pixel) in resized.as_raw().chunks_exact(CHANNELS).enumerate() {
        let y = i / width;
        let x = i % width;
        for (c, &val) in pixel.iter().enumerate() {
            // swap_colors flips RGB source channels into BGR tensor order.
            let channel = if config.swap_colors { CHANNELS - 1 - c } else { c };
            let offset = config.normalization.get(channel).copied().unwrap_or(0.0);
            let idx = channel * height * width + y * width + x;
            tensor_data[idx] = (val as f32 - offset) * config.scale;
        }
    }

    Ok(tensor)
}
