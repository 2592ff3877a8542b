//! Image decoding and tensor preparation

use image::{imageops, RgbImage};
use ndarray::Array4;

use crate::{EngineConfig, InferenceError, InputLayout};

/// Decode an uploaded image (format sniffed from content) into 8-bit RGB
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, InferenceError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| InferenceError::Decode(e.to_string()))
}

/// Resize to the model resolution, scale to [0, 1] and add the batch axis
pub fn to_input_tensor(image: &RgbImage, config: &EngineConfig) -> Array4<f32> {
    let size = config.input_size;
    let resized = imageops::resize(image, size, size, config.resize_filter.into());

    let [n, d1, d2, d3] = config.input_shape();
    let mut input = Array4::<f32>::zeros((n, d1, d2, d3));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            match config.layout {
                InputLayout::Nhwc => input[[0, y, x, c]] = value,
                InputLayout::Nchw => input[[0, c, y, x]] = value,
            }
        }
    }

    input
}
