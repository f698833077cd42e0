//! Image preprocessing: decode, resize and normalize into the network's
//! (channel, row, col) input tensor.
//!
//! Samples are mapped from `[0, 255]` to `[-1, 1]` via `(p − 127.5) / 127.5`.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{Error, Result};
use crate::math::shape::Shape;
use crate::network::metadata::InputType;

/// Maps one 8-bit sample to `[-1, 1]`.
pub fn normalize(sample: u8) -> f32 {
    (sample as f32 - 127.5) / 127.5
}

/// Resizes `img` to `shape.width × shape.height` (bilinear) and flattens it
/// channel-major. One channel uses luma, three use R, G, B in that order.
pub fn image_to_input(img: &DynamicImage, shape: Shape) -> Result<Vec<f32>> {
    let input_type = InputType::for_channels(shape.channels)?;
    let (width, height) = (shape.width as u32, shape.height as u32);
    let resized = img.resize_exact(width, height, FilterType::Triangle);

    let mut input = Vec::with_capacity(shape.volume());
    match input_type {
        InputType::ImageGrayscale => {
            let gray = resized.to_luma8();
            input.extend(gray.pixels().map(|p| normalize(p.0[0])));
        }
        InputType::ImageRgb => {
            let rgb = resized.to_rgb8();
            for channel in 0..3 {
                input.extend(rgb.pixels().map(|p| normalize(p.0[channel])));
            }
        }
    }
    Ok(input)
}

/// Decodes image bytes (PNG/JPEG/BMP/GIF) into an input tensor.
pub fn image_bytes_to_input(bytes: &[u8], shape: Shape) -> Result<Vec<f32>> {
    let img = image::load_from_memory(bytes)?;
    image_to_input(&img, shape)
}

/// Reads and decodes an image file into an input tensor.
pub fn load_image_input(path: impl AsRef<Path>, shape: Shape) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::unreadable(path, e))?;
    image_bytes_to_input(&bytes, shape)
}
