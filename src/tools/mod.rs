//! Helpers shared by the `pixeltool` binary, benches and integration tests.

use crate::error::PixelError;
use crate::interop::{from_dynamic_image, to_rgba_image};
use crate::models::PixelBuffer;
use crate::utils::grayscale::luma;
use image::GenericImageView;
use std::env;
use std::path::Path;
use thiserror::Error;

/// Environment variable capping the longest side of loaded images
pub const MAX_DIM_ENV: &str = "PIXEL_MAX_DIM";

/// Failure while loading, processing or saving an image file
#[derive(Error, Debug)]
pub enum ToolError {
    /// Decoding or encoding failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A pixel operation failed
    #[error(transparent)]
    Pixel(#[from] PixelError),
}

fn max_dim_from_env() -> Option<u32> {
    match env::var(MAX_DIM_ENV) {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image file as an RGBA pixel buffer, downscaling per `PIXEL_MAX_DIM`
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<PixelBuffer, ToolError> {
    let img = image::open(path)?;
    let img = match max_dim_from_env() {
        Some(max_dim) => {
            let (orig_w, orig_h) = img.dimensions();
            if orig_w.max(orig_h) > max_dim {
                img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            } else {
                img
            }
        }
        None => img,
    };
    Ok(from_dynamic_image(&img)?)
}

/// Save a pixel buffer; the format follows the file extension
pub fn save_rgba<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<(), ToolError> {
    to_rgba_image(buffer)?.save(path)?;
    Ok(())
}

/// Summary statistics for the luma of a buffer.
#[derive(Debug, Clone, Copy)]
pub struct GrayStats {
    /// Minimum luma.
    pub min: u8,
    /// Maximum luma.
    pub max: u8,
    /// Average luma.
    pub avg: u8,
}

/// Summary statistics for a binarized buffer.
#[derive(Debug, Clone, Copy)]
pub struct BinaryStats {
    /// Count of black (below threshold) pixels.
    pub black_pixels: usize,
    /// Total pixels in the buffer.
    pub total_pixels: usize,
    /// Ratio of black pixels to total pixels.
    pub black_ratio: f64,
}

/// Compute min/max/avg luma without modifying the buffer.
pub fn grayscale_stats(buffer: &PixelBuffer) -> GrayStats {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &px in buffer.pixels() {
        let v = luma(px);
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    let avg = (sum / buffer.len() as u64) as u8;
    GrayStats { min, max, avg }
}

/// Count pixels whose luma falls below `threshold`.
pub fn binary_stats(buffer: &PixelBuffer, threshold: u8) -> BinaryStats {
    let black = buffer
        .pixels()
        .iter()
        .filter(|&&px| luma(px) < threshold)
        .count();
    let total = buffer.len();
    BinaryStats {
        black_pixels: black,
        total_pixels: total,
        black_ratio: black as f64 / total as f64,
    }
}
