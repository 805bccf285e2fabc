//! Conversions between `PixelBuffer` and the `image` crate's RGBA buffers.

use crate::error::{PixelError, Result};
use crate::models::PixelBuffer;
use image::{DynamicImage, RgbaImage};

/// Copy a decoded RGBA image into a pixel buffer
pub fn from_rgba_image(image: &RgbaImage) -> Result<PixelBuffer> {
    let (width, height) = image.dimensions();
    PixelBuffer::from_flat_bytes(image.as_raw(), width as usize, height as usize)
}

/// Convert any decoded image to RGBA8 and copy it into a pixel buffer
pub fn from_dynamic_image(image: &DynamicImage) -> Result<PixelBuffer> {
    from_rgba_image(&image.to_rgba8())
}

/// Flatten a pixel buffer into an `RgbaImage`
pub fn to_rgba_image(buffer: &PixelBuffer) -> Result<RgbaImage> {
    let bytes = buffer.to_flat_bytes();
    let actual = bytes.len();
    let width = u32::try_from(buffer.width()).map_err(|_| PixelError::InvalidDimensions {
        width: buffer.width(),
        height: buffer.height(),
    })?;
    let height = u32::try_from(buffer.height()).map_err(|_| PixelError::InvalidDimensions {
        width: buffer.width(),
        height: buffer.height(),
    })?;
    RgbaImage::from_raw(width, height, bytes).ok_or(PixelError::InvalidBufferSize {
        expected: buffer.len() * 4,
        actual,
    })
}
