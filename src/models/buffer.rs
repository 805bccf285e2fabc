//! Owned RGBA8 pixel grid in row-major layout (stride == width).
//!
//! The only shared state of the pipeline. Every transform borrows it mutably
//! and leaves it rectangular with the same dimensions.

use super::pixel::Rgba;
use crate::error::{PixelError, Result};

/// Bytes per RGBA8 pixel
pub const CHANNELS: usize = 4;

/// Rectangular grid of RGBA pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<Rgba>,
}

impl PixelBuffer {
    /// Create a buffer filled with a single pixel value
    pub fn new(width: usize, height: usize, fill: Rgba) -> Result<Self> {
        let pixels = pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![fill; pixels],
        })
    }

    /// Interpret `bytes` as row-major RGBA quadruplets
    pub fn from_flat_bytes(bytes: &[u8], width: usize, height: usize) -> Result<Self> {
        let expected = pixel_count(width, height)?
            .checked_mul(CHANNELS)
            .ok_or(PixelError::InvalidDimensions { width, height })?;
        if bytes.len() != expected {
            return Err(PixelError::InvalidBufferSize {
                expected,
                actual: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(CHANNELS)
            .map(|c| Rgba::new(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Flatten back to row-major RGBA bytes
    pub fn to_flat_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * CHANNELS);
        for px in &self.data {
            out.extend_from_slice(&px.to_bytes());
        }
        out
    }

    /// Buffer width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a buffer has at least one pixel
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pixel at (x, y)
    pub fn get(&self, x: usize, y: usize) -> Result<Rgba> {
        let idx = self.index(x, y)?;
        Ok(self.data[idx])
    }

    /// Overwrite the pixel at (x, y)
    pub fn set(&mut self, x: usize, y: usize, pixel: Rgba) -> Result<()> {
        let idx = self.index(x, y)?;
        self.data[idx] = pixel;
        Ok(())
    }

    /// Row `y` as a slice, `None` past the last row
    pub fn row(&self, y: usize) -> Option<&[Rgba]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&self.data[start..start + self.width])
    }

    /// All pixels in row-major order
    pub fn pixels(&self) -> &[Rgba] {
        &self.data
    }

    /// Mutable access to all pixels in row-major order
    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.data
    }

    /// Red channel of every pixel; the luma plane once the buffer is grayscale
    pub fn luma_values(&self) -> Vec<u8> {
        self.data.iter().map(|px| px.r).collect()
    }

    /// Replace the contents with `bytes`, keeping the dimensions
    pub(crate) fn replace_from_flat(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = self.data.len() * CHANNELS;
        if bytes.len() != expected {
            return Err(PixelError::InvalidBufferSize {
                expected,
                actual: bytes.len(),
            });
        }
        for (px, c) in self.data.iter_mut().zip(bytes.chunks_exact(CHANNELS)) {
            *px = Rgba::new(c[0], c[1], c[2], c[3]);
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(PixelError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.idx(x, y))
    }
}

/// `width * height`, rejecting zero sides and sizes that overflow `usize`
fn pixel_count(width: usize, height: usize) -> Result<usize> {
    match width.checked_mul(height) {
        Some(n) if n > 0 => Ok(n),
        _ => Err(PixelError::InvalidDimensions { width, height }),
    }
}
