//! Pixel transforms
//!
//! This module provides the operations applied to a `PixelBuffer`:
//! - Grayscale conversion (Rec. 709 luma, alpha overwritten)
//! - Binarization (fixed threshold and Otsu's method)
//! - Color remapping (channel swap, packed HSV, color subtraction)
//! - Block pooling over non-overlapping tiles

pub mod binarization;
pub mod color;
pub mod grayscale;
pub mod pooling;
