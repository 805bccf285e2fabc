//! Grayscale conversion using Rec. 709 luma weights
//! Y = 0.2126*R + 0.7152*G + 0.0722*B, rounded half away from zero
//!
//! The converted pixel carries the luma in all four channels, alpha included.

use crate::models::{PixelBuffer, Rgba};
use rayon::prelude::*;

/// Coefficients for grayscale conversion
const COEF_R: f64 = 0.2126;
const COEF_G: f64 = 0.7152;
const COEF_B: f64 = 0.0722;

/// Luma of a single pixel
#[inline]
pub fn luma(px: Rgba) -> u8 {
    let y = px.r as f64 * COEF_R + px.g as f64 * COEF_G + px.b as f64 * COEF_B;
    y.round().min(255.0) as u8
}

/// Grayscale kernel: every channel, alpha included, becomes the luma
#[inline]
pub fn gray_pixel(px: Rgba) -> Rgba {
    Rgba::splat(luma(px))
}

/// Convert a pixel slice to grayscale in place
pub fn grayscale_pixels(pixels: &mut [Rgba]) {
    for px in pixels.iter_mut() {
        *px = gray_pixel(*px);
    }
}

/// Convert the whole buffer to grayscale in place
pub fn grayscale(buffer: &mut PixelBuffer) {
    grayscale_pixels(buffer.pixels_mut());
}

/// Convert the buffer to grayscale, processing rows in parallel
pub fn grayscale_parallel(buffer: &mut PixelBuffer) {
    let width = buffer.width();
    buffer
        .pixels_mut()
        .par_chunks_mut(width)
        .for_each(grayscale_pixels);
}

/// Luma plane of flat RGBA bytes (one byte per pixel)
pub fn rgba_to_luma(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|c| luma(Rgba::new(c[0], c[1], c[2], c[3])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_primaries() {
        assert_eq!(luma(Rgba::new(255, 255, 255, 0)), 255);
        assert_eq!(luma(Rgba::new(0, 0, 0, 255)), 0);
        // 54.213 -> 54
        assert_eq!(luma(Rgba::new(255, 0, 0, 0)), 54);
        // 182.376 -> 182
        assert_eq!(luma(Rgba::new(0, 255, 0, 0)), 182);
        // 18.411 -> 18
        assert_eq!(luma(Rgba::new(0, 0, 255, 0)), 18);
        // 147.332 -> 147
        assert_eq!(luma(Rgba::new(10, 200, 30, 9)), 147);
    }

    #[test]
    fn test_gray_pixel_overwrites_alpha() {
        let px = gray_pixel(Rgba::new(10, 200, 30, 9));
        assert_eq!(px, Rgba::new(147, 147, 147, 147));
    }

    #[test]
    fn test_grayscale_idempotent() {
        let bytes: Vec<u8> = (0..64u32).map(|i| (i * 37 % 256) as u8).collect();
        let mut once = PixelBuffer::from_flat_bytes(&bytes, 4, 4).unwrap();
        grayscale(&mut once);
        let mut twice = once.clone();
        grayscale(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let bytes: Vec<u8> = (0..(7 * 5 * 4u32)).map(|i| (i * 91 % 256) as u8).collect();
        let mut seq = PixelBuffer::from_flat_bytes(&bytes, 7, 5).unwrap();
        let mut par = seq.clone();
        grayscale(&mut seq);
        grayscale_parallel(&mut par);
        assert_eq!(seq, par);
    }

    #[test]
    fn test_rgba_to_luma() {
        let rgba = vec![255, 255, 255, 0, 10, 200, 30, 255];
        assert_eq!(rgba_to_luma(&rgba), vec![255, 147]);
    }
}
