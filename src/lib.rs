//! pixel_pipeline - RGBA pixel transforms with Otsu binarization
//!
//! An in-memory RGBA8 raster and the operations applied to it: channel
//! swapping, grayscale, fixed and Otsu binarization, packed HSV, color
//! subtraction and block pooling. Point transforms run through a small
//! executor interface so an accelerator backend can stand in for the CPU.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Executors for point transforms (sequential and rayon)
pub mod backend;
/// Error type and result alias
pub mod error;
/// Conversions to and from `image` crate buffers
pub mod interop;
/// Core data structures (PixelBuffer, Rgba)
pub mod models;
/// Fluent processor and step parsing
pub mod processor;
/// File loading, saving and statistics helpers
pub mod tools;
/// Pixel transforms (grayscale, binarization, color, pooling)
pub mod utils;

pub use backend::{Backend, CpuExecutor, Executor, Operation, ParallelExecutor};
pub use error::{PixelError, Result};
pub use models::{PixelBuffer, Rgba};
pub use processor::{Processor, ProcessorConfig, Step};
pub use utils::binarization::{OtsuMethod, OtsuResult};

/// Apply `steps` to a flat RGBA8 array and return the flattened result
///
/// # Arguments
/// * `bytes` - Raw RGBA bytes (4 bytes per pixel, row-major)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `steps` - Transforms to apply in order
///
/// # Example
/// ```
/// use pixel_pipeline::{Step, process};
///
/// let bytes = vec![10, 20, 30, 255, 250, 250, 250, 255];
/// let out = process(&bytes, 2, 1, &[Step::Binarize(128)]).unwrap();
/// assert_eq!(out, vec![0, 0, 0, 0, 255, 255, 255, 255]);
/// ```
pub fn process(bytes: &[u8], width: usize, height: usize, steps: &[Step]) -> Result<Vec<u8>> {
    let mut processor = Processor::from_flat_bytes(bytes, width, height)?;
    processor.run(steps)?;
    Ok(processor.to_flat_bytes())
}

/// Find the Otsu threshold of a flat RGBA8 array without modifying it
pub fn otsu_threshold(bytes: &[u8], width: usize, height: usize, method: OtsuMethod) -> Result<u8> {
    let buffer = PixelBuffer::from_flat_bytes(bytes, width, height)?;
    let luma: Vec<u8> = buffer.pixels().iter().map(|&px| utils::grayscale::luma(px)).collect();
    Ok(utils::binarization::otsu_threshold(&luma, method).threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_rejects_bad_size() {
        assert_eq!(
            process(&[0u8; 7], 1, 2, &[]),
            Err(PixelError::InvalidBufferSize {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn test_otsu_threshold_both_methods() {
        let mut bytes = Vec::new();
        for i in 0..64u8 {
            let v = if i % 3 == 0 { 40 } else { 180 };
            bytes.extend_from_slice(&[v, v, v, 255]);
        }
        let naive = otsu_threshold(&bytes, 8, 8, OtsuMethod::Naive).unwrap();
        let fast = otsu_threshold(&bytes, 8, 8, OtsuMethod::Optimized).unwrap();
        assert_eq!(naive, 41);
        assert_eq!(naive, fast);
    }
}
