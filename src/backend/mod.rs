//! Executors for point transforms over flat RGBA8 arrays.
//!
//! An executor receives a flat pixel array, an operation id and an optional
//! scalar byte, and returns a flat array of the same length. The sequential
//! [`CpuExecutor`] and the rayon-backed [`ParallelExecutor`] run the same
//! per-pixel kernels, so their output is byte-identical. An accelerator
//! backend plugs in by implementing [`Executor`].

use crate::error::{PixelError, Result};
use crate::models::buffer::CHANNELS;
use crate::models::{PixelBuffer, Rgba};
use crate::utils::binarization::{OtsuMethod, binarize_pixel, otsu_threshold};
use crate::utils::color::{ColorLevels, hsv_to_rgb_pixel, rgb_to_hsv_pixel, swap_rb_pixel};
use crate::utils::grayscale::{gray_pixel, rgba_to_luma};
use log::trace;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Point operations understood by every executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Exchange red and blue
    RgbToBgr,
    /// Luma into all four channels
    Grayscale,
    /// Grayscale then fixed threshold; option is the threshold
    Binarize,
    /// Grayscale then Otsu threshold; option is ignored
    OtsuBinarize,
    /// Pack as hue/saturation/value
    RgbToHsv,
    /// Unpack hue/saturation/value
    HsvToRgb,
    /// Quantize channels; option is the division count
    ColorSubtract,
}

impl Operation {
    /// Every operation, in declaration order
    pub const ALL: [Operation; 7] = [
        Operation::RgbToBgr,
        Operation::Grayscale,
        Operation::Binarize,
        Operation::OtsuBinarize,
        Operation::RgbToHsv,
        Operation::HsvToRgb,
        Operation::ColorSubtract,
    ];

    /// Stable identifier used across the executor boundary
    pub fn name(&self) -> &'static str {
        match self {
            Operation::RgbToBgr => "rgb_to_bgr",
            Operation::Grayscale => "grayscale",
            Operation::Binarize => "binarize",
            Operation::OtsuBinarize => "otsu_binarize",
            Operation::RgbToHsv => "rgb_to_hsv",
            Operation::HsvToRgb => "hsv_to_rgb",
            Operation::ColorSubtract => "color_subtract",
        }
    }

    /// Whether the scalar option must be present
    pub fn requires_option(&self) -> bool {
        matches!(self, Operation::Binarize | Operation::ColorSubtract)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| PixelError::UnknownOperation(s.to_string()))
    }
}

/// Per-pixel work resolved from an operation and its option
#[derive(Debug, Clone)]
enum Kernel {
    Map(fn(Rgba) -> Rgba),
    Threshold(u8),
    Levels(ColorLevels),
}

impl Kernel {
    fn prepare(op: Operation, pixels: &[u8], option: Option<u8>) -> Result<Self> {
        if op.requires_option() && option.is_none() {
            return Err(PixelError::MissingOption(op.name()));
        }
        let kernel = match op {
            Operation::RgbToBgr => Kernel::Map(swap_rb_pixel),
            Operation::Grayscale => Kernel::Map(gray_pixel),
            Operation::RgbToHsv => Kernel::Map(rgb_to_hsv_pixel),
            Operation::HsvToRgb => Kernel::Map(hsv_to_rgb_pixel),
            Operation::Binarize => Kernel::Threshold(option.unwrap_or_default()),
            Operation::OtsuBinarize => {
                let luma = rgba_to_luma(pixels);
                Kernel::Threshold(otsu_threshold(&luma, OtsuMethod::Optimized).threshold)
            }
            Operation::ColorSubtract => {
                Kernel::Levels(ColorLevels::new(option.unwrap_or_default() as usize)?)
            }
        };
        Ok(kernel)
    }

    #[inline]
    fn apply(&self, px: Rgba) -> Rgba {
        match self {
            Kernel::Map(f) => f(px),
            Kernel::Threshold(t) => binarize_pixel(gray_pixel(px), *t),
            Kernel::Levels(levels) => levels.apply(px),
        }
    }

    fn run(&self, bytes: &mut [u8]) {
        for chunk in bytes.chunks_exact_mut(CHANNELS) {
            let px = self.apply(Rgba::new(chunk[0], chunk[1], chunk[2], chunk[3]));
            chunk.copy_from_slice(&px.to_bytes());
        }
    }
}

fn check_flat(pixels: &[u8]) -> Result<()> {
    if pixels.len() % CHANNELS != 0 {
        return Err(PixelError::InvalidBufferSize {
            expected: pixels.len() - pixels.len() % CHANNELS,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Runs point operations over flat RGBA8 arrays
pub trait Executor: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Apply `op` and return an array of the same length
    fn execute(&self, op: Operation, pixels: &[u8], option: Option<u8>) -> Result<Vec<u8>>;

    /// Look the operation up by id and execute it
    fn execute_named(&self, op: &str, pixels: &[u8], option: Option<u8>) -> Result<Vec<u8>> {
        self.execute(op.parse()?, pixels, option)
    }

    /// Flatten `buffer`, execute and write the result back
    fn apply(&self, buffer: &mut PixelBuffer, op: Operation, option: Option<u8>) -> Result<()> {
        let input = buffer.to_flat_bytes();
        let output = self.execute(op, &input, option)?;
        buffer.replace_from_flat(&output)
    }
}

/// Sequential executor
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuExecutor;

impl Executor for CpuExecutor {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn execute(&self, op: Operation, pixels: &[u8], option: Option<u8>) -> Result<Vec<u8>> {
        check_flat(pixels)?;
        trace!("{}: {} over {} bytes", self.name(), op, pixels.len());
        let kernel = Kernel::prepare(op, pixels, option)?;
        let mut out = pixels.to_vec();
        kernel.run(&mut out);
        Ok(out)
    }
}

/// Executor splitting the array into pixel chunks processed with rayon
#[derive(Debug, Clone, Copy)]
pub struct ParallelExecutor {
    chunk_pixels: usize,
}

impl ParallelExecutor {
    /// Create with the default chunk of 4096 pixels
    pub fn new() -> Self {
        Self { chunk_pixels: 4096 }
    }

    /// Create with a custom chunk size in pixels (at least 1)
    pub fn with_chunk_pixels(chunk_pixels: usize) -> Self {
        Self {
            chunk_pixels: chunk_pixels.max(1),
        }
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ParallelExecutor {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn execute(&self, op: Operation, pixels: &[u8], option: Option<u8>) -> Result<Vec<u8>> {
        check_flat(pixels)?;
        trace!(
            "{}: {} over {} bytes in chunks of {} pixels",
            self.name(),
            op,
            pixels.len(),
            self.chunk_pixels
        );
        let kernel = Kernel::prepare(op, pixels, option)?;
        let mut out = pixels.to_vec();
        out.par_chunks_mut(self.chunk_pixels * CHANNELS)
            .for_each(|chunk| kernel.run(chunk));
        Ok(out)
    }
}

/// Executor choice for a `Processor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// [`CpuExecutor`]
    #[default]
    Cpu,
    /// [`ParallelExecutor`]
    Parallel,
}

impl Backend {
    /// Build the executor for this backend
    pub fn executor(&self) -> Box<dyn Executor> {
        match self {
            Backend::Cpu => Box::new(CpuExecutor),
            Backend::Parallel => Box::new(ParallelExecutor::new()),
        }
    }
}

impl FromStr for Backend {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Backend::Cpu),
            "parallel" | "rayon" => Ok(Backend::Parallel),
            other => Err(PixelError::InvalidParameter(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}
