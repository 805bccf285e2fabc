//! Fluent pipeline over a single owned `PixelBuffer`.
//!
//! Point transforms go through the configured executor; Otsu search and block
//! transforms run directly on the buffer.

use crate::backend::{Backend, Executor, Operation};
use crate::error::{PixelError, Result};
use crate::models::PixelBuffer;
use crate::utils::binarization::{OtsuMethod, otsu_threshold};
use crate::utils::pooling::{average_pooling, max_pooling, median_filter, true_max_pooling};
use log::debug;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the executor backend
pub const BACKEND_ENV: &str = "PIXEL_BACKEND";

/// Processor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessorConfig {
    /// Executor used for point transforms
    pub backend: Backend,
}

impl ProcessorConfig {
    /// Read `PIXEL_BACKEND`; unset or unrecognized values fall back to the CPU
    pub fn from_env() -> Self {
        let backend = match env::var(BACKEND_ENV) {
            Ok(value) => value.parse::<Backend>().unwrap_or_else(|err| {
                log::warn!("{BACKEND_ENV}: {err}, using cpu");
                Backend::Cpu
            }),
            Err(_) => Backend::Cpu,
        };
        Self { backend }
    }
}

/// One pipeline step, parseable from the CLI step syntax `name[:arg]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `bgr`
    RgbToBgr,
    /// `gray`
    Grayscale,
    /// `binarize:<threshold>`
    Binarize(u8),
    /// `otsu` (optimized) or `otsu-naive`
    Otsu(OtsuMethod),
    /// `hsv`
    RgbToHsv,
    /// `rgb`
    HsvToRgb,
    /// `subtract:<division>`
    ColorSubtract(usize),
    /// `avg-pool:<size>`
    AveragePooling(usize),
    /// `max-pool:<size>`
    MaxPooling(usize),
    /// `median:<size>`
    MedianFilter(usize),
    /// `true-max-pool:<size>`
    TrueMaxPooling(usize),
}

impl Step {
    /// Parse a comma separated list of steps
    pub fn parse_list(list: &str) -> Result<Vec<Step>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

fn parse_arg<T: FromStr>(name: &str, arg: Option<&str>) -> Result<T> {
    let raw = arg.ok_or_else(|| PixelError::InvalidParameter(format!("{name} needs an argument")))?;
    raw.trim()
        .parse()
        .map_err(|_| PixelError::InvalidParameter(format!("{name}: bad argument '{raw}'")))
}

impl FromStr for Step {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let step = match name {
            "bgr" => Step::RgbToBgr,
            "gray" | "grayscale" => Step::Grayscale,
            "binarize" => Step::Binarize(parse_arg(name, arg)?),
            "otsu" => Step::Otsu(OtsuMethod::Optimized),
            "otsu-naive" => Step::Otsu(OtsuMethod::Naive),
            "hsv" => Step::RgbToHsv,
            "rgb" => Step::HsvToRgb,
            "subtract" => Step::ColorSubtract(parse_arg(name, arg)?),
            "avg-pool" => Step::AveragePooling(parse_arg(name, arg)?),
            "max-pool" => Step::MaxPooling(parse_arg(name, arg)?),
            "median" => Step::MedianFilter(parse_arg(name, arg)?),
            "true-max-pool" => Step::TrueMaxPooling(parse_arg(name, arg)?),
            other => return Err(PixelError::UnknownOperation(other.to_string())),
        };
        Ok(step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::RgbToBgr => write!(f, "bgr"),
            Step::Grayscale => write!(f, "gray"),
            Step::Binarize(t) => write!(f, "binarize:{t}"),
            Step::Otsu(OtsuMethod::Optimized) => write!(f, "otsu"),
            Step::Otsu(OtsuMethod::Naive) => write!(f, "otsu-naive"),
            Step::RgbToHsv => write!(f, "hsv"),
            Step::HsvToRgb => write!(f, "rgb"),
            Step::ColorSubtract(d) => write!(f, "subtract:{d}"),
            Step::AveragePooling(s) => write!(f, "avg-pool:{s}"),
            Step::MaxPooling(s) => write!(f, "max-pool:{s}"),
            Step::MedianFilter(s) => write!(f, "median:{s}"),
            Step::TrueMaxPooling(s) => write!(f, "true-max-pool:{s}"),
        }
    }
}

/// Owns a buffer and applies chained transforms to it
///
/// # Example
/// ```
/// use pixel_pipeline::Processor;
///
/// let bytes = vec![200u8; 4 * 4 * 4];
/// let mut processor = Processor::from_flat_bytes(&bytes, 4, 4).unwrap();
/// processor.rgb_to_bgr().unwrap().otsu_binarize().unwrap();
/// assert_eq!(processor.to_flat_bytes().len(), bytes.len());
/// ```
pub struct Processor {
    buffer: PixelBuffer,
    executor: Box<dyn Executor>,
    last_threshold: Option<u8>,
}

impl Processor {
    /// Wrap a buffer with the default (CPU) configuration
    pub fn new(buffer: PixelBuffer) -> Self {
        Self::with_config(buffer, ProcessorConfig::default())
    }

    /// Wrap a buffer with an explicit configuration
    pub fn with_config(buffer: PixelBuffer, config: ProcessorConfig) -> Self {
        Self::with_executor(buffer, config.backend.executor())
    }

    /// Wrap a buffer with a caller-supplied executor
    pub fn with_executor(buffer: PixelBuffer, executor: Box<dyn Executor>) -> Self {
        Self {
            buffer,
            executor,
            last_threshold: None,
        }
    }

    /// Build from flat RGBA bytes using the configuration from the environment
    pub fn from_flat_bytes(bytes: &[u8], width: usize, height: usize) -> Result<Self> {
        let buffer = PixelBuffer::from_flat_bytes(bytes, width, height)?;
        Ok(Self::with_config(buffer, ProcessorConfig::from_env()))
    }

    /// Borrow the current buffer
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Take the buffer out
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }

    /// Flatten the current buffer
    pub fn to_flat_bytes(&self) -> Vec<u8> {
        self.buffer.to_flat_bytes()
    }

    /// Threshold chosen by the most recent Otsu step
    pub fn last_threshold(&self) -> Option<u8> {
        self.last_threshold
    }

    fn point(&mut self, op: Operation, option: Option<u8>) -> Result<&mut Self> {
        self.executor.apply(&mut self.buffer, op, option)?;
        Ok(self)
    }

    /// Swap red and blue
    pub fn rgb_to_bgr(&mut self) -> Result<&mut Self> {
        self.point(Operation::RgbToBgr, None)
    }

    /// Grayscale, alpha included
    pub fn grayscale(&mut self) -> Result<&mut Self> {
        self.point(Operation::Grayscale, None)
    }

    /// Grayscale then binarize at `threshold`
    pub fn binarize(&mut self, threshold: u8) -> Result<&mut Self> {
        self.point(Operation::Binarize, Some(threshold))
    }

    /// Grayscale then binarize at the threshold found by `method`
    pub fn otsu_binarize_with(&mut self, method: OtsuMethod) -> Result<&mut Self> {
        self.grayscale()?;
        let result = otsu_threshold(&self.buffer.luma_values(), method);
        self.last_threshold = Some(result.threshold);
        self.binarize(result.threshold)
    }

    /// Otsu binarization with the naive search
    pub fn otsu_binarize(&mut self) -> Result<&mut Self> {
        self.otsu_binarize_with(OtsuMethod::Naive)
    }

    /// Otsu binarization with the sorted sweep
    pub fn otsu_binarize_optimized(&mut self) -> Result<&mut Self> {
        self.otsu_binarize_with(OtsuMethod::Optimized)
    }

    /// Pack as HSV
    pub fn rgb_to_hsv(&mut self) -> Result<&mut Self> {
        self.point(Operation::RgbToHsv, None)
    }

    /// Unpack HSV
    pub fn hsv_to_rgb(&mut self) -> Result<&mut Self> {
        self.point(Operation::HsvToRgb, None)
    }

    /// Quantize each channel into `division` levels
    ///
    /// Divisions above 255 cannot cross the one-byte executor option and run
    /// directly on the buffer.
    pub fn color_subtract(&mut self, division: usize) -> Result<&mut Self> {
        match u8::try_from(division) {
            Ok(d) => self.point(Operation::ColorSubtract, Some(d)),
            Err(_) => {
                crate::utils::color::color_subtract(&mut self.buffer, division)?;
                Ok(self)
            }
        }
    }

    /// Mean color per tile
    pub fn average_pooling(&mut self, rect_size: usize) -> Result<&mut Self> {
        average_pooling(&mut self.buffer, rect_size)?;
        Ok(self)
    }

    /// Single-branch max per tile
    pub fn max_pooling(&mut self, rect_size: usize) -> Result<&mut Self> {
        max_pooling(&mut self.buffer, rect_size)?;
        Ok(self)
    }

    /// Alias of [`Processor::max_pooling`]
    pub fn median_filter(&mut self, rect_size: usize) -> Result<&mut Self> {
        median_filter(&mut self.buffer, rect_size)?;
        Ok(self)
    }

    /// Independent per-channel max per tile
    pub fn true_max_pooling(&mut self, rect_size: usize) -> Result<&mut Self> {
        true_max_pooling(&mut self.buffer, rect_size)?;
        Ok(self)
    }

    /// Apply one parsed step
    pub fn apply(&mut self, step: Step) -> Result<&mut Self> {
        debug!("{}: applying {}", self.executor.name(), step);
        match step {
            Step::RgbToBgr => self.rgb_to_bgr(),
            Step::Grayscale => self.grayscale(),
            Step::Binarize(t) => self.binarize(t),
            Step::Otsu(method) => self.otsu_binarize_with(method),
            Step::RgbToHsv => self.rgb_to_hsv(),
            Step::HsvToRgb => self.hsv_to_rgb(),
            Step::ColorSubtract(d) => self.color_subtract(d),
            Step::AveragePooling(s) => self.average_pooling(s),
            Step::MaxPooling(s) => self.max_pooling(s),
            Step::MedianFilter(s) => self.median_filter(s),
            Step::TrueMaxPooling(s) => self.true_max_pooling(s),
        }
    }

    /// Apply steps in order, stopping at the first failure
    pub fn run(&mut self, steps: &[Step]) -> Result<&mut Self> {
        for &step in steps {
            self.apply(step)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rgba;

    #[test]
    fn test_step_parse() {
        let steps = Step::parse_list("bgr, gray,binarize:128,otsu,otsu-naive,subtract:4,avg-pool:3").unwrap();
        assert_eq!(
            steps,
            vec![
                Step::RgbToBgr,
                Step::Grayscale,
                Step::Binarize(128),
                Step::Otsu(OtsuMethod::Optimized),
                Step::Otsu(OtsuMethod::Naive),
                Step::ColorSubtract(4),
                Step::AveragePooling(3),
            ]
        );
        for step in &steps {
            assert_eq!(step.to_string().parse::<Step>().unwrap(), *step);
        }
    }

    #[test]
    fn test_step_parse_errors() {
        assert!(matches!("blur".parse::<Step>(), Err(PixelError::UnknownOperation(_))));
        assert!(matches!("binarize".parse::<Step>(), Err(PixelError::InvalidParameter(_))));
        assert!(matches!("binarize:300".parse::<Step>(), Err(PixelError::InvalidParameter(_))));
    }

    #[test]
    fn test_chain() {
        let mut bytes = vec![30u8; 8 * 4 * 4];
        bytes.extend(vec![230u8; 8 * 4 * 4]);
        let buffer = PixelBuffer::from_flat_bytes(&bytes, 8, 8).unwrap();
        let mut processor = Processor::new(buffer);
        processor.rgb_to_bgr().unwrap().otsu_binarize().unwrap();

        assert_eq!(processor.last_threshold(), Some(31));
        assert_eq!(processor.buffer().get(0, 0).unwrap(), Rgba::TRANSPARENT);
        assert_eq!(processor.buffer().get(7, 7).unwrap(), Rgba::WHITE);
    }

    #[test]
    fn test_both_otsu_variants_agree() {
        let bytes: Vec<u8> = (0..16 * 16 * 4u32).map(|i| (i * 31 % 251) as u8).collect();
        let buffer = PixelBuffer::from_flat_bytes(&bytes, 16, 16).unwrap();

        let mut naive = Processor::new(buffer.clone());
        naive.otsu_binarize().unwrap();
        let mut fast = Processor::with_config(
            buffer,
            ProcessorConfig {
                backend: Backend::Parallel,
            },
        );
        fast.otsu_binarize_optimized().unwrap();

        assert_eq!(naive.last_threshold(), fast.last_threshold());
        assert_eq!(naive.buffer(), fast.buffer());
    }

    #[test]
    fn test_run_stops_on_error() {
        let buffer = PixelBuffer::new(4, 4, Rgba::WHITE).unwrap();
        let mut processor = Processor::new(buffer);
        let err = processor
            .run(&[Step::Grayscale, Step::AveragePooling(0)])
            .err();
        assert!(matches!(err, Some(PixelError::InvalidParameter(_))));
    }

    #[test]
    fn test_large_division_bypasses_executor() {
        let buffer = PixelBuffer::new(2, 2, Rgba::new(255, 3, 100, 9)).unwrap();
        let mut processor = Processor::new(buffer);
        processor.color_subtract(300).unwrap();
        // green 3 lands in the bucket whose lower edge is trunc(3 * 255 / 300) = 2
        let px = processor.buffer().get(0, 0).unwrap();
        assert_eq!(px.a, 9);
        assert_eq!(px.g, 2);
    }
}
