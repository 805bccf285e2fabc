//! Fixed-threshold and Otsu binarization.
//!
//! Otsu's method picks the threshold `t` maximizing the between-class
//! variance `Sb² = R0·R1·(M0−M1)²`, where class 0 holds luma values `< t`
//! and class 1 holds values `>= t`. Every search variant feeds exact integer
//! class statistics into [`ClassSplit::between_class_variance`], so all of
//! them pick the same `t` for the same input.

use crate::models::{PixelBuffer, Rgba};
use crate::utils::grayscale::{gray_pixel, grayscale};
use log::debug;

/// Which Otsu search to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtsuMethod {
    /// Full rescan of the population for every candidate threshold
    Naive,
    /// Sort once, then sweep with a monotone pointer
    #[default]
    Optimized,
}

/// Population statistics of the two classes for one candidate threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassSplit {
    /// Pixels with luma below the threshold
    pub count0: u64,
    /// Sum of luma in class 0
    pub sum0: u64,
    /// Pixels with luma at or above the threshold
    pub count1: u64,
    /// Sum of luma in class 1
    pub sum1: u64,
}

impl ClassSplit {
    /// `R0·R1·(M0−M1)²`, or `None` when either class is empty
    pub fn between_class_variance(&self) -> Option<f64> {
        if self.count0 == 0 || self.count1 == 0 {
            return None;
        }
        let total = (self.count0 + self.count1) as f64;
        let r0 = self.count0 as f64 / total;
        let r1 = self.count1 as f64 / total;
        let m0 = self.sum0 as f64 / self.count0 as f64;
        let m1 = self.sum1 as f64 / self.count1 as f64;
        Some(r0 * r1 * (m0 - m1).powi(2))
    }
}

/// Outcome of a threshold search
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OtsuResult {
    /// Selected threshold
    pub threshold: u8,
    /// Between-class variance at the selected threshold
    pub variance: f64,
}

impl OtsuResult {
    /// Keep the earliest threshold on ties; empty classes never win
    fn consider(&mut self, t: u8, split: &ClassSplit) {
        if let Some(sb2) = split.between_class_variance() {
            if sb2 > self.variance {
                self.variance = sb2;
                self.threshold = t;
            }
        }
    }
}

/// Binarization kernel: black transparent below `threshold`, opaque white otherwise
#[inline]
pub fn binarize_pixel(px: Rgba, threshold: u8) -> Rgba {
    if px.r < threshold {
        Rgba::TRANSPARENT
    } else {
        Rgba::WHITE
    }
}

/// Grayscale the buffer, then binarize it with a fixed threshold
pub fn threshold_binarize(buffer: &mut PixelBuffer, threshold: u8) {
    for px in buffer.pixels_mut() {
        *px = binarize_pixel(gray_pixel(*px), threshold);
    }
}

/// Otsu search rescanning every luma value for each of the 256 thresholds
pub fn otsu_threshold_naive(gray: &[u8]) -> OtsuResult {
    let mut best = OtsuResult::default();
    for t in 0..=255u8 {
        let mut split = ClassSplit::default();
        for &v in gray {
            if v < t {
                split.count0 += 1;
                split.sum0 += v as u64;
            } else {
                split.count1 += 1;
                split.sum1 += v as u64;
            }
        }
        best.consider(t, &split);
    }
    best
}

/// Otsu search over a sorted copy with a monotone pointer and running sum
pub fn otsu_threshold_optimized(gray: &[u8]) -> OtsuResult {
    let mut sorted = gray.to_vec();
    sorted.sort_unstable();

    let total = sorted.len() as u64;
    let sum_all: u64 = sorted.iter().map(|&v| v as u64).sum();

    let mut best = OtsuResult::default();
    let mut n = 0usize;
    let mut sum0 = 0u64;
    for t in 0..=255u8 {
        while n < sorted.len() && sorted[n] < t {
            sum0 += sorted[n] as u64;
            n += 1;
        }
        let split = ClassSplit {
            count0: n as u64,
            sum0,
            count1: total - n as u64,
            sum1: sum_all - sum0,
        };
        best.consider(t, &split);
    }
    best
}

/// Otsu search over a 256-bin histogram
pub fn otsu_threshold_histogram(gray: &[u8]) -> OtsuResult {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total: u64 = gray.len() as u64;
    let sum_all: u64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as u64 * c)
        .sum();

    let mut best = OtsuResult::default();
    let mut count0 = 0u64;
    let mut sum0 = 0u64;
    for t in 0..=255u8 {
        if t > 0 {
            let below = (t - 1) as usize;
            count0 += histogram[below];
            sum0 += below as u64 * histogram[below];
        }
        let split = ClassSplit {
            count0,
            sum0,
            count1: total - count0,
            sum1: sum_all - sum0,
        };
        best.consider(t, &split);
    }
    best
}

/// Run the selected Otsu search on a luma plane
pub fn otsu_threshold(gray: &[u8], method: OtsuMethod) -> OtsuResult {
    let result = match method {
        OtsuMethod::Naive => otsu_threshold_naive(gray),
        OtsuMethod::Optimized => otsu_threshold_optimized(gray),
    };
    debug!(
        "otsu {:?}: threshold={} sb2={:.4} pixels={}",
        method,
        result.threshold,
        result.variance,
        gray.len()
    );
    result
}

/// Grayscale the buffer, find the Otsu threshold and binarize with it
pub fn otsu_binarize(buffer: &mut PixelBuffer, method: OtsuMethod) -> OtsuResult {
    grayscale(buffer);
    let result = otsu_threshold(&buffer.luma_values(), method);
    threshold_binarize(buffer, result.threshold);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_buffer(values: &[u8], width: usize, height: usize) -> PixelBuffer {
        let bytes: Vec<u8> = values.iter().flat_map(|&v| [v, v, v, 255]).collect();
        PixelBuffer::from_flat_bytes(&bytes, width, height).unwrap()
    }

    #[test]
    fn test_threshold_binarize() {
        let mut buf = gray_buffer(&[100, 150, 200, 50], 2, 2);
        threshold_binarize(&mut buf, 128);

        assert_eq!(buf.get(0, 0).unwrap(), Rgba::TRANSPARENT); // 100 < 128
        assert_eq!(buf.get(1, 0).unwrap(), Rgba::WHITE); // 150 >= 128
        assert_eq!(buf.get(0, 1).unwrap(), Rgba::WHITE); // 200 >= 128
        assert_eq!(buf.get(1, 1).unwrap(), Rgba::TRANSPARENT); // 50 < 128
    }

    #[test]
    fn test_threshold_is_exclusive_lower_bound() {
        let mut buf = gray_buffer(&[127, 128], 2, 1);
        threshold_binarize(&mut buf, 128);
        assert_eq!(buf.get(0, 0).unwrap(), Rgba::TRANSPARENT);
        assert_eq!(buf.get(1, 0).unwrap(), Rgba::WHITE);
    }

    #[test]
    fn test_binarize_grayscales_color_input() {
        // luma(255, 0, 0) = 54
        let mut buf = PixelBuffer::from_flat_bytes(&[255, 0, 0, 255], 1, 1).unwrap();
        threshold_binarize(&mut buf, 55);
        assert_eq!(buf.get(0, 0).unwrap(), Rgba::TRANSPARENT);

        let mut buf = PixelBuffer::from_flat_bytes(&[255, 0, 0, 0], 1, 1).unwrap();
        threshold_binarize(&mut buf, 54);
        assert_eq!(buf.get(0, 0).unwrap(), Rgba::WHITE);
    }

    #[test]
    fn test_two_class_threshold() {
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);

        // every t in 51..=200 gives the same split; the earliest wins
        assert_eq!(otsu_threshold_naive(&gray).threshold, 51);
        assert_eq!(otsu_threshold_optimized(&gray).threshold, 51);
        assert_eq!(otsu_threshold_histogram(&gray).threshold, 51);
    }

    #[test]
    fn test_uniform_image_keeps_zero() {
        let gray = vec![128u8; 64];
        let result = otsu_threshold_naive(&gray);
        assert_eq!(result.threshold, 0);
        assert_eq!(result.variance, 0.0);
        assert_eq!(otsu_threshold_optimized(&gray), result);
    }

    #[test]
    fn test_variants_agree_on_spread_values() {
        let gray: Vec<u8> = (0..1000u32).map(|i| ((i * i * 7 + i * 13) % 256) as u8).collect();
        let naive = otsu_threshold_naive(&gray);
        let fast = otsu_threshold_optimized(&gray);
        let hist = otsu_threshold_histogram(&gray);
        assert_eq!(naive.threshold, fast.threshold);
        assert_eq!(naive.threshold, hist.threshold);
        assert_eq!(naive.variance, fast.variance);
    }

    #[test]
    fn test_empty_class_has_no_variance() {
        let split = ClassSplit {
            count0: 0,
            sum0: 0,
            count1: 4,
            sum1: 400,
        };
        assert_eq!(split.between_class_variance(), None);
    }

    #[test]
    fn test_otsu_binarize_buffer() {
        let mut values = vec![20u8; 8];
        values.extend(vec![220u8; 8]);
        let mut buf = gray_buffer(&values, 4, 4);
        let result = otsu_binarize(&mut buf, OtsuMethod::Optimized);
        assert_eq!(result.threshold, 21);
        assert_eq!(buf.get(0, 0).unwrap(), Rgba::TRANSPARENT);
        assert_eq!(buf.get(3, 3).unwrap(), Rgba::WHITE);
    }
}
