//! Per-pixel color remapping: channel swap, packed HSV and color subtraction.
//!
//! The HSV packing stores hue in red as `round(hue * 255 / 360)`, saturation
//! in green as `round((max - min) / max * 255)` and value in blue as `max`.
//! Hue is truncated to whole degrees before packing and after unpacking, so
//! the round trip is lossy by a few levels per channel.

use crate::error::{PixelError, Result};
use crate::models::{PixelBuffer, Rgba};

/// Exchange red and blue; green and alpha are untouched
#[inline]
pub fn swap_rb_pixel(mut px: Rgba) -> Rgba {
    std::mem::swap(&mut px.r, &mut px.b);
    px
}

/// Swap red and blue for every pixel
pub fn rgb_to_bgr(buffer: &mut PixelBuffer) {
    for px in buffer.pixels_mut() {
        *px = swap_rb_pixel(*px);
    }
}

/// Pack a pixel as (hue, saturation, value, alpha)
pub fn rgb_to_hsv_pixel(px: Rgba) -> Rgba {
    let (r, g, b) = (px.r as i32, px.g as i32, px.b as i32);
    let max = px.max_rgb() as i32;
    let min = px.min_rgb() as i32;
    let span = (max - min) as f64;

    let mut hue = if max == min {
        0
    } else if max == r {
        (60.0 * ((g - b) as f64 / span)) as i32
    } else if max == g {
        (60.0 * ((b - r) as f64 / span)) as i32 + 120
    } else {
        (60.0 * ((r - g) as f64 / span)) as i32 + 240
    };
    if hue < 0 {
        hue += 360;
    }

    let h = (hue as f64 * 255.0 / 360.0).round();
    let s = if max == 0 {
        0.0
    } else {
        ((max - min) as f64 / max as f64 * 255.0).round()
    };
    Rgba::new(h as u8, s as u8, max as u8, px.a)
}

/// Unpack a (hue, saturation, value, alpha) pixel back to RGB
pub fn hsv_to_rgb_pixel(px: Rgba) -> Rgba {
    let hue = (px.r as f64 * 360.0 / 255.0) as i32;
    let max = px.b as i32;
    let min = max as f64 - px.g as f64 / 255.0 * max as f64;
    let span = max as f64 - min;
    let low = min as i32;
    let ramp = |degrees: i32| (degrees as f64 / 60.0 * span) as i32 + low;

    let (r, g, b) = if hue <= 60 {
        (max, ramp(hue), low)
    } else if hue <= 120 {
        (((120 - hue) as f64 / 60.0 * span + min) as i32, max, low)
    } else if hue <= 180 {
        (low, max, ramp(hue - 120))
    } else if hue <= 240 {
        (low, ramp(240 - hue), max)
    } else if hue <= 300 {
        (ramp(hue - 240), low, max)
    } else {
        (max, low, ramp(360 - hue))
    };
    Rgba::new(saturate(r), saturate(g), saturate(b), px.a)
}

/// Pack every pixel as HSV
pub fn rgb_to_hsv(buffer: &mut PixelBuffer) {
    for px in buffer.pixels_mut() {
        *px = rgb_to_hsv_pixel(*px);
    }
}

/// Unpack every HSV pixel to RGB
pub fn hsv_to_rgb(buffer: &mut PixelBuffer) {
    for px in buffer.pixels_mut() {
        *px = hsv_to_rgb_pixel(*px);
    }
}

#[inline]
fn saturate(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Boundary table for color subtraction
///
/// `division` evenly spaced lower edges `trunc(i * 255 / division)` followed
/// by a final edge of 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLevels {
    boundaries: Vec<u8>,
}

impl ColorLevels {
    /// Build the table; `division` must be at least 1
    pub fn new(division: usize) -> Result<Self> {
        if division == 0 {
            return Err(PixelError::InvalidParameter(
                "color subtract division must be >= 1".to_string(),
            ));
        }
        let mut boundaries: Vec<u8> = (0..division)
            .map(|i| (i as f64 * 255.0 / division as f64) as u8)
            .collect();
        boundaries.push(255);
        Ok(Self { boundaries })
    }

    /// All boundaries, ascending, last one 255
    pub fn boundaries(&self) -> &[u8] {
        &self.boundaries
    }

    /// Lower edge of the first bucket whose upper edge is `>= value`
    pub fn quantize(&self, value: u8) -> u8 {
        for j in 1..self.boundaries.len() {
            if value <= self.boundaries[j] {
                return self.boundaries[j - 1];
            }
        }
        value
    }

    /// Quantize r, g and b; alpha is untouched
    #[inline]
    pub fn apply(&self, px: Rgba) -> Rgba {
        Rgba::new(
            self.quantize(px.r),
            self.quantize(px.g),
            self.quantize(px.b),
            px.a,
        )
    }
}

/// Reduce each color channel to `division` levels
pub fn color_subtract(buffer: &mut PixelBuffer, division: usize) -> Result<()> {
    let levels = ColorLevels::new(division)?;
    for px in buffer.pixels_mut() {
        *px = levels.apply(*px);
    }
    Ok(())
}
