//! Block transforms over non-overlapping square tiles.
//!
//! Tiles start at (0, 0) and step by `rect_size` left-to-right, top-to-bottom.
//! Origins run from 0 up to, but excluding, `dim - rect_size`. Whatever lies
//! past the last visited tile keeps its original pixels, including a final
//! tile that would fit exactly (a 9x9 buffer with `rect_size` 3 pools only
//! its top-left 6x6 area, and `rect_size == dim` leaves the buffer as is).
//! Each tile is reduced to one (r, g, b) triple which is written back to
//! every pixel of the tile; alpha is kept per pixel.

use crate::error::{PixelError, Result};
use crate::models::{PixelBuffer, Rgba};
use log::trace;

/// Square tile with its top-left corner at (x, y)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Left column
    pub x: usize,
    /// Top row
    pub y: usize,
    /// Edge length
    pub size: usize,
}

/// Tile origins along one axis: `0, s, 2s, …` strictly below `dim - s`
fn origins(dim: usize, rect_size: usize) -> impl Iterator<Item = usize> {
    (0..dim.saturating_sub(rect_size)).step_by(rect_size)
}

/// Top-left corners of every visited tile, in scan order
pub fn tiles(width: usize, height: usize, rect_size: usize) -> Result<Vec<Tile>> {
    if rect_size == 0 {
        return Err(PixelError::InvalidParameter(
            "rect size must be >= 1".to_string(),
        ));
    }
    let out = origins(height, rect_size)
        .flat_map(|y| {
            origins(width, rect_size).map(move |x| Tile {
                x,
                y,
                size: rect_size,
            })
        })
        .collect();
    Ok(out)
}

/// Pixels of one tile in row-major order
fn tile_pixels(buffer: &PixelBuffer, tile: Tile) -> impl Iterator<Item = Rgba> + '_ {
    (tile.y..tile.y + tile.size)
        .filter_map(move |y| buffer.row(y))
        .flat_map(move |row| row[tile.x..tile.x + tile.size].iter().copied())
}

/// Reduce every tile with `reduce` and fill it with the result
fn pool<F>(buffer: &mut PixelBuffer, rect_size: usize, reduce: F) -> Result<()>
where
    F: Fn(&mut dyn Iterator<Item = Rgba>) -> [u8; 3],
{
    let tiles = tiles(buffer.width(), buffer.height(), rect_size)?;
    trace!(
        "pooling {}x{} buffer: {} tiles of {}",
        buffer.width(),
        buffer.height(),
        tiles.len(),
        rect_size
    );
    for tile in tiles {
        let [r, g, b] = reduce(&mut tile_pixels(buffer, tile));
        for y in tile.y..tile.y + tile.size {
            let start = buffer.idx(tile.x, y);
            for px in &mut buffer.pixels_mut()[start..start + tile.size] {
                *px = Rgba::new(r, g, b, px.a);
            }
        }
    }
    Ok(())
}

/// Integer-truncated mean of r, g and b
pub fn tile_mean(pixels: &mut dyn Iterator<Item = Rgba>) -> [u8; 3] {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for px in pixels {
        sum[0] += px.r as u64;
        sum[1] += px.g as u64;
        sum[2] += px.b as u64;
        count += 1;
    }
    if count == 0 {
        return [0; 3];
    }
    sum.map(|s| (s / count) as u8)
}

/// Running maxima where at most one channel advances per pixel
///
/// The red maximum is checked first; green only when red did not advance,
/// blue only when neither did. This is the reduction behind
/// [`max_pooling`] and [`median_filter`], kept for output compatibility.
pub fn single_branch_max(pixels: &mut dyn Iterator<Item = Rgba>) -> [u8; 3] {
    let mut max = [0u8; 3];
    for px in pixels {
        if px.r > max[0] {
            max[0] = px.r;
        } else if px.g > max[1] {
            max[1] = px.g;
        } else if px.b > max[2] {
            max[2] = px.b;
        }
    }
    max
}

/// Independent per-channel maxima
pub fn channel_max(pixels: &mut dyn Iterator<Item = Rgba>) -> [u8; 3] {
    let mut max = [0u8; 3];
    for px in pixels {
        max[0] = max[0].max(px.r);
        max[1] = max[1].max(px.g);
        max[2] = max[2].max(px.b);
    }
    max
}

/// Replace each tile with its mean color
pub fn average_pooling(buffer: &mut PixelBuffer, rect_size: usize) -> Result<()> {
    pool(buffer, rect_size, tile_mean)
}

/// Replace each tile with its single-branch running maxima
pub fn max_pooling(buffer: &mut PixelBuffer, rect_size: usize) -> Result<()> {
    pool(buffer, rect_size, single_branch_max)
}

/// Same reduction as [`max_pooling`]; it does not compute a median
pub fn median_filter(buffer: &mut PixelBuffer, rect_size: usize) -> Result<()> {
    pool(buffer, rect_size, single_branch_max)
}

/// Replace each tile with its independent per-channel maxima
pub fn true_max_pooling(buffer: &mut PixelBuffer, rect_size: usize) -> Result<()> {
    pool(buffer, rect_size, channel_max)
}
