/// Row-major RGBA pixel grid
pub mod buffer;
/// Single RGBA8 pixel
pub mod pixel;

pub use buffer::PixelBuffer;
pub use pixel::Rgba;
