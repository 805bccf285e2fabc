//! Error type shared by every pixel operation.

use thiserror::Error;

/// Errors raised by buffer access and transforms
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PixelError {
    /// Flat byte length does not match `width * height * 4`
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    InvalidBufferSize {
        /// Required byte length
        expected: usize,
        /// Byte length that was supplied
        actual: usize,
    },

    /// Width or height is zero
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// Pixel access outside the grid
    #[error("Pixel ({x}, {y}) out of bounds for {width}x{height} buffer")]
    OutOfBounds {
        /// Column that was accessed
        x: usize,
        /// Row that was accessed
        y: usize,
        /// Buffer width
        width: usize,
        /// Buffer height
        height: usize,
    },

    /// Operation argument outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Executor was asked for an operation id it does not know
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Operation requires a scalar option that was not supplied
    #[error("Operation {0} requires a scalar option")]
    MissingOption(&'static str),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, PixelError>;
