//! Error types for framecheck.

use thiserror::Error;

/// Result alias for framecheck operations.
pub type FrameCheckResult<T> = std::result::Result<T, FrameCheckError>;

/// Errors that can occur when configuring or running the comparison engine.
///
/// Shape violations inside the per-pixel inner loops are caller bugs and
/// panic instead of returning one of these variants; see [`crate::metric`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameCheckError {
    /// The requested width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The row stride is smaller than the minimum bytes per row.
    #[error("invalid stride: {stride} bytes, rows need at least {min_row_bytes}")]
    InvalidStride { stride: usize, min_row_bytes: usize },
    /// The backing buffer is too small for the described image.
    #[error("buffer too small: needed {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A requested region extends outside the image bounds.
    #[error("region {width}x{height} at ({x}, {y}) outside image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Two images that must share dimensions do not.
    #[error("{context}: {expected_width}x{expected_height} != {got_width}x{got_height}")]
    SizeMismatch {
        expected_width: usize,
        expected_height: usize,
        got_width: usize,
        got_height: usize,
        context: &'static str,
    },
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}
