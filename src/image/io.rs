//! Reference image loading via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Decode failures map to
//! [`FrameCheckError::ImageIo`]; the detectors treat them as non-fatal.

use std::path::Path;

use crate::image::GrayImage;
use crate::util::{FrameCheckError, FrameCheckResult};

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> FrameCheckResult<GrayImage> {
    let img = image::open(path).map_err(|err| FrameCheckError::ImageIo {
        reason: err.to_string(),
    })?;
    let gray = img.to_luma8();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    GrayImage::new(gray.into_raw(), width, height)
}

/// Loads an image from disk as packed BGR pixels (frame byte order).
///
/// Returns the pixel data together with the width and height.
pub fn load_bgr_image<P: AsRef<Path>>(path: P) -> FrameCheckResult<(Vec<u8>, usize, usize)> {
    let img = image::open(path).map_err(|err| FrameCheckError::ImageIo {
        reason: err.to_string(),
    })?;
    let rgb = img.to_rgb8();
    let width = rgb.width() as usize;
    let height = rgb.height() as usize;
    let mut data = Vec::with_capacity(width * height * 3);
    for px in rgb.pixels() {
        data.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    Ok((data, width, height))
}
