//! Pixel views and owned grayscale images.
//!
//! `PixelView` is a borrowed 2D view into caller-owned frame memory with an
//! explicit row stride measured in bytes, so a stride larger than the packed
//! row width represents padded scanlines. ROI slices are zero-copy views into
//! the same backing slice and retain the original stride. No view outlives
//! the call that received it; the engine never stores one.

use crate::util::{FrameCheckError, FrameCheckResult};

#[cfg(feature = "image-io")]
pub mod io;

/// In-memory layout of a pixel buffer.
///
/// The tag describes the template side of a comparison; the frame side of a
/// comparison is always tightly packed (1 or 3 bytes per pixel).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// 8-bit grayscale, 1 byte per pixel.
    Gray8,
    /// Three 8-bit channels, 3 bytes per pixel, no padding.
    Packed24,
    /// Three 8-bit channels plus an unused padding byte, 4 bytes per pixel.
    Padded32,
    /// Three 8-bit channels plus a presence byte: 255 means the pixel
    /// participates in comparisons, any other value masks it out.
    MaskedPadded32,
}

impl PixelLayout {
    /// Bytes per pixel, including any padding or presence byte.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Gray8 => 1,
            PixelLayout::Packed24 => 3,
            PixelLayout::Padded32 | PixelLayout::MaskedPadded32 => 4,
        }
    }

    /// Channels compared per pixel (the padding/presence byte is not one).
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray8 => 1,
            _ => 3,
        }
    }
}

/// Borrowed 2D pixel view with an explicit row stride in bytes.
#[derive(Copy, Clone)]
pub struct PixelView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    layout: PixelLayout,
}

impl<'a> PixelView<'a> {
    /// Creates a contiguous view with `stride == width * bytes_per_pixel`.
    pub fn from_slice(
        data: &'a [u8],
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> FrameCheckResult<Self> {
        let stride = width
            .checked_mul(layout.bytes_per_pixel())
            .ok_or(FrameCheckError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, stride, layout)
    }

    /// Creates a view with an explicit row stride in bytes.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        layout: PixelLayout,
    ) -> FrameCheckResult<Self> {
        let needed = required_len(width, height, stride, layout)?;
        if data.len() < needed {
            return Err(FrameCheckError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            layout,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the pixel layout of the view.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the packed bytes of row `y`, `width * bytes_per_pixel` long.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.layout.bytes_per_pixel())?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> FrameCheckResult<PixelView<'a>> {
        if width == 0 || height == 0 {
            return Err(FrameCheckError::InvalidDimensions { width, height });
        }

        let oob = || FrameCheckError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(oob)?;
        let end_y = y.checked_add(height).ok_or_else(oob)?;
        if end_x > self.width || end_y > self.height {
            return Err(oob());
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * self.layout.bytes_per_pixel()))
            .ok_or(FrameCheckError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(FrameCheckError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        PixelView::new(data, width, height, self.stride, self.layout)
    }
}

fn required_len(
    width: usize,
    height: usize,
    stride: usize,
    layout: PixelLayout,
) -> FrameCheckResult<usize> {
    if width == 0 || height == 0 {
        return Err(FrameCheckError::InvalidDimensions { width, height });
    }
    let min_row_bytes = width
        .checked_mul(layout.bytes_per_pixel())
        .ok_or(FrameCheckError::InvalidDimensions { width, height })?;
    if stride < min_row_bytes {
        return Err(FrameCheckError::InvalidStride {
            stride,
            min_row_bytes,
        });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(min_row_bytes))
        .ok_or(FrameCheckError::InvalidDimensions { width, height })?;
    Ok(needed)
}

/// Owned contiguous grayscale image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl GrayImage {
    /// Creates an image from a contiguous buffer of exactly `width * height`
    /// bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> FrameCheckResult<Self> {
        if width == 0 || height == 0 {
            return Err(FrameCheckError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(FrameCheckError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(FrameCheckError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(FrameCheckError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub(crate) fn zeroed(width: usize, height: usize) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            data: vec![0u8; width * height],
            width,
            height,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel data in row-major order, no padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns a borrowed `Gray8` view of the image.
    pub fn view(&self) -> PixelView<'_> {
        PixelView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
            layout: PixelLayout::Gray8,
        }
    }

    /// Consumes the image, returning the backing buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
