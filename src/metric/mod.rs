//! Sum-of-squared-differences pixel metric.
//!
//! Compares two same-size regions channel by channel in exact integer
//! arithmetic: each byte difference is squared and accumulated into a `u64`
//! total, which cannot overflow even across many full-HD frames (one frame
//! contributes at most 1920 * 1080 * 3 * 255² ≈ 4 * 10^11). The supported
//! (template, frame) layout pairs are:
//!
//! | template layout  | frame layout |
//! |------------------|--------------|
//! | `Gray8`          | `Gray8`      |
//! | `Packed24`       | `Packed24`   |
//! | `Padded32`       | `Packed24`   |
//! | `MaskedPadded32` | `Packed24`   |
//!
//! For `MaskedPadded32` only pixels whose presence byte equals 255
//! contribute to the total and the compared-channel count. Row pointers
//! advance by each view's own stride, so sub-regions of larger backing
//! buffers compare without copying.

use crate::image::{PixelLayout, PixelView};

pub mod diffmap;

/// Result of a squared-difference comparison.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SqdiffResult {
    /// Sum over all compared channel pairs of the squared byte difference.
    pub total: u64,
    /// Number of channels actually compared. Always a multiple of the
    /// layout's channel count; zero only when every pixel is masked out.
    pub count: u32,
}

/// Computes the squared difference between `template` and `frame`.
///
/// # Panics
///
/// Panics when the regions differ in size or the layout pair is not one of
/// the supported combinations. These are programming errors in frame/geometry
/// setup, not runtime conditions: this is the performance-critical inner
/// loop and is never expected to see a malformed shape.
pub fn sqdiff(template: PixelView<'_>, frame: PixelView<'_>) -> SqdiffResult {
    let width = template.width();
    let height = template.height();
    assert_eq!(width, frame.width(), "template and frame widths differ");
    assert_eq!(height, frame.height(), "template and frame heights differ");

    let mut total = 0u64;
    match (template.layout(), frame.layout()) {
        (PixelLayout::Gray8, PixelLayout::Gray8)
        | (PixelLayout::Packed24, PixelLayout::Packed24) => {
            for y in 0..height {
                let t = template.row(y).expect("row within bounds");
                let f = frame.row(y).expect("row within bounds");
                total += sqdiff_row_packed(t, f);
            }
            let channels = template.layout().channels();
            SqdiffResult {
                total,
                count: (width * height * channels) as u32,
            }
        }
        (PixelLayout::Padded32, PixelLayout::Packed24) => {
            for y in 0..height {
                let t = template.row(y).expect("row within bounds");
                let f = frame.row(y).expect("row within bounds");
                total += sqdiff_row_padded(t, f);
            }
            SqdiffResult {
                total,
                count: (width * height * 3) as u32,
            }
        }
        (PixelLayout::MaskedPadded32, PixelLayout::Packed24) => {
            let mut pixels = 0u32;
            for y in 0..height {
                let t = template.row(y).expect("row within bounds");
                let f = frame.row(y).expect("row within bounds");
                total += sqdiff_row_masked(t, f, &mut pixels);
            }
            // count is in channels, three per non-masked pixel
            SqdiffResult {
                total,
                count: pixels * 3,
            }
        }
        (t, f) => panic!("unsupported layout pair: {t:?} template against {f:?} frame"),
    }
}

fn sqdiff_row_packed(t: &[u8], f: &[u8]) -> u64 {
    let mut total = 0u64;
    for (&a, &b) in t.iter().zip(f) {
        let diff = i32::from(a) - i32::from(b);
        total += (diff * diff) as u64;
    }
    total
}

fn sqdiff_row_padded(t: &[u8], f: &[u8]) -> u64 {
    let mut total = 0u64;
    for (tp, fp) in t.chunks_exact(4).zip(f.chunks_exact(3)) {
        let diff_b = i32::from(tp[0]) - i32::from(fp[0]);
        let diff_g = i32::from(tp[1]) - i32::from(fp[1]);
        let diff_r = i32::from(tp[2]) - i32::from(fp[2]);
        total += (diff_b * diff_b + diff_g * diff_g + diff_r * diff_r) as u64;
    }
    total
}

fn sqdiff_row_masked(t: &[u8], f: &[u8], pixels: &mut u32) -> u64 {
    let mut total = 0u64;
    let mut row_pixels = 0u32;
    for (tp, fp) in t.chunks_exact(4).zip(f.chunks_exact(3)) {
        let diff_b = i32::from(tp[0]) - i32::from(fp[0]);
        let diff_g = i32::from(tp[1]) - i32::from(fp[1]);
        let diff_r = i32::from(tp[2]) - i32::from(fp[2]);
        let sq = (diff_b * diff_b + diff_g * diff_g + diff_r * diff_r) as u64;
        // branch-free masking keeps the loop tight
        let present = u64::from(tp[3] == 255);
        total += sq * present;
        row_pixels += present as u32;
    }
    *pixels += row_pixels;
    total
}

#[cfg(test)]
mod tests {
    use super::sqdiff;
    use crate::image::{PixelLayout, PixelView};

    #[test]
    fn gray8_counts_every_pixel_once() {
        let a = [0u8, 0, 0, 0];
        let b = [10u8, 0, 0, 0];
        let ta = PixelView::from_slice(&a, 2, 2, PixelLayout::Gray8).unwrap();
        let fb = PixelView::from_slice(&b, 2, 2, PixelLayout::Gray8).unwrap();
        let result = sqdiff(ta, fb);
        assert_eq!(result.total, 100);
        assert_eq!(result.count, 4);
    }

    #[test]
    fn masked_pixel_contributes_nothing() {
        // one present pixel, one masked out
        let template = [255u8, 255, 255, 255, 0, 0, 0, 0];
        let frame = [0u8, 0, 0, 0, 0, 0];
        let t = PixelView::from_slice(&template, 2, 1, PixelLayout::MaskedPadded32).unwrap();
        let f = PixelView::from_slice(&frame, 2, 1, PixelLayout::Packed24).unwrap();
        let result = sqdiff(t, f);
        assert_eq!(result.total, 255 * 255 * 3);
        assert_eq!(result.count, 3);
    }

    #[test]
    #[should_panic(expected = "unsupported layout pair")]
    fn rejects_unsupported_layout_pair() {
        let a = [0u8; 4];
        let b = [0u8; 12];
        let t = PixelView::from_slice(&a, 2, 2, PixelLayout::Gray8).unwrap();
        let f = PixelView::from_slice(&b, 2, 2, PixelLayout::Packed24).unwrap();
        sqdiff(t, f);
    }
}
