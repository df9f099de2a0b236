//! Per-pixel binary difference maps.
//!
//! `threshold_diff` flags pixels whose local squared difference reaches a
//! caller-supplied threshold. The threshold is already squared so the whole
//! comparison stays in squared-distance space; no square root, no floats.

use crate::image::{PixelLayout, PixelView};

/// Writes a 0/1 map of pixels whose 3-channel squared difference between `a`
/// and `b` is at least `threshold_sq`.
///
/// `out` is one byte per pixel, row-major, no padding. Masking is not
/// applied at this layer; callers that need it zero the excluded pixels in
/// `out` afterwards.
///
/// # Panics
///
/// Panics when `a` and `b` are not same-size `Packed24` views or when `out`
/// is not exactly `width * height` bytes (caller bug, see [`crate::metric`]).
pub fn threshold_diff(out: &mut [u8], a: PixelView<'_>, b: PixelView<'_>, threshold_sq: u32) {
    assert_eq!(a.layout(), PixelLayout::Packed24, "inputs must be Packed24");
    assert_eq!(b.layout(), PixelLayout::Packed24, "inputs must be Packed24");
    let width = a.width();
    let height = a.height();
    assert_eq!(width, b.width(), "input widths differ");
    assert_eq!(height, b.height(), "input heights differ");
    assert_eq!(out.len(), width * height, "output map has the wrong size");

    for (y, out_row) in out.chunks_exact_mut(width).enumerate() {
        let row_a = a.row(y).expect("row within bounds");
        let row_b = b.row(y).expect("row within bounds");
        for ((pa, pb), flag) in row_a
            .chunks_exact(3)
            .zip(row_b.chunks_exact(3))
            .zip(out_row)
        {
            let diff_b = i32::from(pa[0]) - i32::from(pb[0]);
            let diff_g = i32::from(pa[1]) - i32::from(pb[1]);
            let diff_r = i32::from(pa[2]) - i32::from(pb[2]);
            let sq = (diff_b * diff_b + diff_g * diff_g + diff_r * diff_r) as u32;
            *flag = u8::from(sq >= threshold_sq);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::threshold_diff;
    use crate::image::{PixelLayout, PixelView};

    #[test]
    fn threshold_straddles_the_squared_sum() {
        let a = [10u8, 10, 10];
        let b = [0u8, 0, 0];
        let va = PixelView::from_slice(&a, 1, 1, PixelLayout::Packed24).unwrap();
        let vb = PixelView::from_slice(&b, 1, 1, PixelLayout::Packed24).unwrap();

        // sum of squares is 300
        let mut out = [0xFFu8; 1];
        threshold_diff(&mut out, va, vb, 250);
        assert_eq!(out, [1]);
        threshold_diff(&mut out, va, vb, 400);
        assert_eq!(out, [0]);
    }
}
