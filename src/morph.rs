//! Grayscale and binary image primitives for the confirm and motion
//! pipelines: color conversion, absolute difference, binarization, min-max
//! normalization and 3x3 elliptical erosion.
//!
//! All operations are pure integer arithmetic and bit-reproducible across
//! platforms.

use crate::image::{GrayImage, PixelLayout, PixelView};

// Fixed-point BT.601 luma weights (b, g, r), 14 fractional bits.
const LUMA_B: u32 = 1868;
const LUMA_G: u32 = 9617;
const LUMA_R: u32 = 4899;
const LUMA_SHIFT: u32 = 14;

/// Converts a `Gray8` or `Packed24` (BGR) view into an owned grayscale image.
pub fn grayscale(frame: PixelView<'_>) -> GrayImage {
    let mut out = GrayImage::zeroed(frame.width(), frame.height());
    grayscale_into(frame, &mut out);
    out
}

/// Converts `frame` into `out`, which must already have the same dimensions.
///
/// `Gray8` input is copied; `Packed24` input is converted with fixed-point
/// BT.601 weights, rounding to nearest.
///
/// # Panics
///
/// Panics on a dimension mismatch or an unsupported frame layout.
pub fn grayscale_into(frame: PixelView<'_>, out: &mut GrayImage) {
    let width = frame.width();
    let height = frame.height();
    assert_eq!(width, out.width(), "output width differs from frame");
    assert_eq!(height, out.height(), "output height differs from frame");

    match frame.layout() {
        PixelLayout::Gray8 => {
            for (y, out_row) in out.data_mut().chunks_exact_mut(width).enumerate() {
                out_row.copy_from_slice(frame.row(y).expect("row within bounds"));
            }
        }
        PixelLayout::Packed24 => {
            let bias = 1u32 << (LUMA_SHIFT - 1);
            for (y, out_row) in out.data_mut().chunks_exact_mut(width).enumerate() {
                let row = frame.row(y).expect("row within bounds");
                for (px, gray) in row.chunks_exact(3).zip(out_row) {
                    let luma = LUMA_B * u32::from(px[0])
                        + LUMA_G * u32::from(px[1])
                        + LUMA_R * u32::from(px[2]);
                    *gray = ((luma + bias) >> LUMA_SHIFT) as u8;
                }
            }
        }
        layout => panic!("cannot convert {layout:?} frame to grayscale"),
    }
}

/// Returns the per-pixel absolute difference of two same-size images.
///
/// # Panics
///
/// Panics on a dimension mismatch.
pub fn absdiff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    assert_eq!(a.width(), b.width(), "input widths differ");
    assert_eq!(a.height(), b.height(), "input heights differ");
    let mut out = GrayImage::zeroed(a.width(), a.height());
    for ((&pa, &pb), po) in a.data().iter().zip(b.data()).zip(out.data_mut()) {
        *po = pa.abs_diff(pb);
    }
    out
}

/// Binarizes `img` in place: a pixel becomes 255 iff its value is at least
/// `threshold`, else 0.
pub fn threshold_binary(img: &mut GrayImage, threshold: u8) {
    for px in img.data_mut() {
        *px = if *px >= threshold { 255 } else { 0 };
    }
}

/// Linearly rescales pixel values so the image range spans [0, 255].
///
/// A constant image maps to all zeros. Rounds to nearest.
pub fn normalize_minmax(img: &GrayImage) -> GrayImage {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    for &px in img.data() {
        min = min.min(px);
        max = max.max(px);
    }

    let mut out = GrayImage::zeroed(img.width(), img.height());
    if max > min {
        let range = u32::from(max - min);
        for (&px, po) in img.data().iter().zip(out.data_mut()) {
            let scaled = u32::from(px - min) * 255;
            *po = ((scaled + range / 2) / range) as u8;
        }
    }
    out
}

/// Erodes `img` with a 3x3 elliptical structuring element, `passes` times.
///
/// At 3x3 the elliptical element is the cross shape: a pixel takes the
/// minimum of itself and its four edge neighbors. Neighbors outside the
/// image never lower the minimum, so borders never erode on their own.
/// Zero passes returns the image unchanged.
pub fn erode_ellipse3(img: &GrayImage, passes: u32) -> GrayImage {
    let mut current = img.clone();
    let width = img.width();
    let height = img.height();

    for _ in 0..passes {
        let mut next = GrayImage::zeroed(width, height);
        let src = current.data();
        let dst = next.data_mut();
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let mut v = src[idx];
                if x > 0 {
                    v = v.min(src[idx - 1]);
                }
                if x + 1 < width {
                    v = v.min(src[idx + 1]);
                }
                if y > 0 {
                    v = v.min(src[idx - width]);
                }
                if y + 1 < height {
                    v = v.min(src[idx + width]);
                }
                dst[idx] = v;
            }
        }
        current = next;
    }
    current
}

/// Returns the maximum pixel value, restricted to pixels where `mask` is
/// nonzero when a mask is given. Returns 0 when the mask excludes everything.
///
/// # Panics
///
/// Panics when the mask dimensions differ from the image (deferred contract
/// violation; callers validate runtime-loaded masks before this point).
pub fn max_value(img: &GrayImage, mask: Option<&GrayImage>) -> u8 {
    match mask {
        None => img.data().iter().copied().max().unwrap_or(0),
        Some(mask) => {
            assert_eq!(img.width(), mask.width(), "mask width differs");
            assert_eq!(img.height(), mask.height(), "mask height differs");
            img.data()
                .iter()
                .zip(mask.data())
                .filter(|&(_, &m)| m != 0)
                .map(|(&v, _)| v)
                .max()
                .unwrap_or(0)
        }
    }
}

/// Counts pixels with a nonzero value.
pub fn count_nonzero(img: &GrayImage) -> usize {
    img.data().iter().filter(|&&px| px != 0).count()
}

#[cfg(test)]
mod tests {
    use super::{count_nonzero, erode_ellipse3, grayscale, max_value, normalize_minmax};
    use crate::image::{GrayImage, PixelLayout, PixelView};

    fn binary(data: &[u8], width: usize, height: usize) -> GrayImage {
        GrayImage::new(data.iter().map(|&v| v * 255).collect(), width, height).unwrap()
    }

    #[test]
    fn erosion_removes_isolated_pixels() {
        #[rustfmt::skip]
        let img = binary(&[
            0, 0, 0, 0,
            0, 1, 0, 0,
            0, 0, 0, 1,
        ], 4, 3);
        let eroded = erode_ellipse3(&img, 1);
        assert_eq!(count_nonzero(&eroded), 0);
    }

    #[test]
    fn erosion_keeps_the_center_of_a_block() {
        #[rustfmt::skip]
        let img = binary(&[
            1, 1, 1,
            1, 1, 1,
            1, 1, 1,
        ], 3, 3);
        let eroded = erode_ellipse3(&img, 1);
        assert_eq!(eroded.get(1, 1), Some(255));
        assert_eq!(eroded.get(0, 0), Some(255)); // corner kept: border never erodes
        assert_eq!(eroded.get(1, 0), Some(0)); // edge midpoint sees an unset neighbor
    }

    #[test]
    fn zero_passes_is_identity() {
        let img = binary(&[1, 0, 1, 0], 2, 2);
        assert_eq!(erode_ellipse3(&img, 0), img);
    }

    #[test]
    fn normalize_spans_full_range() {
        let img = GrayImage::new(vec![10, 20, 30], 3, 1).unwrap();
        let normed = normalize_minmax(&img);
        assert_eq!(normed.data(), &[0, 128, 255]);

        let flat = GrayImage::new(vec![77; 4], 2, 2).unwrap();
        assert_eq!(normalize_minmax(&flat).data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn max_value_honors_the_mask() {
        let img = GrayImage::new(vec![5, 200, 7, 9], 2, 2).unwrap();
        let mask = GrayImage::new(vec![255, 0, 255, 255], 2, 2).unwrap();
        assert_eq!(max_value(&img, None), 200);
        assert_eq!(max_value(&img, Some(&mask)), 9);
    }

    #[test]
    fn grayscale_matches_fixed_point_luma() {
        // pure blue, green, red pixels
        let bgr = [255u8, 0, 0, 0, 255, 0, 0, 0, 255];
        let view = PixelView::from_slice(&bgr, 3, 1, PixelLayout::Packed24).unwrap();
        let gray = grayscale(view);
        assert_eq!(gray.data(), &[29, 150, 76]);
    }
}
