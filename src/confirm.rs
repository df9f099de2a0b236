//! Match confirmation: a pixel-exact re-check of a coarse match candidate.
//!
//! The absolute grayscale difference between the candidate frame region and
//! the template is thresholded and eroded. Real mismatches leave blobs large
//! enough to survive erosion; noise-sized specks do not. An empty eroded map
//! confirms the match.

use crate::image::{GrayImage, PixelView};
use crate::morph;
use crate::util::FrameCheckResult;

/// Strategy for confirming a coarse match candidate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ConfirmMethod {
    /// Trust the coarse match unconditionally.
    None,
    /// Absolute grayscale difference against the template.
    #[default]
    AbsDiff,
    /// Like [`ConfirmMethod::AbsDiff`], but both the frame region and the
    /// template are min-max normalized to [0, 255] first. Compensates for
    /// uniform brightness offsets between capture and template at the cost
    /// of needing a higher noise threshold, since normalization amplifies
    /// small differences.
    NormedAbsDiff,
}

/// Decides whether the candidate at `origin` really shows `template_gray`.
///
/// `frame` is the full `Packed24` frame; `template_gray` is the template's
/// precomputed grayscale. Differences are binarized at
/// `round(noise_threshold * 255)` (a pixel is set iff its difference is at
/// least the threshold) and eroded `erode_passes` times with a 3x3
/// elliptical element; the match is confirmed iff nothing survives. With
/// `erode_passes == 0` any set pixel rejects the candidate.
///
/// A candidate region extending outside the frame is rejected with
/// [`RoiOutOfBounds`](crate::FrameCheckError::RoiOutOfBounds) rather than
/// clamped; the locator contract promises in-bounds candidates.
pub fn confirm(
    frame: PixelView<'_>,
    origin: (usize, usize),
    template_gray: &GrayImage,
    method: ConfirmMethod,
    noise_threshold: f32,
    erode_passes: u32,
) -> FrameCheckResult<bool> {
    if method == ConfirmMethod::None {
        return Ok(true);
    }

    let roi = frame.roi(
        origin.0,
        origin.1,
        template_gray.width(),
        template_gray.height(),
    )?;
    let region_gray = morph::grayscale(roi);

    let mut diff = match method {
        ConfirmMethod::None => unreachable!("handled above"),
        ConfirmMethod::AbsDiff => morph::absdiff(&region_gray, template_gray),
        ConfirmMethod::NormedAbsDiff => {
            let region = morph::normalize_minmax(&region_gray);
            let template = morph::normalize_minmax(template_gray);
            morph::absdiff(&region, &template)
        }
    };

    let threshold = (noise_threshold * 255.0).round() as u8;
    morph::threshold_binary(&mut diff, threshold);
    let eroded = morph::erode_ellipse3(&diff, erode_passes);
    Ok(morph::count_nonzero(&eroded) == 0)
}
