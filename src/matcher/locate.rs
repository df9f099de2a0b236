//! Coarse candidate search.
//!
//! The search is an injected strategy so that the confirm and metric core
//! can be implemented and tested independently of the search algorithm's
//! internals. [`SqdiffSearch`] is the in-crate baseline; callers with an
//! optimized correlation search plug in their own [`Locator`].

use crate::image::PixelView;
use crate::metric;
use crate::util::{FrameCheckError, FrameCheckResult};

/// A coarse match candidate: best-matching top-left position plus a
/// similarity score in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Location {
    pub x: usize,
    pub y: usize,
    pub score: f32,
}

/// Coarse search strategy proposing a candidate match location.
///
/// Implementations must only return positions where the template fits fully
/// inside the frame; the confirmation step rejects out-of-bounds candidates.
pub trait Locator {
    /// Returns the best-matching top-left position of `template` within
    /// `frame` and a similarity score where 1.0 is a perfect match.
    fn locate(&self, frame: PixelView<'_>, template: PixelView<'_>)
        -> FrameCheckResult<Location>;
}

/// Exhaustive squared-difference search.
///
/// Evaluates [`metric::sqdiff`] at every position and normalizes the best
/// total to `1 - total / (count * 255²)`, so identical pixels score 1.0.
/// O(frame area × template area); adequate for test-framework frame rates
/// at typical template sizes, but not a substitute for a pyramid search.
#[derive(Copy, Clone, Debug, Default)]
pub struct SqdiffSearch;

impl Locator for SqdiffSearch {
    fn locate(
        &self,
        frame: PixelView<'_>,
        template: PixelView<'_>,
    ) -> FrameCheckResult<Location> {
        let tpl_width = template.width();
        let tpl_height = template.height();
        if frame.width() < tpl_width || frame.height() < tpl_height {
            return Err(FrameCheckError::RoiOutOfBounds {
                x: 0,
                y: 0,
                width: tpl_width,
                height: tpl_height,
                img_width: frame.width(),
                img_height: frame.height(),
            });
        }

        let mut best_x = 0;
        let mut best_y = 0;
        let mut best_total = u64::MAX;
        let mut compared = 0u32;
        for y in 0..=(frame.height() - tpl_height) {
            for x in 0..=(frame.width() - tpl_width) {
                let roi = frame.roi(x, y, tpl_width, tpl_height)?;
                let result = metric::sqdiff(template, roi);
                // the compared-channel count depends only on the template
                compared = result.count;
                if result.total < best_total {
                    best_total = result.total;
                    best_x = x;
                    best_y = y;
                }
            }
        }

        // a fully masked template carries no evidence either way
        let score = if compared == 0 {
            0.0
        } else {
            let worst = u64::from(compared) * 255 * 255;
            (1.0 - best_total as f64 / worst as f64) as f32
        };

        Ok(Location {
            x: best_x,
            y: best_y,
            score,
        })
    }
}
