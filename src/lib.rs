//! Framecheck verifies what is displayed on a video stream (a television,
//! set-top box or camera feed) by comparing frames against reference images:
//! motion detection answers "is the picture changing at all?" and template
//! matching answers "is this icon/logo on screen at this position?".
//!
//! The core is an exact-integer frame comparison engine: [`metric::sqdiff`]
//! over four pixel layouts with stride and alpha-mask support,
//! [`threshold_diff`] binary difference maps, the [`confirm`] step that
//! re-checks coarse match candidates, and the [`MotionDetect`]
//! reference-frame state machine. The coarse search itself is a pluggable
//! [`Locator`] strategy; [`SqdiffSearch`] is the in-crate baseline.

pub mod confirm;
pub mod image;
pub mod matcher;
pub mod metric;
pub mod morph;
pub mod motion;
pub(crate) mod trace;
pub mod util;

pub use confirm::{confirm, ConfirmMethod};
pub use image::{GrayImage, PixelLayout, PixelView};
pub use matcher::{
    Location, Locator, MatchEvent, MatchSettings, SqdiffSearch, Template, TemplateMatch,
};
pub use metric::diffmap::threshold_diff;
pub use metric::{sqdiff, SqdiffResult};
pub use motion::{MotionDetect, MotionEvent, MotionState};
pub use util::{FrameCheckError, FrameCheckResult};
