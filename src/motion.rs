//! Frame-to-frame motion detection.
//!
//! Compares each incoming frame against the previously accepted reference
//! frame and reports whether differences larger than the noise tolerance
//! survive one erosion pass. Test frameworks use this to check that video is
//! actually playing, e.g. after a channel change. The reference and the
//! incoming frame trade places each step by swapping owned buffers; nothing
//! is copied in steady state.

use std::mem;
use std::sync::{Mutex, MutexGuard};

use crate::image::{GrayImage, PixelView};
use crate::morph;
use crate::trace::{trace_event, trace_warn};
use crate::util::{FrameCheckError, FrameCheckResult};

/// Default noise tolerance for motion detection.
///
/// Note the direction: motion binarizes differences at
/// `round((1 - noise_threshold) * 255)`, the opposite mapping from match
/// confirmation. The two knobs are historically independent; keep them so.
pub const DEFAULT_NOISE_THRESHOLD: f32 = 0.84;

/// Reference-frame acquisition state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionState {
    /// Constructed; no frame has been seen while detection was enabled.
    Initialising,
    /// The next frame will be stored as the reference with no verdict.
    AcquiringReference,
    /// A reference frame is held; every new frame produces a verdict.
    ReferenceAcquired,
}

/// Verdict posted for each frame once a reference frame is held.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotionEvent {
    pub has_motion: bool,
    pub timestamp: u64,
    pub masked: bool,
    pub mask_path: Option<String>,
}

struct Mask {
    image: GrayImage,
    path: Option<String>,
}

struct MotionInner {
    enabled: bool,
    noise_threshold: f32,
    state: MotionState,
    reference: Option<GrayImage>,
    scratch: Option<GrayImage>,
    mask: Option<Mask>,
}

/// Motion detector for a single video stream.
///
/// One frame is fully processed before the next is accepted. Configuration
/// may be mutated from a control thread while a streaming thread calls
/// [`process`](Self::process); every access goes through a per-instance
/// lock, which is held for the whole comparison so each frame sees a
/// consistent configuration.
pub struct MotionDetect {
    inner: Mutex<MotionInner>,
}

impl MotionDetect {
    /// Creates a detector, disabled, with the default noise threshold.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MotionInner {
                enabled: false,
                noise_threshold: DEFAULT_NOISE_THRESHOLD,
                state: MotionState::Initialising,
                reference: None,
                scratch: None,
                mask: None,
            }),
        }
    }

    /// Enables or disables verdict emission.
    ///
    /// Enabling drops the stored reference frame: the next processed frame
    /// is silently stored as the new reference before verdicts resume.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.lock();
        inner.enabled = enabled;
        if enabled {
            inner.state = MotionState::AcquiringReference;
        }
    }

    /// Returns whether verdict emission is enabled.
    pub fn enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Sets the noise tolerance in [0, 1].
    pub fn set_noise_threshold(&self, noise_threshold: f32) {
        self.lock().noise_threshold = noise_threshold.clamp(0.0, 1.0);
    }

    /// Returns the current noise tolerance.
    pub fn noise_threshold(&self) -> f32 {
        self.lock().noise_threshold
    }

    /// Returns the current acquisition state.
    pub fn state(&self) -> MotionState {
        self.lock().state
    }

    /// Installs a comparison mask: pixels where the mask is zero are
    /// excluded from the motion check.
    ///
    /// A mask whose dimensions differ from the current frames is still
    /// installed, with a warning; a later comparison against mismatched
    /// frames fails with `SizeMismatch`.
    pub fn set_mask(&self, mask: GrayImage, path: Option<String>) {
        let mut inner = self.lock();
        if let Some(reference) = &inner.reference {
            if reference.width() != mask.width() || reference.height() != mask.height() {
                trace_warn!(
                    "mask dimensions do not match the input frames",
                    mask_width = mask.width(),
                    mask_height = mask.height(),
                    frame_width = reference.width(),
                    frame_height = reference.height(),
                );
            }
        }
        inner.mask = Some(Mask { image: mask, path });
    }

    /// Removes the comparison mask.
    pub fn clear_mask(&self) {
        self.lock().mask = None;
    }

    /// Loads a mask image from disk.
    ///
    /// A decode failure is non-fatal: a warning is emitted and the
    /// previously installed mask stays in effect.
    #[cfg(feature = "image-io")]
    pub fn load_mask(&self, path: &str) {
        match crate::image::io::load_gray_image(path) {
            Ok(mask) => self.set_mask(mask, Some(path.to_owned())),
            Err(err) => {
                let reason = err.to_string();
                trace_warn!(
                    "failed to load mask image",
                    path = path,
                    reason = reason.as_str()
                );
            }
        }
    }

    /// Processes one frame, returning the motion verdict.
    ///
    /// `frame` is a `Gray8` or `Packed24` view; `timestamp` is echoed into
    /// the event. Returns `Ok(None)` while detection is disabled or while
    /// the first frame after enabling is being stored as the reference. A
    /// frame whose dimensions differ from the stored reference silently
    /// restarts reference acquisition.
    pub fn process(
        &self,
        frame: PixelView<'_>,
        timestamp: u64,
    ) -> FrameCheckResult<Option<MotionEvent>> {
        let mut inner = self.lock();
        if !inner.enabled {
            return Ok(None);
        }

        let width = frame.width();
        let height = frame.height();
        let mut current = match inner.scratch.take() {
            Some(buf) if buf.width() == width && buf.height() == height => buf,
            _ => GrayImage::zeroed(width, height),
        };
        morph::grayscale_into(frame, &mut current);

        if inner.state == MotionState::ReferenceAcquired {
            let reference_fits = inner
                .reference
                .as_ref()
                .is_some_and(|r| r.width() == width && r.height() == height);
            if !reference_fits {
                trace_warn!(
                    "frame geometry changed, reacquiring the reference frame",
                    frame_width = width,
                    frame_height = height,
                );
                inner.state = MotionState::AcquiringReference;
            }
        }

        let mut event = None;
        if inner.state == MotionState::ReferenceAcquired {
            if let Some(mask) = &inner.mask {
                let (mask_width, mask_height) = (mask.image.width(), mask.image.height());
                if mask_width != width || mask_height != height {
                    // deferred contract violation: warned at configuration time
                    inner.scratch = Some(current);
                    return Err(FrameCheckError::SizeMismatch {
                        expected_width: width,
                        expected_height: height,
                        got_width: mask_width,
                        got_height: mask_height,
                        context: "mask does not match frame",
                    });
                }
            }
            let reference = inner
                .reference
                .as_ref()
                .expect("reference frame held in ReferenceAcquired state");
            let has_motion = detect_motion(
                reference,
                &current,
                inner.mask.as_ref().map(|m| &m.image),
                inner.noise_threshold,
            );
            trace_event!("motion_verdict", has_motion = has_motion);
            event = Some(MotionEvent {
                has_motion,
                timestamp,
                masked: inner.mask.is_some(),
                mask_path: inner.mask.as_ref().and_then(|m| m.path.clone()),
            });
        }

        // the current frame becomes the reference; the old reference buffer
        // is recycled as next frame's scratch space
        inner.scratch = mem::replace(&mut inner.reference, Some(current));
        inner.state = MotionState::ReferenceAcquired;
        Ok(event)
    }

    fn lock(&self) -> MutexGuard<'_, MotionInner> {
        self.inner.lock().expect("detector lock poisoned")
    }
}

impl Default for MotionDetect {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded-noise comparison between the reference and the current frame.
///
/// The absolute difference is binarized at
/// `round((1 - noise_threshold) * 255)`, eroded once with a 3x3 elliptical
/// element, and the maximum surviving value inside the mask's nonzero region
/// (everywhere, without a mask) decides the verdict.
fn detect_motion(
    reference: &GrayImage,
    current: &GrayImage,
    mask: Option<&GrayImage>,
    noise_threshold: f32,
) -> bool {
    // clamp to 1: identical frames must never count as motion
    let threshold = (((1.0 - noise_threshold) * 255.0).round() as u8).max(1);
    let mut diff = morph::absdiff(reference, current);
    morph::threshold_binary(&mut diff, threshold);
    let eroded = morph::erode_ellipse3(&diff, 1);
    morph::max_value(&eroded, mask) > 0
}
