//! Template matching over video frames: coarse location plus confirmation.
//!
//! Each processed frame runs the injected [`Locator`] to propose a candidate
//! position, gates the candidate on its first-pass score, and re-checks it
//! with [`crate::confirm`] to reject the false positives a coarse search
//! alone would accept. Configuration may be mutated from a control thread
//! while a streaming thread processes frames; every access goes through a
//! per-instance lock.

use std::sync::Mutex;

use crate::confirm::{confirm, ConfirmMethod};
use crate::image::{GrayImage, PixelLayout, PixelView};
use crate::morph;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::FrameCheckResult;

pub mod locate;

pub use locate::{Location, Locator, SqdiffSearch};

/// Default noise tolerance for match confirmation.
pub const DEFAULT_NOISE_THRESHOLD: f32 = 0.16;

/// Minimum first-pass score before confirmation runs.
pub const DEFAULT_FIRST_PASS_THRESHOLD: f32 = 0.80;

/// Reference image searched for within frames.
///
/// Holds the packed BGR pixels plus a precomputed grayscale used by the
/// confirmation step.
pub struct Template {
    bgr: Vec<u8>,
    width: usize,
    height: usize,
    gray: GrayImage,
    path: Option<String>,
}

impl Template {
    /// Creates a template from packed BGR pixels.
    pub fn from_bgr(data: Vec<u8>, width: usize, height: usize) -> FrameCheckResult<Self> {
        let view = PixelView::from_slice(&data, width, height, PixelLayout::Packed24)?;
        let gray = morph::grayscale(view);
        Ok(Self {
            bgr: data,
            width,
            height,
            gray,
            path: None,
        })
    }

    /// Loads a template image from disk.
    #[cfg(feature = "image-io")]
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> FrameCheckResult<Self> {
        let path_str = path.as_ref().display().to_string();
        let (data, width, height) = crate::image::io::load_bgr_image(path)?;
        let mut template = Self::from_bgr(data, width, height)?;
        template.path = Some(path_str);
        Ok(template)
    }

    /// Records the source path reported in match events.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a borrowed `Packed24` view of the template pixels.
    pub fn view(&self) -> PixelView<'_> {
        PixelView::from_slice(&self.bgr, self.width, self.height, PixelLayout::Packed24)
            .expect("template buffer validated on construction")
    }

    /// Returns the precomputed grayscale template.
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Returns the source path, if one was recorded.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// Tunable matcher parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSettings {
    /// Confirmation strategy applied to coarse candidates.
    pub confirm_method: ConfirmMethod,
    /// Noise tolerance in [0, 1]; the confirmation binarization threshold is
    /// `round(noise_threshold * 255)`.
    pub noise_threshold: f32,
    /// Erosion passes applied to the thresholded difference map. Zero means
    /// any difference pixel above the threshold rejects the candidate.
    pub erode_passes: u32,
    /// Minimum coarse score required before confirmation runs; candidates
    /// below it are reported with `matched: false`.
    pub first_pass_threshold: f32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            confirm_method: ConfirmMethod::AbsDiff,
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            erode_passes: 1,
            first_pass_threshold: DEFAULT_FIRST_PASS_THRESHOLD,
        }
    }
}

/// Verdict posted for each processed frame while a template is loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchEvent {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub timestamp: u64,
    pub first_pass_score: f32,
    pub template_path: Option<String>,
    /// Whether the candidate survived confirmation. Corresponds to the
    /// `match` field of the wire format; renamed because `match` is a
    /// reserved word.
    pub matched: bool,
}

struct MatchInner {
    settings: MatchSettings,
    template: Option<Template>,
}

/// Template matcher for a single video stream.
///
/// One frame is fully processed before the next is accepted; there is no
/// internal parallelism. `L` is the coarse search strategy.
pub struct TemplateMatch<L: Locator = SqdiffSearch> {
    locator: L,
    inner: Mutex<MatchInner>,
}

impl TemplateMatch<SqdiffSearch> {
    /// Creates a matcher using the baseline exhaustive search.
    pub fn new() -> Self {
        Self::with_locator(SqdiffSearch)
    }
}

impl Default for TemplateMatch<SqdiffSearch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Locator> TemplateMatch<L> {
    /// Creates a matcher with an injected coarse search strategy.
    pub fn with_locator(locator: L) -> Self {
        Self {
            locator,
            inner: Mutex::new(MatchInner {
                settings: MatchSettings::default(),
                template: None,
            }),
        }
    }

    /// Replaces the matcher settings.
    pub fn set_settings(&self, settings: MatchSettings) {
        self.lock().settings = settings;
    }

    /// Returns a copy of the current settings.
    pub fn settings(&self) -> MatchSettings {
        self.lock().settings.clone()
    }

    /// Installs or clears the template. Matching is skipped while no
    /// template is loaded.
    pub fn set_template(&self, template: Option<Template>) {
        self.lock().template = template;
    }

    /// Loads a template image from disk.
    ///
    /// A decode failure is non-fatal: a warning is emitted and the
    /// previously loaded template stays in effect.
    #[cfg(feature = "image-io")]
    pub fn load_template(&self, path: &str) {
        match Template::from_path(path) {
            Ok(template) => self.lock().template = Some(template),
            Err(err) => {
                let reason = err.to_string();
                trace_warn!(
                    "failed to load template image",
                    path = path,
                    reason = reason.as_str()
                );
            }
        }
    }

    /// Processes one frame, returning the match verdict.
    ///
    /// Returns `Ok(None)` when no template is loaded or the template does
    /// not fit inside the frame (a warning is emitted for the latter).
    /// `frame` must be a `Packed24` view; `timestamp` is echoed into the
    /// event.
    pub fn process(
        &self,
        frame: PixelView<'_>,
        timestamp: u64,
    ) -> FrameCheckResult<Option<MatchEvent>> {
        let inner = self.lock();
        let Some(template) = inner.template.as_ref() else {
            return Ok(None);
        };
        if template.width() > frame.width() || template.height() > frame.height() {
            trace_warn!(
                "template is larger than the input frame",
                template_width = template.width(),
                template_height = template.height(),
                frame_width = frame.width(),
                frame_height = frame.height(),
            );
            return Ok(None);
        }

        let _span = trace_span!(
            "template_match",
            frame_width = frame.width(),
            frame_height = frame.height()
        )
        .entered();

        let location = self.locator.locate(frame, template.view())?;
        let matched = if location.score >= inner.settings.first_pass_threshold {
            confirm(
                frame,
                (location.x, location.y),
                template.gray(),
                inner.settings.confirm_method,
                inner.settings.noise_threshold,
                inner.settings.erode_passes,
            )?
        } else {
            false
        };
        trace_event!(
            "template_match_verdict",
            x = location.x,
            y = location.y,
            matched = matched
        );

        Ok(Some(MatchEvent {
            x: location.x,
            y: location.y,
            width: template.width(),
            height: template.height(),
            timestamp,
            first_pass_score: location.score,
            template_path: template.path.clone(),
            matched,
        }))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MatchInner> {
        self.inner.lock().expect("matcher lock poisoned")
    }
}
