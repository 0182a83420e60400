//! Scene-change localisation inside a silence window.
//!
//! The locator asks the frame provider for every frame of a window widened
//! by `split_pos_shift` on both sides. The frame with the largest diff score
//! inside the un-widened window is the scene change; the nearest key frames
//! before and after it (from the widened window) bound the cut.

use tracing::{debug, warn};

use tscut_models::{CutCandidate, FramesProperty};

use crate::error::MediaResult;
use crate::metrics;
use crate::provider::FramePropertyProvider;

use super::config::LocatorStrategy;

/// Finds cut candidates through a [`FramePropertyProvider`].
pub struct SceneChangeLocator<'a, P: ?Sized> {
    provider: &'a P,
    split_pos_shift: f64,
    strategy: LocatorStrategy,
    duration: Option<f64>,
}

impl<'a, P> SceneChangeLocator<'a, P>
where
    P: FramePropertyProvider + ?Sized,
{
    pub fn new(provider: &'a P, split_pos_shift: f64, strategy: LocatorStrategy) -> Self {
        Self {
            provider,
            split_pos_shift: split_pos_shift.max(0.0),
            strategy,
            duration: None,
        }
    }

    /// Bound iterative widening by the stream duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Locate the cut inside `[ss, to]` (seconds).
    ///
    /// `Ok(None)` means the window could not be resolved. Only errors that
    /// make every other window fail too are returned.
    pub async fn locate(&self, ss: f64, to: f64) -> MediaResult<Option<CutCandidate>> {
        let candidate = match self.strategy {
            LocatorStrategy::Fixed => self.probe(ss, to).await?,
            LocatorStrategy::Iterative {
                step,
                min_score,
                max_drift,
            } => self.locate_iterative(ss, to, step, min_score, max_drift).await?,
        };
        Ok(candidate.map(|c| c.with_silence(ss, to)))
    }

    async fn locate_iterative(
        &self,
        ss: f64,
        to: f64,
        step: f64,
        min_score: f64,
        max_drift: f64,
    ) -> MediaResult<Option<CutCandidate>> {
        if step <= 0.0 {
            return self.probe(ss, to).await;
        }

        let mut drift = 0.0;
        while drift <= max_drift {
            let (lo, hi) = (ss - drift, to + drift);
            if drift > 0.0 && (lo < 0.0 || self.duration.is_some_and(|d| hi > d)) {
                debug!(ss, to, drift, "Widened window left the stream");
                break;
            }

            if let Some(candidate) = self.probe(lo, hi).await? {
                if candidate.scene_change.diff_score >= min_score {
                    debug!(
                        ss,
                        to,
                        drift,
                        score = candidate.scene_change.diff_score,
                        "Scene change found"
                    );
                    return Ok(Some(candidate));
                }
            }
            drift += step;
        }

        debug!(ss, to, max_drift, "No scene change above threshold");
        metrics::record_window_dropped("below_threshold");
        Ok(None)
    }

    /// One widened query over `[ss, to]`.
    async fn probe(&self, ss: f64, to: f64) -> MediaResult<Option<CutCandidate>> {
        let query_ss = (ss - self.split_pos_shift).max(0.0);
        let query_to = to + self.split_pos_shift;

        let frames = match self.provider.frame_properties(query_ss, query_to).await {
            Ok(frames) => frames,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(ss, to, error = %e, "Frame query failed");
                metrics::record_window_dropped("decode_error");
                return Ok(None);
            }
        };

        let candidate = select_candidate(frames, ss, to);
        if candidate.is_none() {
            debug!(ss, to, "No frames inside window");
            metrics::record_window_dropped("no_frames");
        }
        Ok(candidate)
    }
}

/// Pick the scene change in `[ss, to]` and its surrounding key frames.
///
/// Ties on the diff score keep the earliest frame.
pub fn select_candidate(mut frames: Vec<FramesProperty>, ss: f64, to: f64) -> Option<CutCandidate> {
    frames.sort_by(|a, b| a.pts.total_cmp(&b.pts));

    let scene_change = frames
        .iter()
        .filter(|f| f.pts >= ss && f.pts <= to)
        .fold(None::<&FramesProperty>, |best, frame| match best {
            Some(b) if b.diff_score >= frame.diff_score => Some(b),
            _ => Some(frame),
        })
        .copied()?;

    let prev_end = frames
        .iter()
        .rev()
        .find(|f| f.is_key() && f.pts < scene_change.pts)
        .copied();
    let next_start = frames
        .iter()
        .find(|f| f.is_key() && f.pts > scene_change.pts)
        .copied();

    Some(CutCandidate::new(prev_end, scene_change, next_start))
}
