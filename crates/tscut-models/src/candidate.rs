//! Cut candidates produced by the scene-change locator.

use serde::{Deserialize, Serialize};

use crate::frame::FramesProperty;

/// A located scene change and the key frames surrounding it.
///
/// `prev_end.pts <= scene_change.pts <= next_start.pts` always holds. When no
/// key frame exists on one side of the probed window, that side is the scene
/// change itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutCandidate {
    /// Last key frame strictly before the scene change
    pub prev_end: FramesProperty,
    /// Frame with the largest visual change inside the silence window
    pub scene_change: FramesProperty,
    /// First key frame strictly after the scene change
    pub next_start: FramesProperty,
    /// Silence window (seconds) the candidate was located in
    pub silence: Option<(f64, f64)>,
}

impl CutCandidate {
    /// Build a candidate, falling back to the scene change for a missing side.
    pub fn new(
        prev_end: Option<FramesProperty>,
        scene_change: FramesProperty,
        next_start: Option<FramesProperty>,
    ) -> Self {
        Self {
            prev_end: prev_end.unwrap_or(scene_change),
            scene_change,
            next_start: next_start.unwrap_or(scene_change),
            silence: None,
        }
    }

    /// Attach the originating silence window.
    pub fn with_silence(mut self, start_secs: f64, end_secs: f64) -> Self {
        self.silence = Some((start_secs, end_secs));
        self
    }

    /// Whether the ordering invariant holds.
    pub fn is_ordered(&self) -> bool {
        self.prev_end.pts <= self.scene_change.pts && self.scene_change.pts <= self.next_start.pts
    }
}
