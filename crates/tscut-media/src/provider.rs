//! Collaborator interfaces consumed by the analysis pipeline.
//!
//! The pipeline never talks to FFmpeg directly. It asks three questions of
//! the source recording, each behind its own trait so tests can answer them
//! with canned data:
//!
//! - [`StreamProbe`]: duration, size and track layout of the recording
//! - [`SilenceDetector`]: silent intervals of the first audio track
//! - [`FramePropertyProvider`]: decoded frame metadata for a time window
//!
//! [`crate::source::SourceFile`] implements all three on top of FFmpeg.

use async_trait::async_trait;

use tscut_models::{FramesProperty, SilenceInterval};

use crate::error::MediaResult;
use crate::probe::StreamInfo;
use crate::progress::FfmpegProgress;

/// Callback for long-running FFmpeg passes.
pub type ProgressFn<'a> = &'a (dyn Fn(FfmpegProgress) + Send + Sync);

/// Stream metadata of the recording.
#[async_trait]
pub trait StreamProbe: Send + Sync {
    /// Probe the recording. Fails with `InvalidFormat` if it cannot be parsed.
    async fn stream_info(&self) -> MediaResult<StreamInfo>;
}

/// Silence intervals of the recording's audio.
#[async_trait]
pub trait SilenceDetector: Send + Sync {
    /// Intervals of at least `min_silence_ms` below `threshold_db`, in milliseconds.
    async fn detect_silence(
        &self,
        min_silence_ms: u64,
        threshold_db: f64,
        progress: ProgressFn<'_>,
    ) -> MediaResult<Vec<SilenceInterval>>;
}

/// Decoded frame metadata for a time window.
#[async_trait]
pub trait FramePropertyProvider: Send + Sync {
    /// Frames with `ss <= pts <= to`, in timestamp order, with diff scores.
    ///
    /// An empty result or a non-fatal error means the window could not be
    /// decoded.
    async fn frame_properties(&self, ss: f64, to: f64) -> MediaResult<Vec<FramesProperty>>;
}
