//! An opened source recording.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::warn;

use tscut_models::{FramesProperty, SilenceInterval};

use crate::error::{MediaError, MediaResult};
use crate::frames::extract_frame_properties;
use crate::probe::{probe_stream, StreamInfo};
use crate::provider::{FramePropertyProvider, ProgressFn, SilenceDetector, StreamProbe};
use crate::silence::detect_silence;

/// A transport stream on disk, analysed through FFmpeg.
///
/// Stream metadata is probed on first use and reused afterwards.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    info: OnceCell<StreamInfo>,
}

impl SourceFile {
    /// Open `path`; fails if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            info: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Probed stream metadata.
    pub async fn info(&self) -> MediaResult<&StreamInfo> {
        self.info.get_or_try_init(|| probe_stream(&self.path)).await
    }
}

#[async_trait]
impl StreamProbe for SourceFile {
    async fn stream_info(&self) -> MediaResult<StreamInfo> {
        self.info().await.cloned()
    }
}

#[async_trait]
impl SilenceDetector for SourceFile {
    async fn detect_silence(
        &self,
        min_silence_ms: u64,
        threshold_db: f64,
        progress: ProgressFn<'_>,
    ) -> MediaResult<Vec<SilenceInterval>> {
        let info = self.info().await?;
        if info.sound_tracks == 0 {
            warn!(path = %self.path.display(), "Recording has no audio track");
            return Ok(Vec::new());
        }
        detect_silence(
            &self.path,
            min_silence_ms,
            threshold_db,
            info.duration,
            progress,
        )
        .await
    }
}

#[async_trait]
impl FramePropertyProvider for SourceFile {
    async fn frame_properties(&self, ss: f64, to: f64) -> MediaResult<Vec<FramesProperty>> {
        let duration = self.info().await?.duration;
        extract_frame_properties(&self.path, ss, to, Some(duration)).await
    }
}
