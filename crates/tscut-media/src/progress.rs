//! Progress reporting for FFmpeg runs, analysis stages and byte copies.

use serde::{Deserialize, Serialize};

use crate::probe::StreamInfo;

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Processing speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether processing is complete
    pub is_complete: bool,
}

/// Progress event emitted by the analysis pipeline.
#[derive(Debug, Clone)]
pub enum AnalyzeEvent {
    /// Stream metadata is known
    Probed(StreamInfo),

    /// Silence detection advanced
    DetectingSilence(FfmpegProgress),

    /// Silence detection complete
    SilenceDetected { intervals: usize, merged: usize },

    /// One more window went through the locator
    WindowLocated { done: usize, total: usize, found: bool },

    /// The map is built
    Complete { entries: usize },
}

/// Progress of a bounded byte copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyProgress {
    /// Bytes written so far
    pub copied: u64,
    /// Bytes expected in total
    pub total: u64,
}

impl CopyProgress {
    pub fn new(total: u64) -> Self {
        Self { copied: 0, total }
    }

    /// Record `bytes` more written bytes.
    pub fn advance(&mut self, bytes: u64) {
        self.copied = self.copied.saturating_add(bytes);
    }

    pub fn is_complete(&self) -> bool {
        self.copied >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_progress() {
        let mut progress = CopyProgress::new(4096);
        progress.advance(1024);
        assert_eq!(progress.copied, 1024);
        assert!(!progress.is_complete());
        progress.advance(3072);
        assert!(progress.is_complete());
        assert!(CopyProgress::new(0).is_complete());
    }
}
