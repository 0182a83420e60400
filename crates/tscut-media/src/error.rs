//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use tscut_models::PtsMapError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during analysis and splitting.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid transport stream: {0}")]
    InvalidFormat(String),

    #[error("Invalid index file {path}: {source}")]
    InvalidIndex {
        path: PathBuf,
        #[source]
        source: PtsMapError,
    },

    #[error("Range {start:.3}s-{end:.3}s is not covered by the index")]
    RangeOutOfBounds { start: f64, end: f64 },

    #[error("Clip {0:.3}s is not a key of the index")]
    UnknownClip(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }

    /// Create an invalid index error.
    pub fn invalid_index(path: impl Into<PathBuf>, source: PtsMapError) -> Self {
        Self::InvalidIndex {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error aborts a whole run rather than a single window.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MediaError::FileNotFound(_)
                | MediaError::InvalidFormat(_)
                | MediaError::FfmpegNotFound
                | MediaError::FfprobeNotFound
                | MediaError::InvalidIndex { .. }
        )
    }
}
