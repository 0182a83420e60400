#![deny(unreachable_patterns)]
//! Cut point analysis and byte-exact splitting for MPEG transport streams.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and stderr streaming
//! - Stream probing, silence detection and per-frame metadata via FFmpeg
//! - The analysis pipeline that turns silences into a PTS map
//! - Index persistence and the index-driven splitter

pub mod analyze;
pub mod command;
pub mod error;
pub mod frames;
pub mod index;
pub mod metrics;
pub mod probe;
pub mod progress;
pub mod provider;
pub mod silence;
pub mod source;
pub mod split;

pub use analyze::{analyze_video, AnalyzeConfig, DedupPolicy, LocatorStrategy};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use index::{default_index_path, load_pts_map, save_pts_map};
pub use probe::{probe_stream, StreamInfo};
pub use progress::{AnalyzeEvent, CopyProgress, FfmpegProgress};
pub use provider::{FramePropertyProvider, SilenceDetector, StreamProbe};
pub use source::SourceFile;
pub use split::{range_bytes, Splitter, DEFAULT_CHUNK_SIZE};
