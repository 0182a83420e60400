//! Shared data models for tscut.
//!
//! This crate provides Serde-serializable types for:
//! - Decoded frame metadata and frame types
//! - Silence intervals reported by the audio detector
//! - Cut candidates produced by the scene-change locator
//! - The persisted PTS map and the clips it describes
//! - Timestamp parsing and formatting

pub mod candidate;
pub mod frame;
pub mod interval;
pub mod pts_map;
pub mod timestamp;

// Re-export common types
pub use candidate::CutCandidate;
pub use frame::{FrameType, FramesProperty};
pub use interval::SilenceInterval;
pub use pts_map::{Clip, PtsMap, PtsMapEntry, PtsMapError};
pub use timestamp::TimestampError;

/// Size of one MPEG transport-stream packet in bytes.
pub const TS_PACKET_SIZE: u64 = 188;
