//! Decoded frame metadata.

use serde::{Deserialize, Serialize};

/// Frame coding type as reported by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Independently decodable (I) frame.
    Key,
    /// Frame that references other frames (P/B).
    Predicted,
}

impl FrameType {
    /// Map FFmpeg's picture type letter (`I`, `P`, `B`, ...) to a frame type.
    pub fn from_picture_type(picture_type: &str) -> Self {
        if picture_type == "I" {
            FrameType::Key
        } else {
            FrameType::Predicted
        }
    }

    pub fn is_key(self) -> bool {
        matches!(self, FrameType::Key)
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameType::Key => write!(f, "key"),
            FrameType::Predicted => write!(f, "predicted"),
        }
    }
}

/// Metadata of one decoded frame within a queried time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramesProperty {
    /// Presentation timestamp in seconds
    pub pts: f64,
    /// Byte offset of the frame's first packet in the source file
    pub pos: u64,
    /// Key or predicted frame
    pub frame_type: FrameType,
    /// Visual difference to the previous frame of the window (0 for the first)
    pub diff_score: f64,
}

impl FramesProperty {
    pub fn new(pts: f64, pos: u64, frame_type: FrameType, diff_score: f64) -> Self {
        Self {
            pts,
            pos,
            frame_type,
            diff_score,
        }
    }

    pub fn is_key(&self) -> bool {
        self.frame_type.is_key()
    }
}
