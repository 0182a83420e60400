//! The PTS map: an ordered index of safe cut points.
//!
//! Each key is a presentation timestamp in seconds; each entry records the
//! byte offset where the previous clip must end (`prev_end_pos`) and where the
//! next clip may start (`next_start_pos`). Consecutive keys form clips.
//!
//! The serialized form is a JSON object whose keys are the canonical decimal
//! strings of the timestamps in ascending order:
//!
//! ```json
//! {
//!   "0.0": { "pts_display": "00:00:00.00", "sad": 0.0, ... },
//!   "63.48": { "pts_display": "00:01:03.48", "sad": 0.31, ... }
//! }
//! ```

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::candidate::CutCandidate;
use crate::timestamp::{format_pts_display, round_pts_key};

/// Errors raised while building or loading a PTS map.
#[derive(Debug, Error)]
pub enum PtsMapError {
    #[error("Invalid PTS key: {0}")]
    InvalidKey(String),

    #[error("PTS key {key} does not follow {prev}")]
    NonAscendingKey { prev: f64, key: f64 },

    #[error("Entry {key} starts at byte {prev_end_pos}, before the previous entry ends at {next_start_pos}")]
    Overlap {
        key: f64,
        next_start_pos: u64,
        prev_end_pos: u64,
    },

    #[error("PTS map needs at least 2 entries, found {0}")]
    TooFewEntries(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One cut point of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PtsMapEntry {
    /// Human-readable timestamp (`HH:MM:SS.ss`)
    pub pts_display: String,
    /// Visual difference score at the cut
    pub sad: f64,
    /// Start of the originating silence interval (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent_ss: Option<f64>,
    /// End of the originating silence interval (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent_to: Option<f64>,
    pub prev_end_pts: f64,
    pub prev_end_sad: f64,
    /// Byte offset where the clip before this cut ends
    pub prev_end_pos: u64,
    pub next_start_pts: f64,
    pub next_start_sad: f64,
    /// Byte offset where the clip after this cut starts
    pub next_start_pos: u64,
}

impl PtsMapEntry {
    /// Synthetic entry at the start of the stream.
    pub fn stream_start() -> Self {
        Self::boundary(0.0, 0)
    }

    /// Synthetic entry at the end of the stream.
    pub fn stream_end(duration: f64, file_size: u64) -> Self {
        Self::boundary(duration, file_size)
    }

    fn boundary(pts: f64, pos: u64) -> Self {
        Self {
            pts_display: format_pts_display(pts),
            sad: 0.0,
            silent_ss: Some(pts),
            silent_to: Some(pts),
            prev_end_pts: pts,
            prev_end_sad: 0.0,
            prev_end_pos: pos,
            next_start_pts: pts,
            next_start_sad: 0.0,
            next_start_pos: pos,
        }
    }

    /// Entry describing a located cut.
    pub fn from_candidate(candidate: &CutCandidate) -> Self {
        let pts = round_pts_key(candidate.scene_change.pts);
        Self {
            pts_display: format_pts_display(pts),
            sad: candidate.scene_change.diff_score,
            silent_ss: candidate.silence.map(|(ss, _)| ss),
            silent_to: candidate.silence.map(|(_, to)| to),
            prev_end_pts: candidate.prev_end.pts,
            prev_end_sad: candidate.prev_end.diff_score,
            prev_end_pos: candidate.prev_end.pos,
            next_start_pts: candidate.next_start.pts,
            next_start_sad: candidate.next_start.diff_score,
            next_start_pos: candidate.next_start.pos,
        }
    }
}

/// A clip: the byte range between two consecutive map keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    /// Key the clip starts at (seconds)
    pub start: f64,
    /// Key the clip ends at (seconds)
    pub end: f64,
    /// First byte of the clip (`next_start_pos` of the start entry)
    pub start_pos: u64,
    /// One past the last byte (`prev_end_pos` of the end entry)
    pub end_pos: u64,
}

impl Clip {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn byte_len(&self) -> u64 {
        self.end_pos.saturating_sub(self.start_pos)
    }
}

/// Canonical string form of a map key.
///
/// Integral values keep a trailing `.0` so `0.0` and `120.0` read as
/// timestamps; everything else uses the shortest round-trip representation.
pub fn format_key(key: f64) -> String {
    let s = key.to_string();
    if !key.is_finite() || s.contains(|c: char| c == '.' || c == 'e') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Parse a serialized map key.
pub fn parse_key(key: &str) -> Result<f64, PtsMapError> {
    key.trim()
        .parse::<f64>()
        .ok()
        .filter(|k| k.is_finite())
        .ok_or_else(|| PtsMapError::InvalidKey(key.to_string()))
}

/// Ordered PTS map. Keys are strictly increasing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PtsMap {
    entries: Vec<(f64, PtsMapEntry)>,
}

impl PtsMap {
    /// Build a map from entries that are already in ascending key order.
    pub fn from_entries(entries: Vec<(f64, PtsMapEntry)>) -> Result<Self, PtsMapError> {
        for pair in entries.windows(2) {
            let (prev, key) = (pair[0].0, pair[1].0);
            if key.partial_cmp(&prev) != Some(std::cmp::Ordering::Greater) {
                return Err(PtsMapError::NonAscendingKey { prev, key });
            }
        }
        Ok(Self { entries })
    }

    /// Map with only the synthetic start and end entries.
    pub fn boundaries(duration: f64, file_size: u64) -> Self {
        Self {
            entries: vec![
                (0.0, PtsMapEntry::stream_start()),
                (duration, PtsMapEntry::stream_end(duration, file_size)),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &PtsMapEntry)> + '_ {
        self.entries.iter().map(|(k, e)| (*k, e))
    }

    /// Entry stored under exactly `key`.
    pub fn get(&self, key: f64) -> Option<&PtsMapEntry> {
        let key = round_pts_key(key);
        self.entries
            .iter()
            .find(|(k, _)| round_pts_key(*k) == key)
            .map(|(_, e)| e)
    }

    pub fn first(&self) -> Option<(f64, &PtsMapEntry)> {
        self.entries.first().map(|(k, e)| (*k, e))
    }

    pub fn last(&self) -> Option<(f64, &PtsMapEntry)> {
        self.entries.last().map(|(k, e)| (*k, e))
    }

    /// Stream duration recorded by the end boundary.
    pub fn duration(&self) -> f64 {
        self.last().map(|(_, e)| e.prev_end_pts).unwrap_or(0.0)
    }

    /// Stream size in bytes recorded by the end boundary.
    pub fn length(&self) -> u64 {
        self.last().map(|(_, e)| e.prev_end_pos).unwrap_or(0)
    }

    /// Consecutive key pairs with their byte ranges.
    pub fn clips(&self) -> Vec<Clip> {
        self.entries
            .windows(2)
            .map(|pair| Clip {
                start: pair[0].0,
                end: pair[1].0,
                start_pos: pair[0].1.next_start_pos,
                end_pos: pair[1].1.prev_end_pos,
            })
            .collect()
    }

    /// Pick the longest clips, each at least `length_limit` seconds long,
    /// until more than half of the recording is covered.
    ///
    /// Returns the selected clips (longest first) and their total duration.
    pub fn select_clips(&self, length_limit: f64) -> (Vec<Clip>, f64) {
        let mut clips = self.clips();
        let video_len = clips.last().map(|c| c.end).unwrap_or(0.0);
        clips.sort_by(|a, b| b.duration().total_cmp(&a.duration()));

        let mut selected = Vec::new();
        let mut selected_len = 0.0;
        for clip in clips {
            if clip.duration() < length_limit || selected_len > video_len / 2.0 {
                break;
            }
            selected_len += clip.duration();
            selected.push(clip);
        }
        (selected, selected_len)
    }

    /// Indices of the last key `<= start` and the first key `>= end`.
    pub fn bracket(&self, start: f64, end: f64) -> Option<(usize, usize)> {
        let lower = self.entries.iter().rposition(|(k, _)| *k <= start)?;
        let upper = self.entries.iter().position(|(k, _)| *k >= end)?;
        (lower < upper).then_some((lower, upper))
    }

    /// Key and entry at `index`.
    pub fn at(&self, index: usize) -> Option<(f64, &PtsMapEntry)> {
        self.entries.get(index).map(|(k, e)| (*k, e))
    }

    /// Check every structural invariant of a finished map.
    pub fn validate(&self) -> Result<(), PtsMapError> {
        if self.entries.len() < 2 {
            return Err(PtsMapError::TooFewEntries(self.entries.len()));
        }
        for pair in self.entries.windows(2) {
            let ((prev, a), (key, b)) = (&pair[0], &pair[1]);
            if key <= prev {
                return Err(PtsMapError::NonAscendingKey {
                    prev: *prev,
                    key: *key,
                });
            }
            if a.next_start_pos > b.prev_end_pos {
                return Err(PtsMapError::Overlap {
                    key: *key,
                    next_start_pos: a.next_start_pos,
                    prev_end_pos: b.prev_end_pos,
                });
            }
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, PtsMapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PtsMapError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Serialize for PtsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(&format_key(*key), entry)?;
        }
        map.end()
    }
}

struct PtsMapVisitor;

impl<'de> Visitor<'de> for PtsMapVisitor {
    type Value = PtsMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object keyed by ascending timestamps")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PtsMap, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, entry)) = access.next_entry::<String, PtsMapEntry>()? {
            let key = parse_key(&key).map_err(de::Error::custom)?;
            entries.push((key, entry));
        }
        PtsMap::from_entries(entries).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for PtsMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PtsMapVisitor)
    }
}
