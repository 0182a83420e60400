//! Silence intervals reported by the audio detector.

use serde::{Deserialize, Serialize};

/// A half-open range `[start_ms, end_ms)` in which the audio track is silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceInterval {
    /// Start time in milliseconds.
    pub start_ms: u64,
    /// End time in milliseconds.
    pub end_ms: u64,
}

impl SilenceInterval {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Duration of this interval in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Start time in seconds.
    pub fn start_secs(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    /// End time in seconds.
    pub fn end_secs(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }
}

impl From<(u64, u64)> for SilenceInterval {
    fn from((start_ms, end_ms): (u64, u64)) -> Self {
        Self::new(start_ms, end_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_conversions() {
        let interval = SilenceInterval::from((5000, 6500));
        assert_eq!(interval.duration_ms(), 1500);
        assert!((interval.start_secs() - 5.0).abs() < f64::EPSILON);
        assert!((interval.end_secs() - 6.5).abs() < f64::EPSILON);
    }
}
