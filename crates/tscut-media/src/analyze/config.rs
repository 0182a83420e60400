//! Configuration for cut point analysis.
//!
//! The defaults suit broadcast recordings where programme segments are
//! separated by a short block of silence around a scene change.

use serde::{Deserialize, Serialize};

/// How the locator searches a silence window for a scene change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LocatorStrategy {
    /// Probe the widened window once.
    #[default]
    Fixed,
    /// Keep widening the window until the best frame is a clear change.
    Iterative {
        /// Seconds added on both sides per round
        step: f64,
        /// Minimum diff score accepted as a scene change
        min_score: f64,
        /// Maximum total widening (seconds) before giving up
        max_drift: f64,
    },
}

impl LocatorStrategy {
    /// Iterative strategy with the default step, score and drift.
    pub fn iterative() -> Self {
        Self::Iterative {
            step: 0.5,
            min_score: 0.1,
            max_drift: 5.0,
        }
    }
}

/// Which entry survives when several cuts round to the same second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Largest diff score wins; ties go to the later key.
    #[default]
    HighestScore,
    /// The later key always wins.
    LastWins,
}

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig {
    /// Minimum length of a silence (milliseconds).
    pub min_silence_ms: u64,

    /// Level below which audio counts as silent (dB).
    pub silence_thresh_db: f64,

    /// Seconds the frame query is widened by on both sides of a silence.
    ///
    /// The key frames bracketing a scene change usually sit just outside
    /// the silence itself.
    pub split_pos_shift: f64,

    pub strategy: LocatorStrategy,

    pub dedup_policy: DedupPolicy,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: 800,
            silence_thresh_db: -80.0,
            split_pos_shift: 1.0,
            strategy: LocatorStrategy::Fixed,
            dedup_policy: DedupPolicy::HighestScore,
        }
    }
}

impl AnalyzeConfig {
    /// Catch shorter, louder pauses. Produces more candidates.
    pub fn sensitive() -> Self {
        Self {
            min_silence_ms: 500,
            silence_thresh_db: -60.0,
            split_pos_shift: 1.0,
            strategy: LocatorStrategy::iterative(),
            dedup_policy: DedupPolicy::HighestScore,
        }
    }

    /// Only long, near-digital silences.
    pub fn strict() -> Self {
        Self {
            min_silence_ms: 1500,
            silence_thresh_db: -90.0,
            split_pos_shift: 1.0,
            strategy: LocatorStrategy::Fixed,
            dedup_policy: DedupPolicy::HighestScore,
        }
    }

    pub fn with_min_silence_ms(mut self, ms: u64) -> Self {
        self.min_silence_ms = ms;
        self
    }

    pub fn with_silence_thresh_db(mut self, db: f64) -> Self {
        self.silence_thresh_db = db;
        self
    }

    /// Builder-style setter for the window shift; negative values become 0.
    pub fn with_split_pos_shift(mut self, secs: f64) -> Self {
        self.split_pos_shift = secs.max(0.0);
        self
    }

    pub fn with_strategy(mut self, strategy: LocatorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_dedup_policy(mut self, policy: DedupPolicy) -> Self {
        self.dedup_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzeConfig::default();
        assert_eq!(config.min_silence_ms, 800);
        assert_eq!(config.silence_thresh_db, -80.0);
        assert_eq!(config.split_pos_shift, 1.0);
        assert_eq!(config.strategy, LocatorStrategy::Fixed);
        assert_eq!(config.dedup_policy, DedupPolicy::HighestScore);
    }

    #[test]
    fn test_presets() {
        assert!(AnalyzeConfig::sensitive().min_silence_ms < AnalyzeConfig::default().min_silence_ms);
        assert!(AnalyzeConfig::strict().min_silence_ms > AnalyzeConfig::default().min_silence_ms);
    }

    #[test]
    fn test_builder_pattern() {
        let config = AnalyzeConfig::default()
            .with_min_silence_ms(1200)
            .with_split_pos_shift(-2.0)
            .with_strategy(LocatorStrategy::iterative());

        assert_eq!(config.min_silence_ms, 1200);
        assert_eq!(config.split_pos_shift, 0.0);
        assert!(matches!(config.strategy, LocatorStrategy::Iterative { step, .. } if step == 0.5));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AnalyzeConfig = serde_json::from_str(
            r#"{"min_silence_ms": 1000, "strategy": {"kind": "iterative", "step": 1.0, "min_score": 0.2, "max_drift": 4.0}}"#,
        )
        .unwrap();
        assert_eq!(config.min_silence_ms, 1000);
        assert_eq!(config.silence_thresh_db, -80.0);
        assert_eq!(
            config.strategy,
            LocatorStrategy::Iterative {
                step: 1.0,
                min_score: 0.2,
                max_drift: 4.0
            }
        );
    }
}
