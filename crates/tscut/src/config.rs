//! Runtime configuration.
//!
//! Values come from the environment (after `.env` is loaded) and are then
//! overridden by command-line flags.

use tscut_media::{AnalyzeConfig, LocatorStrategy, DEFAULT_CHUNK_SIZE};

/// Settings shared by all subcommands.
#[derive(Debug, Clone, PartialEq)]
pub struct TscutConfig {
    /// Analysis parameters
    pub analyze: AnalyzeConfig,
    /// Copy chunk size in bytes for split/extract
    pub chunk_size: usize,
}

impl Default for TscutConfig {
    fn default() -> Self {
        Self {
            analyze: AnalyzeConfig::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TscutConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AnalyzeConfig::default();
        let parse_f64 = |name: &str, default: f64| {
            lookup(name)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let iterative = lookup("TSCUT_ITERATIVE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        let analyze = AnalyzeConfig::default()
            .with_min_silence_ms(
                lookup("TSCUT_MIN_SILENCE_MS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(defaults.min_silence_ms),
            )
            .with_silence_thresh_db(parse_f64("TSCUT_SILENCE_THRESH_DB", defaults.silence_thresh_db))
            .with_split_pos_shift(parse_f64("TSCUT_SPLIT_POS_SHIFT", defaults.split_pos_shift))
            .with_strategy(if iterative {
                LocatorStrategy::iterative()
            } else {
                LocatorStrategy::Fixed
            });

        Self {
            analyze,
            chunk_size: lookup("TSCUT_CHUNK_SIZE")
                .and_then(|s| s.trim().parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        assert_eq!(TscutConfig::from_lookup(lookup(&[])), TscutConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = TscutConfig::from_lookup(lookup(&[
            ("TSCUT_MIN_SILENCE_MS", "1200"),
            ("TSCUT_SILENCE_THRESH_DB", "-65.5"),
            ("TSCUT_SPLIT_POS_SHIFT", "2"),
            ("TSCUT_ITERATIVE", "true"),
            ("TSCUT_CHUNK_SIZE", "65536"),
        ]));
        assert_eq!(config.analyze.min_silence_ms, 1200);
        assert_eq!(config.analyze.silence_thresh_db, -65.5);
        assert_eq!(config.analyze.split_pos_shift, 2.0);
        assert_eq!(config.analyze.strategy, LocatorStrategy::iterative());
        assert_eq!(config.chunk_size, 65536);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = TscutConfig::from_lookup(lookup(&[
            ("TSCUT_MIN_SILENCE_MS", "long"),
            ("TSCUT_CHUNK_SIZE", "0"),
            ("TSCUT_ITERATIVE", "nope"),
        ]));
        assert_eq!(config, TscutConfig::default());
    }
}
