//! Timestamp parsing, formatting and rounding utilities.
//!
//! PTS values travel through the pipeline as `f64` seconds. This module
//! provides the shared conversions: user-facing `HH:MM:SS` parsing, the
//! display string stored in every PTS-map entry, the fixed-width clip file
//! names and the decimal rounding used for map keys.

/// Decimal places kept for PTS-map keys.
pub const PTS_KEY_DECIMALS: i32 = 8;

/// Parse a timestamp string to total seconds.
///
/// Supports formats:
/// - `HH:MM:SS` or `HH:MM:SS.mmm`
/// - `MM:SS` or `MM:SS.mmm`
/// - `SS` or `SS.mmm`
///
/// # Examples
/// ```
/// use tscut_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    let names = ["seconds", "minutes", "hours"];
    let mut total = 0.0;
    for (i, part) in parts.iter().rev().enumerate() {
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(names[i], part.to_string()))?;
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total += value * 60f64.powi(i as i32);
    }
    Ok(total)
}

/// Format seconds as the `HH:MM:SS.ss` display string stored in the index.
///
/// # Examples
/// ```
/// use tscut_models::timestamp::format_pts_display;
/// assert_eq!(format_pts_display(63.48), "00:01:03.48");
/// ```
pub fn format_pts_display(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u64;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u64;
    let secs = total_secs % 60.0;
    format!("{:02}:{:02}:{:05.2}", hours, mins, secs)
}

/// Deterministic file name for the clip bounded by two map keys.
///
/// Fixed-width formatting keeps lexical and chronological order identical
/// for recordings shorter than 10000 seconds.
pub fn clip_file_name(start: f64, end: f64) -> String {
    format!("{:08.3}-{:08.3}.ts", start, end)
}

/// Round to a fixed number of decimal places.
pub fn round_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round a PTS to the precision used for map keys.
pub fn round_pts_key(pts: f64) -> f64 {
    round_decimals(pts, PTS_KEY_DECIMALS)
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// Timestamp string is empty
    Empty,
    /// Timestamp contains negative values
    Negative,
    /// Invalid numeric value for a component
    InvalidValue(&'static str, String),
    /// Invalid timestamp format
    InvalidFormat(String),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timestamp cannot be empty"),
            Self::Negative => write!(f, "Timestamp cannot be negative"),
            Self::InvalidValue(component, value) => {
                write!(f, "Invalid {} value: {}", component, value)
            }
            Self::InvalidFormat(ts) => write!(
                f,
                "Invalid timestamp format '{}'. Use HH:MM:SS, MM:SS or seconds",
                ts
            ),
        }
    }
}

impl std::error::Error for TimestampError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_hh_mm_ss() {
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp("00:01:00").unwrap(), 60.0);
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
    }

    #[test]
    fn test_parse_timestamp_short_forms() {
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("130").unwrap(), 130.0);
        assert!((parse_timestamp("58.5").unwrap() - 58.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("abc"), Err(TimestampError::InvalidValue("seconds", _))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_timestamp("-5"), Err(TimestampError::Negative)));
    }

    #[test]
    fn test_format_pts_display() {
        assert_eq!(format_pts_display(0.0), "00:00:00.00");
        assert_eq!(format_pts_display(3725.5), "01:02:05.50");
    }

    #[test]
    fn test_clip_file_name_is_fixed_width() {
        assert_eq!(clip_file_name(0.0, 120.0), "0000.000-0120.000.ts");
        assert_eq!(clip_file_name(120.0, 900.5), "0120.000-0900.500.ts");
    }

    #[test]
    fn test_round_pts_key() {
        assert_eq!(round_pts_key(12.123456789), 12.12345679);
        assert_eq!(round_pts_key(5.0), 5.0);
    }
}
