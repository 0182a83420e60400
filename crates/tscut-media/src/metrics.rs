//! Analysis counters.
//!
//! Counters go through the `metrics` facade; without an installed recorder
//! they are no-ops.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const WINDOWS_ANALYZED_TOTAL: &str = "tscut_windows_analyzed_total";
    pub const WINDOWS_DROPPED_TOTAL: &str = "tscut_windows_dropped_total";
    pub const ENTRIES_DEDUPLICATED_TOTAL: &str = "tscut_entries_deduplicated_total";
    pub const ENTRIES_REPAIRED_TOTAL: &str = "tscut_entries_repaired_total";
    pub const BYTES_COPIED_TOTAL: &str = "tscut_bytes_copied_total";
}

/// Record a silence window handed to the locator.
pub fn record_window_analyzed() {
    counter!(names::WINDOWS_ANALYZED_TOTAL).increment(1);
}

/// Record a window that yielded no cut candidate.
pub fn record_window_dropped(reason: &'static str) {
    counter!(names::WINDOWS_DROPPED_TOTAL, "reason" => reason).increment(1);
}

/// Record entries lost to integer-second collisions.
pub fn record_entries_deduplicated(count: u64) {
    counter!(names::ENTRIES_DEDUPLICATED_TOTAL).increment(count);
}

/// Record entries dropped by the ordering repair pass.
pub fn record_entries_repaired(count: u64) {
    counter!(names::ENTRIES_REPAIRED_TOTAL).increment(count);
}

/// Record bytes written by the splitter.
pub fn record_bytes_copied(bytes: u64) {
    counter!(names::BYTES_COPIED_TOTAL).increment(bytes);
}
