//! Silence interval merging.

use tscut_models::SilenceInterval;

/// Collapse overlapping or touching intervals into a sorted disjoint set.
pub fn merge_intervals(mut intervals: Vec<SilenceInterval>) -> Vec<SilenceInterval> {
    if intervals.len() < 2 {
        return intervals;
    }
    intervals.sort_by_key(|i| (i.start_ms, i.end_ms));

    let mut merged: Vec<SilenceInterval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        match merged.last_mut() {
            Some(current) if next.start_ms <= current.end_ms => {
                current.end_ms = current.end_ms.max(next.end_ms);
            }
            _ => merged.push(next),
        }
    }
    merged
}
