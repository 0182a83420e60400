//! PTS map assembly from located cut candidates.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use tscut_models::timestamp::round_pts_key;
use tscut_models::{CutCandidate, PtsMap, PtsMapEntry};

use crate::metrics;

use super::config::DedupPolicy;

/// A map entry before deduplication.
#[derive(Debug, Clone)]
struct Slot {
    key: f64,
    entry: PtsMapEntry,
    /// Synthetic stream boundary; never displaced.
    pinned: bool,
}

/// Build the PTS map for a stream of `duration` seconds and `file_size` bytes.
///
/// Always succeeds. The result starts at key 0, ends at key `duration`,
/// holds at most one key per integer second and satisfies
/// `next_start_pos(a) < prev_end_pos(b)` for every interior pair.
pub fn build_pts_map(
    candidates: &[CutCandidate],
    duration: f64,
    file_size: u64,
    policy: DedupPolicy,
) -> PtsMap {
    let start = Slot {
        key: 0.0,
        entry: PtsMapEntry::stream_start(),
        pinned: true,
    };
    let end = Slot {
        key: duration,
        entry: PtsMapEntry::stream_end(duration, file_size),
        pinned: true,
    };

    let mut interior = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = round_pts_key(candidate.scene_change.pts);
        if !key.is_finite() || key <= 0.0 || key >= duration {
            debug!(key, duration, "Cut outside the stream ignored");
            continue;
        }
        interior.push(Slot {
            key,
            entry: PtsMapEntry::from_candidate(candidate),
            pinned: false,
        });
    }

    // The boundaries own their seconds and are never deduplicated against each other.
    let reserved = [second_of(start.key), second_of(end.key)];
    let mut slots = Vec::with_capacity(interior.len() + 2);
    slots.push(start);
    slots.extend(deduplicate(interior, policy, &reserved));
    slots.push(end);

    let kept = repair(slots);

    let entries: Vec<(f64, PtsMapEntry)> = kept.into_iter().map(|s| (s.key, s.entry)).collect();
    info!(entries = entries.len(), "Built PTS map");

    match PtsMap::from_entries(entries) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Assembled map out of order, keeping stream boundaries only");
            PtsMap::boundaries(duration, file_size)
        }
    }
}

fn second_of(key: f64) -> i64 {
    key.round() as i64
}

/// Keep one interior slot per integer second, in ascending order.
///
/// Slots falling into a `reserved` second are dropped.
fn deduplicate(slots: Vec<Slot>, policy: DedupPolicy, reserved: &[i64]) -> Vec<Slot> {
    let total = slots.len();
    let mut by_second: BTreeMap<i64, Slot> = BTreeMap::new();

    for slot in slots {
        let second = second_of(slot.key);
        if reserved.contains(&second) {
            debug!(dropped = slot.key, "Cut within a second of a stream boundary");
            continue;
        }
        match by_second.get(&second) {
            Some(existing) if !replaces(existing, &slot, policy) => {
                debug!(
                    kept = existing.key,
                    dropped = slot.key,
                    "Duplicate cut within one second"
                );
            }
            _ => {
                by_second.insert(second, slot);
            }
        }
    }

    let dropped = total - by_second.len();
    if dropped > 0 {
        metrics::record_entries_deduplicated(dropped as u64);
    }
    by_second.into_values().collect()
}

fn replaces(existing: &Slot, challenger: &Slot, policy: DedupPolicy) -> bool {
    match policy {
        DedupPolicy::HighestScore => challenger.entry.sad >= existing.entry.sad,
        DedupPolicy::LastWins => true,
    }
}

/// Drop entries whose key frames overlap the previous kept entry.
fn repair(slots: Vec<Slot>) -> Vec<Slot> {
    let mut kept: Vec<Slot> = Vec::with_capacity(slots.len());
    let mut dropped = 0u64;

    for slot in slots {
        if slot.pinned {
            // The end boundary must survive; back off interior entries instead.
            while kept.len() > 1 {
                match kept.last() {
                    Some(last) if !last.pinned && last.entry.next_start_pos >= slot.entry.prev_end_pos => {
                        debug!(key = last.key, "Entry overlaps stream end, dropped");
                        kept.pop();
                        dropped += 1;
                    }
                    _ => break,
                }
            }
            kept.push(slot);
            continue;
        }

        match kept.last() {
            Some(last) if last.entry.next_start_pos >= slot.entry.prev_end_pos => {
                debug!(
                    key = slot.key,
                    prev_key = last.key,
                    next_start_pos = last.entry.next_start_pos,
                    prev_end_pos = slot.entry.prev_end_pos,
                    "Corrupt candidate dropped"
                );
                dropped += 1;
            }
            _ => kept.push(slot),
        }
    }

    if dropped > 0 {
        metrics::record_entries_repaired(dropped);
    }
    kept
}
