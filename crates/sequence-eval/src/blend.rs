//! Row/priority blending: which overlapping entries survive, and in what
//! order.
//!
//! Different media have different semantics when entries overlap — only
//! one shot can be visible, but every overlapping audio entry keeps
//! sounding. The policy is therefore selected per track kind rather than
//! hard-coded in the compiler.

use crate::compiler::SegmentEntry;
use crate::types::TrackKind;

/// A blend policy filters and orders one segment's active entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendPolicy {
    /// Keep only the entries on the numerically lowest row. Models a shot
    /// track where the topmost row hides rows below it. Idempotent.
    LowestRowWins,
    /// Within one row, the entry that starts latest wins, with explicit
    /// priority ranked above start time. Pre/post-roll entries are always
    /// retained (they exist to fade, not to compete); exactly one real
    /// entry survives.
    LatestStartWinsWithinRow,
    /// Sort by priority ascending and keep everything. The caller decides
    /// what simultaneity means (e.g. an audio mixer plays all of them).
    StablePriorityOrder,
}

impl BlendPolicy {
    pub fn blend(&self, entries: &mut Vec<SegmentEntry>) {
        match self {
            Self::LowestRowWins => {
                if let Some(min_row) = entries.iter().map(|e| e.row).min() {
                    entries.retain(|e| e.row == min_row);
                }
            }
            Self::LatestStartWinsWithinRow => {
                // Rolls first, then priority descending, then latest start
                // first (an open start counts as the earliest possible).
                entries.sort_by(|a, b| {
                    b.flags
                        .is_roll()
                        .cmp(&a.flags.is_roll())
                        .then(b.priority.cmp(&a.priority))
                        .then(b.start.cmp(&a.start))
                });
                let mut kept_real = false;
                entries.retain(|e| {
                    if e.flags.is_roll() {
                        true
                    } else if kept_real {
                        false
                    } else {
                        kept_real = true;
                        true
                    }
                });
            }
            Self::StablePriorityOrder => {
                entries.sort_by_key(|e| e.priority);
            }
        }
    }
}

impl TrackKind {
    /// Apply this kind's full blend to one segment's active set.
    pub fn blend(&self, entries: &mut Vec<SegmentEntry>) {
        match self {
            Self::Shot => {
                // Resolve competition within each row first, then let the
                // lowest surviving row win across rows.
                let mut rows: Vec<i32> = entries.iter().map(|e| e.row).collect();
                rows.sort_unstable();
                rows.dedup();
                let mut blended = Vec::with_capacity(entries.len());
                for row in rows {
                    let mut row_entries: Vec<SegmentEntry> = entries
                        .iter()
                        .filter(|e| e.row == row)
                        .cloned()
                        .collect();
                    BlendPolicy::LatestStartWinsWithinRow.blend(&mut row_entries);
                    blended.extend(row_entries);
                }
                *entries = blended;
                BlendPolicy::LowestRowWins.blend(entries);
            }
            Self::Audio | Self::Generic => {
                BlendPolicy::StablePriorityOrder.blend(entries);
            }
        }
    }
}
