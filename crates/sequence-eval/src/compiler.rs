//! Segment compilation: interval partitioning of overlapping entries.
//!
//! The compiler turns an unordered list of entries into a sorted set of
//! disjoint segments, each covering a maximal run of frames over which the
//! active entry set is constant. Boundaries are collected as sweep events,
//! sorted once, and walked left to right; each emitted segment's active
//! set is passed through the track's blend before storing, so a segment
//! only stores survivors.
//!
//! Entries with inverted ranges are dropped at input validation with a
//! [`CompileWarning`]; the compiler itself never fails.

use crate::error::CompileWarning;
use crate::types::{Entry, EntryId, EvalFlags, TrackKind};
use sl_common::{FrameNumber, FrameRange, FrameTime, RangeBound};

/// Projection of one surviving entry inside a [`Segment`].
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentEntry {
    /// Position of the source entry in the compiled input slice.
    pub index: usize,
    pub id: EntryId,
    pub row: i32,
    pub priority: i32,
    pub flags: EvalFlags,
    /// Canonical inclusive start of the source range, `None` when
    /// unbounded below. Blending tie-breaks on this.
    pub start: Option<i64>,
}

/// A maximal run of frames with a constant (blended) active entry set.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub range: FrameRange,
    /// Survivors of the blend, in blend order.
    pub entries: Vec<SegmentEntry>,
}

/// Sorted, disjoint, binary-searchable segments for one track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentIndex {
    segments: Vec<Segment>,
}

/// Validated entry carried through the sweep.
struct Candidate {
    index: usize,
    id: EntryId,
    row: i32,
    priority: i32,
    flags: EvalFlags,
    lower: Option<i64>,
    upper: Option<i64>,
}

impl SegmentIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile `entries` into disjoint segments, blending each segment's
    /// active set per `kind`. Invalid entries are dropped with a warning
    /// pushed to `warnings`.
    pub fn compile(
        entries: &[Entry],
        kind: TrackKind,
        warnings: &mut Vec<CompileWarning>,
    ) -> Self {
        let mut valid = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if entry.range.validate().is_err() {
                tracing::warn!(
                    entry = %entry.id,
                    range = %entry.range,
                    "Skipping entry with inverted range"
                );
                warnings.push(CompileWarning::InvalidEntryRange {
                    entry: entry.id,
                    range: entry.range,
                });
                continue;
            }
            if entry.range.is_empty() {
                continue;
            }
            valid.push(Candidate {
                index,
                id: entry.id,
                row: entry.row,
                priority: entry.priority,
                flags: entry.flags,
                lower: entry.range.lower_inclusive(),
                upper: entry.range.upper_exclusive(),
            });
        }

        // Sweep events: each closed bound toggles one entry. Entries open
        // below are active from the start of time.
        let mut active = vec![false; valid.len()];
        let mut events: Vec<(i64, bool, usize)> = Vec::with_capacity(valid.len() * 2);
        for (i, candidate) in valid.iter().enumerate() {
            match candidate.lower {
                Some(lower) => events.push((lower, true, i)),
                None => active[i] = true,
            }
            if let Some(upper) = candidate.upper {
                events.push((upper, false, i));
            }
        }
        events.sort_unstable();

        let mut segments = Vec::new();
        let mut prev: Option<i64> = None; // None = unbounded below
        let mut cursor = 0;
        while cursor < events.len() {
            let frame = events[cursor].0;
            emit(&mut segments, make_range(prev, Some(frame)), &active, &valid, kind);
            while cursor < events.len() && events[cursor].0 == frame {
                let (_, is_start, idx) = events[cursor];
                active[idx] = is_start;
                cursor += 1;
            }
            prev = Some(frame);
        }
        // Entries open above stay active past the last boundary
        emit(&mut segments, make_range(prev, None), &active, &valid, kind);

        Self { segments }
    }

    /// Binary search for the segment containing `frame`.
    pub fn find(&self, frame: FrameNumber) -> Option<&Segment> {
        let idx = self
            .segments
            .partition_point(|s| s.range.upper_exclusive().is_some_and(|u| u <= frame.0));
        let segment = self.segments.get(idx)?;
        segment.range.contains(frame).then_some(segment)
    }

    /// Segment containing a sub-frame time (decided by its floor frame).
    pub fn find_at(&self, time: FrameTime) -> Option<&Segment> {
        self.find(time.frame())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Close the run `range` with the currently active candidates.
fn emit(
    segments: &mut Vec<Segment>,
    range: FrameRange,
    active: &[bool],
    valid: &[Candidate],
    kind: TrackKind,
) {
    if range.is_empty() {
        return;
    }
    let mut live: Vec<SegmentEntry> = valid
        .iter()
        .enumerate()
        .filter(|(i, _)| active[*i])
        .map(|(_, c)| SegmentEntry {
            index: c.index,
            id: c.id,
            row: c.row,
            priority: c.priority,
            flags: c.flags,
            start: c.lower,
        })
        .collect();
    if live.is_empty() {
        return;
    }
    kind.blend(&mut live);
    segments.push(Segment {
        range,
        entries: live,
    });
}

fn make_range(lower: Option<i64>, upper: Option<i64>) -> FrameRange {
    FrameRange::new(
        lower.map_or(RangeBound::Open, |l| RangeBound::Inclusive(FrameNumber(l))),
        upper.map_or(RangeBound::Open, |u| RangeBound::Exclusive(FrameNumber(u))),
    )
}
