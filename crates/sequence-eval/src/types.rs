//! Sequence data model types: Entry, Track, SubSequence, SequenceNode.
//!
//! These describe the structure of a sequence hierarchy as the editor owns
//! it. The engine compiles them into segment indexes and never mutates
//! them; entry payloads stay with the caller, only the ids come back out
//! of evaluation.

use serde::{Deserialize, Serialize};
use sl_common::{FrameRange, FrameTime, TimeTransform};
use std::fmt;

/// Caller-assigned identifier for one entry (a "section" in editor terms).
///
/// The engine hands this back in evaluation results; resolving it to the
/// actual payload is the caller's job.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Evaluation-only activation flags.
///
/// Pre/post-roll entries are active slightly outside their nominal range
/// for warm-up and fade purposes; blending always retains them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalFlags {
    #[default]
    None,
    PreRoll,
    PostRoll,
}

impl EvalFlags {
    /// True for pre-roll and post-roll entries.
    pub fn is_roll(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Read-only projection of one schedulable interval on a track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Caller-assigned id, handed back in evaluation results.
    pub id: EntryId,
    /// Active range on the owning track's timeline.
    pub range: FrameRange,
    /// Vertical lane within the track. Lower rows sit on top.
    pub row: i32,
    /// Explicit tie-break rank among overlapping entries on one row.
    pub priority: i32,
    /// Pre/post-roll marking.
    pub flags: EvalFlags,
}

impl Entry {
    /// Create an entry on row 0 with priority 0 and no flags.
    pub fn new(id: EntryId, range: FrameRange) -> Self {
        Self {
            id,
            range,
            row: 0,
            priority: 0,
            flags: EvalFlags::None,
        }
    }

    pub fn with_row(mut self, row: i32) -> Self {
        self.row = row;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_flags(mut self, flags: EvalFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Kind of track, selecting the blend behavior for overlapping entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Exclusive: one visible entry at a time (camera shots). Within a
    /// row the latest-starting entry wins; across rows the lowest row
    /// wins.
    Shot,
    /// Inclusive: all overlapping entries stay active in priority order
    /// (an audio mixer plays them all).
    Audio,
    /// Inclusive default for unconstrained track types.
    Generic,
}

impl TrackKind {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shot => "Shot",
            Self::Audio => "Audio",
            Self::Generic => "Generic",
        }
    }
}

/// A track: a named lane of entries with one blend kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    /// Human-readable name.
    pub name: String,
    /// Blend behavior for overlapping entries.
    pub kind: TrackKind,
    /// Muted tracks contribute no segments at all.
    pub muted: bool,
    /// Entries on this track, in caller order.
    pub entries: Vec<Entry>,
}

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
            muted: false,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }
}

/// Identity of the underlying sequence asset.
///
/// Used only for cycle detection: two placements of the same asset share
/// an `AssetId` but get distinct [`SequenceId`]s.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for one nesting position in the hierarchy.
///
/// Derived by hash-chaining the parent id with the child slot, so the id
/// is deterministic for a given tree shape and two placements of the same
/// asset never collide.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub u32);

impl SequenceId {
    pub const ROOT: Self = Self(0);

    /// Id of the child in `slot` under `parent` (32-bit FNV-1a chain).
    pub fn child_of(parent: SequenceId, slot: u32) -> Self {
        let mut h: u32 = 0x811c_9dc5;
        for b in parent
            .0
            .to_le_bytes()
            .into_iter()
            .chain(slot.to_le_bytes())
        {
            h = (h ^ u32::from(b)).wrapping_mul(0x0100_0193);
        }
        Self(h)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:08x}", self.0)
    }
}

/// One nested placement of a sequence inside its parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubSequence {
    /// Section id of the placement itself (for warnings and bookkeeping).
    pub id: EntryId,
    /// Active range in the parent's time space.
    pub range: FrameRange,
    /// Row and priority participate in sub-sequence blending exactly like
    /// plain entries.
    pub row: i32,
    pub priority: i32,
    pub flags: EvalFlags,
    /// Parent-space to child-space mapping.
    pub transform: TimeTransform,
    /// The nested sequence; exclusively owned by this placement.
    pub node: SequenceNode,
}

impl SubSequence {
    pub fn new(id: EntryId, range: FrameRange, transform: TimeTransform, node: SequenceNode) -> Self {
        Self {
            id,
            range,
            row: 0,
            priority: 0,
            flags: EvalFlags::None,
            transform,
            node,
        }
    }

    pub fn with_row(mut self, row: i32) -> Self {
        self.row = row;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// One sequence in the hierarchy: leaf tracks plus nested placements.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceNode {
    /// Human-readable name.
    pub name: String,
    /// Asset identity, shared by all placements of the same asset.
    pub asset: AssetId,
    /// Valid evaluable range in this sequence's own time space.
    pub play_range: FrameRange,
    /// Leaf tracks of plain entries.
    pub tracks: Vec<Track>,
    /// Blend kind governing overlapping sub-sequence placements
    /// (`Shot` = exclusive, `Audio` = all active).
    pub sub_kind: TrackKind,
    /// Nested placements, in slot order.
    pub subs: Vec<SubSequence>,
}

impl SequenceNode {
    pub fn new(name: impl Into<String>, asset: AssetId, play_range: FrameRange) -> Self {
        Self {
            name: name.into(),
            asset,
            play_range,
            tracks: Vec::new(),
            sub_kind: TrackKind::Shot,
            subs: Vec::new(),
        }
    }

    /// Add a track and return a mutable reference to it.
    pub fn add_track(&mut self, name: impl Into<String>, kind: TrackKind) -> &mut Track {
        self.tracks.push(Track::new(name, kind));
        self.tracks.last_mut().expect("just pushed")
    }

    pub fn add_sub(&mut self, sub: SubSequence) {
        self.subs.push(sub);
    }
}

/// One surviving entry at the queried time.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveEntry {
    /// The entry that is active.
    pub entry: EntryId,
    /// Which sequence instance the entry lives in.
    pub sequence: SequenceId,
    /// The queried time mapped into that sequence's space.
    pub time: FrameTime,
    /// Pre/post-roll marking, so callers can fade rather than cut.
    pub flags: EvalFlags,
}

/// Everything active at one queried time, across the whole hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Surviving entries in deterministic (track order, blend order) order.
    pub active: Vec<ActiveEntry>,
}

impl EvaluationResult {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActiveEntry> {
        self.active.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_common::FrameRange;

    #[test]
    fn sequence_ids_are_deterministic() {
        let a = SequenceId::child_of(SequenceId::ROOT, 0);
        let b = SequenceId::child_of(SequenceId::ROOT, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn sequence_ids_distinguish_slots() {
        let a = SequenceId::child_of(SequenceId::ROOT, 0);
        let b = SequenceId::child_of(SequenceId::ROOT, 1);
        assert_ne!(a, b);
        assert_ne!(a, SequenceId::ROOT);
    }

    #[test]
    fn sequence_ids_distinguish_nesting_positions() {
        // the same asset placed twice gets two distinct ids
        let first = SequenceId::child_of(SequenceId::ROOT, 0);
        let second = SequenceId::child_of(SequenceId::ROOT, 1);
        let nested = SequenceId::child_of(first, 0);
        assert_ne!(nested, SequenceId::child_of(second, 0));
    }

    #[test]
    fn entry_builder_defaults() {
        let e = Entry::new(EntryId(1), FrameRange::from_frames(0, 10));
        assert_eq!(e.row, 0);
        assert_eq!(e.priority, 0);
        assert!(!e.flags.is_roll());

        let e = e.with_row(2).with_priority(5).with_flags(EvalFlags::PreRoll);
        assert_eq!(e.row, 2);
        assert_eq!(e.priority, 5);
        assert!(e.flags.is_roll());
    }

    #[test]
    fn node_tree_serialization_roundtrip() {
        let mut root = SequenceNode::new(
            "Main",
            AssetId::new("/seq/main"),
            FrameRange::from_frames(0, 300),
        );
        let track = root.add_track("Shots", TrackKind::Shot);
        track.add_entry(Entry::new(EntryId(1), FrameRange::from_frames(0, 100)));

        let child = SequenceNode::new(
            "Intro",
            AssetId::new("/seq/intro"),
            FrameRange::from_frames(0, 100),
        );
        root.add_sub(SubSequence::new(
            EntryId(10),
            FrameRange::from_frames(100, 200),
            TimeTransform::default(),
            child,
        ));

        let json = serde_json::to_string(&root).expect("serialize");
        let restored: SequenceNode = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.tracks.len(), 1);
        assert_eq!(restored.subs.len(), 1);
        assert_eq!(restored.subs[0].node.name, "Intro");
    }
}
