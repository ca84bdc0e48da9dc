//! Compilation and evaluation of a sequence hierarchy.
//!
//! The evaluation process:
//! 1. `compile()` walks the node tree depth-first, assigns stable
//!    `SequenceId`s, rejects cyclic asset references, and builds one
//!    [`SegmentIndex`] per track plus one for each node's sub-sequence
//!    placements.
//! 2. `evaluate()` walks the compiled nodes top-down for a given time,
//!    binary-searching each index and recursing into surviving
//!    sub-sequences with the hop transform applied.
//! 3. `invalidate()` + `recompile()` rebuild only stale branches, reusing
//!    every clean compiled node unchanged.
//!
//! The template is a plain value: one owner, no internal locking. Callers
//! that need concurrent access replace it wholesale after each compile.

use std::collections::{HashMap, HashSet};

use crate::compiler::SegmentIndex;
use crate::error::{CompileError, CompileWarning};
use crate::types::{ActiveEntry, AssetId, Entry, EvaluationResult, SequenceId, SequenceNode};
use sl_common::{FrameRange, FrameTime, TimeTransform};

/// Link from a compiled node to one of its compiled children.
#[derive(Clone, Debug)]
pub(crate) struct SubLink {
    pub(crate) child: SequenceId,
    pub(crate) transform: TimeTransform,
}

/// One sequence instance after compilation.
#[derive(Clone, Debug)]
pub(crate) struct CompiledNode {
    pub(crate) parent: Option<SequenceId>,
    pub(crate) play_range: FrameRange,
    /// One index per non-muted track, in track order.
    pub(crate) tracks: Vec<SegmentIndex>,
    /// Index over the sub-sequence placements, blended per the node's
    /// `sub_kind`.
    pub(crate) subs: SegmentIndex,
    /// Aligned with the original placement slots (`SegmentEntry::index`).
    pub(crate) sub_links: Vec<SubLink>,
}

/// A compiled, binary-searchable snapshot of one sequence hierarchy.
///
/// Queries are total: once compilation succeeded, `evaluate` never fails
/// for any time — times outside all content yield an empty result.
#[derive(Clone, Debug, Default)]
pub struct CompiledTemplate {
    pub(crate) root: SequenceId,
    pub(crate) nodes: HashMap<SequenceId, CompiledNode>,
    warnings: Vec<CompileWarning>,
    stale: HashSet<SequenceId>,
}

impl CompiledTemplate {
    /// Compile a full hierarchy from scratch.
    ///
    /// Per-entry problems (inverted ranges) are demoted to [`warnings`];
    /// structural problems (cyclic asset references) abort the compile and
    /// return no usable template.
    ///
    /// [`warnings`]: CompiledTemplate::warnings
    pub fn compile(root: &SequenceNode) -> Result<Self, CompileError> {
        let mut template = Self {
            root: SequenceId::ROOT,
            ..Self::default()
        };
        let mut chain = Vec::new();
        compile_node(
            root,
            SequenceId::ROOT,
            None,
            true,
            &mut chain,
            &mut template.nodes,
            &mut template.warnings,
            None,
        )?;
        tracing::debug!(
            sequences = template.nodes.len(),
            warnings = template.warnings.len(),
            "Compiled sequence hierarchy"
        );
        Ok(template)
    }

    /// Rebuild stale branches against the (possibly edited) source tree.
    ///
    /// Nodes that were not invalidated — directly or via an ancestor — are
    /// reused as compiled, so invalidating one subtree never recompiles
    /// its siblings.
    pub fn recompile(&mut self, root: &SequenceNode) -> Result<(), CompileError> {
        let mut nodes = HashMap::new();
        let mut warnings = Vec::new();
        let mut chain = Vec::new();
        compile_node(
            root,
            SequenceId::ROOT,
            None,
            false,
            &mut chain,
            &mut nodes,
            &mut warnings,
            Some((&self.nodes, &self.stale)),
        )?;
        self.nodes = nodes;
        self.warnings = warnings;
        self.stale.clear();
        Ok(())
    }

    /// Mark one subtree's segments stale for the next [`recompile`].
    ///
    /// [`recompile`]: CompiledTemplate::recompile
    pub fn invalidate(&mut self, sequence: SequenceId) {
        tracing::debug!(sequence = %sequence, "Invalidated subtree");
        self.stale.insert(sequence);
    }

    /// Everything active at `time`, across the whole hierarchy.
    pub fn evaluate(&self, time: FrameTime) -> EvaluationResult {
        let mut result = EvaluationResult::default();
        self.walk(self.root, time, &mut result);
        result
    }

    fn walk(&self, id: SequenceId, time: FrameTime, out: &mut EvaluationResult) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.play_range.contains_time(time) {
            return;
        }
        for index in &node.tracks {
            if let Some(segment) = index.find_at(time) {
                for entry in &segment.entries {
                    out.active.push(ActiveEntry {
                        entry: entry.id,
                        sequence: id,
                        time,
                        flags: entry.flags,
                    });
                }
            }
        }
        if let Some(segment) = node.subs.find_at(time) {
            for entry in &segment.entries {
                let link = &node.sub_links[entry.index];
                self.walk(link.child, link.transform.apply(time), out);
            }
        }
    }

    /// Warnings collected by the last compile pass, in encounter order.
    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    pub fn root(&self) -> SequenceId {
        self.root
    }

    /// Number of compiled sequence instances.
    pub fn sequence_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, sequence: SequenceId) -> bool {
        self.nodes.contains_key(&sequence)
    }
}

/// Compile one node and its subtree.
///
/// `force` rebuilds this node regardless of the stale set — a fresh pass
/// forces everything, and a stale node forces its whole subtree. The cycle
/// check always walks the full ancestor chain; a one-level check misses
/// cycles of two or more levels.
#[allow(clippy::too_many_arguments)]
fn compile_node(
    node: &SequenceNode,
    id: SequenceId,
    parent: Option<SequenceId>,
    force: bool,
    chain: &mut Vec<AssetId>,
    out: &mut HashMap<SequenceId, CompiledNode>,
    warnings: &mut Vec<CompileWarning>,
    prev: Option<(&HashMap<SequenceId, CompiledNode>, &HashSet<SequenceId>)>,
) -> Result<(), CompileError> {
    if chain.contains(&node.asset) {
        return Err(CompileError::CyclicReference {
            asset: node.asset.clone(),
        });
    }
    chain.push(node.asset.clone());

    let stale = force
        || prev.map_or(true, |(nodes, stale_set)| {
            stale_set.contains(&id) || !nodes.contains_key(&id)
        });

    if stale {
        let tracks = node
            .tracks
            .iter()
            .filter(|t| !t.muted)
            .map(|t| SegmentIndex::compile(&t.entries, t.kind, warnings))
            .collect();

        let sub_entries: Vec<Entry> = node
            .subs
            .iter()
            .map(|s| Entry {
                id: s.id,
                range: s.range,
                row: s.row,
                priority: s.priority,
                flags: s.flags,
            })
            .collect();
        let subs = SegmentIndex::compile(&sub_entries, node.sub_kind, warnings);

        let sub_links = node
            .subs
            .iter()
            .enumerate()
            .map(|(slot, s)| SubLink {
                child: SequenceId::child_of(id, slot as u32),
                transform: s.transform,
            })
            .collect();

        tracing::debug!(
            sequence = %id,
            name = %node.name,
            tracks = node.tracks.len(),
            subs = node.subs.len(),
            "Compiled sequence node"
        );
        out.insert(
            id,
            CompiledNode {
                parent,
                play_range: node.play_range,
                tracks,
                subs,
                sub_links,
            },
        );
    } else if let Some((nodes, _)) = prev {
        if let Some(existing) = nodes.get(&id) {
            out.insert(id, existing.clone());
        }
    }

    for (slot, sub) in node.subs.iter().enumerate() {
        compile_node(
            &sub.node,
            SequenceId::child_of(id, slot as u32),
            Some(id),
            stale,
            chain,
            out,
            warnings,
            prev,
        )?;
    }

    chain.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetId, Entry, EntryId, EvalFlags, SubSequence, TrackKind};
    use sl_common::{FrameNumber, Rational};

    fn t(frame: i64) -> FrameTime {
        FrameTime::from_frame(FrameNumber(frame))
    }

    fn leaf(name: &str, asset: &str, play: FrameRange) -> SequenceNode {
        SequenceNode::new(name, AssetId::new(asset), play)
    }

    /// Root with a shot track of two rows, both covering [0, 100).
    fn two_row_root() -> SequenceNode {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        let track = root.add_track("Shots", TrackKind::Shot);
        track.add_entry(Entry::new(EntryId(1), FrameRange::from_frames(0, 100)));
        track.add_entry(Entry::new(EntryId(2), FrameRange::from_frames(0, 100)).with_row(1));
        root
    }

    #[test]
    fn lowest_row_hides_the_other_at_overlap() {
        let template = CompiledTemplate::compile(&two_row_root()).unwrap();
        let result = template.evaluate(t(50));
        assert_eq!(result.len(), 1);
        assert_eq!(result.active[0].entry, EntryId(1));
        assert_eq!(result.active[0].sequence, SequenceId::ROOT);
    }

    #[test]
    fn priority_and_start_resolve_same_row_overlap() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        let track = root.add_track("Shots", TrackKind::Shot);
        track.add_entry(
            Entry::new(EntryId(1), FrameRange::from_frames(0, 50)).with_priority(1),
        );
        track.add_entry(
            Entry::new(EntryId(2), FrameRange::from_frames(25, 75)).with_priority(2),
        );
        let template = CompiledTemplate::compile(&root).unwrap();

        // inside the overlap the higher-priority, later-starting entry wins
        let inside = template.evaluate(t(30));
        assert_eq!(inside.len(), 1);
        assert_eq!(inside.active[0].entry, EntryId(2));

        // before the overlap only the first entry exists
        let before = template.evaluate(t(10));
        assert_eq!(before.len(), 1);
        assert_eq!(before.active[0].entry, EntryId(1));
    }

    #[test]
    fn evaluate_is_total_outside_all_content() {
        let template = CompiledTemplate::compile(&two_row_root()).unwrap();
        assert!(template.evaluate(t(-1_000)).is_empty());
        assert!(template.evaluate(t(250)).is_empty());
        assert!(template.evaluate(t(1_000_000)).is_empty());
    }

    #[test]
    fn play_range_gates_the_root() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 100));
        let track = root.add_track("Audio", TrackKind::Audio);
        track.add_entry(Entry::new(EntryId(1), FrameRange::from_frames(0, 500)));
        let template = CompiledTemplate::compile(&root).unwrap();

        assert_eq!(template.evaluate(t(50)).len(), 1);
        // entry extends past the play range, but the range gates it
        assert!(template.evaluate(t(200)).is_empty());
    }

    #[test]
    fn sub_sequence_maps_time_into_child_space() {
        let mut child = leaf("Intro", "/seq/intro", FrameRange::from_frames(0, 100));
        let track = child.add_track("Audio", TrackKind::Audio);
        track.add_entry(Entry::new(EntryId(7), FrameRange::from_frames(0, 100)));

        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        root.add_sub(SubSequence::new(
            EntryId(10),
            FrameRange::from_frames(100, 200),
            TimeTransform::offset_by(-t(100)),
            child,
        ));
        let template = CompiledTemplate::compile(&root).unwrap();

        let result = template.evaluate(t(150));
        assert_eq!(result.len(), 1);
        let active = result.active[0];
        assert_eq!(active.entry, EntryId(7));
        assert_eq!(active.time, t(50));
        assert_eq!(active.sequence, SequenceId::child_of(SequenceId::ROOT, 0));

        // outside the placement range the child is silent
        assert!(template.evaluate(t(50)).is_empty());
    }

    #[test]
    fn trimmed_child_play_range_suppresses_output() {
        // the placement says [100, 200) but the child only evaluates [0, 30)
        let mut child = leaf("Intro", "/seq/intro", FrameRange::from_frames(0, 30));
        let track = child.add_track("Audio", TrackKind::Audio);
        track.add_entry(Entry::new(EntryId(7), FrameRange::from_frames(0, 100)));

        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        root.add_sub(SubSequence::new(
            EntryId(10),
            FrameRange::from_frames(100, 200),
            TimeTransform::offset_by(-t(100)),
            child,
        ));
        let template = CompiledTemplate::compile(&root).unwrap();

        assert_eq!(template.evaluate(t(110)).len(), 1);
        assert!(template.evaluate(t(150)).is_empty());
    }

    #[test]
    fn scaled_sub_sequence_preserves_subframe() {
        let mut child = leaf("Slow", "/seq/slow", FrameRange::from_frames(0, 1000));
        let track = child.add_track("Audio", TrackKind::Audio);
        track.add_entry(Entry::new(EntryId(7), FrameRange::from_frames(0, 1000)));

        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        root.add_sub(SubSequence::new(
            EntryId(10),
            FrameRange::from_frames(0, 300),
            TimeTransform::new(Rational::new(1, 2), FrameTime::ZERO),
            child,
        ));
        let template = CompiledTemplate::compile(&root).unwrap();

        let result = template.evaluate(t(25));
        assert_eq!(result.len(), 1);
        assert_eq!(result.active[0].time, FrameTime::from_decimal(12.5));
    }

    #[test]
    fn cyclic_hierarchy_fails_compile() {
        // A references B which references A again (a two-level cycle the
        // shallow check would miss)
        let a_again = leaf("A2", "/seq/a", FrameRange::from_frames(0, 10));
        let mut b = leaf("B", "/seq/b", FrameRange::from_frames(0, 50));
        b.add_sub(SubSequence::new(
            EntryId(2),
            FrameRange::from_frames(0, 10),
            TimeTransform::IDENTITY,
            a_again,
        ));
        let mut a = leaf("A", "/seq/a", FrameRange::from_frames(0, 100));
        a.add_sub(SubSequence::new(
            EntryId(1),
            FrameRange::from_frames(0, 50),
            TimeTransform::IDENTITY,
            b,
        ));

        let err = CompiledTemplate::compile(&a).unwrap_err();
        assert_eq!(
            err,
            CompileError::CyclicReference {
                asset: AssetId::new("/seq/a")
            }
        );
    }

    #[test]
    fn same_asset_twice_is_not_a_cycle() {
        let first = leaf("Shot", "/seq/shot", FrameRange::from_frames(0, 50));
        let second = leaf("Shot", "/seq/shot", FrameRange::from_frames(0, 50));
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        root.add_sub(SubSequence::new(
            EntryId(1),
            FrameRange::from_frames(0, 50),
            TimeTransform::IDENTITY,
            first,
        ));
        root.add_sub(SubSequence::new(
            EntryId(2),
            FrameRange::from_frames(50, 100),
            TimeTransform::offset_by(-t(50)),
            second,
        ));

        let template = CompiledTemplate::compile(&root).unwrap();
        assert_eq!(template.sequence_count(), 3);
    }

    #[test]
    fn invalid_entry_warns_and_is_ignored() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        let track = root.add_track("Audio", TrackKind::Audio);
        track.add_entry(Entry::new(EntryId(1), FrameRange::from_frames(0, 100)));
        track.add_entry(Entry::new(EntryId(2), FrameRange::from_frames(50, 10)));

        let template = CompiledTemplate::compile(&root).unwrap();
        assert_eq!(template.warnings().len(), 1);
        assert!(matches!(
            template.warnings()[0],
            CompileWarning::InvalidEntryRange {
                entry: EntryId(2),
                ..
            }
        ));

        let result = template.evaluate(t(30));
        assert_eq!(result.len(), 1);
        assert_eq!(result.active[0].entry, EntryId(1));
    }

    #[test]
    fn muted_track_contributes_nothing() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        let track = root.add_track("Audio", TrackKind::Audio);
        track.add_entry(Entry::new(EntryId(1), FrameRange::from_frames(0, 100)));
        track.muted = true;
        let template = CompiledTemplate::compile(&root).unwrap();
        assert!(template.evaluate(t(50)).is_empty());
    }

    #[test]
    fn preroll_flag_travels_to_the_result() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        let track = root.add_track("Shots", TrackKind::Shot);
        track.add_entry(Entry::new(EntryId(1), FrameRange::from_frames(10, 100)));
        track.add_entry(
            Entry::new(EntryId(2), FrameRange::from_frames(0, 10))
                .with_flags(EvalFlags::PreRoll),
        );
        let template = CompiledTemplate::compile(&root).unwrap();

        let result = template.evaluate(t(5));
        assert_eq!(result.len(), 1);
        assert_eq!(result.active[0].flags, EvalFlags::PreRoll);
    }

    #[test]
    fn exclusive_sub_kind_picks_one_child() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        for (slot, asset) in ["/seq/a", "/seq/b"].into_iter().enumerate() {
            let mut child = leaf("Child", asset, FrameRange::from_frames(0, 100));
            let track = child.add_track("Audio", TrackKind::Audio);
            track.add_entry(Entry::new(
                EntryId(100 + slot as u64),
                FrameRange::from_frames(0, 100),
            ));
            root.add_sub(
                SubSequence::new(
                    EntryId(slot as u64),
                    FrameRange::from_frames(0, 100),
                    TimeTransform::IDENTITY,
                    child,
                )
                .with_row(slot as i32),
            );
        }
        let template = CompiledTemplate::compile(&root).unwrap();

        // Shot sub-kind: only the row-0 child is entered
        let result = template.evaluate(t(50));
        assert_eq!(result.len(), 1);
        assert_eq!(result.active[0].entry, EntryId(100));
    }

    #[test]
    fn inclusive_sub_kind_enters_all_children() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        root.sub_kind = TrackKind::Audio;
        for (slot, asset) in ["/seq/a", "/seq/b"].into_iter().enumerate() {
            let mut child = leaf("Child", asset, FrameRange::from_frames(0, 100));
            let track = child.add_track("Audio", TrackKind::Audio);
            track.add_entry(Entry::new(
                EntryId(100 + slot as u64),
                FrameRange::from_frames(0, 100),
            ));
            root.add_sub(
                SubSequence::new(
                    EntryId(slot as u64),
                    FrameRange::from_frames(0, 100),
                    TimeTransform::IDENTITY,
                    child,
                )
                .with_row(slot as i32),
            );
        }
        let template = CompiledTemplate::compile(&root).unwrap();
        assert_eq!(template.evaluate(t(50)).len(), 2);
    }

    #[test]
    fn recompile_reuses_clean_siblings_and_rebuilds_stale_ones() {
        let mut root = leaf("Main", "/seq/main", FrameRange::from_frames(0, 300));
        for (slot, asset) in ["/seq/a", "/seq/b"].into_iter().enumerate() {
            let mut child = leaf("Child", asset, FrameRange::from_frames(0, 100));
            let track = child.add_track("Audio", TrackKind::Audio);
            track.add_entry(Entry::new(
                EntryId(100 + slot as u64),
                FrameRange::from_frames(0, 100),
            ));
            root.add_sub(SubSequence::new(
                EntryId(slot as u64),
                FrameRange::from_frames((slot as i64) * 100, (slot as i64 + 1) * 100),
                TimeTransform::offset_by(-t(slot as i64 * 100)),
                child,
            ));
        }
        let mut template = CompiledTemplate::compile(&root).unwrap();
        assert_eq!(template.evaluate(t(50)).active[0].entry, EntryId(100));

        // edit the first child's entry, invalidate only that subtree
        let first_child_id = SequenceId::child_of(SequenceId::ROOT, 0);
        root.subs[0].node.tracks[0].entries[0].id = EntryId(999);
        template.invalidate(first_child_id);
        template.recompile(&root).unwrap();

        // stale branch picked up the edit
        assert_eq!(template.evaluate(t(50)).active[0].entry, EntryId(999));
        // clean sibling still answers
        assert_eq!(template.evaluate(t(150)).active[0].entry, EntryId(101));
    }

    #[test]
    fn recompile_without_invalidation_keeps_old_answers() {
        let mut root = two_row_root();
        let mut template = CompiledTemplate::compile(&root).unwrap();

        // edit without invalidating: the compiled snapshot must not change
        root.tracks[0].entries[0].id = EntryId(999);
        template.recompile(&root).unwrap();
        assert_eq!(template.evaluate(t(50)).active[0].entry, EntryId(1));

        // after invalidation the edit is visible
        template.invalidate(SequenceId::ROOT);
        template.recompile(&root).unwrap();
        assert_eq!(template.evaluate(t(50)).active[0].entry, EntryId(999));
    }
}
