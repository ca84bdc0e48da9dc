//! Resolution of one target sequence within a compiled hierarchy.
//!
//! Answers "where does this outer time land inside that nested sequence,
//! and through which transform chain" — the lookup behind playhead
//! display inside a sub-sequence and camera-cut style drill-down. Pure
//! functions of (template, target, time); nothing persists between calls.

use crate::error::ResolveError;
use crate::evaluator::CompiledTemplate;
use crate::types::SequenceId;
use sl_common::{FrameTime, TimeTransform};

/// A successfully resolved target time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedTime {
    /// Composed root-to-target transform.
    pub transform: TimeTransform,
    /// The outer time mapped into the target's space.
    pub local_time: FrameTime,
}

/// Resolve `target` at `outer` time.
///
/// Walks the parent chain from the root, composing each hop's transform.
/// At every hop the parent's compiled (already blended) sub-sequence
/// segments decide whether the path child is actually active — a child
/// hidden by an overlapping sibling, a trimmed placement, or a play range
/// miss all yield [`ResolveError::OutOfRange`], the expected "nothing
/// active here" outcome.
pub fn resolve(
    template: &CompiledTemplate,
    target: SequenceId,
    outer: FrameTime,
) -> Result<ResolvedTime, ResolveError> {
    if !template.contains(target) {
        return Err(ResolveError::UnknownSequence { sequence: target });
    }

    // Parent chain target -> root, walked in root -> target order
    let mut path = vec![target];
    let mut cursor = target;
    while let Some(node) = template.nodes.get(&cursor) {
        match node.parent {
            Some(parent) => {
                path.push(parent);
                cursor = parent;
            }
            None => break,
        }
    }
    path.reverse();

    let mut transform = TimeTransform::IDENTITY;
    let mut local = outer;
    for hop in 0..path.len() - 1 {
        let id = path[hop];
        let node = template
            .nodes
            .get(&id)
            .ok_or(ResolveError::UnknownSequence { sequence: id })?;
        if !node.play_range.contains_time(local) {
            return Err(ResolveError::OutOfRange { sequence: id });
        }

        let next = path[hop + 1];
        let link = node
            .subs
            .find_at(local)
            .and_then(|segment| {
                segment
                    .entries
                    .iter()
                    .map(|entry| &node.sub_links[entry.index])
                    .find(|link| link.child == next)
            })
            .ok_or(ResolveError::OutOfRange { sequence: next })?;

        local = link.transform.apply(local);
        transform = transform.then(&link.transform);
    }

    let node = template
        .nodes
        .get(&target)
        .ok_or(ResolveError::UnknownSequence { sequence: target })?;
    if !node.play_range.contains_time(local) {
        return Err(ResolveError::OutOfRange { sequence: target });
    }

    Ok(ResolvedTime {
        transform,
        local_time: local,
    })
}
