//! `sl-sequence-eval` — Interval evaluation for the Shotline sequence
//! engine.
//!
//! This crate compiles a hierarchy of nested sequences — tracks of
//! overlapping entries plus sub-sequence placements — into a
//! binary-searchable [`CompiledTemplate`], and answers "what is active at
//! time T" across the whole hierarchy. It handles:
//!
//! - **Segment compilation**: partitioning overlapping entries into
//!   disjoint runs with a constant active set
//! - **Blending**: per-track-kind rules for which overlapping entries
//!   survive (shot exclusivity, audio inclusivity, pre/post-roll)
//! - **Nested sequences**: stable per-placement ids, composed time
//!   transforms, full-chain cycle rejection
//! - **Incremental recompiles**: invalidate one subtree, keep its siblings
//!
//! # Usage
//!
//! ```rust
//! use sl_common::{FrameRange, FrameTime, FrameNumber};
//! use sl_sequence_eval::{
//!     AssetId, CompiledTemplate, Entry, EntryId, SequenceNode, TrackKind,
//! };
//!
//! let mut root = SequenceNode::new(
//!     "Main",
//!     AssetId::new("/seq/main"),
//!     FrameRange::from_frames(0, 300),
//! );
//! let track = root.add_track("Shots", TrackKind::Shot);
//! track.add_entry(Entry::new(EntryId(1), FrameRange::from_frames(0, 100)));
//!
//! let template = CompiledTemplate::compile(&root).unwrap();
//! let result = template.evaluate(FrameTime::from_frame(FrameNumber(50)));
//! assert_eq!(result.len(), 1);
//! ```

pub mod blend;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod hierarchy;
pub mod types;

// Re-export primary API
pub use blend::BlendPolicy;
pub use compiler::{Segment, SegmentEntry, SegmentIndex};
pub use error::{CompileError, CompileWarning, EvalError, EvalResult, ResolveError};
pub use evaluator::CompiledTemplate;
pub use hierarchy::{resolve, ResolvedTime};
pub use types::{
    ActiveEntry, AssetId, Entry, EntryId, EvalFlags, EvaluationResult, SequenceId, SequenceNode,
    SubSequence, Track, TrackKind,
};
