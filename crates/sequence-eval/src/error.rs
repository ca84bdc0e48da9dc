//! Error types for sequence compilation and resolution.

use thiserror::Error;

use crate::types::{AssetId, EntryId, SequenceId};
use sl_common::{FrameRange, TimeError};

/// Structural errors that abort a whole compile pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The hierarchy revisits an asset already on the compilation path.
    /// A cyclic hierarchy has no well-defined evaluation, so no usable
    /// template is produced.
    #[error("Cyclic sequence reference: asset {asset} is already on the compilation path")]
    CyclicReference { asset: AssetId },
}

/// Non-fatal findings surfaced out-of-band during a compile pass.
///
/// The offending input is dropped and the rest of the compile proceeds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileWarning {
    #[error("Entry {entry} has an inverted range {range} and was skipped")]
    InvalidEntryRange { entry: EntryId, range: FrameRange },
}

/// Errors from resolving a target sequence at a specific time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Unknown sequence {sequence}")]
    UnknownSequence { sequence: SequenceId },

    /// The target is structurally present but not active at the queried
    /// time (trimmed placement, losing blend, or outside the play range).
    /// Expected and non-fatal: "nothing active here".
    #[error("Sequence {sequence} is not active at the queried time")]
    OutOfRange { sequence: SequenceId },
}

/// Top-level error for engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),
}

/// Convenience Result type for engine operations.
pub type EvalResult<T> = Result<T, EvalError>;
