//! Central error types for the time layer (thiserror-based).

use thiserror::Error;

use crate::range::FrameRange;

/// Errors from time and range arithmetic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("Degenerate transform: a zero scale cannot be inverted")]
    DegenerateTransform,

    #[error("Invalid range {range}: lower bound is above upper bound")]
    InvalidRange { range: FrameRange },
}
