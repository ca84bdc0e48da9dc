//! Frame ranges over a discrete time domain, with interval algebra.
//!
//! Every bound is `Open` (unbounded), `Inclusive`, or `Exclusive`. All of
//! the algebra is defined through the canonical half-open integer view
//! ([`FrameRange::lower_inclusive`] / [`FrameRange::upper_exclusive`]), so
//! no combination of bound kinds can produce an off-by-one.

use crate::error::TimeError;
use crate::types::{FrameNumber, FrameTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One end of a [`FrameRange`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeBound {
    /// Unbounded in this direction.
    Open,
    /// The bound frame is part of the range.
    Inclusive(FrameNumber),
    /// The bound frame is not part of the range.
    Exclusive(FrameNumber),
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Inclusive(frame) => write!(f, "[{}]", frame),
            Self::Exclusive(frame) => write!(f, "({})", frame),
        }
    }
}

/// A range of frames, possibly unbounded on either end.
///
/// Zero-length ranges are legal and contain nothing. A range whose lower
/// bound lies above its upper bound is inverted and fails [`validate`].
///
/// [`validate`]: FrameRange::validate
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub lower: RangeBound,
    pub upper: RangeBound,
}

impl FrameRange {
    pub fn new(lower: RangeBound, upper: RangeBound) -> Self {
        Self { lower, upper }
    }

    /// The range covering all time.
    pub fn all() -> Self {
        Self {
            lower: RangeBound::Open,
            upper: RangeBound::Open,
        }
    }

    /// The canonical empty range `[0, 0)`.
    pub fn empty() -> Self {
        Self {
            lower: RangeBound::Inclusive(FrameNumber::ZERO),
            upper: RangeBound::Exclusive(FrameNumber::ZERO),
        }
    }

    /// Half-open range `[lower, upper)`.
    pub fn from_frames(lower: i64, upper: i64) -> Self {
        Self {
            lower: RangeBound::Inclusive(FrameNumber(lower)),
            upper: RangeBound::Exclusive(FrameNumber(upper)),
        }
    }

    /// Range from `frame` onwards ("from now on" semantics).
    pub fn at_least(frame: i64) -> Self {
        Self {
            lower: RangeBound::Inclusive(FrameNumber(frame)),
            upper: RangeBound::Open,
        }
    }

    /// Range covering everything strictly before `frame`.
    pub fn less_than(frame: i64) -> Self {
        Self {
            lower: RangeBound::Open,
            upper: RangeBound::Exclusive(FrameNumber(frame)),
        }
    }

    /// First frame inside the range, `None` when unbounded below.
    pub fn lower_inclusive(&self) -> Option<i64> {
        match self.lower {
            RangeBound::Open => None,
            RangeBound::Inclusive(f) => Some(f.0),
            RangeBound::Exclusive(f) => Some(f.0 + 1),
        }
    }

    /// One past the last frame inside the range, `None` when unbounded above.
    pub fn upper_exclusive(&self) -> Option<i64> {
        match self.upper {
            RangeBound::Open => None,
            RangeBound::Inclusive(f) => Some(f.0 + 1),
            RangeBound::Exclusive(f) => Some(f.0),
        }
    }

    /// Reject inverted ranges. Zero-length ranges pass (legal, empty).
    pub fn validate(&self) -> Result<(), TimeError> {
        match (self.lower_inclusive(), self.upper_exclusive()) {
            (Some(lower), Some(upper)) if lower > upper => {
                Err(TimeError::InvalidRange { range: *self })
            }
            _ => Ok(()),
        }
    }

    /// True when the range contains no frame at all.
    pub fn is_empty(&self) -> bool {
        match (self.lower_inclusive(), self.upper_exclusive()) {
            (Some(lower), Some(upper)) => lower >= upper,
            _ => false,
        }
    }

    pub fn contains(&self, frame: FrameNumber) -> bool {
        let above_lower = self.lower_inclusive().map_or(true, |l| frame.0 >= l);
        let below_upper = self.upper_exclusive().map_or(true, |u| frame.0 < u);
        above_lower && below_upper
    }

    /// Containment for a sub-frame time: decided by the frame it falls on.
    pub fn contains_time(&self, time: FrameTime) -> bool {
        self.contains(time.frame())
    }

    /// The largest range contained in both. Canonical empty if disjoint.
    pub fn intersect(&self, other: &FrameRange) -> FrameRange {
        if self.is_empty() || other.is_empty() {
            return FrameRange::empty();
        }
        let lower = opt_max(self.lower_inclusive(), other.lower_inclusive());
        let upper = opt_min(self.upper_exclusive(), other.upper_exclusive());
        if let (Some(l), Some(u)) = (lower, upper) {
            if l >= u {
                return FrameRange::empty();
            }
        }
        from_canonical(lower, upper)
    }

    /// The smallest range containing both.
    pub fn hull(&self, other: &FrameRange) -> FrameRange {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let lower = match (self.lower_inclusive(), other.lower_inclusive()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        };
        let upper = match (self.upper_exclusive(), other.upper_exclusive()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        from_canonical(lower, upper)
    }

    pub fn overlaps(&self, other: &FrameRange) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Number of frames in the range, `None` when either end is unbounded.
    pub fn size(&self) -> Option<i64> {
        match (self.lower_inclusive(), self.upper_exclusive()) {
            (Some(lower), Some(upper)) => Some(upper - lower),
            _ => None,
        }
    }
}

/// Build a range from canonical half-open integer bounds.
fn from_canonical(lower: Option<i64>, upper: Option<i64>) -> FrameRange {
    FrameRange {
        lower: match lower {
            Some(l) => RangeBound::Inclusive(FrameNumber(l)),
            None => RangeBound::Open,
        },
        upper: match upper {
            Some(u) => RangeBound::Exclusive(FrameNumber(u)),
            None => RangeBound::Open,
        },
    }
}

fn opt_max(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

fn opt_min(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            RangeBound::Open => write!(f, "(-inf, ")?,
            RangeBound::Inclusive(frame) => write!(f, "[{}, ", frame.0)?,
            RangeBound::Exclusive(frame) => write!(f, "({}, ", frame.0)?,
        }
        match self.upper {
            RangeBound::Open => write!(f, "+inf)"),
            RangeBound::Inclusive(frame) => write!(f, "{}]", frame.0),
            RangeBound::Exclusive(frame) => write!(f, "{})", frame.0),
        }
    }
}
