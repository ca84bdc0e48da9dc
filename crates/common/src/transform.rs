//! Affine time transforms between nested time coordinate spaces.
//!
//! A [`TimeTransform`] maps an outer time to an inner time as
//! `inner = outer * scale + offset`. Entering a sub-sequence composes the
//! parent-to-child transform onto whatever chain led to the parent;
//! composition is associative, which is what makes a root-to-leaf chain
//! well-defined regardless of grouping.

use crate::error::TimeError;
use crate::types::{FrameTime, Rational};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Affine mapping from an outer time domain to an inner one.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeTransform {
    /// Time dilation factor (e.g. a half-speed sub-sequence has scale 2/1
    /// from the child's point of view of the parent clock).
    pub scale: Rational,
    /// Inner-space offset added after scaling.
    pub offset: FrameTime,
}

impl TimeTransform {
    pub const IDENTITY: Self = Self {
        scale: Rational { num: 1, den: 1 },
        offset: FrameTime::ZERO,
    };

    pub fn new(scale: Rational, offset: FrameTime) -> Self {
        Self { scale, offset }
    }

    /// Pure translation, the common case for sub-sequences that start at
    /// an interior frame of their asset.
    pub fn offset_by(offset: FrameTime) -> Self {
        Self {
            scale: Rational::new(1, 1),
            offset,
        }
    }

    /// Map an outer time into the inner space, preserving the sub-frame.
    pub fn apply(&self, time: FrameTime) -> FrameTime {
        time * self.scale + self.offset
    }

    /// The transform equivalent to applying `self` first, then `inner`.
    pub fn then(&self, inner: &TimeTransform) -> TimeTransform {
        TimeTransform {
            scale: self.scale.mul(inner.scale),
            offset: self.offset * inner.scale + inner.offset,
        }
    }

    /// Inner-to-outer mapping. A zero scale collapses all outer times onto
    /// one inner time and cannot be inverted.
    pub fn inverse(&self) -> Result<TimeTransform, TimeError> {
        let scale = self
            .scale
            .inverse()
            .ok_or(TimeError::DegenerateTransform)?;
        Ok(TimeTransform {
            scale,
            offset: -self.offset * scale,
        })
    }
}

impl Default for TimeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for TimeTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t * {} + {}", self.scale, self.offset)
    }
}

/// Convert a time counted at `src` ticks-per-second into `dst`
/// ticks-per-second (storage resolution vs display rate — never conflate
/// the two by reinterpreting the raw frame count).
///
/// Panics if `src` is zero; rates are always positive.
pub fn transform_time(time: FrameTime, src: Rational, dst: Rational) -> FrameTime {
    let ratio = dst
        .div(src)
        .expect("source rate must be non-zero");
    time * ratio
}
