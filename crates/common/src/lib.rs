//! `sl-common` — Shared time, range, and transform types for the Shotline
//! sequence engine.
//!
//! This crate is the foundation the evaluation crates depend on.
//! It defines the core abstractions:
//!
//! - **Types**: `FrameNumber`, `FrameTime`, `Rational` (newtypes for safety)
//! - **Ranges**: `FrameRange`, `RangeBound` and the interval algebra
//!   (intersection, hull, containment) over a discrete frame domain
//! - **Transforms**: `TimeTransform` — composable affine outer-to-inner
//!   time mappings used at sub-sequence boundaries
//! - **Errors**: `TimeError` (thiserror-based)

pub mod error;
pub mod range;
pub mod transform;
pub mod types;

// Re-export commonly used items at crate root
pub use error::TimeError;
pub use range::{FrameRange, RangeBound};
pub use transform::{transform_time, TimeTransform};
pub use types::{FrameNumber, FrameTime, Rational};
