//! Core time types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Frame number (absolute position on a timeline, in frames).
///
/// Signed: sub-sequence offsets routinely map outer frames to negative
/// inner frames before the clamp against the child's play range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameNumber(pub i64);

impl FrameNumber {
    pub const ZERO: Self = Self(0);

    pub fn value(self) -> i64 {
        self.0
    }
}

impl Add<i64> for FrameNumber {
    type Output = Self;
    fn add(self, rhs: i64) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for FrameNumber {
    type Output = i64;
    fn sub(self, rhs: Self) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// Rational number for frame rates and time scales
/// (e.g., 30000/1001 for 29.97fps).
///
/// Used both for display rates and for storage tick resolutions; the two
/// are distinct values and conversion between them is always explicit
/// (see [`transform_time`](crate::transform::transform_time)).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const FPS_24: Self = Self { num: 24, den: 1 };
    pub const FPS_25: Self = Self { num: 25, den: 1 };
    pub const FPS_30: Self = Self { num: 30, den: 1 };
    pub const FPS_29_97: Self = Self {
        num: 30000,
        den: 1001,
    };
    pub const FPS_60: Self = Self { num: 60, den: 1 };
    /// Common storage tick resolution: 24000 ticks per second divides
    /// evenly by every whole broadcast display rate.
    pub const TICKS_24000: Self = Self { num: 24000, den: 1 };

    pub fn new(num: u32, den: u32) -> Self {
        assert!(den > 0, "Rational denominator must be > 0");
        Self { num, den }
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    /// Multiply two rationals, reducing the result to lowest terms so
    /// repeated transform composition does not overflow the components.
    pub fn mul(self, other: Rational) -> Rational {
        let num = self.num as u64 * other.num as u64;
        let den = self.den as u64 * other.den as u64;
        let g = gcd(num, den).max(1);
        Rational {
            num: (num / g) as u32,
            den: (den / g) as u32,
        }
    }

    /// Reciprocal. `None` for zero (a zero scale has no inverse).
    pub fn inverse(self) -> Option<Rational> {
        if self.num == 0 {
            None
        } else {
            Some(Rational {
                num: self.den,
                den: self.num,
            })
        }
    }

    /// `self / other`. `None` when `other` is zero.
    pub fn div(self, other: Rational) -> Option<Rational> {
        other.inverse().map(|inv| self.mul(inv))
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// A time value as an integer frame plus a sub-frame fraction in `[0, 1)`.
///
/// The sub-frame carries scrub and transform precision between frames:
/// round-tripping a playhead through a scaled sub-sequence must come back
/// to the same position, so no operation silently truncates it.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct FrameTime {
    frame: FrameNumber,
    subframe: f64,
}

impl FrameTime {
    pub const ZERO: Self = Self {
        frame: FrameNumber(0),
        subframe: 0.0,
    };

    /// Construct from a frame and a sub-frame fraction.
    ///
    /// Panics if `subframe` is outside `[0, 1)`.
    pub fn new(frame: FrameNumber, subframe: f64) -> Self {
        assert!((0.0..1.0).contains(&subframe), "subframe must be in [0, 1)");
        Self { frame, subframe }
    }

    pub fn from_frame(frame: FrameNumber) -> Self {
        Self {
            frame,
            subframe: 0.0,
        }
    }

    /// Construct from a decimal frame count (e.g. `149.5`).
    pub fn from_decimal(value: f64) -> Self {
        let floor = value.floor();
        Self {
            frame: FrameNumber(floor as i64),
            subframe: value - floor,
        }
    }

    /// The frame this time falls on (floor).
    pub fn frame(self) -> FrameNumber {
        self.frame
    }

    pub fn subframe(self) -> f64 {
        self.subframe
    }

    pub fn as_decimal(self) -> f64 {
        self.frame.0 as f64 + self.subframe
    }

    /// Nearest whole frame.
    pub fn round(self) -> FrameNumber {
        if self.subframe >= 0.5 {
            FrameNumber(self.frame.0 + 1)
        } else {
            self.frame
        }
    }
}

impl From<FrameNumber> for FrameTime {
    fn from(frame: FrameNumber) -> Self {
        Self::from_frame(frame)
    }
}

impl Add for FrameTime {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut frame = self.frame.0 + rhs.frame.0;
        let mut subframe = self.subframe + rhs.subframe;
        if subframe >= 1.0 {
            frame += 1;
            subframe -= 1.0;
        }
        Self {
            frame: FrameNumber(frame),
            subframe,
        }
    }
}

impl Sub for FrameTime {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let mut frame = self.frame.0 - rhs.frame.0;
        let mut subframe = self.subframe - rhs.subframe;
        if subframe < 0.0 {
            frame -= 1;
            subframe += 1.0;
        }
        Self {
            frame: FrameNumber(frame),
            subframe,
        }
    }
}

impl Neg for FrameTime {
    type Output = Self;
    fn neg(self) -> Self {
        if self.subframe == 0.0 {
            Self {
                frame: FrameNumber(-self.frame.0),
                subframe: 0.0,
            }
        } else {
            Self {
                frame: FrameNumber(-self.frame.0 - 1),
                subframe: 1.0 - self.subframe,
            }
        }
    }
}

impl Mul<Rational> for FrameTime {
    type Output = Self;

    /// Scale by a rational. The integer part is computed with integer
    /// div/rem against the denominator, so only the sub-frame fraction
    /// sees floating-point arithmetic.
    fn mul(self, rhs: Rational) -> Self {
        let num = rhs.num as i64;
        let den = rhs.den as i64;
        let scaled = self.frame.0 * num;
        let whole = scaled.div_euclid(den);
        let frac = scaled.rem_euclid(den) as f64 / den as f64 + self.subframe * rhs.as_f64();
        let carry = frac.floor();
        Self {
            frame: FrameNumber(whole + carry as i64),
            subframe: frac - carry,
        }
    }
}

impl fmt::Display for FrameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subframe == 0.0 {
            write!(f, "{}", self.frame)
        } else {
            write!(f, "{}+{:.4}", self.frame, self.subframe)
        }
    }
}
