//! Element type capability for kernels under test
//!
//! The harness, the simulated device kernels, and the host references are
//! generic over the buffer element type. [`Element`] collects the arithmetic
//! surface and the machine constants (epsilon, safe minimum) that the
//! reflector math and the tolerance policy need. Implemented for `f32` and
//! `f64`.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub};

/// Numeric element type supported by the harness
///
/// The machine constants are exposed in two forms: native precision for the
/// kernel math (`SAFE_MIN`), and `f64` for the tolerance policy (`EPSILON`),
/// since error scalars are always accumulated in double precision.
pub trait Element:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + MulAssign
    + 'static
{
    /// Additive identity
    const ZERO: Self;

    /// Multiplicative identity
    const ONE: Self;

    /// Machine epsilon of the element type, widened to `f64`
    ///
    /// Error tolerances scale as `problem_size * EPSILON`.
    const EPSILON: f64;

    /// Smallest value that can be safely inverted without overflow
    ///
    /// Matches the LAPACK convention `safmin / eps`, used by the reflector
    /// reference to rescale nearly-degenerate inputs.
    const SAFE_MIN: Self;

    /// Absolute value
    fn abs(self) -> Self;

    /// Square root
    fn sqrt(self) -> Self;

    /// Widen to `f64` for error accumulation
    fn to_f64(self) -> f64;

    /// Narrow from `f64`, used when materializing generated inputs
    fn from_f64(v: f64) -> Self;
}

impl Element for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const EPSILON: f64 = f32::EPSILON as f64;
    const SAFE_MIN: Self = f32::MIN_POSITIVE / f32::EPSILON;

    fn abs(self) -> Self {
        self.abs()
    }

    fn sqrt(self) -> Self {
        self.sqrt()
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Element for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const EPSILON: f64 = f64::EPSILON;
    const SAFE_MIN: Self = f64::MIN_POSITIVE / f64::EPSILON;

    fn abs(self) -> Self {
        self.abs()
    }

    fn sqrt(self) -> Self {
        self.sqrt()
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities() {
        assert_eq!(f32::ZERO + f32::ONE, 1.0f32);
        assert_eq!(f64::ZERO + f64::ONE, 1.0f64);
    }

    #[test]
    fn test_epsilon_widening() {
        assert!(f32::EPSILON > f64::EPSILON as f32);
        assert_eq!(<f32 as Element>::EPSILON, f32::EPSILON as f64);
    }

    #[test]
    fn test_safe_min_invertible() {
        let inv = 1.0f64 / <f64 as Element>::SAFE_MIN;
        assert!(inv.is_finite());
        let inv32 = 1.0f32 / <f32 as Element>::SAFE_MIN;
        assert!(inv32.is_finite());
    }

    #[test]
    fn test_f64_round_trip() {
        let x = 3.5f32;
        assert_eq!(f32::from_f64(x.to_f64()), x);
    }
}
