//! Custom numeric trait for extended-precision computation
//!
//! The fitting transforms and residuals are written once, generic over
//! [`CustomNumeric`], and instantiated for `f64` and the double-double
//! `TwoFloat` type.

use crate::TwoFloat;
use std::fmt::Debug;

/// Numeric operations needed by the fitting and quadrature code.
///
/// Implemented for `f64` and `TwoFloat`.
pub trait CustomNumeric:
    Copy
    + Debug
    + PartialOrd
    + Send
    + Sync
    + std::fmt::Display
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
    + 'static
{
    /// Exact conversion from f64
    fn from_f64(x: f64) -> Self;

    /// Round to the nearest f64
    fn to_f64(self) -> f64;

    /// Machine epsilon of the representation
    fn epsilon() -> Self;

    fn zero() -> Self {
        Self::from_f64(0.0)
    }

    fn one() -> Self {
        Self::from_f64(1.0)
    }

    fn abs(self) -> Self;

    fn sqrt(self) -> Self;

    fn is_finite(self) -> bool;

    fn max(self, other: Self) -> Self {
        if self > other {
            self
        } else {
            other
        }
    }
}

impl CustomNumeric for f64 {
    fn from_f64(x: f64) -> Self {
        x
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn epsilon() -> Self {
        f64::EPSILON
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

impl CustomNumeric for TwoFloat {
    fn from_f64(x: f64) -> Self {
        TwoFloat::from(x)
    }

    fn to_f64(self) -> f64 {
        self.hi() + self.lo()
    }

    fn epsilon() -> Self {
        // 2^-104: unit roundoff of a double-double pair
        TwoFloat::from(f64::EPSILON * f64::EPSILON * 0.25)
    }

    fn abs(self) -> Self {
        if self.hi() < 0.0 {
            -self
        } else {
            self
        }
    }

    fn sqrt(self) -> Self {
        let hi = self.hi();
        if hi <= 0.0 {
            return TwoFloat::from(0.0);
        }
        // One Newton step on the f64 estimate doubles the correct digits
        let s = TwoFloat::from(hi.sqrt());
        s + (self - s * s) / (TwoFloat::from(2.0) * s)
    }

    fn is_finite(self) -> bool {
        self.hi().is_finite() && self.lo().is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_custom_numeric() {
        let x = 1.5_f64;
        let y = -2.0_f64;

        assert_eq!(CustomNumeric::abs(x), 1.5);
        assert_eq!(CustomNumeric::abs(y), 2.0);
        assert_eq!(CustomNumeric::sqrt(4.0_f64), 2.0);
        assert_eq!(<f64 as CustomNumeric>::epsilon(), f64::EPSILON);
        assert_eq!(<f64 as CustomNumeric>::one() + <f64 as CustomNumeric>::zero(), 1.0);
    }

    #[test]
    fn test_twofloat_custom_numeric() {
        let x = <TwoFloat as CustomNumeric>::from_f64(1.5);
        let y = <TwoFloat as CustomNumeric>::from_f64(-2.0);

        assert_eq!(CustomNumeric::abs(x), <TwoFloat as CustomNumeric>::from_f64(1.5));
        assert_eq!(CustomNumeric::abs(y), <TwoFloat as CustomNumeric>::from_f64(2.0));

        let eps = <TwoFloat as CustomNumeric>::epsilon();
        assert!(eps > <TwoFloat as CustomNumeric>::zero());
        assert!(eps.to_f64() < f64::EPSILON);
    }

    #[test]
    fn test_twofloat_sqrt_beats_f64() {
        let two = <TwoFloat as CustomNumeric>::from_f64(2.0);
        let s = CustomNumeric::sqrt(two);
        // s*s - 2 should vanish well below f64 resolution
        let residual = (s * s - two).to_f64().abs();
        assert!(residual < 1e-28, "residual = {}", residual);
        assert!((s.to_f64() - std::f64::consts::SQRT_2).abs() < 1e-15);
    }
}
