//! Working precision for the least-squares fit

use std::fmt;

/// Vandermonde condition product above which `Adaptive` switches to
/// double-double arithmetic
pub const ADAPTIVE_CONDITION_THRESHOLD: f64 = 1e10;

/// Working precision type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum PrecisionMode {
    /// Use double precision (64-bit)
    #[default]
    Float64,
    /// Use extended precision (double-double `TwoFloat`) with one
    /// residual-refinement sweep
    DoubleDouble,
    /// Choose based on the conditioning of the per-dimension fit matrices
    Adaptive,
}

impl PrecisionMode {
    /// Resolve `Adaptive` into a concrete working precision.
    ///
    /// `condition` is the product of the per-dimension weighted Vandermonde
    /// condition numbers.
    pub fn resolve(self, condition: f64) -> PrecisionMode {
        match self {
            PrecisionMode::Adaptive => {
                if condition.is_nan() || condition > ADAPTIVE_CONDITION_THRESHOLD {
                    PrecisionMode::DoubleDouble
                } else {
                    PrecisionMode::Float64
                }
            }
            other => other,
        }
    }

    /// Whether coefficients are computed in double-double arithmetic
    pub fn is_extended(self) -> bool {
        matches!(self, PrecisionMode::DoubleDouble)
    }
}

impl fmt::Display for PrecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrecisionMode::Float64 => "float64",
            PrecisionMode::DoubleDouble => "double-double",
            PrecisionMode::Adaptive => "adaptive",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(PrecisionMode::Float64.resolve(1e20), PrecisionMode::Float64);
        assert_eq!(
            PrecisionMode::DoubleDouble.resolve(1.0),
            PrecisionMode::DoubleDouble
        );
        assert_eq!(PrecisionMode::Adaptive.resolve(1e3), PrecisionMode::Float64);
        assert_eq!(
            PrecisionMode::Adaptive.resolve(1e12),
            PrecisionMode::DoubleDouble
        );
        assert_eq!(
            PrecisionMode::Adaptive.resolve(f64::NAN),
            PrecisionMode::DoubleDouble
        );
        assert!(PrecisionMode::Adaptive.resolve(1e12).is_extended());
        assert!(!PrecisionMode::Adaptive.resolve(1e3).is_extended());
    }
}
