//! Objective functions consumed by the pipeline
//!
//! The core only evaluates objectives; it never inspects their internals.

use nalgebra::DMatrix;

/// Scalar objective on R^d
pub trait Objective {
    /// Value at `x` (length d). Must be finite on the whole sample grid.
    fn evaluate(&self, x: &[f64]) -> f64;

    /// Analytic Hessian at `x`, if available.
    ///
    /// When `None`, callers fall back to central finite differences.
    fn hessian(&self, _x: &[f64]) -> Option<DMatrix<f64>> {
        None
    }
}

impl<F> Objective for F
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Central finite-difference Hessian with per-dimension steps `h`
pub fn finite_difference_hessian<O: Objective + ?Sized>(
    objective: &O,
    x: &[f64],
    h: &[f64],
) -> DMatrix<f64> {
    let d = x.len();
    let f0 = objective.evaluate(x);
    let mut probe = x.to_vec();
    let mut hess = DMatrix::<f64>::zeros(d, d);

    for i in 0..d {
        probe[i] = x[i] + h[i];
        let fp = objective.evaluate(&probe);
        probe[i] = x[i] - h[i];
        let fm = objective.evaluate(&probe);
        probe[i] = x[i];
        hess[(i, i)] = (fp - 2.0 * f0 + fm) / (h[i] * h[i]);

        for j in (i + 1)..d {
            let mut corner = |si: f64, sj: f64| {
                probe[i] = x[i] + si * h[i];
                probe[j] = x[j] + sj * h[j];
                let value = objective.evaluate(&probe);
                probe[i] = x[i];
                probe[j] = x[j];
                value
            };
            let mixed = (corner(1.0, 1.0) - corner(1.0, -1.0) - corner(-1.0, 1.0)
                + corner(-1.0, -1.0))
                / (4.0 * h[i] * h[j]);
            hess[(i, j)] = mixed;
            hess[(j, i)] = mixed;
        }
    }
    hess
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_objective_and_fd_hessian() {
        let f = |x: &[f64]| x[0] * x[0] * 3.0 + x[0] * x[1] - x[1] * x[1];
        assert_eq!(f.evaluate(&[1.0, 2.0]), 3.0 + 2.0 - 4.0);
        assert!(f.hessian(&[0.0, 0.0]).is_none());

        let hess = finite_difference_hessian(&f, &[0.3, -0.2], &[1e-3, 1e-3]);
        assert!((hess[(0, 0)] - 6.0).abs() < 1e-6);
        assert!((hess[(0, 1)] - 1.0).abs() < 1e-6);
        assert!((hess[(1, 0)] - 1.0).abs() < 1e-6);
        assert!((hess[(1, 1)] + 2.0).abs() < 1e-6);
    }
}
