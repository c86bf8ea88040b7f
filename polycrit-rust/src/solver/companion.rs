//! Colleague-matrix roots of one-dimensional Chebyshev series
//!
//! The eigenvalues of the colleague matrix of sum_k a_k T_k are exactly its
//! roots. All complex eigenvalues are computed; real ones within the
//! imaginary tolerance are polished with Newton on the original series.

use super::backend::SolverBackend;
use super::newton::{polish, NewtonSettings, REFERENCE_BOUND};
use super::types::SolverConfig;
use crate::error::{PolycritError, Result};
use crate::system::AlgebraicSystem;
use nalgebra::linalg::Schur;
use nalgebra::DMatrix;

/// Trailing coefficients below this fraction of the largest are dropped
const TRAILING_CUTOFF: f64 = 1e-14;

const SCHUR_MAX_ITERATIONS: usize = 10_000;

/// Colleague matrix of the Chebyshev series `a` (degree `a.len() - 1 >= 2`)
pub(crate) fn colleague_matrix(a: &[f64]) -> DMatrix<f64> {
    let n = a.len() - 1;
    let mut c = DMatrix::<f64>::zeros(n, n);
    c[(0, 1)] = 1.0;
    for i in 1..n - 1 {
        c[(i, i - 1)] = 0.5;
        c[(i, i + 1)] = 0.5;
    }
    c[(n - 1, n - 2)] = 0.5;
    for j in 0..n {
        c[(n - 1, j)] -= a[j] / (2.0 * a[n]);
    }
    c
}

/// Real roots of sum_k a_k T_k(t) in [-bound, bound]
pub(crate) fn real_chebyshev_roots(a: &[f64], imag_tolerance: f64, bound: f64) -> Result<Vec<f64>> {
    let scale = a.iter().fold(0.0f64, |acc, c| acc.max(c.abs()));
    let mut n = a.len();
    while n > 1 && a[n - 1].abs() <= TRAILING_CUTOFF * scale {
        n -= 1;
    }
    let a = &a[..n];

    match n {
        0 | 1 => Ok(Vec::new()),
        2 => {
            let root = -a[0] / a[1];
            Ok(if root.abs() <= bound { vec![root] } else { vec![] })
        }
        _ => {
            let schur = Schur::try_new(colleague_matrix(a), f64::EPSILON, SCHUR_MAX_ITERATIONS)
                .ok_or_else(|| {
                    PolycritError::solve_failure(
                        "companion",
                        format!("Schur iteration did not converge for degree {}", n - 1),
                    )
                })?;
            let roots = schur
                .complex_eigenvalues()
                .iter()
                .filter(|z| z.im.abs() <= imag_tolerance * z.re.abs().max(1.0))
                .map(|z| z.re)
                .filter(|re| re.abs() <= bound)
                .collect();
            Ok(roots)
        }
    }
}

pub(crate) struct Companion;

impl SolverBackend for Companion {
    fn name(&self) -> &'static str {
        "companion"
    }

    fn find_roots(&self, system: &AlgebraicSystem, config: &SolverConfig) -> Result<Vec<Vec<f64>>> {
        if system.dim() != 1 {
            return Err(PolycritError::solve_failure(
                self.name(),
                format!("requires a one-dimensional system, got dimension {}", system.dim()),
            ));
        }
        let coeffs = system.partials()[0].coeffs();
        let candidates = real_chebyshev_roots(coeffs, config.imag_tolerance, REFERENCE_BOUND)?;

        let settings = NewtonSettings {
            max_iterations: config.newton_max_iterations,
            step_tolerance: config.newton_step_tolerance,
            residual_tolerance: config.residual_tolerance * system.scale(),
        };
        let roots: Vec<Vec<f64>> = candidates
            .iter()
            .map(|&t| polish(system, &[t], &settings).unwrap_or_else(|| vec![t]))
            .collect();

        log::debug!(
            "companion: degree {} series, {} real roots",
            coeffs.len().saturating_sub(1),
            roots.len()
        );
        Ok(roots)
    }
}
