//! Damped Gauss-Newton polishing of real roots
//!
//! Steps use the SVD pseudo-inverse of the Jacobian, so iterations stay
//! defined at singular Jacobians (valleys, degenerate critical points) and
//! move along the minimal-norm direction there.

use crate::system::AlgebraicSystem;
use nalgebra::DVector;

/// Largest |t_i| a Newton iterate may reach before the run is abandoned
pub(crate) const REFERENCE_BOUND: f64 = 1.1;

const MAX_DAMPING_HALVINGS: usize = 8;

/// Stopping rules for one Newton run
#[derive(Debug, Clone, Copy)]
pub(crate) struct NewtonSettings {
    pub max_iterations: usize,
    pub step_tolerance: f64,
    /// Absolute residual norm below which a point is accepted
    pub residual_tolerance: f64,
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Polish `start` (reference coordinates) towards a root of `system`.
///
/// Returns `None` if the iteration leaves the enlarged reference box or ends
/// with a residual above tolerance.
pub(crate) fn polish(
    system: &AlgebraicSystem,
    start: &[f64],
    settings: &NewtonSettings,
) -> Option<Vec<f64>> {
    let mut t = start.to_vec();
    let mut residual = system.residual(&t);
    let mut residual_norm = norm(&residual);

    for _ in 0..settings.max_iterations {
        if residual_norm == 0.0 {
            break;
        }
        let svd = system.jacobian(&t).svd(true, true);
        let s_max = svd.singular_values.max();
        if !(s_max > 0.0) || !s_max.is_finite() {
            break;
        }
        let step = svd
            .solve(&DVector::from_column_slice(&residual), s_max * 1e-12)
            .ok()?;
        let step_norm = step.norm();
        let t_norm = norm(&t);

        let mut lambda = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_DAMPING_HALVINGS {
            let candidate: Vec<f64> = t
                .iter()
                .zip(step.iter())
                .map(|(ti, si)| ti - lambda * si)
                .collect();
            let candidate_residual = system.residual(&candidate);
            let candidate_norm = norm(&candidate_residual);
            let tiny_step = lambda * step_norm <= settings.step_tolerance * (1.0 + t_norm);
            if candidate_norm < residual_norm || tiny_step {
                accepted = Some((candidate, candidate_residual, candidate_norm));
                break;
            }
            lambda *= 0.5;
        }

        let Some((next, next_residual, next_norm)) = accepted else {
            break;
        };
        t = next;
        residual = next_residual;
        residual_norm = next_norm;

        if t.iter().any(|ti| !ti.is_finite() || ti.abs() > REFERENCE_BOUND) {
            return None;
        }
        if lambda * step_norm <= settings.step_tolerance * (1.0 + t_norm) {
            break;
        }
    }

    (residual_norm <= settings.residual_tolerance).then_some(t)
}
