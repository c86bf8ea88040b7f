//! Subdivision with Chebyshev range bounds
//!
//! On a sub-box, each partial is re-expanded in the Chebyshev basis of that
//! box. If the constant coefficient dominates the sum of all other
//! magnitudes, the partial cannot vanish there and the box is excluded.
//! Surviving leaves seed Gauss-Newton polishing from their centres.

use super::backend::SolverBackend;
use super::newton::{polish, NewtonSettings};
use super::types::SolverConfig;
use crate::basis::Basis;
use crate::error::{PolycritError, Result};
use crate::numeric::CustomNumeric;
use crate::polynomial::TensorPolynomial;
use crate::system::AlgebraicSystem;
use mdarray::DTensor;
use std::f64::consts::PI;

/// Rounding slack of the exclusion test, in units of eps * sum|c|
const EXCLUSION_SLACK: f64 = 64.0;

#[derive(Debug, Clone)]
struct SubBox {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl SubBox {
    fn center(&self) -> Vec<f64> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(a, b)| 0.5 * (a + b))
            .collect()
    }

    fn split(&self, min_width: f64) -> Vec<SubBox> {
        let mut children = vec![self.clone()];
        for axis in 0..self.lower.len() {
            let (a, b) = (self.lower[axis], self.upper[axis]);
            if b - a <= min_width {
                continue;
            }
            let mid = 0.5 * (a + b);
            children = children
                .into_iter()
                .flat_map(|child| {
                    let mut left = child.clone();
                    let mut right = child;
                    left.upper[axis] = mid;
                    right.lower[axis] = mid;
                    [left, right]
                })
                .collect();
        }
        children
    }
}

/// Matrix taking Chebyshev coefficients on [-1, 1] to Chebyshev coefficients
/// on [a, b], for `n` terms: interpolation at the Chebyshev-Lobatto points of
/// [a, b] followed by the discrete cosine inversion.
fn restriction(n: usize, a: f64, b: f64) -> DTensor<f64, 2> {
    if n == 1 {
        return DTensor::<f64, 2>::from_elem([1, 1], 1.0);
    }
    let last = n - 1;
    let nf = last as f64;
    let mid = 0.5 * (a + b);
    let half = 0.5 * (b - a);
    let nodes: Vec<f64> = (0..n).map(|m| (PI * m as f64 / nf).cos()).collect();
    let values = Basis::Chebyshev.vandermonde(
        &nodes.iter().map(|s| mid + half * s).collect::<Vec<_>>(),
        n,
    );
    let halve = |i: usize| if i == 0 || i == last { 0.5 } else { 1.0 };
    let inversion = DTensor::<f64, 2>::from_fn([n, n], |idx| {
        let (k, m) = (idx[0], idx[1]);
        2.0 / nf * halve(k) * halve(m) * (PI * (k * m) as f64 / nf).cos()
    });

    DTensor::<f64, 2>::from_fn([n, n], |idx| {
        (0..n)
            .map(|m| inversion[[idx[0], m]] * values[[m, idx[1]]])
            .sum()
    })
}

/// Whether `partial` is bounded away from zero on `sub`
fn excludes(partial: &TensorPolynomial<f64>, sub: &SubBox) -> bool {
    let operators: Vec<DTensor<f64, 2>> = partial
        .shape()
        .iter()
        .enumerate()
        .map(|(axis, &n)| restriction(n, sub.lower[axis], sub.upper[axis]))
        .collect();
    let (coeffs, _) = partial.apply_per_axis(&operators);
    let total: f64 = coeffs.iter().map(|c| c.abs()).sum();
    let rest = total - coeffs[0].abs();
    coeffs[0].abs() > rest + EXCLUSION_SLACK * <f64 as CustomNumeric>::epsilon() * total
}

pub(crate) struct Subdivision;

impl SolverBackend for Subdivision {
    fn name(&self) -> &'static str {
        "subdivision"
    }

    fn find_roots(&self, system: &AlgebraicSystem, config: &SolverConfig) -> Result<Vec<Vec<f64>>> {
        let d = system.dim();
        let mut pending = vec![SubBox {
            lower: vec![-1.0; d],
            upper: vec![1.0; d],
        }];
        let mut leaves = Vec::new();
        let mut examined = 0usize;

        while let Some(sub) = pending.pop() {
            examined += 1;
            if examined > config.max_boxes {
                return Err(PolycritError::solve_failure(
                    self.name(),
                    format!(
                        "exceeded max_boxes = {} with {} leaves found",
                        config.max_boxes,
                        leaves.len()
                    ),
                ));
            }
            if system.partials().iter().any(|p| excludes(p, &sub)) {
                continue;
            }
            let children = sub.split(config.min_box_width);
            if children.len() == 1 {
                leaves.push(sub);
            } else {
                pending.extend(children);
            }
        }

        let settings = NewtonSettings {
            max_iterations: config.newton_max_iterations,
            step_tolerance: config.newton_step_tolerance,
            residual_tolerance: config.residual_tolerance * system.scale(),
        };
        let roots: Vec<Vec<f64>> = leaves
            .iter()
            .filter_map(|leaf| polish(system, &leaf.center(), &settings))
            .collect();

        log::debug!(
            "subdivision examined {} boxes, {} leaves, {} converged",
            examined,
            leaves.len(),
            roots.len()
        );
        // Range bounds over-approximate, so a single failed leaf is routine;
        // every leaf failing leaves the root set unresolved
        if roots.is_empty() && !leaves.is_empty() {
            return Err(PolycritError::solve_failure(
                self.name(),
                format!(
                    "all {} surviving leaves failed to converge (min_box_width = {:e})",
                    leaves.len(),
                    config.min_box_width
                ),
            ));
        }
        Ok(roots)
    }
}
