//! Common test utilities
#![allow(dead_code)]

use polycrit_rust::*;

/// Simple deterministic pseudo-random number generator (LCG)
///
/// Uses the common parameters a = 1664525, c = 1013904223 (Numerical Recipes).
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next f64 in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Next f64 in [lo, hi)
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

pub fn runge(x: &[f64]) -> f64 {
    1.0 / (1.0 + 25.0 * x[0] * x[0])
}

/// (x^2 + y^2 - 1)^2 + 0.05 (sin 8x + cos 8y)
pub fn perturbed_ring(x: &[f64]) -> f64 {
    let r2 = x[0] * x[0] + x[1] * x[1];
    (r2 - 1.0).powi(2) + 0.05 * ((8.0 * x[0]).sin() + (8.0 * x[1]).cos())
}

/// Fit `objective` on a fresh grid
pub fn fit<O: Objective>(
    domain: &Domain,
    objective: &O,
    node_counts: &[usize],
    degree: &[usize],
    basis: Basis,
) -> PolynomialApproximant {
    let grid = make_grid(domain, node_counts, basis).unwrap();
    construct(domain, &grid, objective, degree, PrecisionMode::Float64).unwrap()
}

pub fn radius(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}
