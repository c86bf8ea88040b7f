//! Total-degree homotopy continuation
//!
//! Tracks the roots of the start system G_i(z) = z_i^{D_i} - 1 to those of the
//! gradient system F along
//!
//! H(z, s) = (1 - s) * gamma * G(z) + s * F(z),  s: 0 -> 1
//!
//! with a fixed complex `gamma` off the real axis, so that paths avoid
//! singularities for all but a measure-zero set of systems. Paths diverging
//! to infinity are dropped; real endpoints are polished on the real system.
//! A path that stalls at finite distance, or a real endpoint in the box that
//! does not polish, fails the whole solve so the caller can fall back.

use super::backend::SolverBackend;
use super::newton::{polish, NewtonSettings, REFERENCE_BOUND};
use super::types::SolverConfig;
use crate::error::{PolycritError, Result};
use crate::system::{significant_terms, AlgebraicSystem};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use num_traits::{One, Zero};
use std::f64::consts::PI;

type C64 = Complex<f64>;

const INITIAL_STEP: f64 = 0.01;
const MAX_STEP: f64 = 0.1;
const MIN_STEP: f64 = 1e-8;
const STEP_GROWTH: f64 = 1.5;
const CORRECTOR_ITERATIONS: usize = 5;
const CORRECTOR_TOLERANCE: f64 = 1e-10;
const ENDGAME_ITERATIONS: usize = 20;
const DIVERGENCE_RADIUS: f64 = 1e8;
/// A stalled path this far out is heading to infinity
const ESCAPE_RADIUS: f64 = 1e3;

/// Fixed gamma = exp(i * 2 pi * 0.6180339887)
fn gamma() -> C64 {
    Complex::from_polar(1.0, 2.0 * PI * 0.618_033_988_7)
}

/// Sparse Chebyshev equation evaluable at complex points
struct ComplexEquation {
    terms: Vec<(Vec<usize>, f64)>,
    /// Largest per-axis degree
    max_degree: Vec<usize>,
}

impl ComplexEquation {
    fn new(terms: Vec<(Vec<usize>, f64)>, dim: usize) -> Self {
        let mut max_degree = vec![0; dim];
        for (index, _) in &terms {
            for (m, &k) in max_degree.iter_mut().zip(index) {
                *m = (*m).max(k);
            }
        }
        Self { terms, max_degree }
    }

    /// Value and gradient at `z`
    fn evaluate(&self, z: &[C64]) -> (C64, Vec<C64>) {
        let d = z.len();
        // T_k(z_j) and T_k'(z_j) per axis
        let tables: Vec<(Vec<C64>, Vec<C64>)> = z
            .iter()
            .zip(&self.max_degree)
            .map(|(&zj, &n)| chebyshev_table(zj, n + 1))
            .collect();

        let mut value = C64::zero();
        let mut grad = vec![C64::zero(); d];
        for (index, c) in &self.terms {
            let mut product = C64::new(*c, 0.0);
            for (j, &k) in index.iter().enumerate() {
                product *= tables[j].0[k];
            }
            value += product;
            for (axis, g) in grad.iter_mut().enumerate() {
                let mut partial = C64::new(*c, 0.0);
                for (j, &k) in index.iter().enumerate() {
                    partial *= if j == axis {
                        tables[j].1[k]
                    } else {
                        tables[j].0[k]
                    };
                }
                *g += partial;
            }
        }
        (value, grad)
    }
}

/// T_0..T_{n-1} and their derivatives at complex `z`
fn chebyshev_table(z: C64, n: usize) -> (Vec<C64>, Vec<C64>) {
    let zero = C64::zero();
    let one = C64::one();
    let mut t = vec![zero; n];
    let mut dt = vec![zero; n];
    t[0] = one;
    if n > 1 {
        t[1] = z;
        dt[1] = one;
    }
    for k in 1..n.saturating_sub(1) {
        t[k + 1] = z * t[k] * 2.0 - t[k - 1];
        dt[k + 1] = (t[k] + z * dt[k]) * 2.0 - dt[k - 1];
    }
    (t, dt)
}

/// How a tracked path ended
enum PathEnd {
    Finite(Vec<C64>),
    Diverged,
    /// Step underflow or non-converged endgame at finite distance
    Lost { s: f64 },
}

fn stalled(z: &[C64], s: f64) -> PathEnd {
    if z.iter().any(|v| !v.is_finite() || v.norm() > ESCAPE_RADIUS) {
        PathEnd::Diverged
    } else {
        PathEnd::Lost { s }
    }
}

/// H(z, s), dH/dz and dH/ds
struct Homotopy {
    equations: Vec<ComplexEquation>,
    degrees: Vec<usize>,
    gamma: C64,
}

impl Homotopy {
    fn start(&self, z: &[C64]) -> (Vec<C64>, Vec<C64>) {
        // G_i = z_i^{D_i} - 1 and dG_i/dz_i
        z.iter()
            .zip(&self.degrees)
            .map(|(&zi, &deg)| {
                let power = zi.powu(deg as u32 - 1);
                (power * zi - 1.0, power * deg as f64)
            })
            .unzip()
    }

    fn eval(&self, z: &[C64], s: f64) -> (DVector<C64>, DMatrix<C64>, DVector<C64>) {
        let d = z.len();
        let (g, dg) = self.start(z);
        let mut h = DVector::<C64>::zeros(d);
        let mut jac = DMatrix::<C64>::zeros(d, d);
        let mut ds = DVector::<C64>::zeros(d);
        for (i, eq) in self.equations.iter().enumerate() {
            let (f, df) = eq.evaluate(z);
            let scaled_g = self.gamma * g[i];
            h[i] = scaled_g * (1.0 - s) + f * s;
            ds[i] = f - scaled_g;
            for (j, dfj) in df.iter().enumerate() {
                jac[(i, j)] = *dfj * s;
            }
            jac[(i, i)] += self.gamma * dg[i] * (1.0 - s);
        }
        (h, jac, ds)
    }

    /// Newton on H(., s) from `z`; returns the corrected point when converged
    fn correct(&self, z: &[C64], s: f64, iterations: usize) -> Option<Vec<C64>> {
        let mut z = z.to_vec();
        for _ in 0..iterations {
            let (h, jac, _) = self.eval(&z, s);
            let step = jac.lu().solve(&h)?;
            let z_norm = z.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
            for (zi, si) in z.iter_mut().zip(step.iter()) {
                *zi -= *si;
            }
            if step.norm() <= CORRECTOR_TOLERANCE * (1.0 + z_norm) {
                return Some(z);
            }
        }
        None
    }

    /// Track one path from s = 0 to s = 1
    fn track(&self, start: Vec<C64>) -> PathEnd {
        let mut z = start;
        let mut s = 0.0;
        let mut step = INITIAL_STEP;

        while s < 1.0 {
            let ds = step.min(1.0 - s);
            // Euler predictor: dz/ds = -H_z^{-1} H_s
            let (_, jac, h_s) = self.eval(&z, s);
            let Some(tangent) = jac.lu().solve(&h_s) else {
                step *= 0.5;
                if step < MIN_STEP {
                    return stalled(&z, s);
                }
                continue;
            };
            let predicted: Vec<C64> = z
                .iter()
                .zip(tangent.iter())
                .map(|(zi, ti)| *zi - *ti * ds)
                .collect();

            match self.correct(&predicted, s + ds, CORRECTOR_ITERATIONS) {
                Some(corrected) => {
                    z = corrected;
                    s += ds;
                    step = (step * STEP_GROWTH).min(MAX_STEP);
                    if z.iter().any(|v| !v.is_finite() || v.norm() > DIVERGENCE_RADIUS) {
                        return PathEnd::Diverged;
                    }
                }
                None => {
                    step *= 0.5;
                    if step < MIN_STEP {
                        return stalled(&z, s);
                    }
                }
            }
        }
        match self.correct(&z, 1.0, ENDGAME_ITERATIONS) {
            Some(end) => PathEnd::Finite(end),
            None => stalled(&z, 1.0),
        }
    }
}

/// Roots of the start system, enumerated over the Cartesian product of the
/// per-equation roots of unity
fn start_points(degrees: &[usize]) -> Vec<Vec<C64>> {
    let mut points = vec![Vec::new()];
    for &deg in degrees {
        let roots: Vec<C64> = (0..deg)
            .map(|k| Complex::from_polar(1.0, 2.0 * PI * k as f64 / deg as f64))
            .collect();
        points = points
            .into_iter()
            .flat_map(|prefix| {
                roots.iter().map(move |&r| {
                    let mut next = prefix.clone();
                    next.push(r);
                    next
                })
            })
            .collect();
    }
    points
}

pub(crate) struct HomotopyContinuation;

impl SolverBackend for HomotopyContinuation {
    fn name(&self) -> &'static str {
        "homotopy"
    }

    fn find_roots(&self, system: &AlgebraicSystem, config: &SolverConfig) -> Result<Vec<Vec<f64>>> {
        let d = system.dim();
        let mut equations = Vec::with_capacity(d);
        let mut degrees = Vec::with_capacity(d);
        for partial in system.partials() {
            let (terms, degree) = significant_terms(partial);
            equations.push(ComplexEquation::new(terms, d));
            degrees.push(degree);
        }
        if degrees.contains(&0) {
            // A nonzero constant equation has no roots
            return Ok(Vec::new());
        }

        let paths = degrees
            .iter()
            .try_fold(1usize, |acc, &deg| acc.checked_mul(deg))
            .filter(|&n| n <= config.max_paths)
            .ok_or_else(|| {
                PolycritError::solve_failure(
                    self.name(),
                    format!(
                        "total-degree bound {:?} exceeds max_paths = {}",
                        degrees, config.max_paths
                    ),
                )
            })?;

        let homotopy = Homotopy {
            equations,
            degrees: degrees.clone(),
            gamma: gamma(),
        };
        let mut endpoints = Vec::new();
        let mut diverged = 0usize;
        let mut lost = Vec::new();
        for start in start_points(&degrees) {
            match homotopy.track(start) {
                PathEnd::Finite(z) => endpoints.push(z),
                PathEnd::Diverged => diverged += 1,
                PathEnd::Lost { s } => lost.push(s),
            }
        }

        let settings = NewtonSettings {
            max_iterations: config.newton_max_iterations,
            step_tolerance: config.newton_step_tolerance,
            residual_tolerance: config.residual_tolerance * system.scale(),
        };
        let candidates: Vec<Vec<f64>> = endpoints
            .iter()
            .filter(|z| {
                z.iter()
                    .all(|v| v.im.abs() <= config.imag_tolerance * v.norm().max(1.0))
            })
            .map(|z| z.iter().map(|v| v.re).collect::<Vec<f64>>())
            .filter(|t| t.iter().all(|ti| ti.abs() <= REFERENCE_BOUND))
            .collect();
        let roots: Vec<Vec<f64>> = candidates
            .iter()
            .filter_map(|t| polish(system, t, &settings))
            .collect();
        let unpolished = candidates.len() - roots.len();

        log::debug!(
            "homotopy: {} paths, {} finite endpoints, {} diverged, {} lost, {} real roots",
            paths,
            endpoints.len(),
            diverged,
            lost.len(),
            roots.len()
        );
        if !lost.is_empty() || unpolished > 0 {
            let earliest = lost.iter().copied().fold(1.0, f64::min);
            return Err(PolycritError::solve_failure(
                self.name(),
                format!(
                    "{} of {} paths failed ({} stalled, earliest at s = {:.3e}; {} real endpoints did not polish)",
                    lost.len() + unpolished,
                    paths,
                    lost.len(),
                    earliest,
                    unpolished
                ),
            ));
        }
        Ok(roots)
    }
}
