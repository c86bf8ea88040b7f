//! One-dimensional polynomial bases on the reference interval [-1, 1]
//!
//! All three families obey a three-term recurrence
//!
//! phi_{k+1}(t) = alpha_k * t * phi_k(t) - beta_k * phi_{k-1}(t)
//!
//! which is used for values and, by differentiating the recurrence, for first
//! and second derivatives.

use crate::gauss::{chebyshev_lobatto, legendre, uniform, Rule};
use crate::numeric::CustomNumeric;
use mdarray::DTensor;
use std::fmt;

/// Polynomial basis family
///
/// The basis also fixes the sampling rule of the grid:
/// Chebyshev extrema, Gauss-Legendre nodes or equispaced nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Basis {
    /// Chebyshev polynomials T_k sampled at Chebyshev-Lobatto points
    Chebyshev,
    /// Legendre polynomials P_k sampled at Gauss-Legendre points
    Legendre,
    /// Monomials t^k sampled at equispaced points
    Uniform,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Basis::Chebyshev => "chebyshev",
            Basis::Legendre => "legendre",
            Basis::Uniform => "uniform",
        };
        f.write_str(name)
    }
}

impl Basis {
    /// Recurrence coefficients (alpha_k, beta_k) producing phi_{k+1}
    fn recurrence(&self, k: usize) -> (f64, f64) {
        match self {
            Basis::Chebyshev => {
                if k == 0 {
                    (1.0, 0.0)
                } else {
                    (2.0, 1.0)
                }
            }
            Basis::Legendre => {
                let kf = k as f64;
                ((2.0 * kf + 1.0) / (kf + 1.0), kf / (kf + 1.0))
            }
            Basis::Uniform => (1.0, 0.0),
        }
    }

    /// Quadrature rule with `n_points` nodes matching this basis
    pub fn rule(&self, n_points: usize) -> Rule<f64> {
        match self {
            Basis::Chebyshev => chebyshev_lobatto(n_points),
            Basis::Legendre => legendre(n_points),
            Basis::Uniform => uniform(n_points),
        }
    }

    /// Evaluate phi_0(t), ..., phi_{n-1}(t)
    pub fn evaluate<T: CustomNumeric>(&self, t: T, n: usize) -> Vec<T> {
        let mut p = Vec::with_capacity(n);
        if n == 0 {
            return p;
        }
        p.push(T::one());
        for k in 0..n.saturating_sub(1) {
            let (alpha, beta) = self.recurrence(k);
            let prev = if k == 0 { T::zero() } else { p[k - 1] };
            let next = T::from_f64(alpha) * t * p[k] - T::from_f64(beta) * prev;
            p.push(next);
        }
        p
    }

    /// Evaluate values, first and second derivatives of phi_0..phi_{n-1} at t
    pub fn evaluate_with_derivatives(&self, t: f64, n: usize) -> BasisValues {
        let mut values = vec![0.0; n];
        let mut first = vec![0.0; n];
        let mut second = vec![0.0; n];
        if n == 0 {
            return BasisValues {
                values,
                first,
                second,
            };
        }
        values[0] = 1.0;
        for k in 0..n - 1 {
            let (alpha, beta) = self.recurrence(k);
            let (p_prev, d_prev, dd_prev) = if k == 0 {
                (0.0, 0.0, 0.0)
            } else {
                (values[k - 1], first[k - 1], second[k - 1])
            };
            values[k + 1] = alpha * t * values[k] - beta * p_prev;
            first[k + 1] = alpha * (values[k] + t * first[k]) - beta * d_prev;
            second[k + 1] = alpha * (2.0 * first[k] + t * second[k]) - beta * dd_prev;
        }
        BasisValues {
            values,
            first,
            second,
        }
    }

    /// Coefficients of d/dt of sum_k c_k phi_k, expressed in the same basis.
    ///
    /// The result has one fewer entry than `c` (a single zero for constants).
    pub fn derivative_coefficients<T: CustomNumeric>(&self, c: &[T]) -> Vec<T> {
        let n = c.len();
        if n <= 1 {
            return vec![T::zero()];
        }
        let m = n - 1;
        let mut der = vec![T::zero(); m];
        match self {
            Basis::Uniform => {
                for k in 1..n {
                    der[k - 1] = T::from_f64(k as f64) * c[k];
                }
            }
            Basis::Chebyshev => {
                // Backward recurrence: c'_{k-1} = c'_{k+1} + 2k c_k, then halve c'_0
                let mut last = T::zero();
                let mut before_last = T::zero();
                for k in (1..n).rev() {
                    let value = before_last + T::from_f64(2.0 * k as f64) * c[k];
                    der[k - 1] = value;
                    before_last = last;
                    last = value;
                }
                der[0] = der[0] / T::from_f64(2.0);
            }
            Basis::Legendre => {
                let mut work = c.to_vec();
                for j in (3..=m).rev() {
                    der[j - 1] = T::from_f64(2.0 * j as f64 - 1.0) * work[j];
                    work[j - 2] = work[j - 2] + work[j];
                }
                if m > 1 {
                    der[1] = T::from_f64(3.0) * work[2];
                }
                der[0] = work[1];
            }
        }
        der
    }

    /// Monomial coefficients of phi_0..phi_{n-1}: entry [j, k] is the t^j
    /// coefficient of phi_k.
    pub fn monomial_matrix(&self, n: usize) -> DTensor<f64, 2> {
        let mut m = DTensor::<f64, 2>::from_elem([n, n], 0.0);
        if n == 0 {
            return m;
        }
        m[[0, 0]] = 1.0;
        for k in 0..n - 1 {
            let (alpha, beta) = self.recurrence(k);
            for j in 0..n {
                let shifted = if j == 0 { 0.0 } else { alpha * m[[j - 1, k]] };
                let prev = if k == 0 { 0.0 } else { beta * m[[j, k - 1]] };
                m[[j, k + 1]] = shifted - prev;
            }
        }
        m
    }

    /// Vandermonde-type matrix V[i, k] = phi_k(x_i)
    pub fn vandermonde<T: CustomNumeric>(&self, x: &[T], n_terms: usize) -> DTensor<T, 2> {
        let rows: Vec<Vec<T>> = x.iter().map(|&xi| self.evaluate(xi, n_terms)).collect();
        DTensor::<T, 2>::from_fn([x.len(), n_terms], |idx| rows[idx[0]][idx[1]])
    }
}

/// Basis values with first and second derivatives at one point
#[derive(Debug, Clone)]
pub struct BasisValues {
    pub values: Vec<f64>,
    pub first: Vec<f64>,
    pub second: Vec<f64>,
}

impl BasisValues {
    /// Select the vector for the requested derivative order (0, 1 or 2)
    pub fn order(&self, order: usize) -> &[f64] {
        match order {
            0 => &self.values,
            1 => &self.first,
            _ => &self.second,
        }
    }
}

#[cfg(test)]
#[path = "basis_tests.rs"]
mod tests;
