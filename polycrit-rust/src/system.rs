//! Gradient systems of fitted polynomials
//!
//! An [`AlgebraicSystem`] holds the `d` partial derivatives of a polynomial,
//! in domain units, as Chebyshev series on the reference cube. Solver backends
//! work in reference coordinates; the domain maps roots back.

use crate::approximant::PolynomialApproximant;
use crate::basis::Basis;
use crate::domain::Domain;
use crate::error::{PolycritError, Result};
use crate::polynomial::{multi_index, DomainPolynomial, TensorPolynomial};
use crate::sparsify::SparsificationResult;
use nalgebra::DMatrix;

/// Relative magnitude below which a coefficient does not count towards the
/// degree of an equation
pub const DEGREE_CUTOFF: f64 = 1e-12;

/// Ordered list of partial-derivative polynomials
#[derive(Debug, Clone)]
pub struct AlgebraicSystem {
    domain: Domain,
    partials: Vec<TensorPolynomial<f64>>,
}

impl AlgebraicSystem {
    /// Differentiate `polynomial` along every axis.
    ///
    /// Fails with `SystemSolve` when some partial vanishes identically (up to
    /// the rounding of the fit), since the critical set is then not isolated.
    pub fn from_polynomial(polynomial: &DomainPolynomial) -> Result<Self> {
        let reference = polynomial.reference();
        let scale = reference.max_abs_coeff();
        let mut partials = Vec::with_capacity(polynomial.dim());

        for (axis, &h) in polynomial.domain().half_widths().iter().enumerate() {
            let derivative = reference.derivative(axis);
            let n = reference.shape()[axis] as f64;
            let noise = 64.0 * f64::EPSILON * scale * n * n;
            if derivative.max_abs_coeff() <= noise {
                return Err(PolycritError::solve_failure(
                    "system",
                    format!(
                        "ill-posed system: partial derivative along axis {} vanishes identically",
                        axis
                    ),
                ));
            }
            partials.push(derivative.convert_basis(Basis::Chebyshev)?.scaled(1.0 / h));
        }

        Ok(Self {
            domain: polynomial.domain().clone(),
            partials,
        })
    }

    pub fn from_approximant(approximant: &PolynomialApproximant) -> Result<Self> {
        Self::from_polynomial(approximant.polynomial())
    }

    pub fn from_sparsification(result: &SparsificationResult) -> Result<Self> {
        Self::from_polynomial(result.polynomial())
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn dim(&self) -> usize {
        self.partials.len()
    }

    /// Chebyshev partials on the reference cube
    pub fn partials(&self) -> &[TensorPolynomial<f64>] {
        &self.partials
    }

    /// Gradient (domain units) at reference point `t`
    pub fn residual(&self, t: &[f64]) -> Vec<f64> {
        self.partials.iter().map(|p| p.evaluate(t)).collect()
    }

    /// Jacobian of [`residual`](Self::residual) with respect to `t`
    pub fn jacobian(&self, t: &[f64]) -> DMatrix<f64> {
        let d = self.dim();
        let mut jac = DMatrix::<f64>::zeros(d, d);
        for (i, p) in self.partials.iter().enumerate() {
            for (j, g) in p.gradient(t).into_iter().enumerate() {
                jac[(i, j)] = g;
            }
        }
        jac
    }

    /// Upper bound of |g_i| over the cube, maximized over equations
    pub fn scale(&self) -> f64 {
        self.partials
            .iter()
            .map(|p| p.coeffs().iter().map(|c| c.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Total degree of each equation, ignoring coefficients below
    /// `DEGREE_CUTOFF` relative to the largest one
    pub fn total_degrees(&self) -> Vec<usize> {
        self.partials.iter().map(|p| significant_terms(p).1).collect()
    }

    /// Nonzero coefficient count over all equations
    pub fn term_count(&self) -> usize {
        self.partials.iter().map(|p| p.nonzero_count()).sum()
    }
}

/// Significant (multi-index, coefficient) pairs of a polynomial and their
/// maximal total degree
pub(crate) fn significant_terms(p: &TensorPolynomial<f64>) -> (Vec<(Vec<usize>, f64)>, usize) {
    let cutoff = DEGREE_CUTOFF * p.max_abs_coeff();
    let mut degree = 0;
    let terms: Vec<(Vec<usize>, f64)> = p
        .coeffs()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.abs() > cutoff)
        .map(|(flat, &c)| {
            let index = multi_index(flat, p.shape());
            degree = degree.max(index.iter().sum());
            (index, c)
        })
        .collect();
    (terms, degree)
}
