//! Polynomial approximants of sampled objectives
//!
//! [`construct`] samples an objective on a [`SampleGrid`] and fits a
//! tensor-product polynomial of bounded per-dimension degree by weighted least
//! squares. The weighted residual of that fit, with domain-scaled weights, is a
//! quadrature estimate of the L2 error over the box.

use crate::basis::Basis;
use crate::domain::Domain;
use crate::error::{PolycritError, Result, Stage};
use crate::fitter::TensorFitter;
use crate::grid::SampleGrid;
use crate::objective::Objective;
use crate::polynomial::{DomainPolynomial, TensorPolynomial};
use crate::precision::PrecisionMode;
use crate::TwoFloat;
use nalgebra::DMatrix;

/// Documented relative tolerance between the quadrature L2 estimate and the
/// Riemann midpoint estimate for well-resolved fits
pub const L2_ESTIMATOR_RTOL: f64 = 0.05;

/// Degree bound and working precision of a fit
#[derive(Debug, Clone, PartialEq)]
pub struct ApproximationConfig {
    pub degree: Vec<usize>,
    pub precision: PrecisionMode,
}

impl ApproximationConfig {
    pub fn new(degree: Vec<usize>) -> Self {
        Self {
            degree,
            precision: PrecisionMode::default(),
        }
    }

    /// Same degree in every dimension
    pub fn isotropic(dim: usize, degree: usize) -> Self {
        Self::new(vec![degree; dim])
    }

    pub fn with_precision(mut self, precision: PrecisionMode) -> Self {
        self.precision = precision;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.degree.is_empty() {
            return Err(PolycritError::invalid("degree", &self.degree));
        }
        Ok(())
    }

    /// Check the degree bound against a grid without touching the objective
    pub fn validate_for(&self, grid: &SampleGrid) -> Result<()> {
        self.validate()?;
        check_degree(&self.degree, grid.node_counts())
    }
}

pub(crate) fn check_degree(degree: &[usize], node_counts: &[usize]) -> Result<()> {
    if degree.len() != node_counts.len() {
        return Err(PolycritError::invalid_with_hint(
            "degree.len()",
            degree.len(),
            format!("grid has dimension {}", node_counts.len()),
        ));
    }
    for (dimension, (&deg, &n)) in degree.iter().zip(node_counts).enumerate() {
        if deg + 1 > n {
            return Err(PolycritError::DegreeTooHigh {
                dimension,
                degree: deg,
                node_count: n,
            });
        }
    }
    Ok(())
}

/// Fitted polynomial surrogate of an objective
#[derive(Debug, Clone)]
pub struct PolynomialApproximant {
    polynomial: DomainPolynomial,
    extended: Option<TensorPolynomial<TwoFloat>>,
    node_counts: Vec<usize>,
    sample_count: usize,
    l2_error: f64,
    requested_precision: PrecisionMode,
    precision: PrecisionMode,
    condition: f64,
}

/// Fit a polynomial of degree bound `degree` to `objective` sampled on `grid`.
///
/// Fails with `DegreeTooHigh` when `degree[i] > node_counts[i] - 1`, before
/// the objective is evaluated.
pub fn construct<O: Objective + ?Sized>(
    domain: &Domain,
    grid: &SampleGrid,
    objective: &O,
    degree: &[usize],
    precision: PrecisionMode,
) -> Result<PolynomialApproximant> {
    check_grid(domain, grid)?;
    check_degree(degree, grid.node_counts())?;

    let values = grid.sample(objective)?;
    fit_samples(grid, &values, degree, precision)
}

/// Fit several degree bounds from one sampling pass.
///
/// Every degree bound is validated before the objective is evaluated.
pub fn degree_sweep<O: Objective + ?Sized>(
    domain: &Domain,
    grid: &SampleGrid,
    objective: &O,
    degrees: &[Vec<usize>],
    precision: PrecisionMode,
) -> Result<Vec<PolynomialApproximant>> {
    check_grid(domain, grid)?;
    for degree in degrees {
        check_degree(degree, grid.node_counts())?;
    }
    let values = grid.sample(objective)?;
    degrees
        .iter()
        .map(|degree| fit_samples(grid, &values, degree, precision))
        .collect()
}

fn check_grid(domain: &Domain, grid: &SampleGrid) -> Result<()> {
    if grid.domain() != domain {
        return Err(PolycritError::invalid_with_hint(
            "grid.domain",
            grid.domain(),
            "the sample grid must be built on the same domain",
        ));
    }
    Ok(())
}

pub(crate) fn fit_samples(
    grid: &SampleGrid,
    values: &[f64],
    degree: &[usize],
    requested_precision: PrecisionMode,
) -> Result<PolynomialApproximant> {
    let fitter = TensorFitter::new(grid.basis(), grid.reference_rules(), degree)?;
    let condition = fitter.condition_product();
    let output = fitter.fit(values, requested_precision)?;

    let shape = fitter.n_terms().to_vec();
    let jacobian: f64 = grid.domain().half_widths().iter().product();
    let l2_error = output.weighted_residual * jacobian.sqrt();

    let reference = TensorPolynomial::new(grid.basis(), shape.clone(), output.coeffs);
    let extended = output
        .extended
        .map(|coeffs| TensorPolynomial::new(grid.basis(), shape, coeffs));

    log::info!(
        "fitted {} polynomial of degree {:?} on {} samples: L2 error {:.3e} ({})",
        grid.basis(),
        degree,
        values.len(),
        l2_error,
        output.precision
    );

    Ok(PolynomialApproximant {
        polynomial: DomainPolynomial::new(grid.domain().clone(), reference),
        extended,
        node_counts: grid.node_counts().to_vec(),
        sample_count: values.len(),
        l2_error,
        requested_precision,
        precision: output.precision,
        condition,
    })
}

impl PolynomialApproximant {
    pub fn polynomial(&self) -> &DomainPolynomial {
        &self.polynomial
    }

    pub fn domain(&self) -> &Domain {
        self.polynomial.domain()
    }

    pub fn basis(&self) -> Basis {
        self.polynomial.reference().basis()
    }

    pub fn dim(&self) -> usize {
        self.polynomial.dim()
    }

    pub fn degree(&self) -> Vec<usize> {
        self.polynomial.reference().degree()
    }

    /// Coefficients of the f64 representation, row-major by multi-index
    pub fn coefficients(&self) -> &[f64] {
        self.polynomial.reference().coeffs()
    }

    /// Double-double coefficients, present for `DoubleDouble` fits
    pub fn extended_coefficients(&self) -> Option<&TensorPolynomial<TwoFloat>> {
        self.extended.as_ref()
    }

    pub fn node_counts(&self) -> &[usize] {
        &self.node_counts
    }

    /// Number of objective evaluations behind the fit
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Quadrature estimate of the L2 error over the domain
    pub fn l2_error(&self) -> f64 {
        self.l2_error
    }

    /// Precision the fit was requested in
    pub fn requested_precision(&self) -> PrecisionMode {
        self.requested_precision
    }

    /// Precision the fit actually used (`Adaptive` resolved)
    pub fn precision(&self) -> PrecisionMode {
        self.precision
    }

    /// Product of per-dimension weighted Vandermonde condition numbers
    pub fn condition_estimate(&self) -> f64 {
        self.condition
    }

    pub fn total_coefficients(&self) -> usize {
        self.polynomial.reference().len()
    }

    pub fn nonzero_count(&self) -> usize {
        self.polynomial.reference().nonzero_count()
    }

    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.polynomial.evaluate(x)
    }

    pub fn gradient(&self, x: &[f64]) -> Vec<f64> {
        self.polynomial.gradient(x)
    }

    pub fn hessian(&self, x: &[f64]) -> DMatrix<f64> {
        self.polynomial.hessian(x)
    }

    /// Same polynomial with monomial coefficients
    pub fn to_monomial(&self) -> Result<DomainPolynomial> {
        self.polynomial.to_monomial()
    }

    /// L2 error against `objective` using the nodes and weights of another grid
    pub fn l2_error_against<O: Objective + ?Sized>(
        &self,
        objective: &O,
        reference_grid: &SampleGrid,
    ) -> Result<f64> {
        if reference_grid.dim() != self.dim() {
            return Err(PolycritError::invalid_with_hint(
                "reference_grid.dim()",
                reference_grid.dim(),
                format!("approximant has dimension {}", self.dim()),
            ));
        }
        let values = reference_grid.sample(objective)?;
        let sum: f64 = reference_grid
            .points()
            .zip(&values)
            .zip(reference_grid.weights())
            .map(|((x, f), w)| {
                let r = f - self.evaluate(&x);
                w * r * r
            })
            .sum();
        finite_l2(sum)
    }

    /// Riemann midpoint estimate of the L2 error with `points_per_dim` cells
    /// per dimension
    pub fn riemann_l2_error<O: Objective + ?Sized>(
        &self,
        objective: &O,
        points_per_dim: usize,
    ) -> Result<f64> {
        if points_per_dim == 0 {
            return Err(PolycritError::invalid("points_per_dim", points_per_dim));
        }
        let d = self.dim();
        let domain = self.domain();
        let total = points_per_dim.checked_pow(d as u32).ok_or_else(|| {
            PolycritError::invalid_with_hint(
                "points_per_dim",
                points_per_dim,
                "midpoint grid size overflows usize",
            )
        })?;
        let cell = 2.0 / points_per_dim as f64;

        let mut t = vec![0.0; d];
        let mut sum = 0.0;
        for flat in 0..total {
            let mut rest = flat;
            for axis in (0..d).rev() {
                t[axis] = -1.0 + cell * ((rest % points_per_dim) as f64 + 0.5);
                rest /= points_per_dim;
            }
            let x = domain.from_reference(&t);
            let f = objective.evaluate(&x);
            if !f.is_finite() {
                return Err(PolycritError::instability(
                    Stage::Sampling,
                    format!("objective returned {} at {:?}", f, x),
                ));
            }
            let r = f - self.evaluate(&x);
            sum += r * r;
        }
        finite_l2(sum * domain.volume() / total as f64)
    }
}

fn finite_l2(sum_of_squares: f64) -> Result<f64> {
    let value = sum_of_squares.max(0.0).sqrt();
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PolycritError::instability(
            Stage::Approximation,
            "non-finite L2 error estimate",
        ))
    }
}

#[cfg(test)]
#[path = "approximant_tests.rs"]
mod tests;
