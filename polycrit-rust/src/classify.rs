//! Critical point classification by Hessian spectrum
//!
//! Each root moves through three states:
//!
//! `RawCriticalPoint` (coordinates and values) -> `HessianEvaluation`
//! (symmetric Hessian and its ascending eigenvalues) -> `CriticalPoint`
//! (label, valley dimension, conditioning flags).

use crate::domain::Domain;
use crate::error::{PolycritError, Result, Stage};
use crate::objective::{finite_difference_hessian, Objective};
use crate::polynomial::DomainPolynomial;
use nalgebra::DMatrix;
use std::fmt;

/// Critical point label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum CriticalKind {
    Minimum,
    Maximum,
    Saddle,
    /// Some eigenvalue is negligible: a valley, ridge or flat direction
    Degenerate,
}

impl fmt::Display for CriticalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CriticalKind::Minimum => "minimum",
            CriticalKind::Maximum => "maximum",
            CriticalKind::Saddle => "saddle",
            CriticalKind::Degenerate => "degenerate",
        };
        f.write_str(name)
    }
}

/// Where Hessians come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum HessianSource {
    /// Analytic Hessian of the fitted polynomial
    #[default]
    Polynomial,
    /// The objective's own Hessian, or central finite differences of it
    Objective,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationConfig {
    pub hessian_source: HessianSource,
    /// Eigenvalues with |lambda| <= valley_tolerance * max|lambda| count as zero
    pub valley_tolerance: f64,
    /// Condition numbers above this mark a point as fragile
    pub max_condition: f64,
    /// Finite-difference step relative to each half-width
    pub fd_step: f64,
    /// Relative tolerance of the on-boundary test
    pub boundary_tolerance: f64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            hessian_source: HessianSource::Polynomial,
            valley_tolerance: 1e-2,
            max_condition: 1e8,
            fd_step: 1e-4,
            boundary_tolerance: 1e-8,
        }
    }
}

impl ClassificationConfig {
    pub fn with_hessian_source(mut self, source: HessianSource) -> Self {
        self.hessian_source = source;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.valley_tolerance.is_finite() && (0.0..1.0).contains(&self.valley_tolerance)) {
            return Err(PolycritError::invalid_with_hint(
                "valley_tolerance",
                self.valley_tolerance,
                "must lie in [0, 1)",
            ));
        }
        if !(self.max_condition > 1.0) {
            return Err(PolycritError::invalid("max_condition", self.max_condition));
        }
        if !(self.fd_step.is_finite() && self.fd_step > 0.0) {
            return Err(PolycritError::invalid("fd_step", self.fd_step));
        }
        if !(self.boundary_tolerance.is_finite() && self.boundary_tolerance >= 0.0) {
            return Err(PolycritError::invalid(
                "boundary_tolerance",
                self.boundary_tolerance,
            ));
        }
        Ok(())
    }
}

/// A root of the gradient system with its values
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RawCriticalPoint {
    pub coordinates: Vec<f64>,
    pub polynomial_value: f64,
    pub objective_value: Option<f64>,
    /// Euclidean norm of the polynomial gradient
    pub gradient_norm: f64,
}

impl RawCriticalPoint {
    pub fn new(
        polynomial: &DomainPolynomial,
        coordinates: Vec<f64>,
        objective: Option<&dyn Objective>,
    ) -> Self {
        let gradient_norm = polynomial
            .gradient(&coordinates)
            .iter()
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt();
        Self {
            polynomial_value: polynomial.evaluate(&coordinates),
            objective_value: objective.map(|o| o.evaluate(&coordinates)),
            gradient_norm,
            coordinates,
        }
    }
}

/// Raw point with its Hessian
#[derive(Debug, Clone)]
pub struct HessianEvaluation {
    pub point: RawCriticalPoint,
    pub hessian: DMatrix<f64>,
    /// Ascending
    pub eigenvalues: Vec<f64>,
}

/// Compute the Hessian of `raw` from the configured source.
pub fn evaluate_hessian(
    raw: RawCriticalPoint,
    polynomial: &DomainPolynomial,
    objective: Option<&dyn Objective>,
    config: &ClassificationConfig,
) -> Result<HessianEvaluation> {
    let x = &raw.coordinates;
    let hessian = match config.hessian_source {
        HessianSource::Polynomial => polynomial.hessian(x),
        HessianSource::Objective => {
            let objective = objective.ok_or_else(|| {
                PolycritError::invalid_with_hint(
                    "hessian_source",
                    HessianSource::Objective,
                    "an objective is required for objective Hessians",
                )
            })?;
            match objective.hessian(x) {
                Some(h) => h,
                None => {
                    let steps: Vec<f64> = polynomial
                        .domain()
                        .half_widths()
                        .iter()
                        .map(|h| config.fd_step * h)
                        .collect();
                    finite_difference_hessian(objective, x, &steps)
                }
            }
        }
    };

    let d = x.len();
    if hessian.nrows() != d || hessian.ncols() != d {
        return Err(PolycritError::instability(
            Stage::Classification,
            format!(
                "Hessian has shape {}x{}, expected {}x{}",
                hessian.nrows(),
                hessian.ncols(),
                d,
                d
            ),
        ));
    }
    let symmetric = (&hessian + hessian.transpose()) * 0.5;
    if symmetric.iter().any(|v| !v.is_finite()) {
        return Err(PolycritError::instability(
            Stage::Classification,
            format!("non-finite Hessian at {:?}", x),
        ));
    }
    let mut eigenvalues: Vec<f64> = symmetric
        .clone()
        .symmetric_eigen()
        .eigenvalues
        .iter()
        .copied()
        .collect();
    eigenvalues.sort_by(f64::total_cmp);

    Ok(HessianEvaluation {
        point: raw,
        hessian: symmetric,
        eigenvalues,
    })
}

/// Label a spectrum. Returns the kind and the valley dimension.
pub fn classify_eigenvalues(eigenvalues: &[f64], valley_tolerance: f64) -> (CriticalKind, usize) {
    let scale = eigenvalues.iter().fold(0.0f64, |acc, l| acc.max(l.abs()));
    if scale == 0.0 {
        return (CriticalKind::Degenerate, eigenvalues.len());
    }
    let eps = valley_tolerance * scale;
    let flat = eigenvalues.iter().filter(|l| l.abs() <= eps).count();
    if flat > 0 {
        (CriticalKind::Degenerate, flat)
    } else if eigenvalues.iter().all(|&l| l > eps) {
        (CriticalKind::Minimum, 0)
    } else if eigenvalues.iter().all(|&l| l < -eps) {
        (CriticalKind::Maximum, 0)
    } else {
        (CriticalKind::Saddle, 0)
    }
}

/// max|lambda| / min|lambda|, infinite for a singular spectrum
pub fn condition_number(eigenvalues: &[f64]) -> f64 {
    let max = eigenvalues.iter().fold(0.0f64, |acc, l| acc.max(l.abs()));
    let min = eigenvalues
        .iter()
        .fold(f64::INFINITY, |acc, l| acc.min(l.abs()));
    if min == 0.0 || !min.is_finite() {
        f64::INFINITY
    } else {
        max / min
    }
}

/// Labeled critical point
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CriticalPoint {
    pub coordinates: Vec<f64>,
    pub polynomial_value: f64,
    pub objective_value: Option<f64>,
    pub gradient_norm: f64,
    /// Ascending Hessian eigenvalues
    pub eigenvalues: Vec<f64>,
    pub kind: CriticalKind,
    pub valley_dimension: usize,
    pub condition_number: f64,
    pub on_boundary: bool,
    /// Condition number above the configured ceiling
    pub fragile: bool,
}

impl CriticalPoint {
    /// Objective value when known, else the polynomial value
    pub fn value(&self) -> f64 {
        self.objective_value.unwrap_or(self.polynomial_value)
    }
}

/// Attach a label to an evaluated Hessian
pub fn label(
    evaluation: HessianEvaluation,
    domain: &Domain,
    config: &ClassificationConfig,
) -> CriticalPoint {
    let (kind, valley_dimension) =
        classify_eigenvalues(&evaluation.eigenvalues, config.valley_tolerance);
    let condition_number = condition_number(&evaluation.eigenvalues);
    let point = evaluation.point;
    CriticalPoint {
        on_boundary: domain.on_boundary(&point.coordinates, config.boundary_tolerance),
        fragile: condition_number > config.max_condition,
        coordinates: point.coordinates,
        polynomial_value: point.polynomial_value,
        objective_value: point.objective_value,
        gradient_norm: point.gradient_norm,
        eigenvalues: evaluation.eigenvalues,
        kind,
        valley_dimension,
        condition_number,
    }
}

/// Classify every root of `polynomial`'s gradient.
pub fn classify(
    polynomial: &DomainPolynomial,
    roots: &[Vec<f64>],
    objective: Option<&dyn Objective>,
    config: &ClassificationConfig,
) -> Result<Vec<CriticalPoint>> {
    config.validate()?;
    let points = roots
        .iter()
        .map(|x| {
            let raw = RawCriticalPoint::new(polynomial, x.clone(), objective);
            let evaluation = evaluate_hessian(raw, polynomial, objective, config)?;
            Ok(label(evaluation, polynomial.domain(), config))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "classified {} points: {} minima, {} maxima, {} saddles, {} degenerate",
        points.len(),
        count(&points, CriticalKind::Minimum),
        count(&points, CriticalKind::Maximum),
        count(&points, CriticalKind::Saddle),
        count(&points, CriticalKind::Degenerate)
    );
    Ok(points)
}

fn count(points: &[CriticalPoint], kind: CriticalKind) -> usize {
    points.iter().filter(|p| p.kind == kind).count()
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
