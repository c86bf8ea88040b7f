//! Coefficient thresholding of fitted approximants
//!
//! Small coefficients are zeroed to reduce the size of the polynomial system
//! handed to the solver. The fidelity of the sparse polynomial is reported as
//! the retained-energy fraction
//!
//! l2_ratio = sqrt(max(0, 1 - ||removed||^2 / ||original||^2))
//!
//! with both norms computed exactly by Gauss-Legendre quadrature over the box.

use crate::approximant::PolynomialApproximant;
use crate::error::{PolycritError, Result};
use crate::polynomial::{multi_index, DomainPolynomial, TensorPolynomial};
use std::fmt;

/// How a threshold is compared against coefficient magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum ThresholdMode {
    /// Zero `|c| < threshold * max|c|`
    #[default]
    Relative,
    /// Zero `|c| < threshold`
    Absolute,
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMode::Relative => f.write_str("relative"),
            ThresholdMode::Absolute => f.write_str("absolute"),
        }
    }
}

/// Sparsification settings for a job.
///
/// Thresholds are tried from the most aggressive down; the first whose L2
/// ratio reaches `l2_floor` is used. Without a floor the most aggressive
/// threshold is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SparsificationConfig {
    pub thresholds: Vec<f64>,
    pub mode: ThresholdMode,
    pub l2_floor: Option<f64>,
}

impl Default for SparsificationConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![1e-6],
            mode: ThresholdMode::Relative,
            l2_floor: None,
        }
    }
}

impl SparsificationConfig {
    pub fn new(threshold: f64, mode: ThresholdMode) -> Self {
        Self {
            thresholds: vec![threshold],
            mode,
            l2_floor: None,
        }
    }

    pub fn with_floor(mut self, floor: f64, thresholds: Vec<f64>) -> Self {
        self.l2_floor = Some(floor);
        self.thresholds = thresholds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.thresholds.is_empty() {
            return Err(PolycritError::invalid("thresholds", &self.thresholds));
        }
        for (i, &t) in self.thresholds.iter().enumerate() {
            check_threshold(t).map_err(|_| PolycritError::invalid(format!("thresholds[{}]", i), t))?;
        }
        if let Some(floor) = self.l2_floor {
            check_floor(floor)?;
        }
        Ok(())
    }

    /// Apply these settings to an approximant
    pub fn apply(&self, approximant: &PolynomialApproximant) -> Result<FloorOutcome> {
        self.validate()?;
        sparsify_with_floor(
            approximant,
            &self.thresholds,
            self.mode,
            self.l2_floor.unwrap_or(0.0),
        )
    }
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(PolycritError::invalid_with_hint(
            "threshold",
            threshold,
            "thresholds must be finite and non-negative",
        ));
    }
    Ok(())
}

fn check_floor(floor: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&floor) {
        return Err(PolycritError::invalid_with_hint(
            "l2_floor",
            floor,
            "the L2 ratio floor must lie in [0, 1]",
        ));
    }
    Ok(())
}

/// Thresholded copy of an approximant with its fidelity measures
#[derive(Debug, Clone)]
pub struct SparsificationResult {
    threshold: f64,
    mode: ThresholdMode,
    zeroed: Vec<Vec<usize>>,
    polynomial: DomainPolynomial,
    l2_ratio: f64,
    norm_ratio: f64,
    original_nonzeros: usize,
}

impl SparsificationResult {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn mode(&self) -> ThresholdMode {
        self.mode
    }

    /// Multi-indices of the coefficients set to zero
    pub fn zeroed(&self) -> &[Vec<usize>] {
        &self.zeroed
    }

    /// Sparse polynomial on the approximant's domain
    pub fn polynomial(&self) -> &DomainPolynomial {
        &self.polynomial
    }

    /// Retained-energy fraction in [0, 1]
    pub fn l2_ratio(&self) -> f64 {
        self.l2_ratio
    }

    /// ||sparse|| / ||original||
    pub fn norm_ratio(&self) -> f64 {
        self.norm_ratio
    }

    pub fn original_nonzeros(&self) -> usize {
        self.original_nonzeros
    }

    pub fn nonzero_count(&self) -> usize {
        self.polynomial.reference().nonzero_count()
    }

    pub fn total_coefficients(&self) -> usize {
        self.polynomial.reference().len()
    }

    /// Fraction of coefficients that are zero after thresholding
    pub fn sparsity(&self) -> f64 {
        let total = self.total_coefficients();
        if total == 0 {
            return 0.0;
        }
        1.0 - self.nonzero_count() as f64 / total as f64
    }
}

/// Zero the coefficients of `approximant` below `threshold`.
pub fn sparsify(
    approximant: &PolynomialApproximant,
    threshold: f64,
    mode: ThresholdMode,
) -> Result<SparsificationResult> {
    check_threshold(threshold)?;
    let original = approximant.polynomial().reference();
    let cutoff = match mode {
        ThresholdMode::Relative => threshold * original.max_abs_coeff(),
        ThresholdMode::Absolute => threshold,
    };

    let mut kept = original.coeffs().to_vec();
    let mut removed = vec![0.0; kept.len()];
    let mut zeroed = Vec::new();
    for (flat, c) in kept.iter_mut().enumerate() {
        if *c != 0.0 && c.abs() < cutoff {
            removed[flat] = *c;
            *c = 0.0;
            zeroed.push(multi_index(flat, original.shape()));
        }
    }

    let original_norm = original.reference_l2_norm();
    let sparse = TensorPolynomial::new(original.basis(), original.shape().to_vec(), kept);
    let (l2_ratio, norm_ratio) = if zeroed.is_empty() {
        (1.0, 1.0)
    } else {
        let removed = TensorPolynomial::new(original.basis(), original.shape().to_vec(), removed);
        let removed_norm = removed.reference_l2_norm();
        let fraction = removed_norm / original_norm;
        (
            (1.0 - fraction * fraction).max(0.0).sqrt().min(1.0),
            sparse.reference_l2_norm() / original_norm,
        )
    };

    log::debug!(
        "{} threshold {:e}: zeroed {} of {} coefficients, L2 ratio {:.6}",
        mode,
        threshold,
        zeroed.len(),
        original.len(),
        l2_ratio
    );

    Ok(SparsificationResult {
        threshold,
        mode,
        zeroed,
        polynomial: DomainPolynomial::new(approximant.domain().clone(), sparse),
        l2_ratio,
        norm_ratio,
        original_nonzeros: original.nonzero_count(),
    })
}

/// One row of a threshold trade-off study
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TradeoffRow {
    pub threshold: f64,
    pub nonzero_count: usize,
    pub sparsity: f64,
    pub l2_ratio: f64,
}

/// Sparsify at each threshold and report size against fidelity
pub fn analyze_tradeoff(
    approximant: &PolynomialApproximant,
    thresholds: &[f64],
    mode: ThresholdMode,
) -> Result<Vec<TradeoffRow>> {
    thresholds
        .iter()
        .map(|&threshold| {
            let result = sparsify(approximant, threshold, mode)?;
            Ok(TradeoffRow {
                threshold,
                nonzero_count: result.nonzero_count(),
                sparsity: result.sparsity(),
                l2_ratio: result.l2_ratio(),
            })
        })
        .collect()
}

/// Outcome of a floor-constrained sparsification
#[derive(Debug, Clone)]
pub struct FloorOutcome {
    /// Accepted result (threshold 0 when every candidate was rejected)
    pub selected: SparsificationResult,
    /// Candidates whose L2 ratio fell below the floor, most aggressive first
    pub rejected: Vec<SparsificationResult>,
    /// Whether no candidate met the floor
    pub fell_back: bool,
}

/// Try `thresholds` from most to least aggressive and keep the first whose
/// L2 ratio is at least `floor`. Falls back to the unsparsified polynomial.
pub fn sparsify_with_floor(
    approximant: &PolynomialApproximant,
    thresholds: &[f64],
    mode: ThresholdMode,
    floor: f64,
) -> Result<FloorOutcome> {
    check_floor(floor)?;
    for &t in thresholds {
        check_threshold(t)?;
    }
    let mut ordered = thresholds.to_vec();
    ordered.sort_by(|a, b| b.total_cmp(a));

    let mut rejected = Vec::new();
    for threshold in ordered {
        let result = sparsify(approximant, threshold, mode)?;
        if result.l2_ratio() >= floor {
            return Ok(FloorOutcome {
                selected: result,
                rejected,
                fell_back: false,
            });
        }
        log::debug!(
            "threshold {:e} rejected: L2 ratio {:.6} below floor {}",
            threshold,
            result.l2_ratio(),
            floor
        );
        rejected.push(result);
    }

    log::warn!(
        "no threshold met L2 floor {}; keeping the dense approximant",
        floor
    );
    Ok(FloorOutcome {
        selected: sparsify(approximant, 0.0, mode)?,
        rejected,
        fell_back: true,
    })
}

#[cfg(test)]
#[path = "sparsify_tests.rs"]
mod tests;
