//! Solver configuration and report types

use crate::error::{PolycritError, Result};
use std::fmt;
use std::time::Duration;

/// Root-finding backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum BackendKind {
    /// Companion for one-dimensional systems, subdivision otherwise
    #[default]
    Auto,
    /// Chebyshev range-bound exclusion on sub-boxes plus Gauss-Newton polishing
    Subdivision,
    /// Colleague-matrix eigenvalues (one dimension only)
    Companion,
    /// Total-degree homotopy continuation
    Homotopy,
}

impl BackendKind {
    /// Resolve `Auto` for a system of dimension `dim`
    pub fn resolve(self, dim: usize) -> BackendKind {
        match self {
            BackendKind::Auto => {
                if dim == 1 {
                    BackendKind::Companion
                } else {
                    BackendKind::Subdivision
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Auto => "auto",
            BackendKind::Subdivision => "subdivision",
            BackendKind::Companion => "companion",
            BackendKind::Homotopy => "homotopy",
        };
        f.write_str(name)
    }
}

/// Solver settings
///
/// Tolerances are relative to the box (`boundary_tolerance`, `min_box_width`)
/// or absolute in domain units (`dedup_tolerance`).
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub backend: BackendKind,
    /// Tried once when the primary backend fails
    pub fallback: Option<BackendKind>,
    /// Relative slack when testing whether a root lies in the box
    pub boundary_tolerance: f64,
    /// Euclidean distance below which two roots are merged
    pub dedup_tolerance: f64,
    /// Maximum number of boxes examined by subdivision
    pub max_boxes: usize,
    /// Leaf width in reference units (the cube has width 2)
    pub min_box_width: f64,
    /// Maximum number of homotopy paths
    pub max_paths: usize,
    pub newton_max_iterations: usize,
    /// Newton stops when the step is below this (relative to |t|)
    pub newton_step_tolerance: f64,
    /// Accepted gradient residual relative to the system scale
    pub residual_tolerance: f64,
    /// Largest imaginary part, relative to the modulus, of a real root
    pub imag_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            fallback: Some(BackendKind::Homotopy),
            boundary_tolerance: 1e-8,
            dedup_tolerance: 1e-6,
            max_boxes: 200_000,
            min_box_width: 2.0 / 64.0,
            max_paths: 10_000,
            newton_max_iterations: 40,
            newton_step_tolerance: 1e-13,
            residual_tolerance: 1e-8,
            imag_tolerance: 1e-8,
        }
    }
}

impl SolverConfig {
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_fallback(mut self, fallback: Option<BackendKind>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("boundary_tolerance", self.boundary_tolerance, true),
            ("dedup_tolerance", self.dedup_tolerance, true),
            ("min_box_width", self.min_box_width, false),
            ("newton_step_tolerance", self.newton_step_tolerance, false),
            ("residual_tolerance", self.residual_tolerance, false),
            ("imag_tolerance", self.imag_tolerance, true),
        ];
        for (name, value, zero_ok) in positive {
            let ok = value.is_finite() && (value > 0.0 || (zero_ok && value == 0.0));
            if !ok {
                return Err(PolycritError::invalid(name, value));
            }
        }
        if self.min_box_width > 2.0 {
            return Err(PolycritError::invalid_with_hint(
                "min_box_width",
                self.min_box_width,
                "reference boxes have width 2",
            ));
        }
        for (name, value) in [
            ("max_boxes", self.max_boxes),
            ("max_paths", self.max_paths),
            ("newton_max_iterations", self.newton_max_iterations),
        ] {
            if value == 0 {
                return Err(PolycritError::invalid(name, value));
            }
        }
        if self.fallback == Some(BackendKind::Auto) {
            return Err(PolycritError::invalid_with_hint(
                "fallback",
                BackendKind::Auto,
                "the fallback must name a concrete backend",
            ));
        }
        Ok(())
    }
}

/// Roots of a gradient system with provenance
#[derive(Debug, Clone, serde::Serialize)]
pub struct SolveReport {
    /// Real roots in domain coordinates, lexicographically sorted
    pub roots: Vec<Vec<f64>>,
    /// Roots returned by the backend before filtering
    pub raw_count: usize,
    /// Roots inside the domain before deduplication
    pub in_domain_count: usize,
    /// Roots after deduplication (`roots.len()`)
    pub deduplicated_count: usize,
    pub backend_used: BackendKind,
    pub fallback_used: bool,
    pub elapsed: Duration,
}
