//! # polycrit-rust: polynomial surrogates and their critical points
//!
//! Approximates a multivariate objective on a box by a global tensor-product
//! polynomial fitted on a quadrature grid, optionally sparsifies it, solves
//! the gradient system for every real critical point inside the box, and
//! labels each one from its Hessian spectrum.
//!
//! ```ignore
//! use polycrit_rust::*;
//!
//! let domain = Domain::cube(2, 1.0)?;
//! let config = JobConfig::new(
//!     GridConfig::isotropic(2, 12, Basis::Chebyshev),
//!     ApproximationConfig::isotropic(2, 8),
//! );
//! let output = run_job(&domain, &|x: &[f64]| x[0].powi(4) - x[0].powi(2) + x[1].powi(2), &config)?;
//! output.table().write_csv(std::io::stdout())?;
//! ```

pub mod approximant;
pub mod basis;
pub mod classify;
pub mod domain;
pub mod error;
mod fitter; // Kronecker-structured weighted least squares
pub mod gauss;
pub mod grid;
pub mod numeric;
pub mod objective;
pub mod pipeline;
pub mod polynomial;
pub mod precision;
pub mod records;
pub mod solver;
pub mod sparsify;
pub mod system;

// Re-export commonly used types and functions
pub use approximant::{construct, degree_sweep, ApproximationConfig, PolynomialApproximant};
pub use basis::Basis;
pub use classify::{
    classify, ClassificationConfig, CriticalKind, CriticalPoint, HessianSource, RawCriticalPoint,
};
pub use domain::Domain;
pub use error::{ErrorKind, PolycritError, Result, Stage};
pub use gauss::Rule;
pub use grid::{make_grid, GridConfig, SampleGrid};
pub use numeric::CustomNumeric;
pub use objective::Objective;
pub use pipeline::{run_batch, run_job, Deadline, Job, JobConfig, JobOutput};
pub use polynomial::{DomainPolynomial, TensorPolynomial};
pub use precision::PrecisionMode;
pub use records::{CriticalPointRow, CriticalPointTable, JobSummary};
pub use solver::{solve, BackendKind, SolveReport, SolverBackend, SolverConfig};
pub use sparsify::{
    analyze_tradeoff, sparsify, sparsify_with_floor, FloorOutcome, SparsificationConfig,
    SparsificationResult, ThresholdMode, TradeoffRow,
};
pub use system::AlgebraicSystem;

// Re-export external dependencies for convenience
pub use mdarray::DTensor;
pub use twofloat::TwoFloat;
