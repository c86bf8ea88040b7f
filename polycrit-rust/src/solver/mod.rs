//! Critical point solver
//!
//! Finds the real roots of an [`AlgebraicSystem`] inside its domain.
//!
//! # Pipeline
//!
//! 1. Run the configured backend; on failure, run the fallback once.
//! 2. Map roots to domain coordinates and keep those inside the box (with a
//!    relative boundary tolerance), clamped onto it.
//! 3. Sort lexicographically and merge roots closer than the dedup tolerance,
//!    keeping the first of each cluster.

mod backend;
mod companion;
mod homotopy;
mod newton;
mod subdivision;
mod types;

pub use backend::SolverBackend;
pub use types::{BackendKind, SolveReport, SolverConfig};

use crate::error::{PolycritError, Result};
use crate::system::AlgebraicSystem;
use std::cmp::Ordering;
use std::time::Instant;

/// Solve the gradient system for its real roots in the domain
pub fn solve(system: &AlgebraicSystem, config: &SolverConfig) -> Result<SolveReport> {
    config.validate()?;
    let start = Instant::now();
    let primary = config.backend.resolve(system.dim());

    log::debug!(
        "solving {}-dimensional system: total degrees {:?}, {} terms",
        system.dim(),
        system.total_degrees(),
        system.term_count()
    );

    let (raw, backend_used, fallback_used) =
        match backend::backend_for(primary, system.dim()).find_roots(system, config) {
            Ok(roots) => (roots, primary, false),
            Err(primary_err) => match config.fallback {
                Some(fallback) if fallback != primary => {
                    log::warn!(
                        "{} backend failed ({}); retrying with {}",
                        primary,
                        primary_err,
                        fallback
                    );
                    let roots = backend::backend_for(fallback, system.dim())
                        .find_roots(system, config)
                        .map_err(|fallback_err| {
                            PolycritError::solve_failure(
                                fallback.to_string(),
                                format!("{}; after primary failure: {}", fallback_err, primary_err),
                            )
                        })
                        .map_err(|err| with_system_context(err, system, config))?;
                    (roots, fallback, true)
                }
                _ => return Err(with_system_context(primary_err, system, config)),
            },
        };

    let raw_count = raw.len();
    let domain = system.domain();
    let mut in_domain: Vec<Vec<f64>> = raw
        .iter()
        .map(|t| domain.from_reference(t))
        .filter(|x| domain.contains(x, config.boundary_tolerance))
        .map(|x| domain.clamp(&x))
        .collect();
    let in_domain_count = in_domain.len();

    sort_lexicographic(&mut in_domain);
    let roots = deduplicate(&in_domain, config.dedup_tolerance);

    let report = SolveReport {
        deduplicated_count: roots.len(),
        roots,
        raw_count,
        in_domain_count,
        backend_used,
        fallback_used,
        elapsed: start.elapsed(),
    };
    log::info!(
        "{} backend: {} raw roots, {} in domain, {} after dedup in {:?}",
        report.backend_used,
        report.raw_count,
        report.in_domain_count,
        report.deduplicated_count,
        report.elapsed
    );
    Ok(report)
}

/// Append the system shape and search budgets to a solve diagnostic
fn with_system_context(
    err: PolycritError,
    system: &AlgebraicSystem,
    config: &SolverConfig,
) -> PolycritError {
    match err {
        PolycritError::SystemSolve { backend, diagnostic } => PolycritError::SystemSolve {
            backend,
            diagnostic: format!(
                "{} [dimension {}, total degrees {:?}, {} terms, max_boxes {}, max_paths {}]",
                diagnostic,
                system.dim(),
                system.total_degrees(),
                system.term_count(),
                config.max_boxes,
                config.max_paths
            ),
        },
        other => other,
    }
}

fn lexicographic(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Sort points lexicographically by coordinate
pub fn sort_lexicographic(points: &mut [Vec<f64>]) {
    points.sort_by(|a, b| lexicographic(a, b));
}

/// Greedy Euclidean deduplication: each point is kept unless it lies within
/// `tolerance` of an already kept one. Applying it twice changes nothing.
pub fn deduplicate(points: &[Vec<f64>], tolerance: f64) -> Vec<Vec<f64>> {
    let mut kept: Vec<Vec<f64>> = Vec::new();
    for p in points {
        let duplicate = kept.iter().any(|q| {
            p.iter()
                .zip(q)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt()
                <= tolerance
        });
        if !duplicate {
            kept.push(p.clone());
        }
    }
    kept
}
