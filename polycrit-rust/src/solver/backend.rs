//! Backend interface for real root finding

use super::companion::Companion;
use super::homotopy::HomotopyContinuation;
use super::subdivision::Subdivision;
use super::types::{BackendKind, SolverConfig};
use crate::error::Result;
use crate::system::AlgebraicSystem;

/// A root finder for gradient systems
///
/// Implementations return real roots in reference coordinates of the system
/// (the cube [-1, 1]^d, possibly slightly outside), or fail with
/// `SystemSolve`. Filtering, ordering and deduplication happen afterwards.
pub trait SolverBackend {
    fn name(&self) -> &'static str;

    fn find_roots(&self, system: &AlgebraicSystem, config: &SolverConfig) -> Result<Vec<Vec<f64>>>;
}

/// Backend implementation for a concrete kind (`Auto` must be resolved first)
pub(crate) fn backend_for(kind: BackendKind, dim: usize) -> Box<dyn SolverBackend> {
    match kind.resolve(dim) {
        BackendKind::Companion => Box::new(Companion),
        BackendKind::Homotopy => Box::new(HomotopyContinuation),
        BackendKind::Subdivision | BackendKind::Auto => Box::new(Subdivision),
    }
}
