//! Error types shared by every pipeline stage
//!
//! Errors are plain values: each variant names the offending parameter or the
//! stage at which it occurred, plus an optional remediation hint, so that an
//! orchestrating caller can decide whether to retry with adjusted settings.

use std::fmt;
use std::time::Duration;

/// Pipeline stage at which an error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Stage {
    Grid,
    Sampling,
    Approximation,
    Sparsification,
    Solve,
    Classification,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Grid => "grid",
            Stage::Sampling => "sampling",
            Stage::Approximation => "approximation",
            Stage::Sparsification => "sparsification",
            Stage::Solve => "solve",
            Stage::Classification => "classification",
        };
        f.write_str(name)
    }
}

/// Coarse error category, used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidDomain,
    DegreeTooHigh,
    NumericalInstability,
    SystemSolve,
    Timeout,
}

/// Error type for polycrit operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolycritError {
    /// Malformed box, grid or configuration parameter. Always a caller bug.
    #[error("invalid parameter `{parameter}` = {value}")]
    InvalidDomain {
        parameter: String,
        value: String,
        hint: Option<String>,
    },

    /// Degree bound exceeds what the sample grid supports in one dimension.
    #[error(
        "degree {degree} in dimension {dimension} exceeds node count {node_count} minus one"
    )]
    DegreeTooHigh {
        dimension: usize,
        degree: usize,
        node_count: usize,
    },

    /// Non-finite or ill-conditioned intermediate result.
    #[error("numerical instability during {stage}: {detail}")]
    NumericalInstability {
        stage: Stage,
        detail: String,
        hint: Option<String>,
    },

    /// Root-finding backend failed or reported an ill-posed system.
    #[error("system solve failed in backend `{backend}`: {diagnostic}")]
    SystemSolve { backend: String, diagnostic: String },

    /// The job exceeded its wall-clock budget.
    #[error("time budget {budget:?} exceeded before {stage} (elapsed {elapsed:?})")]
    Timeout {
        stage: Stage,
        elapsed: Duration,
        budget: Duration,
    },
}

impl PolycritError {
    pub(crate) fn invalid(parameter: impl Into<String>, value: impl fmt::Debug) -> Self {
        PolycritError::InvalidDomain {
            parameter: parameter.into(),
            value: format!("{:?}", value),
            hint: None,
        }
    }

    pub(crate) fn invalid_with_hint(
        parameter: impl Into<String>,
        value: impl fmt::Debug,
        hint: impl Into<String>,
    ) -> Self {
        PolycritError::InvalidDomain {
            parameter: parameter.into(),
            value: format!("{:?}", value),
            hint: Some(hint.into()),
        }
    }

    pub(crate) fn instability(stage: Stage, detail: impl Into<String>) -> Self {
        PolycritError::NumericalInstability {
            stage,
            detail: detail.into(),
            hint: None,
        }
    }

    pub(crate) fn solve_failure(backend: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        PolycritError::SystemSolve {
            backend: backend.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Attach a remediation hint (no-op for variants without a hint slot)
    pub fn with_hint(self, text: impl Into<String>) -> Self {
        match self {
            PolycritError::InvalidDomain {
                parameter, value, ..
            } => PolycritError::InvalidDomain {
                parameter,
                value,
                hint: Some(text.into()),
            },
            PolycritError::NumericalInstability { stage, detail, .. } => {
                PolycritError::NumericalInstability {
                    stage,
                    detail,
                    hint: Some(text.into()),
                }
            }
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PolycritError::InvalidDomain { .. } => ErrorKind::InvalidDomain,
            PolycritError::DegreeTooHigh { .. } => ErrorKind::DegreeTooHigh,
            PolycritError::NumericalInstability { .. } => ErrorKind::NumericalInstability,
            PolycritError::SystemSolve { .. } => ErrorKind::SystemSolve,
            PolycritError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Remediation hint, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            PolycritError::InvalidDomain { hint, .. }
            | PolycritError::NumericalInstability { hint, .. } => hint.as_deref(),
            PolycritError::DegreeTooHigh { .. } => {
                Some("raise the node count or lower the degree in that dimension")
            }
            PolycritError::SystemSolve { .. } => {
                Some("retry with an alternate backend or relaxed tolerances")
            }
            PolycritError::Timeout { .. } => None,
        }
    }

    /// Whether an orchestrator may retry with adjusted settings.
    ///
    /// Caller bugs (`InvalidDomain`) and exhausted budgets are never retried
    /// by this crate; numerical and solver failures are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DegreeTooHigh | ErrorKind::NumericalInstability | ErrorKind::SystemSolve
        )
    }
}

pub type Result<T> = std::result::Result<T, PolycritError>;
