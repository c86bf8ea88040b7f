//! End-to-end jobs: sample, fit, sparsify, solve and classify
//!
//! A job is deterministic and self-contained. The wall-clock budget is checked
//! between stages only, never inside a backend.

use crate::approximant::{check_degree, fit_samples, ApproximationConfig, PolynomialApproximant};
use crate::classify::{classify, ClassificationConfig, CriticalKind, CriticalPoint};
use crate::domain::Domain;
use crate::error::{PolycritError, Result, Stage};
use crate::grid::GridConfig;
use crate::objective::Objective;
use crate::records::{CriticalPointTable, JobSummary};
use crate::solver::{solve, SolveReport, SolverConfig};
use crate::sparsify::{SparsificationConfig, SparsificationResult};
use crate::system::AlgebraicSystem;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Settings for every stage of a job
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub grid: GridConfig,
    pub approximation: ApproximationConfig,
    /// Skipped when `None`
    pub sparsification: Option<SparsificationConfig>,
    pub solver: SolverConfig,
    pub classification: ClassificationConfig,
    pub time_budget: Option<Duration>,
}

impl JobConfig {
    pub fn new(grid: GridConfig, approximation: ApproximationConfig) -> Self {
        Self {
            grid,
            approximation,
            sparsification: None,
            solver: SolverConfig::default(),
            classification: ClassificationConfig::default(),
            time_budget: None,
        }
    }

    pub fn with_sparsification(mut self, config: SparsificationConfig) -> Self {
        self.sparsification = Some(config);
        self
    }

    pub fn with_solver(mut self, config: SolverConfig) -> Self {
        self.solver = config;
        self
    }

    pub fn with_classification(mut self, config: ClassificationConfig) -> Self {
        self.classification = config;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Validate every stage, including the degree bound against the grid
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.approximation.validate()?;
        check_degree(&self.approximation.degree, &self.grid.node_counts)?;
        if let Some(sparsification) = &self.sparsification {
            sparsification.validate()?;
        }
        self.solver.validate()?;
        self.classification.validate()
    }
}

/// Wall-clock budget checked between stages
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn start(budget: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Fail with `Timeout` if the budget is used up before `stage`
    pub fn check(&self, stage: Stage) -> Result<()> {
        let Some(budget) = self.budget else {
            return Ok(());
        };
        let elapsed = self.elapsed();
        if elapsed >= budget {
            return Err(PolycritError::Timeout {
                stage,
                elapsed,
                budget,
            });
        }
        Ok(())
    }
}

/// Everything a job produced
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub approximant: PolynomialApproximant,
    pub sparsification: Option<SparsificationResult>,
    pub solve: SolveReport,
    pub critical_points: Vec<CriticalPoint>,
    pub summary: JobSummary,
}

impl JobOutput {
    pub fn table(&self) -> CriticalPointTable {
        CriticalPointTable::new(self.approximant.dim(), &self.critical_points)
    }
}

/// Run one job on `objective` over `domain`
pub fn run_job<O: Objective>(domain: &Domain, objective: &O, config: &JobConfig) -> Result<JobOutput> {
    config.validate()?;
    if config.grid.node_counts.len() != domain.dim() {
        return Err(PolycritError::invalid_with_hint(
            "grid.node_counts",
            &config.grid.node_counts,
            format!("domain has dimension {}", domain.dim()),
        ));
    }
    let deadline = Deadline::start(config.time_budget);

    let grid = config.grid.build(domain)?;
    deadline.check(Stage::Sampling)?;
    let values = grid.sample(objective)?;
    log::debug!("sampled {} nodes", values.len());

    deadline.check(Stage::Approximation)?;
    let approximant = fit_samples(
        &grid,
        &values,
        &config.approximation.degree,
        config.approximation.precision,
    )?;

    let sparsification = match &config.sparsification {
        Some(settings) => {
            deadline.check(Stage::Sparsification)?;
            Some(settings.apply(&approximant)?.selected)
        }
        None => None,
    };
    let polynomial = match &sparsification {
        Some(result) => result.polynomial(),
        None => approximant.polynomial(),
    };

    deadline.check(Stage::Solve)?;
    let system = AlgebraicSystem::from_polynomial(polynomial)?;
    let report = solve(&system, &config.solver)?;

    deadline.check(Stage::Classification)?;
    let critical_points = classify(
        polynomial,
        &report.roots,
        Some(objective as &dyn Objective),
        &config.classification,
    )?;

    let count = |kind| critical_points.iter().filter(|p| p.kind == kind).count();
    let reference = polynomial.reference();
    let summary = JobSummary {
        dimension: domain.dim(),
        basis: approximant.basis(),
        node_counts: approximant.node_counts().to_vec(),
        degree: approximant.degree(),
        precision: approximant.precision(),
        l2_error: approximant.l2_error(),
        condition_estimate: approximant.condition_estimate(),
        threshold: sparsification.as_ref().map(|s| s.threshold()),
        l2_ratio: sparsification.as_ref().map(|s| s.l2_ratio()),
        sparsity: 1.0 - reference.nonzero_count() as f64 / reference.len() as f64,
        nonzero_count: reference.nonzero_count(),
        backend: report.backend_used,
        fallback_used: report.fallback_used,
        solve_time: report.elapsed,
        raw_count: report.raw_count,
        deduplicated_count: report.deduplicated_count,
        minima: count(CriticalKind::Minimum),
        maxima: count(CriticalKind::Maximum),
        saddles: count(CriticalKind::Saddle),
        degenerate: count(CriticalKind::Degenerate),
        elapsed: deadline.elapsed(),
    };
    log::info!(
        "job finished in {:?}: {} critical points ({} minima, {} saddles)",
        summary.elapsed,
        critical_points.len(),
        summary.minima,
        summary.saddles
    );

    Ok(JobOutput {
        approximant,
        sparsification,
        solve: report,
        critical_points,
        summary,
    })
}

/// One entry of a batch
#[derive(Debug, Clone)]
pub struct Job {
    pub domain: Domain,
    pub config: JobConfig,
}

/// Run independent jobs in parallel. Results keep the order of `jobs`.
pub fn run_batch<O: Objective + Sync>(objective: &O, jobs: &[Job]) -> Vec<Result<JobOutput>> {
    log::info!("running batch of {} jobs", jobs.len());
    jobs.par_iter()
        .map(|job| run_job(&job.domain, objective, &job.config))
        .collect()
}
