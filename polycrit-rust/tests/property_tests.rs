//! Cross-module properties of the approximation and solve stages

mod common;

use common::{fit, SimpleRng};
use polycrit_rust::*;
use std::time::Duration;

#[test]
fn test_error_decreases_with_degree() {
    let domain = Domain::cube(2, 1.0).unwrap();
    let objective = |x: &[f64]| (x[0] + 0.5 * x[1]).exp() * (2.0 * x[1]).cos();
    let grid = make_grid(&domain, &[24, 24], Basis::Chebyshev).unwrap();
    let degrees: Vec<Vec<usize>> = [4, 8, 12, 16].iter().map(|&k| vec![k, k]).collect();
    let approximants =
        degree_sweep(&domain, &grid, &objective, &degrees, PrecisionMode::Float64).unwrap();

    let errors: Vec<f64> = approximants.iter().map(|a| a.l2_error()).collect();
    for pair in errors.windows(2) {
        assert!(pair[1] < pair[0], "errors not decreasing: {:?}", errors);
    }
    // spectral: each step of four degrees gains well over a digit
    assert!(errors[3] < 1e-4 * errors[0]);
}

#[test]
fn test_error_decreases_with_sample_count() {
    let domain = Domain::cube(2, 1.0).unwrap();
    let objective = |x: &[f64]| (x[0] + 0.5 * x[1]).exp() * (2.0 * x[1]).cos();
    let reference = make_grid(&domain, &[100, 100], Basis::Legendre).unwrap();

    // Degree grows with the grid
    let mut node_errors = Vec::new();
    let mut reference_errors = Vec::new();
    for n in [5, 8, 11, 14] {
        let approx = fit(&domain, &objective, &[n, n], &[n - 2, n - 2], Basis::Chebyshev);
        node_errors.push(approx.l2_error());
        reference_errors.push(approx.l2_error_against(&objective, &reference).unwrap());
    }
    for pair in node_errors.windows(2) {
        assert!(pair[1] < pair[0], "node errors not decreasing: {:?}", node_errors);
    }
    for pair in reference_errors.windows(2) {
        assert!(pair[1] < pair[0], "reference errors not decreasing: {:?}", reference_errors);
    }

    // At a fixed degree extra samples do not degrade the fit
    let fixed: Vec<f64> = [10, 16, 24, 40]
        .iter()
        .map(|&n| {
            fit(&domain, &objective, &[n, n], &[8, 8], Basis::Chebyshev)
                .l2_error_against(&objective, &reference)
                .unwrap()
        })
        .collect();
    let best = fixed.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(fixed.iter().all(|&e| e < 4.0 * best), "{:?}", fixed);
    assert!(fixed[3] < 2.0 * best, "{:?}", fixed);
}

#[test]
fn test_critical_points_lie_in_domain() {
    let mut rng = SimpleRng::new(7);
    for _ in 0..4 {
        let center = vec![rng.uniform(-1.0, 1.0), rng.uniform(-1.0, 1.0)];
        let domain = Domain::new(center, vec![rng.uniform(0.3, 1.5), rng.uniform(0.3, 1.5)]).unwrap();
        let objective = |x: &[f64]| (3.0 * x[0]).sin() * (2.0 * x[1]).cos() + 0.1 * x[0];
        let config = JobConfig::new(
            GridConfig::isotropic(2, 16, Basis::Chebyshev),
            ApproximationConfig::isotropic(2, 12),
        );
        let output = run_job(&domain, &objective, &config).unwrap();
        for p in &output.critical_points {
            assert!(domain.contains(&p.coordinates, 1e-12), "{:?} outside {:?}", p.coordinates, domain);
        }
        assert!(output.solve.deduplicated_count <= output.solve.in_domain_count);
        assert!(output.solve.in_domain_count <= output.solve.raw_count);
    }
}

#[test]
fn test_deduplication_is_idempotent() {
    let mut rng = SimpleRng::new(3);
    let mut points: Vec<Vec<f64>> = (0..200)
        .map(|_| vec![rng.uniform(-1.0, 1.0), rng.uniform(-1.0, 1.0)])
        .collect();
    solver::sort_lexicographic(&mut points);
    let once = solver::deduplicate(&points, 0.1);
    let twice = solver::deduplicate(&once, 0.1);
    assert_eq!(once, twice);
    assert!(once.len() < points.len());
}

#[test]
fn test_sparsify_threshold_zero_keeps_everything() {
    let domain = Domain::cube(2, 1.0).unwrap();
    let approx = fit(
        &domain,
        &|x: &[f64]| (x[0] * x[1]).sin(),
        &[10, 10],
        &[8, 8],
        Basis::Legendre,
    );
    for mode in [ThresholdMode::Relative, ThresholdMode::Absolute] {
        let result = sparsify(&approx, 0.0, mode).unwrap();
        assert!(result.zeroed().is_empty());
        assert_eq!(result.l2_ratio(), 1.0);
        assert_eq!(result.polynomial().reference(), approx.polynomial().reference());
    }
}

#[test]
fn test_error_taxonomy() {
    let domain = Domain::cube(1, 1.0).unwrap();
    let square = |x: &[f64]| x[0] * x[0];

    let err = Domain::new(vec![0.0], vec![-1.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDomain);
    assert!(!err.is_retryable());

    let config = JobConfig::new(
        GridConfig::isotropic(1, 4, Basis::Chebyshev),
        ApproximationConfig::isotropic(1, 8),
    );
    let err = run_job(&domain, &square, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegreeTooHigh);
    assert!(err.is_retryable());

    let grid = make_grid(&domain, &[8], Basis::Chebyshev).unwrap();
    let err = construct(&domain, &grid, &|x: &[f64]| 1.0 / x[0], &[4], PrecisionMode::Float64)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumericalInstability);

    // a constant has no isolated critical points
    let config = JobConfig::new(
        GridConfig::isotropic(1, 6, Basis::Chebyshev),
        ApproximationConfig::isotropic(1, 4),
    );
    let err = run_job(&domain, &|_: &[f64]| 2.5, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SystemSolve);

    let config = config.with_time_budget(Duration::ZERO);
    let err = run_job(&domain, &square, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[test]
fn test_job_table_and_summary_serialize() {
    let domain = Domain::cube(2, 1.0).unwrap();
    let objective = |x: &[f64]| x[0].powi(4) - x[0] * x[0] + x[1] * x[1];
    let config = JobConfig::new(
        GridConfig::isotropic(2, 8, Basis::Chebyshev),
        ApproximationConfig::isotropic(2, 4),
    );
    let output = run_job(&domain, &objective, &config).unwrap();
    assert_eq!(output.summary.minima, 2);
    assert_eq!(output.summary.saddles, 1);

    let mut buffer = Vec::new();
    output.table().write_csv(&mut buffer).unwrap();
    let text = String::from_utf8(buffer.clone()).unwrap();
    assert!(text.starts_with("x1,x2,z,kind,"));
    assert_eq!(text.lines().count(), 4);

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    assert_eq!(reader.headers().unwrap().len(), 9);
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    for (record, point) in records.iter().zip(&output.critical_points) {
        assert_eq!(&record[3], point.kind.to_string());
        assert_eq!(record[0].parse::<f64>().unwrap(), point.coordinates[0]);
    }

    assert!(output.summary.condition_estimate >= 1.0);
    let summary = serde_json::to_value(&output.summary).unwrap();
    assert_eq!(summary["degree"], serde_json::json!([4, 4]));
    assert_eq!(summary["backend"], "Subdivision");
    assert!(summary["condition_estimate"].as_f64().unwrap() >= 1.0);
}

#[test]
fn test_batch_matches_sequential_runs() {
    let objective = |x: &[f64]| (x[0] - 0.3).powi(2) + (x[1] + 0.2).powi(2);
    let jobs: Vec<Job> = [4usize, 6]
        .iter()
        .map(|&degree| Job {
            domain: Domain::cube(2, 1.0).unwrap(),
            config: JobConfig::new(
                GridConfig::isotropic(2, 8, Basis::Legendre),
                ApproximationConfig::isotropic(2, degree),
            ),
        })
        .collect();
    let batch = run_batch(&objective, &jobs);
    for (job, result) in jobs.iter().zip(batch) {
        let parallel = result.unwrap();
        let sequential = run_job(&job.domain, &objective, &job.config).unwrap();
        assert_eq!(parallel.critical_points.len(), 1);
        assert_eq!(parallel.critical_points[0].kind, CriticalKind::Minimum);
        assert_eq!(
            parallel.critical_points[0].coordinates,
            sequential.critical_points[0].coordinates
        );
    }
}
