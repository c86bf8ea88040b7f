use super::*;
use crate::basis::Basis;
use crate::domain::Domain;
use crate::error::ErrorKind;
use crate::grid::make_grid;
use crate::precision::PrecisionMode;
use approx::assert_abs_diff_eq;

fn approximant(basis: Basis) -> PolynomialApproximant {
    let domain = Domain::new(vec![0.0, 0.5], vec![1.0, 1.5]).unwrap();
    let grid = make_grid(&domain, &[14, 14], basis).unwrap();
    let f = |x: &[f64]| (1.5 * x[0]).exp() * (0.7 * x[1]).cos() + 0.1 * x[1];
    crate::approximant::construct(&domain, &grid, &f, &[10, 10], PrecisionMode::Float64).unwrap()
}

#[test]
fn test_threshold_zero_is_identity() {
    let approx = approximant(Basis::Chebyshev);
    for mode in [ThresholdMode::Relative, ThresholdMode::Absolute] {
        let result = sparsify(&approx, 0.0, mode).unwrap();
        assert!(result.zeroed().is_empty());
        assert_eq!(result.l2_ratio(), 1.0);
        assert_eq!(result.norm_ratio(), 1.0);
        assert_eq!(result.nonzero_count(), approx.nonzero_count());
        assert_eq!(result.polynomial().reference().coeffs(), approx.coefficients());
    }
}

#[test]
fn test_relative_and_absolute_cutoffs() {
    let approx = approximant(Basis::Chebyshev);
    let max = approx
        .coefficients()
        .iter()
        .fold(0.0f64, |acc, c| acc.max(c.abs()));

    let relative = sparsify(&approx, 1e-4, ThresholdMode::Relative).unwrap();
    let absolute = sparsify(&approx, 1e-4 * max, ThresholdMode::Absolute).unwrap();
    assert_eq!(relative.zeroed(), absolute.zeroed());
    assert!(!relative.zeroed().is_empty());

    let shape = approx.polynomial().reference().shape().to_vec();
    for index in relative.zeroed() {
        assert_eq!(relative.polynomial().reference().coeff(index), 0.0);
        let original = approx.polynomial().reference().coeff(index);
        assert!(original.abs() < 1e-4 * max);
        assert!(index.iter().zip(&shape).all(|(i, n)| i < n));
    }
    assert_eq!(
        relative.nonzero_count() + relative.zeroed().len(),
        approx.nonzero_count()
    );
    assert_eq!(relative.original_nonzeros(), approx.nonzero_count());
}

#[test]
fn test_l2_ratio_bounds() {
    for basis in [Basis::Chebyshev, Basis::Legendre, Basis::Uniform] {
        let approx = approximant(basis);
        for threshold in [1e-10, 1e-6, 1e-3, 1e-1, 0.5, 1.0, 2.0] {
            let result = sparsify(&approx, threshold, ThresholdMode::Relative).unwrap();
            assert!(
                (0.0..=1.0).contains(&result.l2_ratio()),
                "{} {}: {}",
                basis,
                threshold,
                result.l2_ratio()
            );
            assert!(result.sparsity() >= 0.0 && result.sparsity() <= 1.0);
        }
    }
}

#[test]
fn test_legendre_ratio_matches_norm_ratio() {
    let approx = approximant(Basis::Legendre);
    let result = sparsify(&approx, 1e-2, ThresholdMode::Relative).unwrap();
    assert!(!result.zeroed().is_empty());
    assert_abs_diff_eq!(result.l2_ratio(), result.norm_ratio(), epsilon = 1e-10);
}

#[test]
fn test_tradeoff_is_monotone() {
    // Orthogonal basis: removed energy grows with the removed set
    let approx = approximant(Basis::Legendre);
    let thresholds = [1e-12, 1e-8, 1e-4, 1e-2, 1e-1];
    let rows = analyze_tradeoff(&approx, &thresholds, ThresholdMode::Relative).unwrap();
    assert_eq!(rows.len(), thresholds.len());
    for pair in rows.windows(2) {
        assert!(pair[1].nonzero_count <= pair[0].nonzero_count);
        assert!(pair[1].sparsity >= pair[0].sparsity);
        assert!(pair[1].l2_ratio <= pair[0].l2_ratio + 1e-12);
    }
}

#[test]
fn test_floor_is_honoured() {
    let approx = approximant(Basis::Chebyshev);
    let thresholds = vec![1e-8, 0.5, 1e-3, 0.05];
    let floor = 0.999;
    let outcome = sparsify_with_floor(&approx, &thresholds, ThresholdMode::Relative, floor).unwrap();
    assert!(outcome.selected.l2_ratio() >= floor);
    assert!(!outcome.fell_back);
    for rejected in &outcome.rejected {
        assert!(rejected.l2_ratio() < floor);
        assert!(rejected.threshold() > outcome.selected.threshold());
    }
}

#[test]
fn test_floor_falls_back_to_dense() {
    let approx = approximant(Basis::Chebyshev);
    let outcome =
        sparsify_with_floor(&approx, &[0.5, 0.2], ThresholdMode::Relative, 1.0).unwrap();
    assert!(outcome.fell_back);
    assert_eq!(outcome.rejected.len(), 2);
    assert_eq!(outcome.rejected[0].threshold(), 0.5);
    assert_eq!(outcome.selected.threshold(), 0.0);
    assert_eq!(outcome.selected.l2_ratio(), 1.0);
}

#[test]
fn test_invalid_thresholds() {
    let approx = approximant(Basis::Legendre);
    for bad in [-1.0, f64::NAN, f64::INFINITY] {
        let err = sparsify(&approx, bad, ThresholdMode::Absolute).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDomain);
    }
    assert!(sparsify_with_floor(&approx, &[0.1], ThresholdMode::Relative, 1.5).is_err());

    let config = SparsificationConfig::new(1e-3, ThresholdMode::Relative);
    assert!(config.validate().is_ok());
    assert!(config.clone().with_floor(0.9, vec![]).validate().is_err());
    let outcome = config.apply(&approx).unwrap();
    assert_eq!(outcome.selected.threshold(), 1e-3);
}
