use super::*;
use crate::basis::Basis;
use crate::error::ErrorKind;
use crate::polynomial::TensorPolynomial;
use approx::assert_abs_diff_eq;

/// a x^2 + b y^2 + c x y in monomials on `domain`
fn quadratic(domain: &Domain, a: f64, b: f64, c: f64) -> DomainPolynomial {
    // reference t = x / h for a centred box
    let h = domain.half_widths();
    let mut coeffs = vec![0.0; 9];
    coeffs[2 * 3] = a * h[0] * h[0];
    coeffs[2] = b * h[1] * h[1];
    coeffs[3 + 1] = c * h[0] * h[1];
    DomainPolynomial::new(
        domain.clone(),
        TensorPolynomial::new(Basis::Uniform, vec![3, 3], coeffs),
    )
}

#[test]
fn test_classify_eigenvalues() {
    assert_eq!(classify_eigenvalues(&[1.0, 2.0], 1e-2), (CriticalKind::Minimum, 0));
    assert_eq!(classify_eigenvalues(&[-3.0, -1.0], 1e-2), (CriticalKind::Maximum, 0));
    assert_eq!(classify_eigenvalues(&[-1.0, 2.0], 1e-2), (CriticalKind::Saddle, 0));
    assert_eq!(
        classify_eigenvalues(&[1e-5, 2.0], 1e-2),
        (CriticalKind::Degenerate, 1)
    );
    assert_eq!(
        classify_eigenvalues(&[0.0, 0.0, 0.0], 1e-2),
        (CriticalKind::Degenerate, 3)
    );
}

#[test]
fn test_condition_number() {
    assert_eq!(condition_number(&[-4.0, 2.0]), 2.0);
    assert_eq!(condition_number(&[0.0, 1.0]), f64::INFINITY);
}

#[test]
fn test_quadratic_forms() {
    let domain = Domain::cube(2, 2.0).unwrap();
    let origin = vec![vec![0.0, 0.0]];
    let config = ClassificationConfig::default();
    let cases = [
        (1.0, 2.0, 0.0, CriticalKind::Minimum),
        (-1.0, -0.5, 0.0, CriticalKind::Maximum),
        (1.0, -1.0, 0.0, CriticalKind::Saddle),
        (1.0, 1e-4, 0.0, CriticalKind::Degenerate),
    ];
    for (a, b, c, expected) in cases {
        let p = quadratic(&domain, a, b, c);
        let points = classify(&p, &origin, None, &config).unwrap();
        assert_eq!(points.len(), 1);
        let point = &points[0];
        assert_eq!(point.kind, expected, "a={} b={}", a, b);
        assert!(point.gradient_norm < 1e-14);
        assert!(!point.on_boundary);
        assert_eq!(point.value(), point.polynomial_value);
        assert!(point.eigenvalues.windows(2).all(|w| w[0] <= w[1]));
    }

    let p = quadratic(&domain, 1.0, 1e-4, 0.0);
    let point = &classify(&p, &origin, None, &config).unwrap()[0];
    assert_eq!(point.valley_dimension, 1);
    assert_abs_diff_eq!(point.condition_number, 1e4, epsilon = 1e-6);
    assert!(!point.fragile);
}

#[test]
fn test_mixed_term_eigenvalues() {
    // Hessian [[2, 3], [3, 2]] has eigenvalues -1 and 5
    let domain = Domain::cube(2, 1.0).unwrap();
    let p = quadratic(&domain, 1.0, 1.0, 3.0);
    let point = &classify(&p, &[vec![0.0, 0.0]], None, &ClassificationConfig::default()).unwrap()[0];
    assert_abs_diff_eq!(point.eigenvalues[0], -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(point.eigenvalues[1], 5.0, epsilon = 1e-12);
    assert_eq!(point.kind, CriticalKind::Saddle);
}

#[test]
fn test_fragile_and_boundary_flags() {
    let domain = Domain::cube(2, 1.0).unwrap();
    let p = quadratic(&domain, 1.0, 1e-10, 0.0);
    let config = ClassificationConfig {
        valley_tolerance: 0.0,
        ..ClassificationConfig::default()
    };
    let point = &classify(&p, &[vec![0.0, 1.0]], None, &config).unwrap()[0];
    assert!(point.fragile);
    assert!(point.on_boundary);
    assert_eq!(point.kind, CriticalKind::Minimum);
}

struct Bowl;

impl Objective for Bowl {
    fn evaluate(&self, x: &[f64]) -> f64 {
        x[0] * x[0] + 3.0 * x[1] * x[1]
    }

    fn hessian(&self, _x: &[f64]) -> Option<DMatrix<f64>> {
        Some(DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 6.0]))
    }
}

#[test]
fn test_objective_hessian_sources() {
    let domain = Domain::cube(2, 1.0).unwrap();
    // The polynomial is a saddle; the objective says otherwise
    let p = quadratic(&domain, 1.0, -1.0, 0.0);
    let config = ClassificationConfig::default().with_hessian_source(HessianSource::Objective);
    let roots = [vec![0.0, 0.0]];

    let analytic = &classify(&p, &roots, Some(&Bowl), &config).unwrap()[0];
    assert_eq!(analytic.kind, CriticalKind::Minimum);
    assert_eq!(analytic.eigenvalues, vec![2.0, 6.0]);
    assert_eq!(analytic.objective_value, Some(0.0));

    let closure = |x: &[f64]| x[0] * x[0] + 3.0 * x[1] * x[1];
    let fd = &classify(&p, &roots, Some(&closure), &config).unwrap()[0];
    assert_eq!(fd.kind, CriticalKind::Minimum);
    assert_abs_diff_eq!(fd.eigenvalues[0], 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(fd.eigenvalues[1], 6.0, epsilon = 1e-6);

    let err = classify(&p, &roots, None, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDomain);
}

#[test]
fn test_config_validation() {
    assert!(ClassificationConfig::default().validate().is_ok());
    let bad = ClassificationConfig {
        valley_tolerance: 1.5,
        ..ClassificationConfig::default()
    };
    assert!(bad.validate().is_err());
    let bad = ClassificationConfig {
        fd_step: 0.0,
        ..ClassificationConfig::default()
    };
    assert!(bad.validate().is_err());
}
