use super::*;
use crate::polynomial::TensorPolynomial;
use approx::assert_abs_diff_eq;

fn rules(basis: Basis, points: &[usize]) -> Vec<Rule<f64>> {
    points.iter().map(|&n| basis.rule(n)).collect()
}

#[test]
fn test_recovers_exact_polynomial() {
    for basis in [Basis::Chebyshev, Basis::Legendre, Basis::Uniform] {
        let rules = rules(basis, &[7, 6]);
        let shape = vec![4, 3];
        let truth: Vec<f64> = (0..12).map(|k| (k as f64 - 4.5) / (1.0 + k as f64)).collect();
        let p = TensorPolynomial::new(basis, shape, truth.clone());
        let nodes: Vec<Vec<f64>> = rules.iter().map(|r| r.x.clone()).collect();
        let values = p.values_on_grid(&nodes);

        let fitter = TensorFitter::new(basis, &rules, &[3, 2]).unwrap();
        assert_eq!(fitter.n_terms(), &[4, 3]);
        let out = fitter.fit(&values, PrecisionMode::Float64).unwrap();
        assert_eq!(out.precision, PrecisionMode::Float64);
        assert!(out.extended.is_none());
        for (c, t) in out.coeffs.iter().zip(&truth) {
            assert_abs_diff_eq!(*c, *t, epsilon = 1e-12);
        }
        assert!(out.weighted_residual < 1e-12, "{}", out.weighted_residual);
    }
}

#[test]
fn test_double_double_matches_float64() {
    let rules = rules(Basis::Chebyshev, &[25]);
    let values: Vec<f64> = rules[0].x.iter().map(|x| (3.0 * x).sin() + x * x).collect();
    let fitter = TensorFitter::new(Basis::Chebyshev, &rules, &[15]).unwrap();

    let f64_fit = fitter.fit(&values, PrecisionMode::Float64).unwrap();
    let dd_fit = fitter.fit(&values, PrecisionMode::DoubleDouble).unwrap();
    assert_eq!(dd_fit.precision, PrecisionMode::DoubleDouble);
    let extended = dd_fit.extended.as_ref().unwrap();
    assert_eq!(extended.len(), 16);
    for (a, b) in f64_fit.coeffs.iter().zip(&dd_fit.coeffs) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-13);
    }
    assert_abs_diff_eq!(
        f64_fit.weighted_residual,
        dd_fit.weighted_residual,
        epsilon = 1e-13
    );
}

#[test]
fn test_adaptive_follows_condition_product() {
    for basis in [Basis::Chebyshev, Basis::Uniform] {
        let rules = rules(basis, &[60]);
        let values: Vec<f64> = rules[0].x.iter().map(|x| x.exp()).collect();
        let fitter = TensorFitter::new(basis, &rules, &[30]).unwrap();
        let cond = fitter.condition_product();
        assert!(cond >= 1.0);
        let out = fitter.fit(&values, PrecisionMode::Adaptive).unwrap();
        let expected = if cond > crate::precision::ADAPTIVE_CONDITION_THRESHOLD {
            PrecisionMode::DoubleDouble
        } else {
            PrecisionMode::Float64
        };
        assert_eq!(out.precision, expected, "{} condition {:e}", basis, cond);
    }
}

#[test]
fn test_residual_is_nonincreasing_in_degree() {
    let rules = rules(Basis::Legendre, &[30]);
    let values: Vec<f64> = rules[0].x.iter().map(|x| 1.0 / (1.0 + 4.0 * x * x)).collect();
    let mut previous = f64::INFINITY;
    for degree in 0..20 {
        let fitter = TensorFitter::new(Basis::Legendre, &rules, &[degree]).unwrap();
        let out = fitter.fit(&values, PrecisionMode::Float64).unwrap();
        assert!(out.weighted_residual <= previous * (1.0 + 1e-10) + 1e-15);
        previous = out.weighted_residual;
    }
}
