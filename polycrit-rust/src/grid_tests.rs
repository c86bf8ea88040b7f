use super::*;
use crate::error::ErrorKind;
use approx::assert_abs_diff_eq;

#[test]
fn test_anisotropic_grid_shape() {
    let domain = Domain::new(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
    let grid = make_grid(&domain, &[4, 2], Basis::Chebyshev).unwrap();
    assert_eq!(grid.shape(), vec![5, 3]);
    assert_eq!(grid.total_nodes(), 15);
    assert_eq!(grid.points().count(), 15);
    assert_eq!(grid.nodes(1), vec![-1.0, 1.0, 3.0]);
}

#[test]
fn test_points_are_row_major_and_inside() {
    let domain = Domain::new(vec![0.5, -0.5], vec![0.5, 1.5]).unwrap();
    let grid = make_grid(&domain, &[2, 3], Basis::Legendre).unwrap();
    let points: Vec<Vec<f64>> = grid.points().collect();
    let x0 = grid.nodes(0);
    let x1 = grid.nodes(1);
    assert_eq!(points[0], vec![x0[0], x1[0]]);
    assert_eq!(points[1], vec![x0[0], x1[1]]);
    assert_eq!(points[4], vec![x0[1], x1[0]]);
    assert!(points.iter().all(|p| domain.contains(p, 1e-12)));
}

#[test]
fn test_weights_integrate_domain_volume() {
    let domain = Domain::new(vec![0.0, 0.0, 3.0], vec![1.0, 0.5, 2.0]).unwrap();
    for basis in [Basis::Chebyshev, Basis::Legendre, Basis::Uniform] {
        let grid = make_grid(&domain, &[3, 4, 2], basis).unwrap();
        let total: f64 = grid.weights().iter().sum();
        assert_abs_diff_eq!(total, domain.volume(), epsilon = 1e-13);
    }
}

#[test]
fn test_invalid_grids() {
    let domain = Domain::cube(2, 1.0).unwrap();
    let err = make_grid(&domain, &[3, 0], Basis::Chebyshev).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDomain);
    assert!(err.to_string().contains("node_counts[1]"));

    let err = make_grid(&domain, &[3], Basis::Chebyshev).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDomain);

    assert!(GridConfig::new(vec![], Basis::Legendre).validate().is_err());
    assert!(GridConfig::new(vec![usize::MAX - 1, 4], Basis::Legendre)
        .validate()
        .is_err());
    assert!(GridConfig::isotropic(3, 5, Basis::Uniform).validate().is_ok());
}

#[test]
fn test_sample_rejects_non_finite() {
    let domain = Domain::cube(1, 1.0).unwrap();
    let grid = make_grid(&domain, &[4], Basis::Uniform).unwrap();
    let values = grid.sample(&|x: &[f64]| x[0] * 2.0).unwrap();
    assert_eq!(values, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);

    let err = grid.sample(&|x: &[f64]| 1.0 / x[0]).unwrap_err();
    match err {
        PolycritError::NumericalInstability { stage, .. } => assert_eq!(stage, Stage::Sampling),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_tensor_outer() {
    let out = tensor_outer(&[vec![1.0, 2.0], vec![3.0, 4.0, 5.0]]);
    assert_eq!(out, vec![3.0, 4.0, 5.0, 6.0, 8.0, 10.0]);
}
