//! Separable weighted least-squares fitter on tensor grids
//!
//! Solves min || sqrt(W) * (A * coeffs - values) ||^2 where the design matrix
//! A = A_1 (x) ... (x) A_d is a Kronecker product of per-dimension
//! Vandermonde matrices and W is the tensor quadrature weight. The weighted
//! pseudo-inverse factorizes the same way,
//!
//! (sqrt(W) A)^+ = (sqrt(w_1) A_1)^+ (x) ... (x) (sqrt(w_d) A_d)^+
//!
//! so the fit is a sequence of mode products with small matrices.

use crate::basis::Basis;
use crate::error::{PolycritError, Result, Stage};
use crate::gauss::Rule;
use crate::grid::tensor_outer;
use crate::numeric::CustomNumeric;
use crate::polynomial::mode_product;
use crate::precision::PrecisionMode;
use crate::TwoFloat;
use mdarray::DTensor;
use nalgebra::DMatrix;

/// Per-dimension weighted design matrix and its pseudo-inverse
struct AxisOperator {
    /// sqrt(w) * V, shape (n_points, n_terms)
    design: DTensor<f64, 2>,
    /// (sqrt(w) * V)^+, shape (n_terms, n_points)
    pinv: DTensor<f64, 2>,
    /// sigma_max / sigma_min of `design`
    condition: f64,
}

/// Result of a tensor fit
#[derive(Debug, Clone)]
pub struct FitOutput {
    /// Coefficients rounded to f64
    pub coeffs: Vec<f64>,
    /// Double-double coefficients, present when fitted in extended precision
    pub extended: Option<Vec<TwoFloat>>,
    /// sqrt(sum W (f - p)^2) with reference-cube weights
    pub weighted_residual: f64,
    /// Precision actually used
    pub precision: PrecisionMode,
}

/// Fitter for the Kronecker-structured weighted least-squares problem
///
/// Built once per (grid, degree) pair; `fit` may be called for any number of
/// sample vectors on that grid.
pub(crate) struct TensorFitter {
    basis: Basis,
    axes: Vec<AxisOperator>,
    /// Reference nodes per dimension
    nodes: Vec<Vec<f64>>,
    /// sqrt of the tensor reference weights, row-major
    sqrt_weights: Vec<f64>,
    n_points: Vec<usize>,
    n_terms: Vec<usize>,
}

impl TensorFitter {
    /// Build the per-dimension operators for `rules` and degree bound `degree`.
    pub fn new(basis: Basis, rules: &[Rule<f64>], degree: &[usize]) -> Result<Self> {
        assert_eq!(rules.len(), degree.len());
        let mut axes = Vec::with_capacity(rules.len());
        for (rule, &deg) in rules.iter().zip(degree) {
            axes.push(axis_operator(basis, rule, deg + 1)?);
        }
        let sqrt_weights: Vec<Vec<f64>> = rules
            .iter()
            .map(|r| r.w.iter().map(|w| w.sqrt()).collect())
            .collect();
        let sqrt_weights = tensor_outer(&sqrt_weights);

        Ok(Self {
            basis,
            axes,
            nodes: rules.iter().map(|r| r.x.clone()).collect(),
            sqrt_weights,
            n_points: rules.iter().map(|r| r.len()).collect(),
            n_terms: degree.iter().map(|d| d + 1).collect(),
        })
    }

    /// Product of per-dimension condition numbers of the weighted design
    pub fn condition_product(&self) -> f64 {
        self.axes.iter().map(|a| a.condition).product()
    }

    pub fn n_terms(&self) -> &[usize] {
        &self.n_terms
    }

    /// Fit `values` (row-major on the grid) in the requested precision
    pub fn fit(&self, values: &[f64], mode: PrecisionMode) -> Result<FitOutput> {
        let total: usize = self.n_points.iter().product();
        assert_eq!(
            values.len(),
            total,
            "values.len()={} must equal the number of grid nodes {}",
            values.len(),
            total
        );
        let precision = mode.resolve(self.condition_product());

        let output = if precision.is_extended() {
            let (coeffs, residual) = self.fit_generic::<TwoFloat>(values, 1);
            FitOutput {
                coeffs: coeffs.iter().map(|c| c.to_f64()).collect(),
                extended: Some(coeffs),
                weighted_residual: residual,
                precision,
            }
        } else {
            let (coeffs, residual) = self.fit_generic::<f64>(values, 0);
            FitOutput {
                coeffs,
                extended: None,
                weighted_residual: residual,
                precision: PrecisionMode::Float64,
            }
        };

        if let Some(bad) = output.coeffs.iter().position(|c| !c.is_finite()) {
            return Err(PolycritError::instability(
                Stage::Approximation,
                format!("non-finite coefficient at flat index {}", bad),
            )
            .with_hint("lower the degree or switch to DoubleDouble precision"));
        }
        if !output.weighted_residual.is_finite() {
            return Err(PolycritError::instability(
                Stage::Approximation,
                "non-finite least-squares residual",
            ));
        }
        Ok(output)
    }

    /// Fit in arithmetic `T` with `sweeps` residual-refinement passes.
    ///
    /// The pseudo-inverses are computed in f64; the design matrices and the
    /// residual are evaluated in `T`.
    fn fit_generic<T: CustomNumeric>(&self, values: &[f64], sweeps: usize) -> (Vec<T>, f64) {
        let pinv: Vec<DTensor<T, 2>> = self.axes.iter().map(|a| convert_tensor(&a.pinv)).collect();
        let design: Vec<DTensor<T, 2>> = self
            .nodes
            .iter()
            .zip(&self.n_terms)
            .zip(&self.axes)
            .map(|((x, &n), axis)| self.weighted_design::<T>(x, n, axis))
            .collect();

        let rhs: Vec<T> = values
            .iter()
            .zip(&self.sqrt_weights)
            .map(|(&f, &s)| T::from_f64(f) * T::from_f64(s))
            .collect();

        let mut coeffs = apply_all(&pinv, &rhs, &self.n_points);
        let mut residual = self.residual(&design, &rhs, &coeffs);
        for _ in 0..sweeps {
            let correction = apply_all(&pinv, &residual, &self.n_points);
            for (c, dc) in coeffs.iter_mut().zip(&correction) {
                *c = *c + *dc;
            }
            residual = self.residual(&design, &rhs, &coeffs);
        }

        let norm = residual
            .iter()
            .fold(T::zero(), |acc, &r| acc + r * r)
            .sqrt()
            .to_f64();
        (coeffs, norm)
    }

    /// sqrt(w) * V evaluated in `T`, sharing the f64 sqrt(w) of the stored design
    fn weighted_design<T: CustomNumeric>(
        &self,
        x: &[f64],
        n_terms: usize,
        axis: &AxisOperator,
    ) -> DTensor<T, 2> {
        let xt: Vec<T> = x.iter().map(|&v| T::from_f64(v)).collect();
        let v = self.basis.vandermonde(&xt, n_terms);
        // Column 0 of the f64 design is sqrt(w_i) * phi_0 = sqrt(w_i)
        DTensor::<T, 2>::from_fn([x.len(), n_terms], |idx| {
            T::from_f64(axis.design[[idx[0], 0]]) * v[[idx[0], idx[1]]]
        })
    }

    fn residual<T: CustomNumeric>(
        &self,
        design: &[DTensor<T, 2>],
        rhs: &[T],
        coeffs: &[T],
    ) -> Vec<T> {
        let fitted = apply_all(design, coeffs, &self.n_terms);
        rhs.iter().zip(&fitted).map(|(&b, &p)| b - p).collect()
    }
}

fn apply_all<T: CustomNumeric>(operators: &[DTensor<T, 2>], data: &[T], shape: &[usize]) -> Vec<T> {
    let mut data = data.to_vec();
    let mut shape = shape.to_vec();
    for (axis, op) in operators.iter().enumerate() {
        let (next, next_shape) = mode_product(&data, &shape, axis, op);
        data = next;
        shape = next_shape;
    }
    data
}

fn convert_tensor<T: CustomNumeric>(m: &DTensor<f64, 2>) -> DTensor<T, 2> {
    let (rows, cols) = *m.shape();
    DTensor::<T, 2>::from_fn([rows, cols], |idx| T::from_f64(m[[idx[0], idx[1]]]))
}

/// Build sqrt(w) V and its pseudo-inverse for one dimension
fn axis_operator(basis: Basis, rule: &Rule<f64>, n_terms: usize) -> Result<AxisOperator> {
    let n_points = rule.len();
    let v = basis.vandermonde(&rule.x, n_terms);
    let a = DMatrix::<f64>::from_fn(n_points, n_terms, |i, k| rule.w[i].sqrt() * v[[i, k]]);

    let svd = a.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    if !(s_min > 0.0) || !s_max.is_finite() {
        return Err(PolycritError::instability(
            Stage::Approximation,
            format!(
                "rank-deficient {} design with {} nodes and {} terms",
                basis, n_points, n_terms
            ),
        ));
    }
    let pinv = svd
        .pseudo_inverse(f64::EPSILON * s_max)
        .map_err(|msg| PolycritError::instability(Stage::Approximation, msg.to_string()))?;

    log::debug!(
        "{} axis: {} nodes, {} terms, condition {:.3e}",
        basis,
        n_points,
        n_terms,
        s_max / s_min
    );

    Ok(AxisOperator {
        design: DTensor::<f64, 2>::from_fn([n_points, n_terms], |idx| a[(idx[0], idx[1])]),
        pinv: DTensor::<f64, 2>::from_fn([n_terms, n_points], |idx| pinv[(idx[0], idx[1])]),
        condition: s_max / s_min,
    })
}

#[cfg(test)]
#[path = "fitter_tests.rs"]
mod tests;
