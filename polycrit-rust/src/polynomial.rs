//! Dense tensor-product polynomials
//!
//! A [`TensorPolynomial`] stores coefficients `c[k_1, ..., k_d]` of
//!
//! p(t) = sum_k c[k] * phi_{k_1}(t_1) * ... * phi_{k_d}(t_d)
//!
//! on the reference cube [-1, 1]^d, flattened row-major (last index fastest).
//! Every linear per-axis operation (evaluation on a grid, differentiation,
//! change of basis) is a mode product with a small `DTensor<T, 2>` operator.
//!
//! [`DomainPolynomial`] pairs a reference polynomial with its [`Domain`] and
//! exposes values and derivatives in domain coordinates.

use crate::basis::{Basis, BasisValues};
use crate::domain::Domain;
use crate::error::{PolycritError, Result, Stage};
use crate::gauss::{self, Rule};
use crate::grid::tensor_outer;
use crate::numeric::CustomNumeric;
use mdarray::DTensor;
use nalgebra::DMatrix;

/// Apply `matrix` (shape `[m, shape[axis]]`) along one axis of a row-major
/// tensor. Returns the new data and shape (`shape[axis]` replaced by `m`).
pub fn mode_product<T: CustomNumeric>(
    data: &[T],
    shape: &[usize],
    axis: usize,
    matrix: &DTensor<T, 2>,
) -> (Vec<T>, Vec<usize>) {
    let (rows, cols) = *matrix.shape();
    assert_eq!(
        cols, shape[axis],
        "operator has {} columns but axis {} has length {}",
        cols, axis, shape[axis]
    );
    let outer: usize = shape[..axis].iter().product();
    let inner: usize = shape[axis + 1..].iter().product();

    let mut out = vec![T::zero(); outer * rows * inner];
    for o in 0..outer {
        let src = o * cols * inner;
        let dst = o * rows * inner;
        for i in 0..rows {
            for k in 0..cols {
                let m = matrix[[i, k]];
                if m == T::zero() {
                    continue;
                }
                let a = src + k * inner;
                let b = dst + i * inner;
                for j in 0..inner {
                    out[b + j] = out[b + j] + m * data[a + j];
                }
            }
        }
    }

    let mut new_shape = shape.to_vec();
    new_shape[axis] = rows;
    (out, new_shape)
}

/// Row-major multi-index of a flat position
pub fn multi_index(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for axis in (0..shape.len()).rev() {
        index[axis] = flat % shape[axis];
        flat /= shape[axis];
    }
    index
}

/// Flat position of a row-major multi-index
pub fn flat_index(index: &[usize], shape: &[usize]) -> usize {
    index
        .iter()
        .zip(shape)
        .fold(0, |acc, (&i, &n)| acc * n + i)
}

/// Dense coefficient tensor in one basis family
#[derive(Debug, Clone, PartialEq)]
pub struct TensorPolynomial<T> {
    basis: Basis,
    /// Number of terms per dimension (degree + 1)
    shape: Vec<usize>,
    coeffs: Vec<T>,
}

impl<T: CustomNumeric> TensorPolynomial<T> {
    /// # Panics
    /// Panics if `coeffs.len()` differs from the product of `shape`.
    pub fn new(basis: Basis, shape: Vec<usize>, coeffs: Vec<T>) -> Self {
        assert_eq!(
            coeffs.len(),
            shape.iter().product::<usize>(),
            "coefficient count must match the shape {:?}",
            shape
        );
        Self {
            basis,
            shape,
            coeffs,
        }
    }

    pub fn zeros(basis: Basis, shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self::new(basis, shape, vec![T::zero(); len])
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    /// Per-dimension degree bound
    pub fn degree(&self) -> Vec<usize> {
        self.shape.iter().map(|n| n.saturating_sub(1)).collect()
    }

    pub fn coeffs(&self) -> &[T] {
        &self.coeffs
    }

    pub fn coeffs_mut(&mut self) -> &mut [T] {
        &mut self.coeffs
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn coeff(&self, index: &[usize]) -> T {
        self.coeffs[flat_index(index, &self.shape)]
    }

    pub fn nonzero_count(&self) -> usize {
        self.coeffs.iter().filter(|&&c| c != T::zero()).count()
    }

    pub fn max_abs_coeff(&self) -> T {
        self.coeffs
            .iter()
            .fold(T::zero(), |acc, &c| acc.max(c.abs()))
    }

    /// Whether every coefficient is exactly zero
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == T::zero())
    }

    /// Apply one operator per axis
    pub fn apply_per_axis(&self, operators: &[DTensor<T, 2>]) -> (Vec<T>, Vec<usize>) {
        assert_eq!(operators.len(), self.dim());
        let mut data = self.coeffs.clone();
        let mut shape = self.shape.clone();
        for (axis, op) in operators.iter().enumerate() {
            let (next, next_shape) = mode_product(&data, &shape, axis, op);
            data = next;
            shape = next_shape;
        }
        (data, shape)
    }

    /// Values on the tensor grid spanned by per-dimension reference nodes,
    /// row-major.
    pub fn values_on_grid(&self, nodes: &[Vec<T>]) -> Vec<T> {
        let operators: Vec<DTensor<T, 2>> = nodes
            .iter()
            .zip(&self.shape)
            .map(|(x, &n)| self.basis.vandermonde(x, n))
            .collect();
        self.apply_per_axis(&operators).0
    }

    /// Value at a reference point
    pub fn evaluate(&self, t: &[T]) -> T {
        let nodes: Vec<Vec<T>> = t.iter().map(|&ti| vec![ti]).collect();
        self.values_on_grid(&nodes)[0]
    }

    /// Partial derivative along `axis` with respect to the reference variable.
    ///
    /// The derivative has one fewer term along `axis` (at least one).
    pub fn derivative(&self, axis: usize) -> Self {
        let n = self.shape[axis];
        let rows = n.saturating_sub(1).max(1);
        let columns: Vec<Vec<T>> = (0..n)
            .map(|k| {
                let mut unit = vec![T::zero(); n];
                unit[k] = T::one();
                self.basis.derivative_coefficients(&unit)
            })
            .collect();
        let op = DTensor::<T, 2>::from_fn([rows, n], |idx| columns[idx[1]][idx[0]]);
        let (coeffs, shape) = mode_product(&self.coeffs, &self.shape, axis, &op);
        Self::new(self.basis, shape, coeffs)
    }

    /// Multiply every coefficient by `factor`
    pub fn scaled(&self, factor: T) -> Self {
        Self::new(
            self.basis,
            self.shape.clone(),
            self.coeffs.iter().map(|&c| c * factor).collect(),
        )
    }

    /// Convert numeric representation
    pub fn convert<U: CustomNumeric>(&self) -> TensorPolynomial<U> {
        TensorPolynomial {
            basis: self.basis,
            shape: self.shape.clone(),
            coeffs: self.coeffs.iter().map(|&c| U::from_f64(c.to_f64())).collect(),
        }
    }
}

impl TensorPolynomial<f64> {
    /// Per-axis basis values with first and second derivatives at `t`
    fn axis_values(&self, t: &[f64]) -> Vec<BasisValues> {
        t.iter()
            .zip(&self.shape)
            .map(|(&ti, &n)| self.basis.evaluate_with_derivatives(ti, n))
            .collect()
    }

    /// Contract the coefficients with per-axis derivative orders
    fn contract(&self, values: &[BasisValues], orders: &[usize]) -> f64 {
        let operators: Vec<DTensor<f64, 2>> = values
            .iter()
            .zip(orders)
            .zip(&self.shape)
            .map(|((v, &order), &n)| {
                let row = v.order(order);
                DTensor::<f64, 2>::from_fn([1, n], |idx| row[idx[1]])
            })
            .collect();
        self.apply_per_axis(&operators).0[0]
    }

    /// Gradient with respect to reference coordinates
    pub fn gradient(&self, t: &[f64]) -> Vec<f64> {
        let values = self.axis_values(t);
        let mut orders = vec![0; self.dim()];
        (0..self.dim())
            .map(|i| {
                orders[i] = 1;
                let g = self.contract(&values, &orders);
                orders[i] = 0;
                g
            })
            .collect()
    }

    /// Hessian with respect to reference coordinates
    pub fn hessian(&self, t: &[f64]) -> DMatrix<f64> {
        let d = self.dim();
        let values = self.axis_values(t);
        let mut hess = DMatrix::<f64>::zeros(d, d);
        let mut orders = vec![0; d];
        for i in 0..d {
            for j in i..d {
                orders[i] += 1;
                orders[j] += 1;
                let h = self.contract(&values, &orders);
                orders[i] = 0;
                orders[j] = 0;
                hess[(i, j)] = h;
                hess[(j, i)] = h;
            }
        }
        hess
    }

    /// Re-express the polynomial in another basis family.
    ///
    /// The change of basis per axis is found by interpolation at
    /// Chebyshev-Lobatto nodes, so it is exact up to rounding.
    pub fn convert_basis(&self, target: Basis) -> Result<Self> {
        if target == self.basis {
            return Ok(self.clone());
        }
        let operators = self
            .shape
            .iter()
            .map(|&n| change_of_basis(self.basis, target, n))
            .collect::<Result<Vec<_>>>()?;
        let (coeffs, shape) = self.apply_per_axis(&operators);
        Ok(Self::new(target, shape, coeffs))
    }

    pub fn to_chebyshev(&self) -> Result<Self> {
        self.convert_basis(Basis::Chebyshev)
    }

    /// Coefficients of the monomials t^k (the `Uniform` basis family)
    pub fn to_monomial(&self) -> Result<Self> {
        self.convert_basis(Basis::Uniform)
    }

    /// L2 norm over the reference cube, exact by Gauss-Legendre quadrature
    pub fn reference_l2_norm(&self) -> f64 {
        let rules: Vec<Rule<f64>> = self.shape.iter().map(|&n| gauss::legendre(n)).collect();
        let nodes: Vec<Vec<f64>> = rules.iter().map(|r| r.x.clone()).collect();
        let weights = tensor_outer(&rules.iter().map(|r| r.w.clone()).collect::<Vec<_>>());
        let values = self.values_on_grid(&nodes);
        values
            .iter()
            .zip(&weights)
            .map(|(v, w)| w * v * v)
            .sum::<f64>()
            .sqrt()
    }
}

/// Operator mapping `n` coefficients in `source` to `target`
fn change_of_basis(source: Basis, target: Basis, n: usize) -> Result<DTensor<f64, 2>> {
    let nodes = gauss::chebyshev_lobatto(n).x;
    let vs = source.vandermonde(&nodes, n);
    let vt = target.vandermonde(&nodes, n);

    let a = DMatrix::<f64>::from_fn(n, n, |i, k| vt[[i, k]]);
    let b = DMatrix::<f64>::from_fn(n, n, |i, k| vs[[i, k]]);
    let solved = a.lu().solve(&b).ok_or_else(|| {
        PolycritError::instability(
            Stage::Approximation,
            format!("singular interpolation matrix converting {} to {}", source, target),
        )
    })?;
    Ok(DTensor::<f64, 2>::from_fn([n, n], |idx| {
        solved[(idx[0], idx[1])]
    }))
}

/// Polynomial on a box domain
#[derive(Debug, Clone, PartialEq)]
pub struct DomainPolynomial {
    domain: Domain,
    reference: TensorPolynomial<f64>,
}

impl DomainPolynomial {
    pub fn new(domain: Domain, reference: TensorPolynomial<f64>) -> Self {
        assert_eq!(domain.dim(), reference.dim(), "dimension mismatch");
        Self { domain, reference }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Underlying polynomial on [-1, 1]^d
    pub fn reference(&self) -> &TensorPolynomial<f64> {
        &self.reference
    }

    pub fn dim(&self) -> usize {
        self.domain.dim()
    }

    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.reference.evaluate(&self.domain.to_reference(x))
    }

    /// Gradient in domain units
    pub fn gradient(&self, x: &[f64]) -> Vec<f64> {
        let t = self.domain.to_reference(x);
        self.reference
            .gradient(&t)
            .iter()
            .zip(self.domain.half_widths())
            .map(|(g, h)| g / h)
            .collect()
    }

    /// Hessian in domain units
    pub fn hessian(&self, x: &[f64]) -> DMatrix<f64> {
        let t = self.domain.to_reference(x);
        let h = self.domain.half_widths();
        let mut hess = self.reference.hessian(&t);
        for i in 0..self.dim() {
            for j in 0..self.dim() {
                hess[(i, j)] /= h[i] * h[j];
            }
        }
        hess
    }

    /// L2 norm over the domain
    pub fn l2_norm(&self) -> f64 {
        let jacobian: f64 = self.domain.half_widths().iter().product();
        self.reference.reference_l2_norm() * jacobian.sqrt()
    }

    pub fn to_monomial(&self) -> Result<Self> {
        Ok(Self::new(self.domain.clone(), self.reference.to_monomial()?))
    }
}

#[cfg(test)]
#[path = "polynomial_tests.rs"]
mod tests;
