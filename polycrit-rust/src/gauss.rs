//! Quadrature rules for sampling and integration
//!
//! The integral of f(x) over [a, b] is approximated by a weighted sum
//!
//! sum(f(xi) * wi for (xi, wi) in zip(x, w))
//!
//! Every rule here integrates with respect to the plain Lebesgue measure, so
//! the weighted sums of all three sampling families estimate the same L2 norm.

use crate::numeric::CustomNumeric;
use std::f64::consts::PI;

/// Quadrature rule on an interval [a, b]
#[derive(Debug, Clone)]
pub struct Rule<T> {
    /// Quadrature points, sorted ascending
    pub x: Vec<T>,
    /// Quadrature weights
    pub w: Vec<T>,
    /// Left endpoint of integration interval
    pub a: T,
    /// Right endpoint of integration interval
    pub b: T,
}

impl<T: CustomNumeric> Rule<T> {
    /// Create a new quadrature rule from points and weights.
    ///
    /// # Panics
    /// Panics if x and w have different lengths.
    pub fn new(x: Vec<T>, w: Vec<T>, a: T, b: T) -> Self {
        assert_eq!(x.len(), w.len(), "x and w must have the same length");
        Self { x, w, a, b }
    }

    /// Rule with no points on [-1, 1]
    pub fn empty() -> Self {
        Self {
            x: vec![],
            w: vec![],
            a: T::from_f64(-1.0),
            b: T::from_f64(1.0),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Reseat the rule to a new interval [a, b].
    ///
    /// Scales and translates the quadrature points and weights to the new interval.
    pub fn reseat(&self, a: T, b: T) -> Self {
        let scaling = (b - a) / (self.b - self.a);
        let half = T::from_f64(0.5);
        let midpoint_old = (self.b + self.a) * half;
        let midpoint_new = (b + a) * half;

        let x = self
            .x
            .iter()
            .map(|&xi| scaling * (xi - midpoint_old) + midpoint_new)
            .collect();
        let w = self.w.iter().map(|&wi| wi * scaling).collect();

        Self { x, w, a, b }
    }

    /// Weighted sum of `f` over the rule
    pub fn integrate<F: Fn(T) -> T>(&self, f: F) -> T {
        self.x
            .iter()
            .zip(self.w.iter())
            .fold(T::zero(), |acc, (&xi, &wi)| acc + wi * f(xi))
    }

    /// Check ordering, bounds and weight positivity
    pub fn validate(&self) -> bool {
        if self.a >= self.b || self.x.len() != self.w.len() {
            return false;
        }
        if self.x.iter().any(|&xi| xi < self.a || xi > self.b) {
            return false;
        }
        if self.x.windows(2).any(|pair| pair[1] <= pair[0]) {
            return false;
        }
        self.w.iter().all(|&wi| wi > T::zero())
    }

    /// Convert the rule to a different numeric type.
    pub fn convert<U: CustomNumeric>(&self) -> Rule<U> {
        Rule {
            x: self.x.iter().map(|&v| U::from_f64(v.to_f64())).collect(),
            w: self.w.iter().map(|&v| U::from_f64(v.to_f64())).collect(),
            a: U::from_f64(self.a.to_f64()),
            b: U::from_f64(self.b.to_f64()),
        }
    }
}

/// Compute Legendre polynomial P_n(x) and its derivative using the recurrence
fn legendre_polynomial_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }

    let mut p0 = 1.0;
    let mut p1 = x;
    let mut dp0 = 0.0;
    let mut dp1 = 1.0;

    for k in 2..=n {
        let k_f = k as f64;
        let k1_f = (k - 1) as f64;

        let p2 = ((2.0 * k1_f + 1.0) * x * p1 - k1_f * p0) / k_f;
        let dp2 = ((2.0 * k1_f + 1.0) * (p1 + x * dp1) - k1_f * dp0) / k_f;

        p0 = p1;
        p1 = p2;
        dp0 = dp1;
        dp1 = dp2;
    }

    (p1, dp1)
}

/// Gauss-Legendre rule with `n` points on [-1, 1].
///
/// Roots are found with Newton's method from Chebyshev-like initial guesses;
/// symmetric pairs are generated together.
pub fn legendre(n: usize) -> Rule<f64> {
    if n == 0 {
        return Rule::empty();
    }
    if n == 1 {
        return Rule::new(vec![0.0], vec![2.0], -1.0, 1.0);
    }

    let mut x = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    let m = n.div_ceil(2);

    for i in 0..m {
        let mut z = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();

        for _ in 0..100 {
            let (p, dp) = legendre_polynomial_and_derivative(n, z);
            let step = p / dp;
            z -= step;
            if step.abs() <= 1e-16 * z.abs().max(1.0) {
                break;
            }
        }

        let (_, dp) = legendre_polynomial_and_derivative(n, z);
        let weight = 2.0 / ((1.0 - z * z) * dp * dp);

        if i == n - 1 - i {
            // Middle root of an odd rule
            x.push(0.0);
            w.push(weight);
        } else {
            x.push(-z);
            w.push(weight);
            x.push(z);
            w.push(weight);
        }
    }

    sort_rule(x, w)
}

/// Chebyshev-Lobatto (extrema) rule with `n` points on [-1, 1] and
/// Clenshaw-Curtis weights.
pub fn chebyshev_lobatto(n: usize) -> Rule<f64> {
    match n {
        0 => return Rule::empty(),
        1 => return Rule::new(vec![0.0], vec![2.0], -1.0, 1.0),
        _ => {}
    }

    let intervals = n - 1;
    let nf = intervals as f64;
    let theta: Vec<f64> = (0..n).map(|j| j as f64 * PI / nf).collect();

    let mut w = vec![0.0; n];
    let mut v = vec![1.0; n];
    let endpoint = if intervals % 2 == 0 {
        let e = 1.0 / (nf * nf - 1.0);
        for k in 1..intervals / 2 {
            let kf = k as f64;
            for j in 1..intervals {
                v[j] -= 2.0 * (2.0 * kf * theta[j]).cos() / (4.0 * kf * kf - 1.0);
            }
        }
        for j in 1..intervals {
            v[j] -= (nf * theta[j]).cos() / (nf * nf - 1.0);
        }
        e
    } else {
        for k in 1..=(intervals - 1) / 2 {
            let kf = k as f64;
            for j in 1..intervals {
                v[j] -= 2.0 * (2.0 * kf * theta[j]).cos() / (4.0 * kf * kf - 1.0);
            }
        }
        1.0 / (nf * nf)
    };
    w[0] = endpoint;
    w[intervals] = endpoint;
    for j in 1..intervals {
        w[j] = 2.0 * v[j] / nf;
    }

    // cos(theta_j) runs from 1 down to -1; negate for ascending order
    let x: Vec<f64> = theta
        .iter()
        .enumerate()
        .map(|(j, &t)| {
            if 2 * j == intervals {
                0.0
            } else {
                -t.cos()
            }
        })
        .collect();

    Rule::new(x, w, -1.0, 1.0)
}

/// Equispaced rule with `n` points on [-1, 1] and trapezoid weights.
pub fn uniform(n: usize) -> Rule<f64> {
    match n {
        0 => return Rule::empty(),
        1 => return Rule::new(vec![0.0], vec![2.0], -1.0, 1.0),
        _ => {}
    }
    let h = 2.0 / (n - 1) as f64;
    let x = (0..n)
        .map(|j| if j == n - 1 { 1.0 } else { -1.0 + j as f64 * h })
        .collect();
    let w = (0..n)
        .map(|j| if j == 0 || j == n - 1 { 0.5 * h } else { h })
        .collect();
    Rule::new(x, w, -1.0, 1.0)
}

fn sort_rule(x: Vec<f64>, w: Vec<f64>) -> Rule<f64> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    indices.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

    let sorted_x = indices.iter().map(|&i| x[i]).collect();
    let sorted_w = indices.iter().map(|&i| w[i]).collect();
    Rule::new(sorted_x, sorted_w, -1.0, 1.0)
}

#[cfg(test)]
#[path = "gauss_tests.rs"]
mod tests;
