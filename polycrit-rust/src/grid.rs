//! Tensor sample grids over a box domain
//!
//! A grid with node counts `n = (n_1, ..., n_d)` has `n_i + 1` nodes in
//! dimension `i`, placed by the quadrature rule of the chosen basis and mapped
//! affinely into the domain. Points are enumerated row-major (last dimension
//! fastest), which is also the layout of every coefficient and value tensor
//! in this crate.

use crate::basis::Basis;
use crate::domain::Domain;
use crate::error::{PolycritError, Result, Stage};
use crate::gauss::Rule;
use crate::objective::Objective;

/// Grid configuration: node counts and basis
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub node_counts: Vec<usize>,
    pub basis: Basis,
}

impl GridConfig {
    pub fn new(node_counts: Vec<usize>, basis: Basis) -> Self {
        Self { node_counts, basis }
    }

    /// Same node count in every dimension
    pub fn isotropic(dim: usize, node_count: usize, basis: Basis) -> Self {
        Self::new(vec![node_count; dim], basis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_counts.is_empty() {
            return Err(PolycritError::invalid("node_counts", &self.node_counts));
        }
        if let Some(i) = self.node_counts.iter().position(|&n| n < 1) {
            return Err(PolycritError::invalid_with_hint(
                format!("node_counts[{}]", i),
                self.node_counts[i],
                "every dimension needs a node count of at least 1",
            ));
        }
        let mut total: usize = 1;
        for &n in &self.node_counts {
            total = total.checked_mul(n + 1).ok_or_else(|| {
                PolycritError::invalid_with_hint(
                    "node_counts",
                    &self.node_counts,
                    "total number of grid nodes overflows usize",
                )
            })?;
        }
        Ok(())
    }

    pub fn build(&self, domain: &Domain) -> Result<SampleGrid> {
        make_grid(domain, &self.node_counts, self.basis)
    }
}

/// Deterministic tensor grid on a domain
#[derive(Debug, Clone)]
pub struct SampleGrid {
    domain: Domain,
    node_counts: Vec<usize>,
    basis: Basis,
    /// Per-dimension rules on [-1, 1]
    rules: Vec<Rule<f64>>,
}

/// Build the sample grid for `domain` with `node_counts[i] + 1` nodes per
/// dimension placed by the rule of `basis`.
pub fn make_grid(domain: &Domain, node_counts: &[usize], basis: Basis) -> Result<SampleGrid> {
    let config = GridConfig::new(node_counts.to_vec(), basis);
    config.validate()?;
    if node_counts.len() != domain.dim() {
        return Err(PolycritError::invalid_with_hint(
            "node_counts.len()",
            node_counts.len(),
            format!("domain has dimension {}", domain.dim()),
        ));
    }
    if let Some(i) = domain.half_widths().iter().position(|&h| !(h > 0.0)) {
        return Err(PolycritError::invalid(
            format!("half_widths[{}]", i),
            domain.half_widths()[i],
        ));
    }

    let rules = node_counts.iter().map(|&n| basis.rule(n + 1)).collect();
    log::debug!(
        "built {} grid with node counts {:?} on {}-dimensional domain",
        basis,
        node_counts,
        domain.dim()
    );

    Ok(SampleGrid {
        domain: domain.clone(),
        node_counts: node_counts.to_vec(),
        basis,
        rules,
    })
}

impl SampleGrid {
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn node_counts(&self) -> &[usize] {
        &self.node_counts
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn dim(&self) -> usize {
        self.node_counts.len()
    }

    /// Number of nodes per dimension (`node_counts[i] + 1`)
    pub fn shape(&self) -> Vec<usize> {
        self.node_counts.iter().map(|n| n + 1).collect()
    }

    /// Total number of nodes, the product of `node_counts[i] + 1`
    pub fn total_nodes(&self) -> usize {
        self.shape().iter().product()
    }

    /// Reference rule on [-1, 1] for one dimension
    pub fn reference_rule(&self, dim: usize) -> &Rule<f64> {
        &self.rules[dim]
    }

    pub fn reference_rules(&self) -> &[Rule<f64>] {
        &self.rules
    }

    /// Nodes of one dimension in domain coordinates
    pub fn nodes(&self, dim: usize) -> Vec<f64> {
        let c = self.domain.center()[dim];
        let h = self.domain.half_widths()[dim];
        self.rules[dim].x.iter().map(|t| c + h * t).collect()
    }

    /// Tensor-product quadrature weights, scaled to the domain volume
    pub fn weights(&self) -> Vec<f64> {
        let scaled: Vec<Vec<f64>> = self
            .rules
            .iter()
            .zip(self.domain.half_widths())
            .map(|(rule, h)| rule.w.iter().map(|w| w * h).collect())
            .collect();
        tensor_outer(&scaled)
    }

    /// Iterate over every grid point in domain coordinates, row-major
    pub fn points(&self) -> GridPoints<'_> {
        GridPoints {
            grid: self,
            index: vec![0; self.dim()],
            done: false,
            nodes: (0..self.dim()).map(|i| self.nodes(i)).collect(),
        }
    }

    /// Evaluate `objective` on every node.
    ///
    /// Fails with `NumericalInstability` naming the first non-finite node.
    pub fn sample<O: Objective + ?Sized>(&self, objective: &O) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(self.total_nodes());
        for point in self.points() {
            let value = objective.evaluate(&point);
            if !value.is_finite() {
                return Err(PolycritError::instability(
                    Stage::Sampling,
                    format!("objective returned {} at {:?}", value, point),
                )
                .with_hint("the objective must be finite on the whole box"));
            }
            values.push(value);
        }
        Ok(values)
    }
}

/// Row-major iterator over grid points
pub struct GridPoints<'a> {
    grid: &'a SampleGrid,
    index: Vec<usize>,
    done: bool,
    nodes: Vec<Vec<f64>>,
}

impl Iterator for GridPoints<'_> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let point = self
            .index
            .iter()
            .enumerate()
            .map(|(dim, &i)| self.nodes[dim][i])
            .collect();

        // Advance the multi-index, last dimension fastest
        let shape = self.grid.shape();
        let mut dim = shape.len();
        loop {
            if dim == 0 {
                self.done = true;
                break;
            }
            dim -= 1;
            self.index[dim] += 1;
            if self.index[dim] < shape[dim] {
                break;
            }
            self.index[dim] = 0;
        }
        Some(point)
    }
}

/// Outer product of per-dimension vectors, flattened row-major
pub fn tensor_outer(factors: &[Vec<f64>]) -> Vec<f64> {
    let mut out = vec![1.0];
    for factor in factors {
        let mut next = Vec::with_capacity(out.len() * factor.len());
        for &a in &out {
            for &b in factor {
                next.push(a * b);
            }
        }
        out = next;
    }
    out
}

#[cfg(test)]
#[path = "grid_tests.rs"]
mod tests;
