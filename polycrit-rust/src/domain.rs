//! Box domains and their affine map to the reference cube [-1, 1]^d

use crate::error::{PolycritError, Result};

/// Axis-aligned box `center ± half_widths`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Domain {
    center: Vec<f64>,
    half_widths: Vec<f64>,
}

impl Domain {
    /// Create a (possibly anisotropic) box.
    ///
    /// Fails with `InvalidDomain` for an empty center, mismatched lengths,
    /// non-finite entries or a half-width that is not strictly positive.
    pub fn new(center: Vec<f64>, half_widths: Vec<f64>) -> Result<Self> {
        if center.is_empty() {
            return Err(PolycritError::invalid_with_hint(
                "dimension",
                0usize,
                "a domain needs at least one dimension",
            ));
        }
        if half_widths.len() != center.len() {
            return Err(PolycritError::invalid_with_hint(
                "half_widths.len()",
                half_widths.len(),
                format!("expected {} entries to match the center", center.len()),
            ));
        }
        if let Some(i) = center.iter().position(|c| !c.is_finite()) {
            return Err(PolycritError::invalid(format!("center[{}]", i), center[i]));
        }
        if let Some(i) = half_widths
            .iter()
            .position(|&h| !(h.is_finite() && h > 0.0))
        {
            return Err(PolycritError::invalid_with_hint(
                format!("half_widths[{}]", i),
                half_widths[i],
                "half-widths must be finite and strictly positive",
            ));
        }
        Ok(Self {
            center,
            half_widths,
        })
    }

    /// Box with the same half-width in every dimension
    pub fn isotropic(center: Vec<f64>, half_width: f64) -> Result<Self> {
        let d = center.len();
        Self::new(center, vec![half_width; d])
    }

    /// Cube [-half_width, half_width]^dim centred at the origin
    pub fn cube(dim: usize, half_width: f64) -> Result<Self> {
        Self::isotropic(vec![0.0; dim], half_width)
    }

    /// Box from per-dimension (lower, upper) bounds
    pub fn from_bounds(bounds: &[(f64, f64)]) -> Result<Self> {
        let center = bounds.iter().map(|&(lo, hi)| 0.5 * (lo + hi)).collect();
        let half_widths = bounds.iter().map(|&(lo, hi)| 0.5 * (hi - lo)).collect();
        Self::new(center, half_widths)
    }

    pub fn dim(&self) -> usize {
        self.center.len()
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn half_widths(&self) -> &[f64] {
        &self.half_widths
    }

    pub fn lower(&self) -> Vec<f64> {
        self.center
            .iter()
            .zip(&self.half_widths)
            .map(|(c, h)| c - h)
            .collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.center
            .iter()
            .zip(&self.half_widths)
            .map(|(c, h)| c + h)
            .collect()
    }

    /// Lebesgue volume of the box
    pub fn volume(&self) -> f64 {
        self.half_widths.iter().map(|h| 2.0 * h).product()
    }

    /// Map domain coordinates to the reference cube
    pub fn to_reference(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.center.iter().zip(&self.half_widths))
            .map(|(xi, (c, h))| (xi - c) / h)
            .collect()
    }

    /// Map reference coordinates back into the domain
    pub fn from_reference(&self, t: &[f64]) -> Vec<f64> {
        t.iter()
            .zip(self.center.iter().zip(&self.half_widths))
            .map(|(ti, (c, h))| c + h * ti)
            .collect()
    }

    /// Inclusive containment with a tolerance relative to each half-width
    pub fn contains(&self, x: &[f64], rel_eps: f64) -> bool {
        x.len() == self.dim()
            && self
                .to_reference(x)
                .iter()
                .all(|t| t.is_finite() && t.abs() <= 1.0 + rel_eps)
    }

    /// Whether some coordinate sits on a face of the box (within `rel_eps`)
    pub fn on_boundary(&self, x: &[f64], rel_eps: f64) -> bool {
        self.to_reference(x)
            .iter()
            .any(|t| (t.abs() - 1.0).abs() <= rel_eps)
    }

    /// Clamp a point into the closed box
    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        let t: Vec<f64> = self
            .to_reference(x)
            .iter()
            .map(|t| t.clamp(-1.0, 1.0))
            .collect();
        self.from_reference(&t)
    }
}
