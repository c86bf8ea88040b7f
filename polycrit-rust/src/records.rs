//! Tabular output of classified critical points
//!
//! A [`CriticalPointTable`] has the stable columns `x1..xd, z` followed by the
//! classification columns `kind, valley_dimension, condition_number,
//! gradient_norm, eig1..eigd`. `z` is the objective value when it was
//! evaluated and the polynomial value otherwise.

use crate::basis::Basis;
use crate::classify::{CriticalKind, CriticalPoint};
use crate::precision::PrecisionMode;
use crate::solver::BackendKind;
use serde::Serialize;
use std::io;
use std::time::Duration;

/// One table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPointRow {
    pub coordinates: Vec<f64>,
    pub z: f64,
    pub kind: CriticalKind,
    pub valley_dimension: usize,
    pub condition_number: f64,
    pub gradient_norm: f64,
    pub eigenvalues: Vec<f64>,
}

impl From<&CriticalPoint> for CriticalPointRow {
    fn from(point: &CriticalPoint) -> Self {
        Self {
            coordinates: point.coordinates.clone(),
            z: point.value(),
            kind: point.kind,
            valley_dimension: point.valley_dimension,
            condition_number: point.condition_number,
            gradient_norm: point.gradient_norm,
            eigenvalues: point.eigenvalues.clone(),
        }
    }
}

/// Critical points of one job in column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPointTable {
    dimension: usize,
    rows: Vec<CriticalPointRow>,
}

impl CriticalPointTable {
    /// Build a table for points of dimension `dimension`.
    ///
    /// # Panics
    /// Panics if some point has a different dimension.
    pub fn new(dimension: usize, points: &[CriticalPoint]) -> Self {
        let rows: Vec<CriticalPointRow> = points.iter().map(CriticalPointRow::from).collect();
        for row in &rows {
            assert_eq!(
                row.coordinates.len(),
                dimension,
                "critical point dimension mismatch"
            );
        }
        Self { dimension, rows }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn rows(&self) -> &[CriticalPointRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one kind, in table order
    pub fn of_kind(&self, kind: CriticalKind) -> impl Iterator<Item = &CriticalPointRow> {
        self.rows.iter().filter(move |r| r.kind == kind)
    }

    /// Row with the smallest `z` among minima
    pub fn lowest_minimum(&self) -> Option<&CriticalPointRow> {
        self.of_kind(CriticalKind::Minimum)
            .min_by(|a, b| a.z.total_cmp(&b.z))
    }

    /// Column names in output order
    pub fn columns(&self) -> Vec<String> {
        let d = self.dimension;
        let mut columns: Vec<String> = (1..=d).map(|i| format!("x{}", i)).collect();
        columns.push("z".to_string());
        columns.extend(
            ["kind", "valley_dimension", "condition_number", "gradient_norm"]
                .iter()
                .map(|s| s.to_string()),
        );
        columns.extend((1..=d).map(|i| format!("eig{}", i)));
        columns
    }

    /// Write a header record and one record per row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> io::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.columns())?;
        for row in &self.rows {
            let mut fields: Vec<String> = row.coordinates.iter().map(|x| x.to_string()).collect();
            fields.push(row.z.to_string());
            fields.push(row.kind.to_string());
            fields.push(row.valley_dimension.to_string());
            fields.push(row.condition_number.to_string());
            fields.push(row.gradient_norm.to_string());
            fields.extend(row.eigenvalues.iter().map(|l| l.to_string()));
            out.write_record(&fields)?;
        }
        out.flush()
    }
}

/// Per-job provenance and counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub dimension: usize,
    pub basis: Basis,
    pub node_counts: Vec<usize>,
    pub degree: Vec<usize>,
    pub precision: PrecisionMode,
    pub l2_error: f64,
    /// Product of the per-axis weighted Vandermonde condition numbers
    pub condition_estimate: f64,
    /// Applied threshold, when the job sparsified
    pub threshold: Option<f64>,
    pub l2_ratio: Option<f64>,
    /// Fraction of zero coefficients in the solved polynomial
    pub sparsity: f64,
    pub nonzero_count: usize,
    pub backend: BackendKind,
    pub fallback_used: bool,
    pub solve_time: Duration,
    pub raw_count: usize,
    pub deduplicated_count: usize,
    pub minima: usize,
    pub maxima: usize,
    pub saddles: usize,
    pub degenerate: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(coordinates: Vec<f64>, z: f64, kind: CriticalKind, eigenvalues: Vec<f64>) -> CriticalPoint {
        CriticalPoint {
            coordinates,
            polynomial_value: z + 1.0,
            objective_value: Some(z),
            gradient_norm: 1e-12,
            eigenvalues,
            kind,
            valley_dimension: 0,
            condition_number: 2.0,
            on_boundary: false,
            fragile: false,
        }
    }

    fn table() -> CriticalPointTable {
        CriticalPointTable::new(
            2,
            &[
                point(vec![-0.5, 0.0], 0.25, CriticalKind::Minimum, vec![1.0, 2.0]),
                point(vec![0.0, 0.0], 1.0, CriticalKind::Saddle, vec![-2.0, 1.0]),
                point(vec![0.5, 0.0], -0.5, CriticalKind::Minimum, vec![1.0, 2.0]),
            ],
        )
    }

    #[test]
    fn test_columns() {
        assert_eq!(
            table().columns(),
            vec![
                "x1",
                "x2",
                "z",
                "kind",
                "valley_dimension",
                "condition_number",
                "gradient_norm",
                "eig1",
                "eig2"
            ]
        );
    }

    #[test]
    fn test_csv_output() {
        let mut buffer = Vec::new();
        table().write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "-0.5,0,0.25,minimum,0,2,0.000000000001,1,2");
        assert!(lines[2].contains(",saddle,"));
        assert!(lines.iter().all(|l| l.split(',').count() == 9));
    }

    #[test]
    fn test_lowest_minimum_prefers_objective_value() {
        let t = table();
        let best = t.lowest_minimum().unwrap();
        assert_eq!(best.coordinates, vec![0.5, 0.0]);
        assert_eq!(best.z, -0.5);
        assert_eq!(t.of_kind(CriticalKind::Saddle).count(), 1);
    }

    #[test]
    fn test_json_serialization() {
        let value = serde_json::to_value(table()).unwrap();
        assert_eq!(value["dimension"], 2);
        assert_eq!(value["rows"][1]["kind"], "Saddle");
        assert_eq!(value["rows"][0]["eigenvalues"][1], 2.0);
    }
}
