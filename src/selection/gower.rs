//! Gower-like dissimilarity for mixed-type rows
//!
//! Numeric columns contribute `|a - b| / range`; categorical and boolean columns
//! contribute 0 when equal and 1 otherwise. Each pair averages the contributions of
//! the columns that carry weight for it.

use crate::data::{ColumnKind, Table, Value};
use crate::error::{CeterisError, Result};

/// Ranges smaller than this are treated as constant columns
const RANGE_EPSILON: f64 = 1e-8;

/// Per-column ranges and kinds for Gower dissimilarity
#[derive(Debug, Clone, PartialEq)]
pub struct GowerMetric {
    kinds: Vec<ColumnKind>,
    /// `None` for categorical columns or numeric columns without observed values
    ranges: Vec<Option<f64>>,
}

impl GowerMetric {
    /// Ranges computed over `data` and the `reference` row together
    pub fn fit(data: &Table, reference: &[Value]) -> Result<Self> {
        check_row_width(data, reference)?;
        Ok(Self::build(data, Some(reference)))
    }

    /// Ranges computed over `data` only
    pub fn from_table(data: &Table) -> Self {
        Self::build(data, None)
    }

    fn build(data: &Table, reference: Option<&[Value]>) -> Self {
        let kinds = data.kinds();
        let ranges = data
            .columns()
            .iter()
            .enumerate()
            .map(|(j, column)| {
                if !column.kind().is_numeric() {
                    return None;
                }
                let extra = reference.and_then(|r| r[j].as_f64());
                let (lo, hi) = column
                    .values()
                    .iter()
                    .filter_map(Value::as_f64)
                    .chain(extra)
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
                (lo <= hi).then_some(hi - lo)
            })
            .collect();

        Self { kinds, ranges }
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    pub fn ranges(&self) -> &[Option<f64>] {
        &self.ranges
    }

    /// Dissimilarity in `[0, 1]` between two rows.
    ///
    /// Rows where no column carries weight are at distance 0.
    pub fn distance(&self, a: &[Value], b: &[Value]) -> f64 {
        let mut weighted = 0.0;
        let mut weights = 0.0;

        for ((kind, range), (x, y)) in self.kinds.iter().zip(&self.ranges).zip(a.iter().zip(b)) {
            let contribution = if kind.is_numeric() {
                numeric_term(x, y, *range)
            } else {
                categorical_term(x, y)
            };
            if let Some(s) = contribution {
                weighted += s;
                weights += 1.0;
            }
        }

        if weights == 0.0 {
            0.0
        } else {
            weighted / weights
        }
    }

    /// Dissimilarity between `reference` and every row of `data`
    pub fn distances_to(&self, reference: &[Value], data: &Table) -> Result<Vec<f64>> {
        check_row_width(data, reference)?;
        Ok(data.rows().map(|row| self.distance(&row, reference)).collect())
    }
}

fn numeric_term(x: &Value, y: &Value, range: Option<f64>) -> Option<f64> {
    let range = range.filter(|r| r.abs() > RANGE_EPSILON)?;
    let (x, y) = (x.as_f64()?, y.as_f64()?);
    Some((x - y).abs() / range)
}

fn categorical_term(x: &Value, y: &Value) -> Option<f64> {
    match (x.is_missing(), y.is_missing()) {
        (true, true) => None,
        (false, false) if x.total_cmp(y).is_eq() => Some(0.0),
        _ => Some(1.0),
    }
}

fn check_row_width(data: &Table, row: &[Value]) -> Result<()> {
    if row.len() != data.n_cols() {
        return Err(CeterisError::ShapeError {
            expected: format!("{} values", data.n_cols()),
            actual: format!("{}", row.len()),
        });
    }
    Ok(())
}

/// Gower dissimilarity between `reference` and every row of `data`.
///
/// Numeric ranges span `data` and `reference` together. Untyped numeric matrices
/// can be compared through [`Table::from_array`], which treats every column as Float.
pub fn gower_distances(reference: &[Value], data: &Table) -> Result<Vec<f64>> {
    GowerMetric::fit(data, reference)?.distances_to(reference, data)
}
