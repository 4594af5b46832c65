//! Aggregated profiles
//!
//! Collapses the curves of every observation for one variable into a single curve
//! by aggregating predictions at each grid position.

use crate::data::Value;
use crate::error::{CeterisError, Result};
use crate::explainability::ProfileTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Statistic used to combine predictions at one grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
    Min,
    Max,
}

impl Aggregation {
    /// Apply to a non-empty set of predictions
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Aggregation {
    type Err = CeterisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            other => Err(CeterisError::ConfigError(format!(
                "Unknown aggregation '{}'",
                other
            ))),
        }
    }
}

/// One aggregated curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedProfile {
    pub variable: String,
    pub label: String,
    pub aggregation: Aggregation,
    /// Grid values of the variable
    pub grid: Vec<Value>,
    /// Aggregated prediction at each grid value
    pub yhat: Vec<f64>,
    /// Number of observation curves combined
    pub n_profiles: usize,
}

/// Aggregate every observation's curve for `variable`
pub fn aggregate_profile(
    profile: &ProfileTable,
    variable: &str,
    aggregation: Aggregation,
) -> Result<AggregatedProfile> {
    let var_idx = profile
        .variable_names()
        .iter()
        .position(|n| n == variable)
        .ok_or_else(|| CeterisError::FeatureNotFound(variable.to_string()))?;

    let mut curves: BTreeMap<usize, Vec<(&Value, f64)>> = BTreeMap::new();
    let mut label = None;
    for row in profile.iter().filter(|r| r.variable == variable) {
        label.get_or_insert_with(|| row.label.clone());
        let value = row.values.get(var_idx).ok_or_else(|| CeterisError::ShapeError {
            expected: format!("at least {} values per row", var_idx + 1),
            actual: format!("{}", row.values.len()),
        })?;
        curves.entry(row.profile_id).or_default().push((value, row.yhat));
    }

    let Some(first) = curves.values().next() else {
        return Err(CeterisError::InvalidInput(format!(
            "Variable '{}' was not profiled",
            variable
        )));
    };
    let n_grid = first.len();
    if let Some(bad) = curves.values().find(|c| c.len() != n_grid) {
        return Err(CeterisError::ShapeError {
            expected: format!("{} grid points per profile", n_grid),
            actual: format!("{}", bad.len()),
        });
    }

    let grid: Vec<Value> = first.iter().map(|(v, _)| (*v).clone()).collect();
    let yhat = (0..n_grid)
        .map(|i| {
            let at_point: Vec<f64> = curves.values().map(|c| c[i].1).collect();
            aggregation.apply(&at_point)
        })
        .collect();

    Ok(AggregatedProfile {
        variable: variable.to_string(),
        label: label.unwrap_or_default(),
        aggregation,
        grid,
        yhat,
        n_profiles: curves.len(),
    })
}
