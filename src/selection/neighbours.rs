//! Nearest-neighbour selection of observations

use crate::data::{Table, Value};
use crate::error::{CeterisError, Result};
use crate::selection::gower::gower_distances;
use crate::selection::{check_labels, clamp_count, Selection};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_NEIGHBOURS: usize = 20;

/// Dissimilarity between a reference row and every row of a table
pub trait Distance: Send + Sync {
    fn distances(&self, reference: &[Value], candidates: &Table) -> Result<Vec<f64>>;
}

impl<F> Distance for F
where
    F: Fn(&[Value], &Table) -> Result<Vec<f64>> + Send + Sync,
{
    fn distances(&self, reference: &[Value], candidates: &Table) -> Result<Vec<f64>> {
        self(reference, candidates)
    }
}

/// Metric used to rank candidate rows
#[derive(Clone, Default)]
pub enum DistanceMetric {
    /// Gower-like mixed-type dissimilarity
    #[default]
    Gower,
    /// Caller-supplied distance
    Custom(Arc<dyn Distance>),
}

impl DistanceMetric {
    pub fn custom(distance: impl Distance + 'static) -> Self {
        DistanceMetric::Custom(Arc::new(distance))
    }
}

impl Distance for DistanceMetric {
    fn distances(&self, reference: &[Value], candidates: &Table) -> Result<Vec<f64>> {
        let distances = match self {
            DistanceMetric::Gower => gower_distances(reference, candidates)?,
            DistanceMetric::Custom(distance) => distance.distances(reference, candidates)?,
        };
        if distances.len() != candidates.n_rows() {
            return Err(CeterisError::ShapeError {
                expected: format!("{} distances", candidates.n_rows()),
                actual: format!("{}", distances.len()),
            });
        }
        Ok(distances)
    }
}

impl fmt::Debug for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Gower => write!(f, "Gower"),
            DistanceMetric::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = CeterisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gower" => Ok(DistanceMetric::Gower),
            other => Err(CeterisError::ConfigError(format!(
                "Distance has to be \"gower\" or a custom function, got '{}'",
                other
            ))),
        }
    }
}

/// Selects the rows closest to a reference observation
#[derive(Debug, Clone)]
pub struct NeighbourSelector {
    /// Number of neighbours
    n: usize,
    /// Dissimilarity used for ranking
    metric: DistanceMetric,
    /// Columns the distance is computed on; all when unset
    variables: Option<Vec<String>>,
}

impl NeighbourSelector {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            metric: DistanceMetric::Gower,
            variables: None,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Restrict the distance computation to these columns
    pub fn with_variables<S: Into<String>>(mut self, variables: impl IntoIterator<Item = S>) -> Self {
        self.variables = Some(variables.into_iter().map(Into::into).collect());
        self
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn metric(&self) -> &DistanceMetric {
        &self.metric
    }

    /// The `n` rows of smallest dissimilarity to `reference`, nearest first.
    ///
    /// Ties are broken by original row order. Returned rows keep every column even
    /// when the distance was computed on a subset.
    pub fn select(&self, data: &Table, reference: &[Value], labels: Option<&[Value]>) -> Result<Selection> {
        check_labels(data, labels)?;
        if reference.len() != data.n_cols() {
            return Err(CeterisError::ShapeError {
                expected: format!("{} reference values", data.n_cols()),
                actual: format!("{}", reference.len()),
            });
        }
        let n = clamp_count(self.n, data.n_rows());

        let (candidates, reference) = self.restrict(data, reference)?;
        let distances = self.metric.distances(&reference, &candidates)?;

        let mut ranked: Vec<(f64, usize)> = distances.into_iter().zip(0..).collect();
        let by_distance = |a: &(f64, usize), b: &(f64, usize)| -> Ordering {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        };
        if n < ranked.len() {
            ranked.select_nth_unstable_by(n, by_distance);
            ranked.truncate(n);
        }
        ranked.sort_unstable_by(by_distance);

        debug!(n, metric = ?self.metric, "Selected neighbours");
        let indices = ranked.into_iter().map(|(_, i)| i).collect();
        Selection::from_indices(data, labels, indices)
    }

    fn restrict(&self, data: &Table, reference: &[Value]) -> Result<(Table, Vec<Value>)> {
        let Some(variables) = &self.variables else {
            return Ok((data.clone(), reference.to_vec()));
        };

        let mut distinct: Vec<&str> = Vec::with_capacity(variables.len());
        for v in variables {
            if !distinct.contains(&v.as_str()) {
                distinct.push(v.as_str());
            }
        }

        let positions: Option<Vec<usize>> = distinct.iter().map(|v| data.column_index(v)).collect();
        match positions {
            Some(positions) if !positions.is_empty() => {
                let subset = data.select_columns(distinct.as_slice())?;
                let reference = positions.iter().map(|&i| reference[i].clone()).collect();
                Ok((subset, reference))
            }
            _ => {
                warn!(
                    selected = ?variables,
                    available = ?data.column_names(),
                    "Selected variables are not a subset of the data columns; using all"
                );
                Ok((data.clone(), reference.to_vec()))
            }
        }
    }
}

impl Default for NeighbourSelector {
    fn default() -> Self {
        Self::new(DEFAULT_NEIGHBOURS)
    }
}

/// The `n` rows of `data` closest to `reference` under `metric`
pub fn select_neighbours(
    data: &Table,
    reference: &[Value],
    labels: Option<&[Value]>,
    variables: Option<&[String]>,
    metric: &DistanceMetric,
    n: usize,
) -> Result<Selection> {
    let mut selector = NeighbourSelector::new(n).with_metric(metric.clone());
    if let Some(variables) = variables {
        selector = selector.with_variables(variables.iter().cloned());
    }
    selector.select(data, reference, labels)
}
