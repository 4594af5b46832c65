//! Observation selection
//!
//! Picks which training rows to explain:
//! - Seeded uniform sampling without replacement
//! - Nearest neighbours of a reference row under a pluggable dissimilarity
//! - Gower-like dissimilarity for mixed numeric and categorical columns

mod gower;
mod sample;
mod neighbours;

pub use gower::{gower_distances, GowerMetric};
pub use sample::{select_sample, SampleSelector, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED};
pub use neighbours::{select_neighbours, Distance, DistanceMetric, NeighbourSelector, DEFAULT_NEIGHBOURS};

use crate::data::{Table, Value};
use crate::error::{CeterisError, Result};
use tracing::warn;

/// Rows chosen from a table, with their aligned labels
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Selected rows, in selection order
    pub data: Table,
    /// Labels of the selected rows, when labels were given
    pub labels: Option<Vec<Value>>,
    /// Row indices into the source table
    pub indices: Vec<usize>,
}

impl Selection {
    fn from_indices(data: &Table, labels: Option<&[Value]>, indices: Vec<usize>) -> Result<Self> {
        let labels = labels.map(|y| indices.iter().map(|&i| y[i].clone()).collect());
        Ok(Self {
            data: data.take(&indices)?,
            labels,
            indices,
        })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Clamp a requested row count to what is available
fn clamp_count(requested: usize, available: usize) -> usize {
    if requested > available {
        warn!(requested, available, "Given n is larger than data size; using all rows");
        return available;
    }
    requested
}

fn check_labels(data: &Table, labels: Option<&[Value]>) -> Result<()> {
    match labels {
        Some(y) if y.len() != data.n_rows() => Err(CeterisError::ShapeError {
            expected: format!("{} labels", data.n_rows()),
            actual: format!("{}", y.len()),
        }),
        _ => Ok(()),
    }
}
