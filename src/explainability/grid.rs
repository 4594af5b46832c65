//! Observation grid construction
//!
//! For one (observation, variable, split) triple, replicate the observation once per
//! grid point, overwrite the varied column, and predict the whole batch at once.

use crate::data::{ColumnKind, Table, Value};
use crate::error::Result;
use crate::explainability::explainer::{predict_checked, Predict};
use crate::explainability::ProfileRow;
use tracing::debug;

/// Shared context for building per-variable observation grids
pub struct ObservationGrid<'a> {
    names: &'a [String],
    kinds: &'a [ColumnKind],
    model: &'a dyn Predict,
    label: &'a str,
}

impl<'a> ObservationGrid<'a> {
    pub fn new(
        names: &'a [String],
        kinds: &'a [ColumnKind],
        model: &'a dyn Predict,
        label: &'a str,
    ) -> Self {
        Self {
            names,
            kinds,
            model,
            label,
        }
    }

    /// Synthetic batch: `observation` repeated once per split value, with
    /// `variable` set to the split value of each row
    pub fn build_batch(&self, observation: &[Value], variable: &str, split: &[Value]) -> Result<Table> {
        let mut batch = Table::from_repeated_row(self.names, self.kinds, observation, split.len())?;
        batch.set_column(variable, split.to_vec())?;
        Ok(batch)
    }

    /// Profile rows for one observation and one variable.
    ///
    /// The prediction function is called exactly once for the whole batch.
    pub fn build_variable_frame(
        &self,
        observation: &[Value],
        variable: &str,
        split: &[Value],
        profile_id: usize,
    ) -> Result<Vec<ProfileRow>> {
        let batch = self.build_batch(observation, variable, split)?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        debug!(variable, profile_id, batch_size = batch.n_rows(), "Predicting observation grid");
        let predictions = predict_checked(self.model, &batch)?;

        Ok(batch
            .rows()
            .zip(predictions)
            .map(|(values, yhat)| ProfileRow {
                values,
                yhat,
                variable: variable.to_string(),
                label: self.label.to_string(),
                profile_id,
            })
            .collect())
    }
}
