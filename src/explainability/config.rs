//! Profile configuration

use crate::data::Value;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Mapping from variable name to its ordered grid of query values
pub type VariableSplits = BTreeMap<String, Vec<Value>>;

/// Default number of grid points for continuous variables
pub const DEFAULT_GRID_POINTS: usize = 101;

/// Configuration for Ceteris Paribus profile computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Number of quantile grid points for continuous variables (at least 1)
    pub grid_points: usize,

    /// Variables to profile; all explainer variables when unset or empty
    pub variables: Option<Vec<String>>,

    /// Explicit grids; used only when the key set matches the selected variables
    pub variable_splits: Option<VariableSplits>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            grid_points: DEFAULT_GRID_POINTS,
            variables: None,
            variable_splits: None,
        }
    }
}

impl ProfileConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the number of grid points (at least 1)
    pub fn with_grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points.max(1);
        self
    }

    /// Builder method to restrict the profiled variables
    pub fn with_variables<S: Into<String>>(mut self, variables: impl IntoIterator<Item = S>) -> Self {
        self.variables = Some(variables.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to supply explicit variable grids
    pub fn with_variable_splits(mut self, splits: VariableSplits) -> Self {
        self.variable_splits = Some(splits);
        self
    }

    /// Builder method to supply one explicit grid, adding to any already set
    pub fn with_variable_split<V: Into<Value>>(
        mut self,
        variable: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.variable_splits
            .get_or_insert_with(VariableSplits::new)
            .insert(variable.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
