//! Ceteris Paribus profile assembly
//!
//! Orchestrates split resolution and grid prediction across every selected variable
//! and every new observation, producing a long-form profile table and a companion
//! observation table.

use crate::data::{Table, Value};
use crate::error::{CeterisError, Result};
use crate::explainability::explainer::Explainer;
use crate::explainability::grid::ObservationGrid;
use crate::explainability::split::resolve_variable_splits;
use crate::explainability::{ProfileConfig, VariableSplits};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

/// One row of the profile table: a synthetic observation and its prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    /// Variable values in explainer order; only `variable` differs from the observation
    pub values: Vec<Value>,
    /// Model prediction
    pub yhat: f64,
    /// Name of the varied variable
    pub variable: String,
    /// Model label
    pub label: String,
    /// Index of the originating observation
    pub profile_id: usize,
}

/// Long-form profile table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTable {
    variable_names: Vec<String>,
    rows: Vec<ProfileRow>,
}

impl ProfileTable {
    pub fn new(variable_names: Vec<String>, rows: Vec<ProfileRow>) -> Self {
        Self { variable_names, rows }
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn rows(&self) -> &[ProfileRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileRow> {
        self.rows.iter()
    }

    /// Value of variable `name` in `row`
    pub fn value<'r>(&self, row: &'r ProfileRow, name: &str) -> Option<&'r Value> {
        let idx = self.variable_names.iter().position(|n| n == name)?;
        row.values.get(idx)
    }

    /// Rows grouped by varied variable, keys sorted
    pub fn split_by_variable(&self) -> BTreeMap<&str, Vec<&ProfileRow>> {
        let mut groups: BTreeMap<&str, Vec<&ProfileRow>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.variable.as_str()).or_default().push(row);
        }
        groups
    }

    /// Rows grouped by profile id, keys sorted
    pub fn split_by_observation(&self) -> BTreeMap<usize, Vec<&ProfileRow>> {
        let mut groups: BTreeMap<usize, Vec<&ProfileRow>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.profile_id).or_default().push(row);
        }
        groups
    }

    /// Smallest and largest prediction, ignoring NaN
    pub fn prediction_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .map(|r| r.yhat)
            .filter(|y| !y.is_nan())
            .fold(None, |acc, y| match acc {
                None => Some((y, y)),
                Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            })
    }

    fn relabel(&mut self, label: &str) {
        for row in &mut self.rows {
            row.label = label.to_string();
        }
    }
}

/// One row of the observation table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    /// Original variable values
    pub values: Vec<Value>,
    /// Model prediction for the observation itself
    pub yhat: f64,
    pub label: String,
    /// Matches `ProfileRow::profile_id`
    pub profile_id: usize,
    /// True label, when supplied
    pub y: Option<Value>,
}

/// Observations and their own predictions, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationTable {
    variable_names: Vec<String>,
    rows: Vec<ObservationRow>,
}

impl ObservationTable {
    pub fn new(variable_names: Vec<String>, rows: Vec<ObservationRow>) -> Self {
        Self { variable_names, rows }
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn rows(&self) -> &[ObservationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObservationRow> {
        self.rows.iter()
    }

    fn relabel(&mut self, label: &str) {
        for row in &mut self.rows {
            row.label = label.to_string();
        }
    }
}

/// True labels for the profiled observations
#[derive(Debug, Clone, PartialEq)]
pub enum TrueLabels {
    /// A bare scalar; only valid when exactly one observation is profiled
    Single(Value),
    /// One label per observation
    Many(Vec<Value>),
}

impl TrueLabels {
    /// Normalise to one label per observation
    pub fn normalize(self, n_observations: usize) -> Result<Vec<Value>> {
        match self {
            TrueLabels::Single(value) if n_observations == 1 => Ok(vec![value]),
            TrueLabels::Single(_) => Err(CeterisError::InvalidInput(format!(
                "A single true label was given for {} observations",
                n_observations
            ))),
            TrueLabels::Many(values) if values.len() == n_observations => Ok(values),
            TrueLabels::Many(values) => Err(CeterisError::InvalidInput(format!(
                "{} true labels given for {} observations",
                values.len(),
                n_observations
            ))),
        }
    }
}

impl From<Value> for TrueLabels {
    fn from(value: Value) -> Self {
        TrueLabels::Single(value)
    }
}

impl From<f64> for TrueLabels {
    fn from(value: f64) -> Self {
        TrueLabels::Single(Value::from(value))
    }
}

impl<V: Into<Value>> From<Vec<V>> for TrueLabels {
    fn from(values: Vec<V>) -> Self {
        TrueLabels::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Sorted, de-duplicated variable selection; everything when `requested` is empty
pub fn selected_variables(all: &[String], requested: Option<&[String]>) -> Result<Vec<String>> {
    let requested = match requested {
        Some(r) if !r.is_empty() => r,
        _ => all,
    };

    let known: BTreeSet<&str> = all.iter().map(String::as_str).collect();
    let unknown: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|v| !known.contains(v))
        .collect();
    if !unknown.is_empty() {
        return Err(CeterisError::InvalidInput(format!(
            "Invalid variable names: {:?}",
            unknown
        )));
    }

    let selected: BTreeSet<&String> = requested.iter().collect();
    Ok(selected.into_iter().cloned().collect())
}

/// Ceteris Paribus profiles of one model for a set of observations
#[derive(Debug, Clone)]
pub struct CeterisParibus {
    label: String,
    variable_names: Vec<String>,
    selected_variables: Vec<String>,
    variable_splits: VariableSplits,
    profile: ProfileTable,
    observations: ObservationTable,
    n_training_rows: Option<usize>,
}

impl CeterisParibus {
    /// Compute profiles for every row of `observations`
    pub fn compute(
        explainer: &Explainer,
        observations: &Table,
        truth: Option<TrueLabels>,
        config: &ProfileConfig,
    ) -> Result<Self> {
        let names = explainer.variable_names();
        if config.grid_points == 0 {
            return Err(CeterisError::InvalidInput(
                "grid_points must be at least 1".to_string(),
            ));
        }
        if observations.n_cols() != names.len() {
            return Err(CeterisError::InvalidInput(format!(
                "Observations have {} columns but the explainer has {} variables",
                observations.n_cols(),
                names.len()
            )));
        }

        let renamed: Cow<'_, Table> = if observations.column_names() == names {
            Cow::Borrowed(observations)
        } else {
            Cow::Owned(observations.clone().with_column_names(names)?)
        };
        let kinds = explainer.column_kinds(&renamed);
        let rows: Vec<Vec<Value>> = renamed.rows().collect();
        // grid rows and the observations' own predictions see the same coerced values
        let observations = Table::from_rows(names, &kinds, &rows)?;
        let n = observations.n_rows();
        let truth = truth.map(|t| t.normalize(n)).transpose()?;

        let selected = selected_variables(names, config.variables.as_deref())?;
        let splits = resolve_variable_splits(
            explainer.data(),
            &selected,
            config.grid_points,
            config.variable_splits.as_ref(),
        )?;

        let label = explainer.label();
        let grid = ObservationGrid::new(names, &kinds, explainer.model(), label);

        let mut profile_rows = Vec::new();
        for (profile_id, observation) in observations.rows().enumerate() {
            for variable in &selected {
                let split = splits
                    .get(variable)
                    .ok_or_else(|| CeterisError::FeatureNotFound(variable.clone()))?;
                profile_rows.extend(grid.build_variable_frame(&observation, variable, split, profile_id)?);
            }
        }

        let predictions = if n == 0 {
            Vec::new()
        } else {
            explainer.predict(&observations)?
        };
        let observation_rows = observations
            .rows()
            .zip(predictions)
            .enumerate()
            .map(|(profile_id, (values, yhat))| ObservationRow {
                values,
                yhat,
                label: label.to_string(),
                profile_id,
                y: truth.as_ref().map(|t| t[profile_id].clone()),
            })
            .collect();

        debug!(
            label,
            observations = n,
            variables = selected.len(),
            profile_rows = profile_rows.len(),
            "Computed Ceteris Paribus profiles"
        );

        Ok(Self {
            label: label.to_string(),
            variable_names: names.to_vec(),
            selected_variables: selected,
            variable_splits: splits,
            profile: ProfileTable::new(names.to_vec(), profile_rows),
            observations: ObservationTable::new(names.to_vec(), observation_rows),
            n_training_rows: explainer.data().map(Table::n_rows),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Change the label of the profile and of every row it holds
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
        self.profile.relabel(&self.label);
        self.observations.relabel(&self.label);
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn selected_variables(&self) -> &[String] {
        &self.selected_variables
    }

    pub fn variable_splits(&self) -> &VariableSplits {
        &self.variable_splits
    }

    pub fn profile(&self) -> &ProfileTable {
        &self.profile
    }

    pub fn observations(&self) -> &ObservationTable {
        &self.observations
    }

    /// Number of training rows of the explainer, when it had data
    pub fn n_training_rows(&self) -> Option<usize> {
        self.n_training_rows
    }

    pub fn split_by_variable(&self) -> BTreeMap<&str, Vec<&ProfileRow>> {
        self.profile.split_by_variable()
    }

    pub fn split_by_observation(&self) -> BTreeMap<usize, Vec<&ProfileRow>> {
        self.profile.split_by_observation()
    }

    /// Filter the profiled variables for display.
    ///
    /// A request that is not a subset of the profiled variables is ignored with a
    /// warning and every profiled variable is returned.
    pub fn select_variables<S: AsRef<str>>(&self, requested: &[S]) -> Vec<String> {
        if requested.is_empty() {
            return self.selected_variables.clone();
        }

        let profiled: BTreeSet<&str> = self.selected_variables.iter().map(String::as_str).collect();
        if requested.iter().all(|v| profiled.contains(v.as_ref())) {
            let chosen: BTreeSet<&str> = requested.iter().map(AsRef::as_ref).collect();
            return chosen.into_iter().map(str::to_string).collect();
        }

        let requested: Vec<&str> = requested.iter().map(AsRef::as_ref).collect();
        warn!(
            requested = ?requested,
            profiled = ?self.selected_variables,
            "Selected variables are not a subset of the profiled variables; showing all"
        );
        self.selected_variables.clone()
    }

    pub fn into_tables(self) -> (ProfileTable, ObservationTable) {
        (self.profile, self.observations)
    }
}

impl fmt::Display for CeterisParibus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selected variables: {:?}", self.selected_variables)?;
        match self.n_training_rows {
            Some(n) => writeln!(f, "Training data size: {}", n)?,
            None => writeln!(f, "Training data size: unknown")?,
        }

        let header: Vec<&str> = self
            .variable_names
            .iter()
            .map(String::as_str)
            .chain(["_yhat_", "_vname_", "_label_", "_ids_"])
            .collect();
        writeln!(f, "{}", header.join("\t"))?;

        for row in self.profile.iter() {
            let cells: Vec<String> = row.values.iter().map(Value::to_string).collect();
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}",
                cells.join("\t"),
                row.yhat,
                row.variable,
                row.label,
                row.profile_id
            )?;
        }
        Ok(())
    }
}

/// Compute Ceteris Paribus profiles for `observations`
pub fn individual_variable_profile(
    explainer: &Explainer,
    observations: &Table,
    truth: Option<TrueLabels>,
    config: &ProfileConfig,
) -> Result<CeterisParibus> {
    CeterisParibus::compute(explainer, observations, truth, config)
}

/// Profile and observation tables for `observations`
pub fn compute_profile(
    explainer: &Explainer,
    observations: &Table,
    truth: Option<TrueLabels>,
    config: &ProfileConfig,
) -> Result<(ProfileTable, ObservationTable)> {
    CeterisParibus::compute(explainer, observations, truth, config).map(CeterisParibus::into_tables)
}
