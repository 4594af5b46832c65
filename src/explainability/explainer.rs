//! Model explanation context
//!
//! An [`Explainer`] bundles everything profile computation needs to know about a
//! fitted model: how to predict, the variable order, the training data used to
//! derive grids, optional true labels, and a display label.

use crate::data::{ColumnKind, Table, Value};
use crate::error::{CeterisError, Result};
use ndarray::{Array1, Array2};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Label used when none is supplied and none can be derived
pub const UNLABELED_MODEL: &str = "unlabeled_model";

/// Capability of producing one prediction per row of a table
pub trait Predict: Send + Sync {
    /// Predict every row of `data`, in order
    fn predict(&self, data: &Table) -> Result<Vec<f64>>;

    /// Display string of the model, e.g. `RandomForestRegressor(n_estimators=100)`
    fn describe(&self) -> Option<String> {
        None
    }
}

impl<F> Predict for F
where
    F: Fn(&Table) -> Result<Vec<f64>> + Send + Sync,
{
    fn predict(&self, data: &Table) -> Result<Vec<f64>> {
        self(data)
    }
}

/// Adapter for models that predict on a numeric ndarray matrix
pub struct ArrayModel<F>
where
    F: Fn(&Array2<f64>) -> Result<Array1<f64>> + Send + Sync,
{
    predict_fn: F,
    name: Option<String>,
}

impl<F> ArrayModel<F>
where
    F: Fn(&Array2<f64>) -> Result<Array1<f64>> + Send + Sync,
{
    pub fn new(predict_fn: F) -> Self {
        Self {
            predict_fn,
            name: None,
        }
    }

    /// Set the display string reported by [`Predict::describe`]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<F> Predict for ArrayModel<F>
where
    F: Fn(&Array2<f64>) -> Result<Array1<f64>> + Send + Sync,
{
    fn predict(&self, data: &Table) -> Result<Vec<f64>> {
        let x = data.to_array()?;
        Ok((self.predict_fn)(&x)?.to_vec())
    }

    fn describe(&self) -> Option<String> {
        self.name.clone()
    }
}

/// Derive a model label from its display string.
///
/// Returns the text before the first `(`, or [`UNLABELED_MODEL`] when the display
/// string is absent or has no parenthesis.
pub fn default_label(display: Option<&str>) -> String {
    display
        .and_then(|s| s.split_once('('))
        .map(|(head, _)| head.trim())
        .filter(|head| !head.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNLABELED_MODEL.to_string())
}

/// Call `model` on `data` and check that it returned one prediction per row
pub(crate) fn predict_checked(model: &dyn Predict, data: &Table) -> Result<Vec<f64>> {
    let predictions = model.predict(data)?;
    if predictions.len() != data.n_rows() {
        return Err(CeterisError::PredictionError(format!(
            "Prediction function returned {} values for {} rows",
            predictions.len(),
            data.n_rows()
        )));
    }
    Ok(predictions)
}

/// Unified representation of a model to be explained
#[derive(Clone)]
pub struct Explainer {
    model: Arc<dyn Predict>,
    variable_names: Vec<String>,
    data: Option<Table>,
    y: Option<Vec<Value>>,
    label: String,
}

impl Explainer {
    pub fn builder() -> ExplainerBuilder {
        ExplainerBuilder::default()
    }

    /// Predict every row of `data`, checking the returned length
    pub fn predict(&self, data: &Table) -> Result<Vec<f64>> {
        predict_checked(self.model.as_ref(), data)
    }

    pub fn model(&self) -> &dyn Predict {
        self.model.as_ref()
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn n_variables(&self) -> usize {
        self.variable_names.len()
    }

    pub fn data(&self) -> Option<&Table> {
        self.data.as_ref()
    }

    pub fn y(&self) -> Option<&[Value]> {
        self.y.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Column kinds used to build synthetic rows: the training data's, or those of
    /// `observations` when the explainer has no data
    pub fn column_kinds(&self, observations: &Table) -> Vec<ColumnKind> {
        match &self.data {
            Some(data) => data.kinds(),
            None => observations.kinds(),
        }
    }
}

impl fmt::Debug for Explainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explainer")
            .field("label", &self.label)
            .field("variable_names", &self.variable_names)
            .field("n_rows", &self.data.as_ref().map(Table::n_rows))
            .field("has_y", &self.y.is_some())
            .finish()
    }
}

/// Builder for [`Explainer`]
#[derive(Default)]
pub struct ExplainerBuilder {
    model: Option<Arc<dyn Predict>>,
    predict_fn: Option<Arc<dyn Predict>>,
    model_repr: Option<String>,
    variable_names: Option<Vec<String>>,
    data: Option<Table>,
    y: Option<Vec<Value>>,
    label: Option<String>,
}

impl ExplainerBuilder {
    /// Model object exposing the predict capability
    pub fn model(mut self, model: impl Predict + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// Explicit prediction function; takes precedence over the model's own
    pub fn predict_fn<F>(mut self, predict_fn: F) -> Self
    where
        F: Fn(&Table) -> Result<Vec<f64>> + Send + Sync + 'static,
    {
        self.predict_fn = Some(Arc::new(predict_fn));
        self
    }

    /// Display string used to derive a default label
    pub fn model_repr(mut self, repr: impl Into<String>) -> Self {
        self.model_repr = Some(repr.into());
        self
    }

    pub fn variable_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.variable_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Training data, used to derive variable grids
    pub fn data(mut self, data: Table) -> Self {
        self.data = Some(data);
        self
    }

    /// True labels aligned with the training data rows
    pub fn labels<V: Into<Value>>(mut self, y: impl IntoIterator<Item = V>) -> Self {
        self.y = Some(y.into_iter().map(Into::into).collect());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn build(self) -> Result<Explainer> {
        let model = self
            .predict_fn
            .or_else(|| self.model.clone())
            .ok_or_else(|| CeterisError::ConfigError("Unable to find predict function".to_string()))?;

        let (variable_names, data) = match (self.variable_names, self.data) {
            (Some(names), Some(data)) => {
                if names.len() != data.n_cols() {
                    return Err(CeterisError::InvalidInput(format!(
                        "{} variable names given but data has {} columns",
                        names.len(),
                        data.n_cols()
                    )));
                }
                let data = data.with_column_names(&names)?;
                (names, Some(data))
            }
            (Some(names), None) => (names, None),
            (None, Some(data)) => (data.column_names(), Some(data)),
            (None, None) => {
                return Err(CeterisError::ConfigError(
                    "Variable names not given and no data to infer them from".to_string(),
                ))
            }
        };

        let mut seen = HashSet::new();
        if let Some(dup) = variable_names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(CeterisError::InvalidInput(format!("Duplicate variable name '{}'", dup)));
        }

        if let (Some(y), Some(data)) = (&self.y, &data) {
            if y.len() != data.n_rows() {
                return Err(CeterisError::ShapeError {
                    expected: format!("{} labels", data.n_rows()),
                    actual: format!("{}", y.len()),
                });
            }
        }

        let label = match self.label {
            Some(label) => label,
            None => {
                warn!("Model is unlabeled; a label can be set with set_label");
                let repr = self
                    .model_repr
                    .or_else(|| self.model.as_ref().and_then(|m| m.describe()));
                default_label(repr.as_deref())
            }
        };

        Ok(Explainer {
            model,
            variable_names,
            data,
            y: self.y,
            label,
        })
    }
}
