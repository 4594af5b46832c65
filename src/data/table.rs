//! Tagged-column table
//!
//! A table is an ordered set of uniquely named columns, each carrying an explicit
//! [`ColumnKind`]. Rows are materialised on demand as fixed-order `Vec<Value>`s.

use crate::data::Value;
use crate::error::{CeterisError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Float,
    Integer,
    Boolean,
    Categorical,
}

impl ColumnKind {
    /// Numeric kinds take part in range-normalised distances
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Float | ColumnKind::Integer)
    }

    /// Discrete kinds are enumerated rather than sampled on a quantile grid
    pub fn is_discrete(self) -> bool {
        !matches!(self, ColumnKind::Float)
    }

    /// Infer a kind from the first non-missing value; all-missing columns are Float
    pub fn infer(values: &[Value]) -> ColumnKind {
        values
            .iter()
            .find(|v| !v.is_missing())
            .map(|v| match v {
                Value::Int(_) => ColumnKind::Integer,
                Value::Bool(_) => ColumnKind::Boolean,
                Value::Str(_) => ColumnKind::Categorical,
                _ => ColumnKind::Float,
            })
            .unwrap_or(ColumnKind::Float)
    }

    /// Convert a value into this kind's representation.
    ///
    /// Ints widen into float columns and integral floats narrow into integer
    /// columns; every other mismatch is rejected.
    pub fn coerce(self, value: Value) -> Result<Value> {
        if value.is_missing() {
            return Ok(Value::Missing);
        }
        match (self, value) {
            (ColumnKind::Float, Value::Float(v)) => Ok(Value::Float(v)),
            (ColumnKind::Float, Value::Int(v)) => Ok(Value::Float(v as f64)),
            (ColumnKind::Integer, Value::Int(v)) => Ok(Value::Int(v)),
            (ColumnKind::Integer, Value::Float(v)) if v.fract() == 0.0 && v.is_finite() => {
                Ok(Value::Int(v as i64))
            }
            (ColumnKind::Boolean, Value::Bool(v)) => Ok(Value::Bool(v)),
            (ColumnKind::Categorical, Value::Str(s)) => Ok(Value::Str(s)),
            (kind, other) => Err(CeterisError::InvalidInput(format!(
                "Cannot store {} value '{}' in a {:?} column",
                other.type_name(),
                other,
                kind
            ))),
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: Vec<Value>,
}

impl Column {
    /// Create a column, coercing every value to `kind`
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Value>) -> Result<Self> {
        let values = values
            .into_iter()
            .map(|v| kind.coerce(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.into(),
            kind,
            values,
        })
    }

    /// Float column; NaN becomes missing
    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Float,
            values: values.into_iter().map(Value::from).collect(),
        }
    }

    pub fn float_opt(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Float,
            values: values.into_iter().map(Value::from).collect(),
        }
    }

    pub fn integer(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Integer,
            values: values.into_iter().map(Value::Int).collect(),
        }
    }

    pub fn integer_opt(name: impl Into<String>, values: impl IntoIterator<Item = Option<i64>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Integer,
            values: values.into_iter().map(Value::from).collect(),
        }
    }

    pub fn boolean(name: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Boolean,
            values: values.into_iter().map(Value::Bool).collect(),
        }
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
            values: values.into_iter().map(|s| Value::Str(s.into())).collect(),
        }
    }

    pub fn categorical_opt<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
            values: values
                .into_iter()
                .map(|s| s.map(|s| Value::Str(s.into())).unwrap_or(Value::Missing))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Non-missing values as floats (numeric and boolean columns only)
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Ordered collection of equally long, uniquely named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table, validating unique names and equal column lengths
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(CeterisError::InvalidInput(format!(
                    "Duplicate column name '{}'",
                    col.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let n = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != n) {
                return Err(CeterisError::ShapeError {
                    expected: format!("{} rows", n),
                    actual: format!("{} rows in column '{}'", bad.len(), bad.name),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Build a table from row-major values with an explicit schema
    pub fn from_rows(names: &[String], kinds: &[ColumnKind], rows: &[Vec<Value>]) -> Result<Self> {
        if names.len() != kinds.len() {
            return Err(CeterisError::ShapeError {
                expected: format!("{} column kinds", names.len()),
                actual: format!("{}", kinds.len()),
            });
        }

        let mut buffers: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(CeterisError::ShapeError {
                    expected: format!("{} values per row", names.len()),
                    actual: format!("{} values in row {}", row.len(), i),
                });
            }
            for (buf, value) in buffers.iter_mut().zip(row.iter()) {
                buf.push(value.clone());
            }
        }

        let columns = names
            .iter()
            .zip(kinds.iter())
            .zip(buffers)
            .map(|((name, &kind), values)| Column::new(name.clone(), kind, values))
            .collect::<Result<Vec<_>>>()?;

        Self::new(columns)
    }

    /// Build a table holding `n` copies of `row`
    pub fn from_repeated_row(
        names: &[String],
        kinds: &[ColumnKind],
        row: &[Value],
        n: usize,
    ) -> Result<Self> {
        if row.len() != names.len() || kinds.len() != names.len() {
            return Err(CeterisError::ShapeError {
                expected: format!("{} values per row", names.len()),
                actual: format!("{}", row.len()),
            });
        }

        let columns = names
            .iter()
            .zip(kinds.iter())
            .zip(row.iter())
            .map(|((name, &kind), value)| {
                let value = kind.coerce(value.clone())?;
                Ok(Column {
                    name: name.clone(),
                    kind,
                    values: vec![value; n],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(columns)
    }

    /// Untyped fallback: every column of the matrix becomes a Float column.
    ///
    /// Without names, columns are named by position ("0", "1", ...).
    pub fn from_array(array: &Array2<f64>, names: Option<&[String]>) -> Result<Self> {
        let names: Vec<String> = match names {
            Some(names) => {
                if names.len() != array.ncols() {
                    return Err(CeterisError::ShapeError {
                        expected: format!("{} column names", array.ncols()),
                        actual: format!("{}", names.len()),
                    });
                }
                names.to_vec()
            }
            None => (0..array.ncols()).map(|i| i.to_string()).collect(),
        };

        let columns = array
            .columns()
            .into_iter()
            .zip(names)
            .map(|(col, name)| Column::float(name, col.iter().copied()))
            .collect();

        Self::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn kinds(&self) -> Vec<ColumnKind> {
        self.columns.iter().map(|c| c.kind).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CeterisError::FeatureNotFound(name.to_string()))
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Materialise one row in column order
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.n_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index].clone()).collect())
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.n_rows()).map(move |i| self.columns.iter().map(|c| c.values[i].clone()).collect())
    }

    /// Rows at `indices`, in the order given (repeats allowed)
    pub fn take(&self, indices: &[usize]) -> Result<Table> {
        let n = self.n_rows();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(CeterisError::InvalidInput(format!(
                "Row index {} out of bounds (n_rows={})",
                bad, n
            )));
        }

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();

        Ok(Table { columns })
    }

    /// Columns with the given names, in the given order
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| self.column(name.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    /// Rename columns positionally
    pub fn with_column_names(self, names: &[String]) -> Result<Table> {
        if names.len() != self.n_cols() {
            return Err(CeterisError::ShapeError {
                expected: format!("{} column names", self.n_cols()),
                actual: format!("{}", names.len()),
            });
        }
        let columns = self
            .columns
            .into_iter()
            .zip(names.iter())
            .map(|(col, name)| col.renamed(name.clone()))
            .collect();
        Table::new(columns)
    }

    /// Replace the values of column `name`, coercing them to its kind
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        let n_rows = self.n_rows();
        if values.len() != n_rows {
            return Err(CeterisError::ShapeError {
                expected: format!("{} values", n_rows),
                actual: format!("{}", values.len()),
            });
        }
        let idx = self
            .column_index(name)
            .ok_or_else(|| CeterisError::FeatureNotFound(name.to_string()))?;
        let kind = self.columns[idx].kind;
        self.columns[idx].values = values
            .into_iter()
            .map(|v| kind.coerce(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    /// Row-major numeric matrix for ndarray-based models.
    ///
    /// Booleans map to 0/1 and missing cells to NaN; categorical columns are rejected.
    pub fn to_array(&self) -> Result<Array2<f64>> {
        if let Some(col) = self.columns.iter().find(|c| c.kind == ColumnKind::Categorical) {
            return Err(CeterisError::InvalidInput(format!(
                "Categorical column '{}' cannot be converted to a numeric matrix",
                col.name
            )));
        }

        let col_refs: Vec<&[Value]> = self.columns.iter().map(|c| c.values.as_slice()).collect();
        Ok(Array2::from_shape_fn((self.n_rows(), self.n_cols()), |(r, c)| {
            col_refs[c][r].as_f64().unwrap_or(f64::NAN)
        }))
    }
}
