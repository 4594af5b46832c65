//! polars `DataFrame` export of profile and observation tables

use crate::data::{Column, ColumnKind, Table, Value};
use crate::error::Result;
use crate::explainability::{ObservationTable, ProfileTable};
use crate::export::{IDS_COLUMN, LABEL_COLUMN, VNAME_COLUMN, YHAT_COLUMN, Y_COLUMN};
use polars::prelude::DataFrame;

/// Kind of an exported column; ints mixed with floats widen to Float
fn export_kind(values: &[Value]) -> ColumnKind {
    let mut present = values.iter().filter(|v| !v.is_missing());
    if present.all(|v| matches!(v, Value::Int(_) | Value::Float(_)))
        && values.iter().any(|v| matches!(v, Value::Float(f) if !f.is_nan()))
    {
        return ColumnKind::Float;
    }
    ColumnKind::infer(values)
}

fn variable_columns<'a>(
    names: &[String],
    rows: impl Iterator<Item = &'a [Value]>,
) -> Result<Vec<Column>> {
    let mut buffers: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for values in rows {
        for (buffer, value) in buffers.iter_mut().zip(values) {
            buffer.push(value.clone());
        }
    }

    names
        .iter()
        .zip(buffers)
        .map(|(name, values)| Column::new(name.clone(), export_kind(&values), values))
        .collect()
}

fn id_column(ids: impl Iterator<Item = usize>) -> Column {
    Column::integer(IDS_COLUMN, ids.map(|id| id as i64))
}

impl ProfileTable {
    /// Long-form frame: variable columns followed by `_yhat_`, `_vname_`, `_label_`, `_ids_`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = variable_columns(self.variable_names(), self.iter().map(|r| r.values.as_slice()))?;
        columns.push(Column::float(YHAT_COLUMN, self.iter().map(|r| r.yhat)));
        columns.push(Column::categorical(VNAME_COLUMN, self.iter().map(|r| r.variable.as_str())));
        columns.push(Column::categorical(LABEL_COLUMN, self.iter().map(|r| r.label.as_str())));
        columns.push(id_column(self.iter().map(|r| r.profile_id)));

        Table::new(columns)?.to_dataframe()
    }
}

impl ObservationTable {
    /// Variable columns followed by `_yhat_`, `_label_`, `_ids_`, `_y_`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = variable_columns(self.variable_names(), self.iter().map(|r| r.values.as_slice()))?;
        columns.push(Column::float(YHAT_COLUMN, self.iter().map(|r| r.yhat)));
        columns.push(Column::categorical(LABEL_COLUMN, self.iter().map(|r| r.label.as_str())));
        columns.push(id_column(self.iter().map(|r| r.profile_id)));

        let truth: Vec<Value> = self
            .iter()
            .map(|r| r.y.clone().unwrap_or(Value::Missing))
            .collect();
        columns.push(Column::new(Y_COLUMN, export_kind(&truth), truth)?);

        Table::new(columns)?.to_dataframe()
    }
}
