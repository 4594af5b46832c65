//! Conversions between [`Table`] and polars `DataFrame`, plus CSV loading

use crate::data::{Column, ColumnKind, Table, Value};
use crate::error::{CeterisError, Result};
use polars::prelude as pl;
use polars::prelude::{NamedFrom, SerReader};
use std::fs::File;
use std::path::Path;

impl Table {
    /// Convert a polars frame into a tagged-column table.
    ///
    /// Floats map to Float, signed/unsigned ints to Integer, booleans to Boolean;
    /// any other dtype is cast to string and treated as Categorical.
    pub fn from_dataframe(df: &pl::DataFrame) -> Result<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(column_from_polars)
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    /// Convert into a polars frame with one typed series per column
    pub fn to_dataframe(&self) -> Result<pl::DataFrame> {
        let columns: Vec<pl::Column> = self.columns().iter().map(column_to_polars).collect();
        Ok(pl::DataFrame::new(columns)?)
    }
}

fn column_from_polars(col: &pl::Column) -> Result<Column> {
    let name = col.name().to_string();

    match col.dtype() {
        pl::DataType::Float32 | pl::DataType::Float64 => {
            let cast = col.cast(&pl::DataType::Float64)?;
            let values: Vec<Option<f64>> = cast.f64()?.into_iter().collect();
            Ok(Column::float_opt(name, values))
        }
        pl::DataType::Int8
        | pl::DataType::Int16
        | pl::DataType::Int32
        | pl::DataType::Int64
        | pl::DataType::UInt8
        | pl::DataType::UInt16
        | pl::DataType::UInt32
        | pl::DataType::UInt64 => {
            let cast = col.cast(&pl::DataType::Int64)?;
            let values: Vec<Option<i64>> = cast.i64()?.into_iter().collect();
            Ok(Column::integer_opt(name, values))
        }
        pl::DataType::Boolean => {
            let values: Vec<Value> = col.bool()?.into_iter().map(Value::from).collect();
            Column::new(name, ColumnKind::Boolean, values)
        }
        _ => {
            let cast = col.cast(&pl::DataType::String)?;
            let values: Vec<Option<String>> = cast
                .str()?
                .into_iter()
                .map(|s| s.map(str::to_string))
                .collect();
            Ok(Column::categorical_opt(name, values))
        }
    }
}

fn column_to_polars(col: &Column) -> pl::Column {
    let name = col.name();
    let series = match col.kind() {
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = col.values().iter().map(Value::as_f64).collect();
            pl::Series::new(name.into(), values)
        }
        ColumnKind::Integer => {
            let values: Vec<Option<i64>> = col.values().iter().map(Value::as_i64).collect();
            pl::Series::new(name.into(), values)
        }
        ColumnKind::Boolean => {
            let values: Vec<Option<bool>> = col.values().iter().map(Value::as_bool).collect();
            pl::Series::new(name.into(), values)
        }
        ColumnKind::Categorical => {
            let values: Vec<Option<&str>> = col.values().iter().map(Value::as_str).collect();
            pl::Series::new(name.into(), values)
        }
    };
    series.into()
}

/// Load a CSV file with a header row into a [`Table`]
pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    load_csv_with_separator(path, b',')
}

/// Load a CSV file using a custom field separator
pub fn load_csv_with_separator(path: impl AsRef<Path>, separator: u8) -> Result<Table> {
    let file = File::open(path.as_ref()).map_err(|e| CeterisError::DataError(e.to_string()))?;

    let parse_opts = pl::CsvParseOptions::default().with_separator(separator);
    let df = pl::CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .with_parse_options(parse_opts)
        .into_reader_with_file_handle(file)
        .finish()?;

    Table::from_dataframe(&df)
}
