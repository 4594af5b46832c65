//! Tabular data module
//!
//! Provides the tagged-column table used throughout the crate:
//! - Typed scalar cells ([`Value`])
//! - Columns with an explicit [`ColumnKind`]
//! - Row-wise access, row subsets, and ndarray / polars conversions
//! - CSV loading through polars

mod value;
mod table;
mod frame;

pub use value::Value;
pub use table::{Column, ColumnKind, Table};
pub use frame::{load_csv, load_csv_with_separator};
