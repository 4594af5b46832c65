//! Ceteris Paribus - What-if profiles for black-box models
//!
//! This crate shows how a model's prediction changes when one input variable is
//! varied while every other variable is held fixed at an observation's values.
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - Tagged-column tables, polars interop, CSV loading
//!
//! ## Profiles
//! - [`explainability`] - Explainers, variable splits, observation grids, profile assembly
//!
//! ## Selection
//! - [`selection`] - Random samples and nearest neighbours under Gower dissimilarity
//!
//! ## Output
//! - [`export`] - Flat records, plotting scripts, DataFrames
//!
//! # Example
//!
//! ```no_run
//! use ceteris_paribus::prelude::*;
//!
//! # fn main() -> ceteris_paribus::Result<()> {
//! let data = load_csv("housing.csv")?;
//! let explainer = Explainer::builder()
//!     .predict_fn(|t: &Table| Ok(vec![0.0; t.n_rows()]))
//!     .data(data.clone())
//!     .label("baseline")
//!     .build()?;
//!
//! let observations = select_sample(&data, None, 5, 42)?.data;
//! let cp = individual_variable_profile(&explainer, &observations, None, &ProfileConfig::default())?;
//! println!("{}", cp);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Tabular data
pub mod data;

// Profile computation
pub mod explainability;

// Observation selection
pub mod selection;

// Output
pub mod export;

pub use error::{CeterisError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::data::{load_csv, Column, ColumnKind, Table, Value};
    pub use crate::error::{CeterisError, Result};
    pub use crate::explainability::{
        aggregate_profile, compute_profile, individual_variable_profile, Aggregation, ArrayModel,
        CeterisParibus, Explainer, Predict, ProfileConfig, TrueLabels,
    };
    pub use crate::export::{dump_observations, dump_profiles, save_observations, save_profiles};
    pub use crate::selection::{
        select_neighbours, select_sample, DistanceMetric, NeighbourSelector, SampleSelector,
        Selection,
    };
}
