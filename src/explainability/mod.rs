//! Ceteris Paribus profile engine
//!
//! Computes what-if profiles of a black-box model:
//! - Explanation context with prediction capability and label defaulting
//! - Variable splits (quantile grids and distinct-value enumeration)
//! - Observation grids predicted in one batch per variable
//! - Profile assembly into long-form profile and observation tables
//! - Aggregated profiles across observations

mod config;
mod explainer;
mod split;
mod grid;
mod profile;
mod aggregate;

pub use config::{ProfileConfig, VariableSplits, DEFAULT_GRID_POINTS};
pub use explainer::{default_label, ArrayModel, Explainer, ExplainerBuilder, Predict, UNLABELED_MODEL};
pub use split::{
    calculate_variable_splits, compute_split, compute_split_values, linspace, quantiles,
    resolve_variable_splits, valid_variable_splits,
};
pub use grid::ObservationGrid;
pub use profile::{
    compute_profile, individual_variable_profile, selected_variables, CeterisParibus,
    ObservationRow, ObservationTable, ProfileRow, ProfileTable, TrueLabels,
};
pub use aggregate::{aggregate_profile, AggregatedProfile, Aggregation};
