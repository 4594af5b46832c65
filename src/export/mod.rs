//! Profile export
//!
//! Converts profile and observation tables into forms consumed by plotting and
//! serialization layers:
//! - Flat JSON records with `_yhat_`, `_vname_`, `_label_`, `_ids_` and `_y_` columns
//! - Script files (`profile = [...];`) combining several profiles
//! - polars DataFrames

mod records;
mod dataframe;

pub use records::{
    dump_observations, dump_profiles, save_observations, save_profiles, Record, IDS_COLUMN,
    LABEL_COLUMN, VNAME_COLUMN, YHAT_COLUMN, Y_COLUMN,
};
