//! Flat record export of profile and observation tables
//!
//! Records map column names to portable JSON scalars. Profile records carry the
//! variable columns plus `_yhat_`, `_vname_`, `_label_` and `_ids_`; observation
//! records add `_y_`, which is `null` when no true label was given.

use crate::data::Value;
use crate::error::Result;
use crate::explainability::{CeterisParibus, ObservationRow, ObservationTable, ProfileTable};
use std::fs;
use std::path::Path;
use tracing::debug;

/// One flat row keyed by column name
pub type Record = serde_json::Map<String, serde_json::Value>;

pub const YHAT_COLUMN: &str = "_yhat_";
pub const VNAME_COLUMN: &str = "_vname_";
pub const LABEL_COLUMN: &str = "_label_";
pub const IDS_COLUMN: &str = "_ids_";
pub const Y_COLUMN: &str = "_y_";

fn variable_record(names: &[String], values: &[Value]) -> Record {
    names
        .iter()
        .zip(values)
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect()
}

fn float_json(value: f64) -> serde_json::Value {
    Value::Float(value).to_json()
}

impl ProfileTable {
    pub fn to_records(&self) -> Vec<Record> {
        self.iter()
            .map(|row| {
                let mut record = variable_record(self.variable_names(), &row.values);
                record.insert(YHAT_COLUMN.to_string(), float_json(row.yhat));
                record.insert(VNAME_COLUMN.to_string(), row.variable.clone().into());
                record.insert(LABEL_COLUMN.to_string(), row.label.clone().into());
                record.insert(IDS_COLUMN.to_string(), (row.profile_id as u64).into());
                record
            })
            .collect()
    }
}

fn observation_record(names: &[String], row: &ObservationRow) -> Record {
    let mut record = variable_record(names, &row.values);
    record.insert(YHAT_COLUMN.to_string(), float_json(row.yhat));
    record.insert(LABEL_COLUMN.to_string(), row.label.clone().into());
    record.insert(IDS_COLUMN.to_string(), (row.profile_id as u64).into());
    record.insert(
        Y_COLUMN.to_string(),
        row.y.as_ref().map(Value::to_json).unwrap_or(serde_json::Value::Null),
    );
    record
}

impl ObservationTable {
    pub fn to_records(&self) -> Vec<Record> {
        self.iter()
            .map(|row| observation_record(self.variable_names(), row))
            .collect()
    }
}

/// Profile records of several profiles, concatenated in order
pub fn dump_profiles(profiles: &[&CeterisParibus]) -> Vec<Record> {
    profiles
        .iter()
        .flat_map(|cp| cp.profile().to_records())
        .collect()
}

/// Observation records of several profiles.
///
/// Each observation is repeated once per selected variable, tagged with `_vname_`,
/// so every profile curve has a matching observation point.
pub fn dump_observations(profiles: &[&CeterisParibus]) -> Vec<Record> {
    let mut records = Vec::new();
    for cp in profiles {
        let table = cp.observations();
        for row in table.iter() {
            for variable in cp.selected_variables() {
                let mut record = observation_record(table.variable_names(), row);
                record.insert(VNAME_COLUMN.to_string(), variable.clone().into());
                records.push(record);
            }
        }
    }
    records
}

fn write_script(path: &Path, name: &str, records: &[Record]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, format!("{} = {};", name, json))?;
    debug!(path = %path.display(), records = records.len(), "Wrote {} records", name);
    Ok(())
}

/// Write `profile = <json>;` for the given profiles
pub fn save_profiles(path: impl AsRef<Path>, profiles: &[&CeterisParibus]) -> Result<()> {
    write_script(path.as_ref(), "profile", &dump_profiles(profiles))
}

/// Write `observation = <json>;` for the given profiles
pub fn save_observations(path: impl AsRef<Path>, profiles: &[&CeterisParibus]) -> Result<()> {
    write_script(path.as_ref(), "observation", &dump_observations(profiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, Table};
    use crate::explainability::{individual_variable_profile, Explainer, ProfileConfig, TrueLabels};
    use serde_json::json;

    fn profile(label: &str) -> CeterisParibus {
        let data = Table::new(vec![
            Column::integer("a", vec![1, 2, 3]),
            Column::categorical("b", vec!["x", "y", "x"]),
        ])
        .unwrap();
        let explainer = Explainer::builder()
            .predict_fn(|t: &Table| -> Result<Vec<f64>> {
                Ok(t.rows()
                    .map(|r| r[0].as_f64().unwrap_or(0.0) * if r[1].as_str() == Some("x") { 1.0 } else { 2.0 })
                    .collect())
            })
            .data(data.clone())
            .label(label)
            .build()
            .unwrap();

        let obs = data.take(&[0]).unwrap();
        individual_variable_profile(&explainer, &obs, Some(TrueLabels::from(1.5)), &ProfileConfig::default())
            .unwrap()
    }

    #[test]
    fn test_profile_records() {
        let cp = profile("m1");
        let records = cp.profile().to_records();
        assert_eq!(records.len(), 3 + 2);

        let first = serde_json::Value::Object(records[0].clone());
        assert_eq!(
            first,
            json!({"a": 1, "b": "x", "_yhat_": 1.0, "_vname_": "a", "_label_": "m1", "_ids_": 0})
        );
    }

    #[test]
    fn test_observation_records() {
        let cp = profile("m1");
        let records = cp.observations().to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["_y_"], json!(1.5));
        assert_eq!(records[0]["_ids_"], json!(0));
        assert!(!records[0].contains_key("_vname_"));
    }

    #[test]
    fn test_missing_truth_is_null() {
        let table = ObservationTable::new(
            vec!["a".to_string()],
            vec![ObservationRow {
                values: vec![Value::Missing],
                yhat: f64::NAN,
                label: "m".to_string(),
                profile_id: 0,
                y: None,
            }],
        );
        let records = table.to_records();
        assert_eq!(records[0]["_y_"], serde_json::Value::Null);
        assert_eq!(records[0]["a"], serde_json::Value::Null);
        assert_eq!(records[0]["_yhat_"], serde_json::Value::Null);
    }

    #[test]
    fn test_dump_multiple_profiles() {
        let first = profile("m1");
        let second = profile("m2");
        let profiles = [&first, &second];

        let records = dump_profiles(&profiles);
        assert_eq!(records.len(), 10);
        assert_eq!(records[9]["_label_"], json!("m2"));

        let observations = dump_observations(&profiles);
        assert_eq!(observations.len(), 2 * 2);
        assert_eq!(observations[1]["_vname_"], json!("b"));
    }

    #[test]
    fn test_save_scripts() {
        let cp = profile("m1");
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("profile.js");
        save_profiles(&path, &[&cp]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("profile = ["));
        assert!(text.ends_with("];"));

        let body = text.trim_start_matches("profile = ").trim_end_matches(';');
        let parsed: Vec<Record> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, cp.profile().to_records());

        let path = dir.path().join("observation.js");
        save_observations(&path, &[&cp]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("observation = ["));
    }
}
