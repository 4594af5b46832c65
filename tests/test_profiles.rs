//! Integration tests for profile computation: splits, grids, assembly, aggregation

use ceteris_paribus::data::{Column, ColumnKind, Table, Value};
use ceteris_paribus::explainability::{
    aggregate_profile, compute_profile, compute_split, individual_variable_profile, Aggregation,
    ArrayModel, Explainer, ProfileConfig, TrueLabels, UNLABELED_MODEL,
};
use ceteris_paribus::{CeterisError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn housing(n: usize, seed: u64) -> Table {
    let mut rng = StdRng::seed_from_u64(seed);
    Table::new(vec![
        Column::float("rm", (0..n).map(|_| 4.0 + rng.gen::<f64>() * 4.0).collect::<Vec<_>>()),
        Column::float("lstat", (0..n).map(|_| rng.gen::<f64>() * 30.0).collect::<Vec<_>>()),
        Column::integer("rad", (0..n).map(|_| rng.gen_range(1..=8)).collect::<Vec<_>>()),
    ])
    .unwrap()
}

fn linear_model() -> ArrayModel<impl Fn(&Array2<f64>) -> Result<Array1<f64>> + Send + Sync> {
    let weights = Array1::from(vec![5.0, -0.5, 0.25]);
    ArrayModel::new(move |x: &Array2<f64>| Ok(x.dot(&weights) + 1.0))
        .with_name("LinearRegression(fit_intercept=True)")
}

fn explainer(data: Table) -> Explainer {
    Explainer::builder()
        .model(linear_model())
        .data(data)
        .build()
        .unwrap()
}

// ============================================================================
// Variable Splits
// ============================================================================

#[test]
fn test_integer_split_is_sorted_distinct() {
    let column = Column::integer("age", vec![21, 21, 19, 30, 21, 21, 19, 30]);
    assert_eq!(
        compute_split(&column, 101),
        vec![Value::Int(19), Value::Int(21), Value::Int(30)]
    );
}

#[test]
fn test_float_split_spans_min_to_max() {
    let data = housing(300, 1);
    let column = data.column("lstat").unwrap();
    let observed = column.numeric_values();
    let min = observed.iter().copied().fold(f64::INFINITY, f64::min);
    let max = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    for grid_points in [1, 2, 17, 101] {
        let split = compute_split(column, grid_points);
        assert_eq!(split.len(), grid_points);
        assert_eq!(split[0].as_f64(), Some(min));
        if grid_points > 1 {
            assert_eq!(split[grid_points - 1].as_f64(), Some(max));
        }
    }
}

// ============================================================================
// Profile Assembly
// ============================================================================

#[test]
fn test_profile_row_count() {
    let data = housing(200, 2);
    let explainer = explainer(data.clone());
    let observations = data.take(&[0, 5, 9]).unwrap();
    let config = ProfileConfig::new().with_grid_points(20);

    let cp = individual_variable_profile(&explainer, &observations, None, &config).unwrap();
    let rad_levels = compute_split(data.column("rad").unwrap(), 20).len();

    assert_eq!(cp.profile().len(), 3 * (20 + 20 + rad_levels));
    assert_eq!(cp.observations().len(), 3);
    assert_eq!(cp.label(), "LinearRegression");
}

#[test]
fn test_explicit_split_produces_exact_rows() {
    let data = housing(50, 3);
    let explainer = explainer(data.clone());
    let observation = data.take(&[4]).unwrap();
    let original = observation.row(0).unwrap();

    let config = ProfileConfig::new()
        .with_variables(["lstat"])
        .with_variable_split("lstat", [10, 20, 30]);
    let cp = individual_variable_profile(&explainer, &observation, None, &config).unwrap();

    let profile = cp.profile();
    assert_eq!(profile.len(), 3);
    for (row, expected) in profile.iter().zip([10.0, 20.0, 30.0]) {
        assert_eq!(row.values[1].as_f64(), Some(expected));
        assert_eq!(row.values[0], original[0]);
        assert_eq!(row.values[2], original[2]);
    }
}

#[test]
fn test_mismatched_split_override_is_recomputed() {
    let data = housing(50, 4);
    let explainer = explainer(data.clone());
    let observation = data.take(&[0]).unwrap();

    let config = ProfileConfig::new()
        .with_grid_points(5)
        .with_variables(["rm", "lstat"])
        .with_variable_split("lstat", [1.0, 2.0]);
    let cp = individual_variable_profile(&explainer, &observation, None, &config).unwrap();

    assert_eq!(cp.variable_splits()["lstat"].len(), 5);
    assert_eq!(cp.profile().len(), 10);
}

#[test]
fn test_profile_matches_direct_prediction() {
    let data = housing(100, 5);
    let explainer = explainer(data.clone());
    let observations = data.take(&[1, 2]).unwrap();
    let cp = individual_variable_profile(&explainer, &observations, None, &ProfileConfig::new().with_grid_points(9))
        .unwrap();

    let rows: Vec<Vec<Value>> = cp.profile().iter().map(|r| r.values.clone()).collect();
    let batch = Table::from_rows(explainer.variable_names(), &data.kinds(), &rows).unwrap();
    let direct = explainer.predict(&batch).unwrap();

    for (row, expected) in cp.profile().iter().zip(direct) {
        assert!((row.yhat - expected).abs() < 1e-12);
    }

    let own = explainer.predict(&observations).unwrap();
    let observed: Vec<f64> = cp.observations().iter().map(|r| r.yhat).collect();
    assert_eq!(observed, own);
}

#[test]
fn test_one_prediction_call_per_variable_and_observation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let data = housing(60, 6);
    let explainer = Explainer::builder()
        .predict_fn(move |t: &Table| -> Result<Vec<f64>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0; t.n_rows()])
        })
        .data(data.clone())
        .label("constant")
        .build()
        .unwrap();

    let observations = data.take(&[0, 1, 2, 3]).unwrap();
    individual_variable_profile(&explainer, &observations, None, &ProfileConfig::default()).unwrap();

    // 4 observations x 3 variables, plus one batch for the observations themselves
    assert_eq!(calls.load(Ordering::SeqCst), 4 * 3 + 1);
}

#[test]
fn test_compute_profile_is_deterministic() {
    let data = housing(80, 7);
    let explainer = explainer(data.clone());
    let observations = data.take(&[3, 7]).unwrap();
    let config = ProfileConfig::new().with_grid_points(33);

    let first = compute_profile(&explainer, &observations, None, &config).unwrap();
    let second = compute_profile(&explainer, &observations, None, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_true_labels_attached() {
    let data = housing(30, 8);
    let explainer = explainer(data.clone());
    let observations = data.take(&[0, 1]).unwrap();
    let truth = TrueLabels::from(vec![Value::Float(20.5), Value::Missing]);

    let (_, obs) = compute_profile(&explainer, &observations, Some(truth), &ProfileConfig::default()).unwrap();
    assert_eq!(obs.rows()[0].y, Some(Value::Float(20.5)));
    assert_eq!(obs.rows()[1].y, Some(Value::Missing));
}

#[test]
fn test_invalid_inputs() {
    let data = housing(30, 9);
    let explainer = explainer(data.clone());

    let narrow = data.select_columns(&["rm", "lstat"]).unwrap();
    let result = compute_profile(&explainer, &narrow, None, &ProfileConfig::default());
    assert!(matches!(result, Err(CeterisError::InvalidInput(_))));

    let config = ProfileConfig::new().with_variables(["crim"]);
    let result = compute_profile(&explainer, &data.take(&[0]).unwrap(), None, &config);
    assert!(matches!(result, Err(CeterisError::InvalidInput(_))));
}

#[test]
fn test_float_observation_in_integer_column() {
    let data = housing(40, 11);
    let explainer = Explainer::builder()
        .predict_fn(|t: &Table| -> Result<Vec<f64>> {
            Ok(t.rows()
                .map(|r| r[2].as_i64().map(|v| v as f64).unwrap_or(-1.0))
                .collect())
        })
        .data(data.clone())
        .label("rad_only")
        .build()
        .unwrap();

    let observation = Table::new(vec![
        Column::float("rm", vec![6.0]),
        Column::float("lstat", vec![10.0]),
        Column::float("rad", vec![2.0]),
    ])
    .unwrap();
    let config = ProfileConfig::new()
        .with_variables(["rad"])
        .with_variable_split("rad", [1, 2, 3]);
    let cp = individual_variable_profile(&explainer, &observation, None, &config).unwrap();

    let own = cp.observations().rows()[0].yhat;
    assert_eq!(own, 2.0);
    let at_two: Vec<f64> = cp
        .profile()
        .iter()
        .filter(|r| r.values[2] == Value::Int(2))
        .map(|r| r.yhat)
        .collect();
    assert_eq!(at_two, vec![own]);
}

#[test]
fn test_zero_grid_points_from_file_rejected() {
    let data = housing(20, 12);
    let explainer = explainer(data.clone());
    let config = ProfileConfig::from_json(r#"{"grid_points": 0, "variables": ["rm"]}"#).unwrap();
    let result = compute_profile(&explainer, &data.take(&[0]).unwrap(), None, &config);
    assert!(matches!(result, Err(CeterisError::InvalidInput(_))));
}

#[test]
fn test_profile_without_training_data_needs_splits() {
    let explainer = Explainer::builder()
        .model(linear_model())
        .variable_names(["rm", "lstat", "rad"])
        .build()
        .unwrap();
    assert_eq!(explainer.label(), "LinearRegression");

    let observation = Table::new(vec![
        Column::float("rm", vec![6.0]),
        Column::float("lstat", vec![12.0]),
        Column::integer("rad", vec![3]),
    ])
    .unwrap();

    let result = compute_profile(&explainer, &observation, None, &ProfileConfig::default());
    assert!(matches!(result, Err(CeterisError::ConfigError(_))));

    let config = ProfileConfig::new()
        .with_variable_split("rm", [5.0, 6.0, 7.0])
        .with_variable_split("lstat", [10.0])
        .with_variable_split("rad", [1, 2]);
    let (profile, _) = compute_profile(&explainer, &observation, None, &config).unwrap();
    assert_eq!(profile.len(), 3 + 1 + 2);
}

#[test]
fn test_categorical_variable_profile() {
    let data = Table::new(vec![
        Column::float("age", vec![22.0, 38.0, 26.0, 35.0, 54.0, 2.0]),
        Column::categorical("sex", vec!["male", "female", "female", "female", "male", "male"]),
        Column::boolean("alone", vec![false, false, true, false, true, false]),
    ])
    .unwrap();
    let explainer = Explainer::builder()
        .predict_fn(|t: &Table| -> Result<Vec<f64>> {
            Ok(t.rows()
                .map(|r| {
                    let base = if r[1].as_str() == Some("female") { 0.7 } else { 0.2 };
                    let alone = if r[2].as_bool() == Some(true) { -0.1 } else { 0.0 };
                    base + alone - r[0].as_f64().unwrap_or(0.0) / 1000.0
                })
                .collect())
        })
        .data(data.clone())
        .build()
        .unwrap();
    assert_eq!(explainer.label(), UNLABELED_MODEL);
    assert_eq!(explainer.column_kinds(&data)[1], ColumnKind::Categorical);

    let config = ProfileConfig::new().with_variables(["sex", "alone"]);
    let cp = individual_variable_profile(&explainer, &data.take(&[0]).unwrap(), None, &config).unwrap();

    let groups = cp.split_by_variable();
    let sexes: Vec<&Value> = groups["sex"].iter().map(|r| &r.values[1]).collect();
    assert_eq!(sexes, vec![&Value::from("female"), &Value::from("male")]);
    let flags: Vec<&Value> = groups["alone"].iter().map(|r| &r.values[2]).collect();
    assert_eq!(flags, vec![&Value::Bool(false), &Value::Bool(true)]);
}

// ============================================================================
// Aggregated Profiles
// ============================================================================

#[test]
fn test_mean_profile_of_additive_model() {
    let data = housing(120, 10);
    let explainer = explainer(data.clone());
    let observations = data.take(&[0, 1, 2, 3, 4]).unwrap();
    let config = ProfileConfig::new().with_variables(["rm"]).with_grid_points(11);
    let cp = individual_variable_profile(&explainer, &observations, None, &config).unwrap();

    let mean = aggregate_profile(cp.profile(), "rm", Aggregation::Mean).unwrap();
    assert_eq!(mean.grid.len(), 11);
    assert_eq!(mean.n_profiles, 5);

    // additive model: the mean curve rises by 5 per unit of rm
    let x = Array1::from(mean.grid.iter().map(|v| v.as_f64().unwrap()).collect::<Vec<_>>());
    let y = Array1::from(mean.yhat.clone());
    let slope = (y[10] - y[0]) / (x[10] - x[0]);
    assert!((slope - 5.0).abs() < 1e-9);

    let max = aggregate_profile(cp.profile(), "rm", Aggregation::Max).unwrap();
    let min = aggregate_profile(cp.profile(), "rm", Aggregation::Min).unwrap();
    assert!(max.yhat.iter().zip(&min.yhat).all(|(hi, lo)| hi >= lo));
}
