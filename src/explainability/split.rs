//! Variable split calculation
//!
//! A split is the ordered set of values at which a variable is re-evaluated.
//! Continuous (float) variables are sampled from their empirical quantile function;
//! integer, boolean and categorical variables enumerate their distinct values.

use crate::data::{Column, ColumnKind, Table, Value};
use crate::error::{CeterisError, Result};
use crate::explainability::VariableSplits;
use std::collections::BTreeSet;
use tracing::warn;

/// `n` evenly spaced points in `[start, end]`; a single point is `start`
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Empirical quantiles of already sorted data with linear interpolation.
///
/// Probability `p` maps to position `(n - 1) * p`; `p = 0` and `p = 1` return the
/// exact minimum and maximum.
pub fn quantiles(sorted: &[f64], probabilities: &[f64]) -> Vec<f64> {
    if sorted.is_empty() {
        return Vec::new();
    }
    let last = sorted.len() - 1;

    probabilities
        .iter()
        .map(|&p| {
            let h = last as f64 * p.clamp(0.0, 1.0);
            let lo = (h.floor() as usize).min(last);
            let hi = (lo + 1).min(last);
            let frac = h - lo as f64;
            if frac == 0.0 {
                sorted[lo]
            } else {
                sorted[lo] + frac * (sorted[hi] - sorted[lo])
            }
        })
        .collect()
}

/// Sorted distinct non-missing values
pub fn distinct_sorted(values: &[Value]) -> Vec<Value> {
    let mut distinct: Vec<Value> = values.iter().filter(|v| !v.is_missing()).cloned().collect();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());
    distinct
}

/// Split for one variable's observed values.
///
/// Discrete kinds return their sorted distinct values and ignore `grid_points`;
/// float columns return `grid_points` quantiles at `linspace(0, 1, grid_points)`.
/// Missing values are ignored.
pub fn compute_split_values(values: &[Value], kind: ColumnKind, grid_points: usize) -> Vec<Value> {
    if kind.is_discrete() {
        return distinct_sorted(values);
    }

    let mut observed: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    observed.sort_by(|a, b| a.total_cmp(b));

    let probabilities = linspace(0.0, 1.0, grid_points);
    quantiles(&observed, &probabilities)
        .into_iter()
        .map(Value::Float)
        .collect()
}

/// Split for one column
pub fn compute_split(column: &Column, grid_points: usize) -> Vec<Value> {
    compute_split_values(column.values(), column.kind(), grid_points)
}

/// Splits for every variable in `variables`, computed from `data`
pub fn calculate_variable_splits(
    data: &Table,
    variables: &[String],
    grid_points: usize,
) -> Result<VariableSplits> {
    variables
        .iter()
        .map(|var| {
            let column = data.column(var)?;
            Ok((var.clone(), compute_split(column, grid_points)))
        })
        .collect()
}

/// Whether an explicit split mapping covers exactly `variables`; warns otherwise
pub fn valid_variable_splits(splits: &VariableSplits, variables: &[String]) -> bool {
    let expected: BTreeSet<&str> = variables.iter().map(String::as_str).collect();
    let given: BTreeSet<&str> = splits.keys().map(String::as_str).collect();

    if expected == given {
        return true;
    }

    warn!(
        given = ?given,
        expected = ?expected,
        "Variable splits do not match the selected variables and will be recomputed"
    );
    false
}

/// Use `overrides` when valid, otherwise compute splits from the training data
pub fn resolve_variable_splits(
    data: Option<&Table>,
    variables: &[String],
    grid_points: usize,
    overrides: Option<&VariableSplits>,
) -> Result<VariableSplits> {
    if let Some(splits) = overrides {
        if valid_variable_splits(splits, variables) {
            return Ok(splits.clone());
        }
    }

    let data = data.ok_or_else(|| {
        CeterisError::ConfigError(
            "Training data is required to compute variable splits".to_string(),
        )
    })?;
    calculate_variable_splits(data, variables, grid_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn floats(values: &[Value]) -> Vec<f64> {
        values.iter().map(|v| v.as_f64().unwrap()).collect()
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_integer_split_is_distinct_sorted() {
        let column = Column::integer("age", vec![21, 21, 19, 30, 21, 21, 19, 30]);
        let split = compute_split(&column, 101);
        assert_eq!(split, vec![Value::Int(19), Value::Int(21), Value::Int(30)]);
    }

    #[test]
    fn test_integer_split_ignores_grid_points() {
        let column = Column::integer("a", vec![1, 2, 1, 2, 1]);
        assert_eq!(compute_split(&column, 1), compute_split(&column, 50));
        assert_eq!(compute_split(&column, 3), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_two_point_float_split_is_min_max() {
        let column = Column::float("x", vec![1.0, 1.2, 3.0, 1.7]);
        assert_eq!(floats(&compute_split(&column, 2)), vec![1.0, 3.0]);
    }

    #[test]
    fn test_single_grid_point_is_minimum() {
        let column = Column::float("x", vec![4.0, 1.5, 3.0]);
        assert_eq!(floats(&compute_split(&column, 1)), vec![1.5]);
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantiles(&sorted, &[0.5]), vec![2.5]);
        assert_eq!(quantiles(&sorted, &[0.0, 1.0]), vec![1.0, 4.0]);
    }

    #[test]
    fn test_random_float_split_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let values: Vec<f64> = (0..1000).map(|_| rng.gen::<f64>()).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let split = floats(&compute_split(&Column::float("x", values), 200));
        assert_eq!(split.len(), 200);
        assert_eq!(split[0], min);
        assert_eq!(split[199], max);
        assert!(split.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_categorical_split() {
        let column = Column::categorical("b", vec!["a", "x", "a", "c"]);
        assert_eq!(
            compute_split(&column, 4),
            vec![Value::from("a"), Value::from("c"), Value::from("x")]
        );
    }

    #[test]
    fn test_missing_values_ignored() {
        let column = Column::float_opt("x", vec![Some(2.0), None, Some(1.0)]);
        assert_eq!(floats(&compute_split(&column, 3)), vec![1.0, 1.5, 2.0]);

        let column = Column::categorical_opt("c", vec![None, Some("b"), Some("a")]);
        assert_eq!(compute_split(&column, 3), vec![Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn test_calculate_variable_splits() {
        let data = Table::new(vec![
            Column::integer("a", vec![1, 2, 1, 2, 1, 2]),
            Column::float("b", vec![1.0, 2.0, 3.0, 4.0, 5.5, 7.2]),
        ])
        .unwrap();

        let variables = vec!["a".to_string(), "b".to_string()];
        let splits = calculate_variable_splits(&data, &variables, 4).unwrap();
        assert_eq!(splits.len(), 2);
        assert_eq!(splits["a"], vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(splits["b"].len(), 4);
    }

    #[test]
    fn test_valid_variable_splits() {
        let mut splits = VariableSplits::new();
        splits.insert("a".to_string(), vec![Value::Int(1), Value::Int(2)]);
        splits.insert("b".to_string(), vec![Value::Int(4)]);

        assert!(valid_variable_splits(&splits, &["a".to_string(), "b".to_string()]));
        assert!(!valid_variable_splits(
            &splits,
            &["c".to_string(), "a".to_string(), "b".to_string()]
        ));
    }

    #[test]
    fn test_resolve_uses_override_verbatim() {
        let mut splits = VariableSplits::new();
        splits.insert("a".to_string(), vec![Value::Int(1), Value::Int(2)]);
        splits.insert("c".to_string(), vec![Value::Int(3)]);

        let variables = vec!["a".to_string(), "c".to_string()];
        let resolved = resolve_variable_splits(None, &variables, 10, Some(&splits)).unwrap();
        assert_eq!(resolved, splits);
    }

    #[test]
    fn test_resolve_recomputes_invalid_override() {
        let data = Table::new(vec![
            Column::integer("a", vec![1, 2, 4, 2]),
            Column::categorical("b", vec!["a", "x", "a", "c"]),
            Column::float("c", vec![1.21, 1.45, 1.72, 1.9132]),
        ])
        .unwrap();

        let mut wrong = VariableSplits::new();
        wrong.insert("a".to_string(), vec![Value::Int(0)]);

        let variables = vec!["b".to_string(), "c".to_string()];
        let resolved = resolve_variable_splits(Some(&data), &variables, 4, Some(&wrong)).unwrap();
        assert_eq!(resolved["b"].len(), 3);
        assert_eq!(resolved["c"].len(), 4);
        assert!(!resolved.contains_key("a"));
    }

    #[test]
    fn test_resolve_without_data_fails() {
        let result = resolve_variable_splits(None, &["a".to_string()], 10, None);
        assert!(matches!(result, Err(CeterisError::ConfigError(_))));
    }
}
