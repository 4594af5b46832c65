//! Categorical Example
//!
//! Profiles a hand-written survival score over mixed numeric and categorical passengers.

use ceteris_paribus::explainability::UNLABELED_MODEL;
use ceteris_paribus::export::dump_profiles;
use ceteris_paribus::prelude::*;
use polars::prelude::{DataFrame, NamedFrom, Series};

fn survival(t: &Table) -> ceteris_paribus::Result<Vec<f64>> {
    Ok(t.rows()
        .map(|r| {
            let female = if r[2].as_str() == Some("female") { 0.45 } else { 0.0 };
            let class = 0.12 * (3.0 - r[1].as_f64().unwrap_or(3.0));
            let age = -0.004 * r[0].as_f64().unwrap_or(30.0);
            (0.3 + female + class + age).clamp(0.0, 1.0)
        })
        .collect())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ceteris_paribus=info".into()),
        )
        .init();

    // Create sample data
    let df = DataFrame::new(vec![
        Series::new("age".into(), &[22.0, 38.0, 26.0, 35.0, 35.0, 54.0, 2.0, 27.0, 14.0, 58.0]).into(),
        Series::new("class".into(), &[3i64, 1, 3, 1, 3, 1, 3, 3, 2, 1]).into(),
        Series::new(
            "sex".into(),
            &["male", "female", "female", "female", "male", "male", "male", "female", "female", "female"],
        )
        .into(),
    ])?;
    let survived = vec![0i64, 1, 1, 1, 0, 0, 0, 1, 1, 1];

    let data = Table::from_dataframe(&df)?;
    println!("Dataset: {} rows, kinds {:?}", data.n_rows(), data.kinds());

    let explainer = Explainer::builder()
        .predict_fn(survival)
        .data(data.clone())
        .labels(survived.clone())
        .build()?;
    if explainer.label() == UNLABELED_MODEL {
        println!("Model has no display name, using '{}'", UNLABELED_MODEL);
    }

    // Passengers most similar to the first one
    let reference = data.row(0).unwrap_or_default();
    let labels: Vec<Value> = survived.iter().map(|&s| Value::Int(s)).collect();
    let neighbours = select_neighbours(
        &data,
        &reference,
        Some(labels.as_slice()),
        None,
        &DistanceMetric::Gower,
        3,
    )?;
    println!("Neighbours of passenger 0: {:?}", neighbours.indices);

    let mut cp = individual_variable_profile(
        &explainer,
        &neighbours.data,
        neighbours.labels.map(TrueLabels::from),
        &ProfileConfig::new().with_grid_points(5),
    )?;
    cp.set_label("survival_score");
    println!("\n{}", cp);

    for (variable, rows) in cp.split_by_variable() {
        println!("\n{}: {} profile points", variable, rows.len());
    }

    let median = aggregate_profile(cp.profile(), "class", Aggregation::Median)?;
    println!("\nMedian survival by class: {:?}", median.yhat);

    let records = dump_profiles(&[&cp]);
    println!("\nFirst record: {}", serde_json::to_string_pretty(&records[0])?);

    let frame = cp.profile().to_dataframe()?;
    println!("\n{}", frame.head(Some(5)));

    Ok(())
}
