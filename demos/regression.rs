//! Regression Example
//!
//! Profiles a linear model over a few sampled houses and their nearest neighbours.

use ceteris_paribus::prelude::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ceteris_paribus=info".into()),
        )
        .init();

    // Create sample data
    let mut rng = StdRng::seed_from_u64(7);
    let n = 500;
    let data = Table::new(vec![
        Column::float("rooms", (0..n).map(|_| 3.0 + rng.gen::<f64>() * 5.0).collect::<Vec<_>>()),
        Column::float("lstat", (0..n).map(|_| rng.gen::<f64>() * 35.0).collect::<Vec<_>>()),
        Column::integer("rad", (0..n).map(|_| rng.gen_range(1..=8)).collect::<Vec<_>>()),
    ])?;
    let prices: Vec<f64> = data
        .rows()
        .map(|r| {
            let noise: f64 = rng.gen::<f64>() - 0.5;
            9.0 * r[0].as_f64().unwrap_or(0.0) - 0.6 * r[1].as_f64().unwrap_or(0.0) + noise
        })
        .collect();

    println!("Dataset: {} rows, {} columns", data.n_rows(), data.n_cols());

    // Wrap a fitted linear model
    let weights = Array1::from(vec![9.0, -0.6, 0.0]);
    let model = ArrayModel::new(move |x: &Array2<f64>| Ok(x.dot(&weights)))
        .with_name("LinearRegression(fit_intercept=False)");
    let explainer = Explainer::builder()
        .model(model)
        .data(data.clone())
        .labels(prices.clone())
        .build()?;

    // Profile a random sample of houses
    let sample = select_sample(&data, None, 4, 42)?;
    let truth: Vec<Value> = sample.indices.iter().map(|&i| Value::Float(prices[i])).collect();
    let config = ProfileConfig::new().with_grid_points(11).with_variables(["rooms", "lstat"]);
    let cp = individual_variable_profile(&explainer, &sample.data, Some(TrueLabels::from(truth)), &config)?;

    println!("\n{}", cp);

    for variable in cp.selected_variables() {
        let mean = aggregate_profile(cp.profile(), variable, Aggregation::Mean)?;
        println!("\nMean profile for {} over {} houses:", variable, mean.n_profiles);
        for (x, y) in mean.grid.iter().zip(&mean.yhat) {
            println!("  {:>8} -> {:.3}", x, y);
        }
    }

    // Profile the neighbourhood of one house
    let reference = data.row(0).unwrap_or_default();
    let neighbours = NeighbourSelector::new(10).select(&data, &reference, None)?;
    println!("\nNearest neighbours of house 0: {:?}", neighbours.indices);

    let local = individual_variable_profile(
        &explainer,
        &neighbours.data,
        None,
        &ProfileConfig::new().with_variables(["lstat"]),
    )?;
    if let Some((lo, hi)) = local.profile().prediction_range() {
        println!("Predicted price range across the neighbourhood: {:.2} .. {:.2}", lo, hi);
    }

    // Write plotting scripts
    let dir = std::env::temp_dir();
    save_profiles(dir.join("profile.js"), &[&cp, &local])?;
    save_observations(dir.join("observation.js"), &[&cp, &local])?;
    println!("\nScripts written to {}", dir.display());

    Ok(())
}
