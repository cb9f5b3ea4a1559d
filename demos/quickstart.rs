//! Quickstart demonstrating both forecasters on a synthetic price series.
//!
//! Run with: RUST_LOG=sigforecast=debug cargo run --example quickstart

use chrono::{TimeZone, Utc};
use sigforecast::core::{
    TimeSeries, FORECAST_COLUMN, LOWER_BOUND_COLUMN, PREDICTIONS_COLUMN, PREDICTION_COLUMN,
    UPPER_BOUND_COLUMN,
};
use sigforecast::forecasters::{RecurrentConfig, RecurrentForecaster, StatisticalForecaster};
use sigforecast::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sigforecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    println!("=== sigforecast Quickstart ===\n");

    // 1. Two years of business-day closes: drift plus a monthly cycle
    let start = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    let values: Vec<f64> = (0..504)
        .map(|i| {
            let t = i as f64;
            100.0                                  // base level
            + 0.08 * t                             // drift
            + 3.0 * (t * std::f64::consts::TAU / 21.0).sin() // monthly cycle
            + 0.4 * (t * 0.7).cos()                // wiggle
        })
        .collect();
    let mut series = TimeSeries::from_business_days(start, values)?;
    series.set_name("Close");
    println!("Created series with {} observations", series.len());

    // 2. Recurrent forecaster: one month of lags, one week ahead
    println!("\n--- Recurrent forecaster (21 lags -> 5 days) ---");
    let config = RecurrentConfig::default()
        .with_forecast_len(5)
        .with_learning_rate(0.005);
    let mut recurrent = RecurrentForecaster::with_config(series.clone(), config)?;

    let tested = recurrent.train(21, 20)?;
    if let Some(loss) = recurrent.loss_history().last() {
        println!("Final training loss: {:.6}", loss);
    }
    for (date, value) in tested.non_null(PREDICTION_COLUMN)? {
        println!("  {}  test prediction {:.2}", date.format("%Y-%m-%d"), value);
    }

    let forecast = recurrent.forecast()?;
    for (date, value) in forecast.non_null(FORECAST_COLUMN)? {
        println!("  {}  forecast {:.2}", date.format("%Y-%m-%d"), value);
    }

    // 3. Statistical forecaster: ARIMA(5,2,2) with a 75/25 split
    println!("\n--- Statistical forecaster, ARIMA(5,2,2) ---");
    let mut statistical = StatisticalForecaster::new(series)?;
    statistical.process_data()?;
    let preds = statistical.fit_model()?;

    let metrics = statistical.evaluate(&preds)?;
    println!("Test MAE:  {:.4}", metrics.mae);
    println!("Test RMSE: {:.4}", metrics.rmse);
    if let Some(mape) = metrics.mape {
        println!("Test MAPE: {:.2}%", mape);
    }

    let validated = statistical.validate(&preds)?;
    println!(
        "Validation frame: {} rows, columns {:?}",
        validated.len(),
        validated.column_names()
    );

    // 4. Ten calendar days ahead with a 95% interval
    println!("\n--- Forecast with 95% Confidence Interval ---");
    let future = statistical.forecast(10)?;
    let with_ci = statistical.generate_ci(&future, 10, 0.05)?;
    for row in with_ci.len() - 10..with_ci.len() {
        let date = with_ci.index()[row];
        let (Some(point), Some(lo), Some(hi)) = (
            with_ci.value(PREDICTIONS_COLUMN, row)?,
            with_ci.value(LOWER_BOUND_COLUMN, row)?,
            with_ci.value(UPPER_BOUND_COLUMN, row)?,
        ) else {
            continue;
        };
        println!(
            "  {}  {:.2}  [{:.2}, {:.2}]",
            date.format("%Y-%m-%d"),
            point,
            lo,
            hi
        );
    }

    println!("\n=== Quickstart Complete ===");
    Ok(())
}
