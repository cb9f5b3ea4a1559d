//! Accuracy metrics for comparing held-out observations with predictions.

use crate::error::{ForecastError, Result};

/// Accuracy of a set of predictions against observed values.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// R-squared (coefficient of determination)
    pub r_squared: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;
    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let ss_res: f64 = errors.iter().map(|e| e * e).sum();
    let mse = ss_res / n;

    let mape = if actual.contains(&0.0) {
        None
    } else {
        let sum: f64 = actual
            .iter()
            .zip(&errors)
            .map(|(a, e)| (e / a).abs())
            .sum();
        Some(100.0 * sum / n)
    };

    let smape = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        * 100.0
        / n;

    let mean_actual = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape,
        smape,
        r_squared,
    })
}
