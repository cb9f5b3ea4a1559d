//! Sliding window construction for supervised sequence models.
//!
//! A series of length `n` is split into a training segment (the first
//! `n - horizon` values) and a held-out segment (the last `horizon` values).
//! Training pairs are every full (input, target) window inside the training
//! segment; the held-out segment is predicted from the `lags` values right
//! before it.

use crate::error::{ForecastError, Result};

/// A fixed-length input window and the target window following it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPair {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

/// Number of training pairs for a series of length `n`.
///
/// Equals `n - horizon - horizon - lags + 1`, or zero when no full pair fits.
pub fn training_pair_count(n: usize, lags: usize, horizon: usize) -> usize {
    (n + 1).saturating_sub(2 * horizon + lags)
}

/// Build all overlapping window pairs over the training segment.
///
/// Pair `i` has input `series[i..i + lags]` and target
/// `series[i + lags..i + lags + horizon]`.
pub fn training_pairs(series: &[f64], lags: usize, horizon: usize) -> Result<Vec<WindowPair>> {
    validate_sizes(lags, horizon)?;

    let count = training_pair_count(series.len(), lags, horizon);
    if count == 0 {
        return Err(ForecastError::InsufficientData {
            needed: 2 * horizon + lags,
            got: series.len(),
        });
    }

    let train = &series[..series.len() - horizon];
    let pairs = train
        .windows(lags + horizon)
        .map(|w| WindowPair {
            input: w[..lags].to_vec(),
            target: w[lags..].to_vec(),
        })
        .collect::<Vec<_>>();
    debug_assert_eq!(pairs.len(), count);

    Ok(pairs)
}

/// Input window immediately preceding the held-out segment.
pub fn holdout_input(series: &[f64], lags: usize, horizon: usize) -> Result<&[f64]> {
    validate_sizes(lags, horizon)?;

    let needed = lags + horizon;
    if series.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: series.len(),
        });
    }
    let end = series.len() - horizon;
    Ok(&series[end - lags..end])
}

/// The trailing `lags` values, used as input for out-of-sample forecasts.
pub fn latest_input(series: &[f64], lags: usize) -> Result<&[f64]> {
    if lags == 0 {
        return Err(ForecastError::InvalidParameter(
            "lag window must be positive".to_string(),
        ));
    }
    if series.len() < lags {
        return Err(ForecastError::InsufficientData {
            needed: lags,
            got: series.len(),
        });
    }
    Ok(&series[series.len() - lags..])
}

fn validate_sizes(lags: usize, horizon: usize) -> Result<()> {
    if lags == 0 {
        return Err(ForecastError::InvalidParameter(
            "lag window must be positive".to_string(),
        ));
    }
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "forecast horizon must be positive".to_string(),
        ));
    }
    Ok(())
}
