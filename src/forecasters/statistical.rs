//! Fixed-order ARIMA forecaster with train/test validation and intervals.

use crate::core::{
    calendar_days_after, is_output_column, ForecastFrame, TimeSeries, LOWER_BOUND_COLUMN,
    PREDICTIONS_COLUMN, UPPER_BOUND_COLUMN,
};
use crate::error::{ForecastError, Result};
use crate::models::{ARIMASpec, Forecaster, ARIMA};
use crate::utils::{calculate_metrics, AccuracyMetrics};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// How observations are assigned to the training partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// The earliest observations train, the latest test.
    #[default]
    Chronological,
    /// Random date membership; each partition stays in date order.
    Shuffled { seed: u64 },
}

/// Configuration of a [`StatisticalForecaster`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalConfig {
    pub order: ARIMASpec,
    /// Share of observations in the training partition, rounded down.
    pub train_fraction: f64,
    pub split: SplitStrategy,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            order: ARIMASpec::new(5, 2, 2),
            train_fraction: 0.75,
            split: SplitStrategy::Chronological,
        }
    }
}

/// ARIMA forecaster over an observed series.
///
/// Usage runs `process_data`, then `fit_model`, after which `validate`,
/// `forecast` and `generate_ci` are available.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use sigforecast::core::{TimeSeries, PREDICTIONS_COLUMN};
/// use sigforecast::forecasters::StatisticalForecaster;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let values: Vec<f64> = (0..80).map(|i| 10.0 + 0.5 * i as f64 + (i as f64).sin()).collect();
/// let series = TimeSeries::from_business_days(start, values).unwrap();
///
/// let mut forecaster = StatisticalForecaster::new(series).unwrap();
/// forecaster.process_data().unwrap();
/// let preds = forecaster.fit_model().unwrap();
/// assert_eq!(preds.len(), 20);
///
/// let future = forecaster.forecast(5).unwrap();
/// assert_eq!(future.len(), 85);
/// let with_ci = forecaster.generate_ci(&future, 5, 0.05).unwrap();
/// assert!(with_ci.value("Lower Bound", 84).unwrap().is_some());
/// assert!(with_ci.value(PREDICTIONS_COLUMN, 84).unwrap().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct StatisticalForecaster {
    series: TimeSeries,
    config: StatisticalConfig,
    train: Option<TimeSeries>,
    test: Option<TimeSeries>,
    model: Option<ARIMA>,
}

impl StatisticalForecaster {
    pub fn new(series: TimeSeries) -> Result<Self> {
        Self::with_config(series, StatisticalConfig::default())
    }

    pub fn with_config(series: TimeSeries, config: StatisticalConfig) -> Result<Self> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if is_output_column(series.name()) {
            return Err(ForecastError::InvalidParameter(format!(
                "series name '{}' collides with an output column",
                series.name()
            )));
        }
        if !(config.train_fraction > 0.0 && config.train_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "train fraction must be in (0, 1), got {}",
                config.train_fraction
            )));
        }
        Ok(Self {
            series,
            config,
            train: None,
            test: None,
            model: None,
        })
    }

    /// Split the series into training and test partitions.
    pub fn process_data(&mut self) -> Result<()> {
        let n = self.series.len();
        let n_train = (self.config.train_fraction * n as f64).floor() as usize;
        if n_train == 0 || n_train == n {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: n,
            });
        }

        let (train, test) = match self.config.split {
            SplitStrategy::Chronological => {
                (self.series.slice(0, n_train)?, self.series.slice(n_train, n)?)
            }
            SplitStrategy::Shuffled { seed } => {
                let mut order: Vec<usize> = (0..n).collect();
                order.shuffle(&mut StdRng::seed_from_u64(seed));
                let (train_idx, test_idx) = order.split_at_mut(n_train);
                train_idx.sort_unstable();
                test_idx.sort_unstable();
                (self.series.select(train_idx)?, self.series.select(test_idx)?)
            }
        };

        tracing::debug!(
            train = train.len(),
            test = test.len(),
            split = ?self.config.split,
            "split series"
        );
        self.train = Some(train);
        self.test = Some(test);
        Ok(())
    }

    /// Fit on the training partition and forecast the test length, then refit
    /// on the full series for later forecasting.
    ///
    /// Returns the test-period forecasts.
    pub fn fit_model(&mut self) -> Result<Vec<f64>> {
        let train = self.train.as_ref().ok_or(ForecastError::FitRequired)?;
        let test = self.test.as_ref().ok_or(ForecastError::FitRequired)?;
        let order = self.config.order;

        tracing::info!(
            p = order.p,
            d = order.d,
            q = order.q,
            train = train.len(),
            "fitting statistical forecaster"
        );

        let mut validation_model = ARIMA::from_spec(order);
        validation_model.fit(train)?;
        let preds = validation_model.predict(test.len())?.into_point();

        let mut full_model = ARIMA::from_spec(order);
        full_model.fit(&self.series)?;
        tracing::info!(
            aic = ?full_model.aic(),
            converged = full_model.converged(),
            "statistical forecaster fitted"
        );
        self.model = Some(full_model);

        Ok(preds)
    }

    /// Observed series with a `Predictions` column placed on the test dates.
    pub fn validate(&self, preds: &[f64]) -> Result<ForecastFrame> {
        let test = self.test.as_ref().ok_or(ForecastError::FitRequired)?;
        if preds.len() != test.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: test.len(),
                got: preds.len(),
            });
        }

        let mut frame = ForecastFrame::from_series(&self.series);
        frame.set_at_dates(PREDICTIONS_COLUMN, test.timestamps(), preds)?;
        Ok(frame)
    }

    /// Accuracy of test-period forecasts against the test partition.
    pub fn evaluate(&self, preds: &[f64]) -> Result<AccuracyMetrics> {
        let test = self.test.as_ref().ok_or(ForecastError::FitRequired)?;
        calculate_metrics(test.values(), preds)
    }

    /// Observed series extended by `n` rows one calendar day apart, whose
    /// `Predictions` hold the full-series model forecasts.
    pub fn forecast(&self, n: usize) -> Result<ForecastFrame> {
        let model = self.model.as_ref().ok_or(ForecastError::FitRequired)?;
        let forecast = model.predict(n)?;
        let last = self.series.last_timestamp().ok_or(ForecastError::EmptyData)?;

        let mut frame = ForecastFrame::from_series(&self.series);
        frame.add_null_column(PREDICTIONS_COLUMN)?;
        for (date, &value) in calendar_days_after(last, n).into_iter().zip(forecast.point()) {
            frame.append_row(date, &[None, Some(value)])?;
        }
        Ok(frame)
    }

    /// Copy of `info` with `Lower Bound` and `Upper Bound` set on its last `n`
    /// rows from the `1 - alpha` interval of the next `n` forecasts.
    pub fn generate_ci(&self, info: &ForecastFrame, n: usize, alpha: f64) -> Result<ForecastFrame> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "significance level must be in (0, 1), got {alpha}"
            )));
        }
        let model = self.model.as_ref().ok_or(ForecastError::FitRequired)?;
        if n > info.len() {
            return Err(ForecastError::InsufficientData {
                needed: n,
                got: info.len(),
            });
        }

        let forecast = model.predict_with_intervals(n, 1.0 - alpha)?;
        let (lower, upper) = match (forecast.lower(), forecast.upper()) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ if n == 0 => (&[][..], &[][..]),
            _ => {
                return Err(ForecastError::ComputationError(
                    "model returned no interval bounds".to_string(),
                ))
            }
        };

        let mut frame = info.clone();
        frame.set_tail(LOWER_BOUND_COLUMN, lower)?;
        frame.set_tail(UPPER_BOUND_COLUMN, upper)?;
        Ok(frame)
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn config(&self) -> &StatisticalConfig {
        &self.config
    }

    pub fn train(&self) -> Option<&TimeSeries> {
        self.train.as_ref()
    }

    pub fn test(&self) -> Option<&TimeSeries> {
        self.test.as_ref()
    }

    /// Model fitted on the full series.
    pub fn model(&self) -> Option<&ARIMA> {
        self.model.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(n: usize) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
        let values = (0..n)
            .map(|i| {
                let noise = ((i * 37 + 5) % 11) as f64 / 11.0 - 0.5;
                100.0 + 0.6 * i as f64 + 1.5 * (i as f64 * 0.4).sin() + noise
            })
            .collect();
        TimeSeries::from_business_days(start, values).unwrap()
    }

    fn fitted_forecaster(n: usize) -> StatisticalForecaster {
        let mut forecaster = StatisticalForecaster::new(make_series(n)).unwrap();
        forecaster.process_data().unwrap();
        forecaster.fit_model().unwrap();
        forecaster
    }

    #[test]
    fn chronological_split_is_75_25() {
        let mut forecaster = StatisticalForecaster::new(make_series(101)).unwrap();
        forecaster.process_data().unwrap();

        let train = forecaster.train().unwrap();
        let test = forecaster.test().unwrap();
        assert_eq!(train.len(), 75);
        assert_eq!(test.len(), 26);
        assert!(train.last_timestamp().unwrap() < test.first_timestamp().unwrap());
    }

    #[test]
    fn shuffled_split_is_reproducible_and_sorted() {
        let config = StatisticalConfig {
            split: SplitStrategy::Shuffled { seed: 11 },
            ..Default::default()
        };
        let mut a = StatisticalForecaster::with_config(make_series(40), config).unwrap();
        let mut b = StatisticalForecaster::with_config(make_series(40), config).unwrap();
        a.process_data().unwrap();
        b.process_data().unwrap();

        let train = a.train().unwrap();
        let test = a.test().unwrap();
        assert_eq!(train.len(), 30);
        assert_eq!(test.len(), 10);
        assert_eq!(train.timestamps(), b.train().unwrap().timestamps());
        assert!(train.timestamps().windows(2).all(|w| w[0] < w[1]));
        assert!(test.timestamps().windows(2).all(|w| w[0] < w[1]));

        let mut all: Vec<_> = train.timestamps().iter().chain(test.timestamps()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 40);
    }

    #[test]
    fn fit_model_forecasts_test_length() {
        let mut forecaster = StatisticalForecaster::new(make_series(80)).unwrap();
        forecaster.process_data().unwrap();
        let preds = forecaster.fit_model().unwrap();

        assert_eq!(preds.len(), 20);
        assert!(preds.iter().all(|v| v.is_finite()));
        assert!(forecaster.model().unwrap().is_fitted());
    }

    #[test]
    fn validate_aligns_predictions_to_test_dates() {
        let mut forecaster = StatisticalForecaster::new(make_series(80)).unwrap();
        forecaster.process_data().unwrap();
        let preds = forecaster.fit_model().unwrap();

        let frame = forecaster.validate(&preds).unwrap();
        let column = frame.column(PREDICTIONS_COLUMN).unwrap();
        assert_eq!(frame.len(), 80);
        assert!(column[..60].iter().all(Option::is_none));
        assert_eq!(column[60], Some(preds[0]));
        assert_eq!(column[79], Some(preds[19]));

        assert!(matches!(
            forecaster.validate(&preds[..5]),
            Err(ForecastError::DimensionMismatch { expected: 20, got: 5 })
        ));
    }

    #[test]
    fn forecast_appends_calendar_days() {
        let forecaster = fitted_forecaster(80);
        let last = forecaster.series().last_timestamp().unwrap();

        let frame = forecaster.forecast(7).unwrap();
        assert_eq!(frame.len(), 87);
        for (k, date) in frame.index()[80..].iter().enumerate() {
            assert_eq!(*date, last + Duration::days(k as i64 + 1));
        }

        let observed = frame.column("value").unwrap();
        let predictions = frame.column(PREDICTIONS_COLUMN).unwrap();
        assert!(observed[80..].iter().all(Option::is_none));
        assert!(predictions[..80].iter().all(Option::is_none));
        assert!(predictions[80..].iter().all(Option::is_some));
    }

    #[test]
    fn generate_ci_fills_last_rows_only() {
        let forecaster = fitted_forecaster(80);
        let info = forecaster.forecast(5).unwrap();

        let frame = forecaster.generate_ci(&info, 5, 0.05).unwrap();
        let lower = frame.column(LOWER_BOUND_COLUMN).unwrap();
        let upper = frame.column(UPPER_BOUND_COLUMN).unwrap();
        let predictions = frame.column(PREDICTIONS_COLUMN).unwrap();

        assert!(lower[..80].iter().all(Option::is_none));
        assert!(upper[..80].iter().all(Option::is_none));
        for row in 80..85 {
            let (lo, hi, p) = (lower[row].unwrap(), upper[row].unwrap(), predictions[row].unwrap());
            assert!(lo < p && p < hi);
            // Symmetric around the point forecast
            assert_relative_eq!(p - lo, hi - p, epsilon = 1e-9);
        }
    }

    #[test]
    fn generate_ci_wider_at_lower_significance() {
        let forecaster = fitted_forecaster(80);
        let info = forecaster.forecast(3).unwrap();

        let narrow = forecaster.generate_ci(&info, 3, 0.2).unwrap();
        let wide = forecaster.generate_ci(&info, 3, 0.01).unwrap();
        let width = |f: &ForecastFrame| {
            f.value(UPPER_BOUND_COLUMN, 82).unwrap().unwrap()
                - f.value(LOWER_BOUND_COLUMN, 82).unwrap().unwrap()
        };
        assert!(width(&wide) > width(&narrow));
    }

    #[test]
    fn generate_ci_validates_arguments() {
        let forecaster = fitted_forecaster(60);
        let info = forecaster.forecast(2).unwrap();

        assert!(matches!(
            forecaster.generate_ci(&info, 100, 0.05),
            Err(ForecastError::InsufficientData { needed: 100, got: 62 })
        ));
        assert!(matches!(
            forecaster.generate_ci(&info, 2, 0.0),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            forecaster.generate_ci(&info, 2, 1.0),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn stages_before_fit_require_fit() {
        let mut forecaster = StatisticalForecaster::new(make_series(60)).unwrap();
        assert!(matches!(forecaster.fit_model(), Err(ForecastError::FitRequired)));
        assert!(matches!(forecaster.validate(&[]), Err(ForecastError::FitRequired)));

        forecaster.process_data().unwrap();
        assert!(matches!(forecaster.forecast(3), Err(ForecastError::FitRequired)));

        let info = ForecastFrame::from_series(forecaster.series());
        assert!(matches!(
            forecaster.generate_ci(&info, 3, 0.05),
            Err(ForecastError::FitRequired)
        ));
    }

    #[test]
    fn evaluate_scores_test_forecasts() {
        let mut forecaster = StatisticalForecaster::new(make_series(80)).unwrap();
        forecaster.process_data().unwrap();
        let preds = forecaster.fit_model().unwrap();

        let metrics = forecaster.evaluate(&preds).unwrap();
        assert!(metrics.mae >= 0.0);
        assert_relative_eq!(metrics.rmse, metrics.mse.sqrt(), epsilon = 1e-12);

        let perfect = forecaster.evaluate(forecaster.test().unwrap().values()).unwrap();
        assert_relative_eq!(perfect.mae, 0.0);
    }

    #[test]
    fn invalid_configs_rejected() {
        let config = StatisticalConfig {
            train_fraction: 1.0,
            ..Default::default()
        };
        assert!(StatisticalForecaster::with_config(make_series(10), config).is_err());

        let mut forecaster = StatisticalForecaster::new(make_series(1)).unwrap();
        assert!(matches!(
            forecaster.process_data(),
            Err(ForecastError::InsufficientData { .. })
        ));

        let mut clashing = make_series(10);
        clashing.set_name(PREDICTIONS_COLUMN);
        assert!(matches!(
            StatisticalForecaster::new(clashing),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn config_deserializes_split_strategy() {
        let config: StatisticalConfig =
            serde_json::from_str(r#"{"split": {"shuffled": {"seed": 3}}}"#).unwrap();
        assert_eq!(config.split, SplitStrategy::Shuffled { seed: 3 });
        assert_eq!(config.order, ARIMASpec::new(5, 2, 2));
        assert_relative_eq!(config.train_fraction, 0.75);
    }
}
