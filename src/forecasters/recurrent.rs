//! Window-to-window forecaster backed by an LSTM network.

use crate::core::periods::TDAYS_PER_YEAR;
use crate::core::{
    business_days_after, is_output_column, ForecastFrame, TimeSeries, FORECAST_COLUMN,
    PREDICTION_COLUMN,
};
use crate::error::{ForecastError, Result};
use crate::models::{LstmConfig, LstmNetwork};
use crate::transform::{holdout_input, latest_input, training_pairs, MinMaxScaler};
use serde::{Deserialize, Serialize};

/// Configuration of a [`RecurrentForecaster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrentConfig {
    /// Output window length and held-out segment length.
    pub forecast_len: usize,
    /// Hidden units of the network; `None` uses the lag window length.
    pub hidden_units: Option<usize>,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub gradient_clip: Option<f64>,
    /// Target range of the scaler.
    pub feature_range: (f64, f64),
    pub seed: u64,
}

impl Default for RecurrentConfig {
    fn default() -> Self {
        Self {
            forecast_len: TDAYS_PER_YEAR,
            hidden_units: None,
            learning_rate: 0.001,
            batch_size: 32,
            gradient_clip: None,
            feature_range: (-1.0, 1.0),
            seed: 42,
        }
    }
}

impl RecurrentConfig {
    pub fn with_forecast_len(mut self, forecast_len: usize) -> Self {
        self.forecast_len = forecast_len;
        self
    }

    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = Some(hidden_units);
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Forecasts `forecast_len` future values from the last `lags` observations.
///
/// The network is built on the first call to [`train`](Self::train) and kept
/// across calls. The scaler fit during training is the one used by
/// [`forecast`](Self::forecast).
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use sigforecast::core::TimeSeries;
/// use sigforecast::forecasters::{RecurrentConfig, RecurrentForecaster};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let values: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.4).sin()).collect();
/// let series = TimeSeries::from_business_days(start, values).unwrap();
///
/// let config = RecurrentConfig::default().with_forecast_len(3).with_hidden_units(4);
/// let mut forecaster = RecurrentForecaster::with_config(series, config).unwrap();
///
/// let tested = forecaster.train(5, 2).unwrap();
/// assert_eq!(tested.len(), 40);
///
/// let forecast = forecaster.forecast().unwrap();
/// assert_eq!(forecast.len(), 43);
/// ```
#[derive(Debug, Clone)]
pub struct RecurrentForecaster {
    series: TimeSeries,
    config: RecurrentConfig,
    lags: usize,
    network: Option<LstmNetwork>,
    scaler: MinMaxScaler,
    loss_history: Vec<f64>,
}

impl RecurrentForecaster {
    /// Forecaster with one trading year of lags and horizon.
    pub fn new(series: TimeSeries) -> Result<Self> {
        Self::with_config(series, RecurrentConfig::default())
    }

    pub fn with_config(series: TimeSeries, config: RecurrentConfig) -> Result<Self> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if is_output_column(series.name()) {
            return Err(ForecastError::InvalidParameter(format!(
                "series name '{}' collides with an output column",
                series.name()
            )));
        }
        if config.forecast_len == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast length must be positive".to_string(),
            ));
        }
        let (min, max) = config.feature_range;
        let scaler = MinMaxScaler::new(min, max)?;

        Ok(Self {
            series,
            config,
            lags: TDAYS_PER_YEAR,
            network: None,
            scaler,
            loss_history: Vec::new(),
        })
    }

    /// Fit on the training segment and predict the held-out segment.
    ///
    /// The returned frame holds the observed series and a `Prediction` column
    /// populated only over the last `forecast_len` rows.
    pub fn train(&mut self, lags: usize, epochs: usize) -> Result<ForecastFrame> {
        let horizon = self.config.forecast_len;
        let mut scaler = self.scaler.clone();
        let scaled = scaler.fit_transform(self.series.values())?;
        let pairs = training_pairs(&scaled, lags, horizon)?;

        tracing::info!(
            observations = self.series.len(),
            lags,
            horizon,
            pairs = pairs.len(),
            epochs,
            "training recurrent forecaster"
        );

        // Trained on a copy; the instance keeps its state when training fails
        let mut network = match &self.network {
            Some(network) => network.clone(),
            None => LstmNetwork::new(self.network_config(lags))?,
        };
        tracing::info!("network summary\n{}", network.summary());

        let history = network.fit(&pairs, epochs)?;
        let prediction = network.predict(holdout_input(&scaled, lags, horizon)?)?;
        let prediction = scaler.inverse_transform(&prediction)?;

        let mut frame = ForecastFrame::from_series(&self.series);
        frame.set_tail(PREDICTION_COLUMN, &prediction)?;

        tracing::info!(
            final_loss = ?history.last(),
            "recurrent forecaster trained"
        );

        self.network = Some(network);
        self.lags = lags;
        self.scaler = scaler;
        self.loss_history.extend(history);
        Ok(frame)
    }

    /// Predict the next `forecast_len` business days from the latest window.
    ///
    /// The returned frame extends the observed series by those dates; only
    /// they carry a `Forecast` value.
    pub fn forecast(&self) -> Result<ForecastFrame> {
        let network = self.network.as_ref().ok_or(ForecastError::FitRequired)?;
        if !self.scaler.is_fitted() {
            return Err(ForecastError::FitRequired);
        }

        let input = self.scaler.transform(latest_input(self.series.values(), self.lags)?)?;
        let forecast = self.scaler.inverse_transform(&network.predict(&input)?)?;
        if forecast.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "recurrent forecast is not finite".to_string(),
            ));
        }

        let last = self.series.last_timestamp().ok_or(ForecastError::EmptyData)?;
        let dates = business_days_after(last, forecast.len(), self.series.calendar());

        let mut frame = ForecastFrame::from_series(&self.series);
        frame.extend_index(&dates)?;
        frame.set_tail(FORECAST_COLUMN, &forecast)?;
        Ok(frame)
    }

    fn network_config(&self, lags: usize) -> LstmConfig {
        LstmConfig {
            hidden_units: self.config.hidden_units.unwrap_or(lags),
            output_len: self.config.forecast_len,
            learning_rate: self.config.learning_rate,
            batch_size: self.config.batch_size,
            gradient_clip: self.config.gradient_clip,
            seed: self.config.seed,
        }
    }

    /// Lag window used by the last successful training run.
    pub fn lags(&self) -> usize {
        self.lags
    }

    pub fn forecast_len(&self) -> usize {
        self.config.forecast_len
    }

    pub fn config(&self) -> &RecurrentConfig {
        &self.config
    }

    pub fn network(&self) -> Option<&LstmNetwork> {
        self.network.as_ref()
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Mean training loss of every epoch run so far.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }
}
