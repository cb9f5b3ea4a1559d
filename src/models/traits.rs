//! Forecaster trait defining the common interface for statistical models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for models fitted on a single series.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with confidence intervals at `level` in (0, 1).
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        // Point predictions only unless the model knows its error distribution
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use sigforecast::models::{BoxedForecaster, Forecaster};
/// use sigforecast::models::arima::ARIMA;
///
/// let model: BoxedForecaster = Box::new(ARIMA::new(1, 1, 0));
/// assert_eq!(model.name(), "ARIMA");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;
