//! Forecasting models.

mod traits;

pub mod arima;
pub mod lstm;

pub use arima::{ARIMASpec, ARIMA};
pub use lstm::{AdamConfig, LstmConfig, LstmNetwork};
pub use traits::{BoxedForecaster, Forecaster};
