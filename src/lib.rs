//! # sigforecast
//!
//! Business-day time series forecasting.
//!
//! Two forecasters share the same input (an observed [`TimeSeries`]) and output
//! (a dated [`ForecastFrame`] of nullable columns):
//!
//! - [`RecurrentForecaster`] trains an LSTM on sliding windows and predicts a
//!   window of future values from the latest lag window.
//! - [`StatisticalForecaster`] fits ARIMA(5,2,2), validates on a held-out
//!   partition and produces confidence intervals.
//!
//! [`TimeSeries`]: core::TimeSeries
//! [`ForecastFrame`]: core::ForecastFrame
//! [`RecurrentForecaster`]: forecasters::RecurrentForecaster
//! [`StatisticalForecaster`]: forecasters::StatisticalForecaster

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod forecasters;
pub mod models;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{ForecastFrame, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::forecasters::{
        RecurrentConfig, RecurrentForecaster, SplitStrategy, StatisticalConfig,
        StatisticalForecaster,
    };
    pub use crate::models::Forecaster;
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
