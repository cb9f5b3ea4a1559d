//! Forecasters over an observed series, returning dated frames.
//!
//! - [`RecurrentForecaster`]: LSTM mapping a lag window to a forecast window
//! - [`StatisticalForecaster`]: ARIMA(5,2,2) with validation and intervals

mod recurrent;
mod statistical;

pub use recurrent::{RecurrentConfig, RecurrentForecaster};
pub use statistical::{SplitStrategy, StatisticalConfig, StatisticalForecaster};
