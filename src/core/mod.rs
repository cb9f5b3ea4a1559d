//! Core data structures for business-day time series forecasting.

mod calendar;
mod forecast;
mod frame;
pub mod periods;
mod time_series;

pub use calendar::{
    business_days_after, calendar_days_after, is_weekday, next_business_day, CalendarAnnotations,
};
pub use forecast::Forecast;
pub use frame::{
    is_output_column, ForecastFrame, FORECAST_COLUMN, LOWER_BOUND_COLUMN, PREDICTIONS_COLUMN,
    PREDICTION_COLUMN, UPPER_BOUND_COLUMN,
};
pub use time_series::{TimeSeries, TimeSeriesBuilder, DEFAULT_SERIES_NAME};
