//! Observed series: a univariate sequence of dated values.

use crate::core::calendar::{next_business_day, CalendarAnnotations};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};

/// Column label used when a series has no explicit name.
pub const DEFAULT_SERIES_NAME: &str = "value";

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    name: String,
    calendar: Option<CalendarAnnotations>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    name: Option<String>,
    calendar: Option<CalendarAnnotations>,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn calendar(mut self, calendar: CalendarAnnotations) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        let mut series = TimeSeries::univariate(self.timestamps, self.values)?;
        if let Some(name) = self.name {
            series.name = name;
        }
        series.calendar = self.calendar;
        Ok(series)
    }
}

impl TimeSeries {
    /// Create a univariate series named [`DEFAULT_SERIES_NAME`].
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.len() != timestamps.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        Ok(Self {
            timestamps,
            values,
            name: DEFAULT_SERIES_NAME.to_string(),
            calendar: None,
        })
    }

    /// Create a series over consecutive business days.
    ///
    /// The first observation lands on `start` if it is a weekday, otherwise on
    /// the following Monday.
    pub fn from_business_days(start: DateTime<Utc>, values: Vec<f64>) -> Result<Self> {
        let mut timestamps = Vec::with_capacity(values.len());
        if !values.is_empty() {
            let mut current = next_business_day(start - Duration::days(1), None);
            timestamps.push(current);
            for _ in 1..values.len() {
                current = next_business_day(current, None);
                timestamps.push(current);
            }
        }
        Self::univariate(timestamps, values)
    }

    pub fn builder() -> TimeSeriesBuilder {
        TimeSeriesBuilder::new()
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Column label of the observed values.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    pub fn calendar(&self) -> Option<&CalendarAnnotations> {
        self.calendar.as_ref()
    }

    pub fn set_calendar(&mut self, calendar: CalendarAnnotations) {
        self.calendar = Some(calendar);
    }

    /// Check if timestamp is a business day under this series' calendar.
    pub fn is_business_day(&self, timestamp: &DateTime<Utc>) -> bool {
        match &self.calendar {
            Some(c) => c.is_business_day(timestamp),
            None => crate::core::calendar::is_weekday(timestamp),
        }
    }

    /// The trailing `n` values.
    pub fn tail(&self, n: usize) -> Result<&[f64]> {
        if n > self.len() {
            return Err(ForecastError::InsufficientData {
                needed: n,
                got: self.len(),
            });
        }
        Ok(&self.values[self.len() - n..])
    }

    /// Extract a contiguous slice of the series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            name: self.name.clone(),
            calendar: self.calendar.clone(),
        })
    }

    /// Extract the observations at the given strictly ascending positions.
    pub fn select(&self, indices: &[usize]) -> Result<TimeSeries> {
        for (k, &i) in indices.iter().enumerate() {
            if i >= self.len() {
                return Err(ForecastError::IndexOutOfBounds {
                    index: i,
                    size: self.len(),
                });
            }
            if k > 0 && i <= indices[k - 1] {
                return Err(ForecastError::InvalidParameter(
                    "indices must be strictly ascending".to_string(),
                ));
            }
        }

        Ok(TimeSeries {
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
            values: indices.iter().map(|&i| self.values[i]).collect(),
            name: self.name.clone(),
            calendar: self.calendar.clone(),
        })
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }
}
