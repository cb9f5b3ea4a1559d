//! Dated frame of nullable columns returned by the forecasters.
//!
//! The first column always holds the observed series. Forecasters append
//! prediction, forecast and bound columns aligned by the date index, and
//! extend the index with future dates whose observed values are null.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Held-out test predictions of the recurrent forecaster.
pub const PREDICTION_COLUMN: &str = "Prediction";
/// Out-of-sample forecasts of the recurrent forecaster.
pub const FORECAST_COLUMN: &str = "Forecast";
/// Test and future predictions of the statistical forecaster.
pub const PREDICTIONS_COLUMN: &str = "Predictions";
/// Lower confidence bound.
pub const LOWER_BOUND_COLUMN: &str = "Lower Bound";
/// Upper confidence bound.
pub const UPPER_BOUND_COLUMN: &str = "Upper Bound";

const OUTPUT_COLUMNS: [&str; 5] = [
    PREDICTION_COLUMN,
    FORECAST_COLUMN,
    PREDICTIONS_COLUMN,
    LOWER_BOUND_COLUMN,
    UPPER_BOUND_COLUMN,
];

/// Whether `name` is one of the columns the forecasters write.
pub fn is_output_column(name: &str) -> bool {
    OUTPUT_COLUMNS.contains(&name)
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Vec<Option<f64>>,
}

/// A date-indexed table whose cells may be null.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFrame {
    index: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl ForecastFrame {
    /// Frame holding the observed series as its only column.
    pub fn from_series(series: &TimeSeries) -> Self {
        Self {
            index: series.timestamps().to_vec(),
            columns: vec![Column {
                name: series.name().to_string(),
                values: series.values().iter().map(|&v| Some(v)).collect(),
            }],
        }
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| ForecastError::ColumnNotFound(name.to_string()))
    }

    /// Cell at `row` of column `name`.
    pub fn value(&self, name: &str, row: usize) -> Result<Option<f64>> {
        let column = self.column(name)?;
        column
            .get(row)
            .copied()
            .ok_or(ForecastError::IndexOutOfBounds {
                index: row,
                size: column.len(),
            })
    }

    /// Dates and values of the non-null cells of a column.
    pub fn non_null(&self, name: &str) -> Result<Vec<(DateTime<Utc>, f64)>> {
        let column = self.column(name)?;
        Ok(self
            .index
            .iter()
            .zip(column)
            .filter_map(|(&date, value)| value.map(|v| (date, v)))
            .collect())
    }

    /// Add or replace a column. `values` must cover the whole index.
    ///
    /// The observed column cannot be replaced.
    pub fn add_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if self.columns.first().is_some_and(|c| c.name == name) {
            return Err(ForecastError::InvalidParameter(format!(
                "column '{name}' holds the observed series"
            )));
        }
        if values.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Add an all-null column, replacing any existing column of that name.
    pub fn add_null_column(&mut self, name: &str) -> Result<()> {
        self.add_column(name, vec![None; self.len()])
    }

    /// Append dates after the last one; every column gets nulls.
    pub fn extend_index(&mut self, dates: &[DateTime<Utc>]) -> Result<()> {
        let mut last = self.index.last().copied();
        for &date in dates {
            if let Some(prev) = last {
                if date <= prev {
                    return Err(ForecastError::TimestampError(
                        "appended dates must be strictly increasing".to_string(),
                    ));
                }
            }
            last = Some(date);
        }

        self.index.extend_from_slice(dates);
        for column in &mut self.columns {
            column.values.resize(self.index.len(), None);
        }
        Ok(())
    }

    /// Append one row with a value per column, in column order.
    pub fn append_row(&mut self, date: DateTime<Utc>, values: &[Option<f64>]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        self.extend_index(&[date])?;
        let row = self.len() - 1;
        for (column, &value) in self.columns.iter_mut().zip(values) {
            column.values[row] = value;
        }
        Ok(())
    }

    /// Populate the last `values.len()` rows of a column; earlier rows are null.
    pub fn set_tail(&mut self, name: &str, values: &[f64]) -> Result<()> {
        if values.len() > self.len() {
            return Err(ForecastError::InsufficientData {
                needed: values.len(),
                got: self.len(),
            });
        }
        let offset = self.len() - values.len();
        let mut column = vec![None; self.len()];
        for (cell, &v) in column[offset..].iter_mut().zip(values) {
            *cell = Some(v);
        }
        self.add_column(name, column)
    }

    /// Populate a column at the given dates; all other rows are null.
    pub fn set_at_dates(
        &mut self,
        name: &str,
        dates: &[DateTime<Utc>],
        values: &[f64],
    ) -> Result<()> {
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }
        let mut column = vec![None; self.len()];
        for (date, &v) in dates.iter().zip(values) {
            let row = self.index.binary_search(date).map_err(|_| {
                ForecastError::TimestampError(format!("date {date} not in frame index"))
            })?;
            column[row] = Some(v);
        }
        self.add_column(name, column)
    }
}
