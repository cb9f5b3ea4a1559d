//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};

/// Point predictions with optional interval bounds.
#[derive(Debug, Clone, Default)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    ///
    /// All three vectors must have the same length.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        for bound in [&lower, &upper] {
            if bound.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: bound.len(),
                });
            }
        }
        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn into_point(self) -> Vec<f64> {
        self.point
    }
}
