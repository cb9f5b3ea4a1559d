//! Min-max scaling fit once and reused for every later transform.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Fitted bounds of the data seen by [`MinMaxScaler::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct FittedRange {
    data_min: f64,
    data_max: f64,
}

/// Maps values linearly from the fitted data range into `feature_range`.
///
/// x_scaled = (x - data_min) / (data_max - data_min) * (max - min) + min
///
/// A constant series has zero data range; it is treated as range 1 so that
/// every value maps to `min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    fitted: Option<FittedRange>,
}

impl MinMaxScaler {
    /// Create an unfitted scaler targeting `[min, max]`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min >= max || !min.is_finite() || !max.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "feature range must satisfy min < max, got ({min}, {max})"
            )));
        }
        Ok(Self {
            feature_range: (min, max),
            fitted: None,
        })
    }

    pub fn feature_range(&self) -> (f64, f64) {
        self.feature_range
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Minimum and maximum of the fitted data.
    pub fn data_range(&self) -> Option<(f64, f64)> {
        self.fitted.map(|f| (f.data_min, f.data_max))
    }

    /// Learn the data bounds. Refitting replaces previous bounds.
    pub fn fit(&mut self, data: &[f64]) -> Result<()> {
        if data.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        let data_min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        self.fitted = Some(FittedRange { data_min, data_max });
        Ok(())
    }

    pub fn fit_transform(&mut self, data: &[f64]) -> Result<Vec<f64>> {
        self.fit(data)?;
        self.transform(data)
    }

    /// Scale values with the fitted bounds.
    pub fn transform(&self, data: &[f64]) -> Result<Vec<f64>> {
        let (scale, offset) = self.coefficients()?;
        Ok(data.iter().map(|&x| x * scale + offset).collect())
    }

    /// Map scaled values back to the original units.
    pub fn inverse_transform(&self, data: &[f64]) -> Result<Vec<f64>> {
        let (scale, offset) = self.coefficients()?;
        Ok(data.iter().map(|&x| (x - offset) / scale).collect())
    }

    fn coefficients(&self) -> Result<(f64, f64)> {
        let fitted = self.fitted.ok_or(ForecastError::FitRequired)?;
        let (min, max) = self.feature_range;

        let range = fitted.data_max - fitted.data_min;
        let range = if range.abs() < 1e-12 { 1.0 } else { range };

        let scale = (max - min) / range;
        let offset = min - fitted.data_min * scale;
        Ok((scale, offset))
    }
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self {
            feature_range: (0.0, 1.0),
            fitted: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scales_into_symmetric_range() {
        let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        let scaled = scaler.fit_transform(&[0.0, 50.0, 100.0]).unwrap();

        assert_relative_eq!(scaled[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(scaled[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(scaled[2], 1.0, epsilon = 1e-12);
        assert_eq!(scaler.data_range(), Some((0.0, 100.0)));
    }

    #[test]
    fn default_range_is_unit_interval() {
        let mut scaler = MinMaxScaler::default();
        let scaled = scaler.fit_transform(&[-10.0, 0.0, 10.0]).unwrap();

        assert_relative_eq!(scaled[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(scaled[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(scaled[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_recovers_original_values() {
        let series = vec![101.5, 99.25, 130.0, 87.75, 112.0];
        let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        let scaled = scaler.fit_transform(&series).unwrap();
        let recovered = scaler.inverse_transform(&scaled).unwrap();

        for (orig, rec) in series.iter().zip(recovered.iter()) {
            assert_relative_eq!(orig, rec, epsilon = 1e-9);
        }
    }

    #[test]
    fn transform_reuses_fitted_bounds() {
        let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        scaler.fit(&[0.0, 10.0]).unwrap();

        // Values outside the fitted range are extrapolated, not clipped.
        let scaled = scaler.transform(&[20.0, -10.0]).unwrap();
        assert_relative_eq!(scaled[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(scaled[1], -3.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_series_maps_to_range_minimum() {
        let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        let scaled = scaler.fit_transform(&[5.0; 4]).unwrap();
        for x in scaled {
            assert_relative_eq!(x, -1.0, epsilon = 1e-12);
        }
        let back = scaler.inverse_transform(&[-1.0]).unwrap();
        assert_relative_eq!(back[0], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn unfitted_scaler_requires_fit() {
        let scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(ForecastError::FitRequired)
        ));
        assert!(matches!(
            scaler.inverse_transform(&[1.0]),
            Err(ForecastError::FitRequired)
        ));
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(MinMaxScaler::new(1.0, 1.0).is_err());
        assert!(MinMaxScaler::new(2.0, -1.0).is_err());

        let mut scaler = MinMaxScaler::default();
        assert!(matches!(scaler.fit(&[]), Err(ForecastError::EmptyData)));
        assert!(matches!(
            scaler.fit(&[1.0, f64::NAN]),
            Err(ForecastError::MissingValues)
        ));
    }
}
