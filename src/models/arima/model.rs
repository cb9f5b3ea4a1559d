//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Minimum series length needed to estimate the model.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(5, 2, 2)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// Parameters are estimated by conditional sum of squares. A mean term is
/// estimated only for undifferenced models (`d == 0`), so a differenced model
/// carries no deterministic drift.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    include_mean: bool,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    intercept: f64,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    /// One-step in-sample predictions on the original scale.
    fitted: Option<Vec<f64>>,
    /// Residuals on the differenced scale.
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    converged: bool,
}

impl ARIMA {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            include_mean: spec.d == 0,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            fitted: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
            converged: false,
        }
    }

    /// Force estimation of a mean term on the differenced series.
    pub fn with_mean(mut self, include_mean: bool) -> Self {
        self.include_mean = include_mean;
        self
    }

    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Whether the last parameter search met its tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Estimated parameters: mean (if any), AR terms, MA terms, noise variance.
    pub fn num_params(&self) -> usize {
        self.spec.p + self.spec.q + usize::from(self.include_mean) + 1
    }

    /// Residuals of the recursion for the given parameters; entries before
    /// `max(p, q)` are zero.
    fn recursion_residuals(
        diff_series: &[f64],
        ar: &[f64],
        ma: &[f64],
        intercept: f64,
    ) -> Vec<f64> {
        let n = diff_series.len();
        let start = ar.len().max(ma.len());
        let mut residuals = vec![0.0; n];

        for t in start..n {
            let mut pred = intercept;
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (diff_series[t - 1 - i] - intercept);
            }
            for (i, theta) in ma.iter().enumerate() {
                pred += theta * residuals[t - 1 - i];
            }
            residuals[t] = diff_series[t] - pred;
        }

        residuals
    }

    fn split_params<'a>(&self, params: &'a [f64]) -> (f64, &'a [f64], &'a [f64]) {
        let offset = usize::from(self.include_mean);
        let intercept = if self.include_mean { params[0] } else { 0.0 };
        let ar = &params[offset..offset + self.spec.p];
        let ma = &params[offset + self.spec.p..];
        (intercept, ar, ma)
    }

    fn estimate_parameters(&mut self, diff_series: &[f64]) {
        let p = self.spec.p;
        let q = self.spec.q;
        let mean = diff_series.iter().sum::<f64>() / diff_series.len() as f64;

        let mut initial = Vec::with_capacity(p + q + 1);
        let mut bounds = Vec::with_capacity(p + q + 1);
        if self.include_mean {
            initial.push(mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for i in 0..p {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-0.99, 0.99));
        }
        for i in 0..q {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-0.99, 0.99));
        }

        if initial.is_empty() {
            self.intercept = 0.0;
            self.ar_coefficients = vec![];
            self.ma_coefficients = vec![];
            self.converged = true;
            return;
        }

        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-10,
            restarts: 2,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| {
                let (intercept, ar, ma) = self.split_params(params);
                let start = p.max(q);
                let css: f64 = Self::recursion_residuals(diff_series, ar, ma, intercept)[start..]
                    .iter()
                    .map(|e| e * e)
                    .sum();
                if css.is_finite() {
                    css
                } else {
                    f64::MAX
                }
            },
            &initial,
            Some(&bounds),
            config,
        );

        if !result.converged {
            tracing::warn!(
                iterations = result.iterations,
                "ARIMA parameter search did not converge"
            );
        }

        let (intercept, ar, ma) = self.split_params(&result.optimal_point);
        self.intercept = intercept;
        self.ar_coefficients = ar.to_vec();
        self.ma_coefficients = ma.to_vec();
        self.converged = result.converged;
    }

    fn calculate_fitted(&mut self, original: &[f64], diff_series: &[f64]) {
        let d = self.spec.d;
        let start = self.spec.p.max(self.spec.q);
        let residuals = Self::recursion_residuals(
            diff_series,
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.intercept,
        );

        // Differencing is exact given the past, so the one-step error on the
        // original scale equals the error on the differenced scale.
        let mut fitted = vec![f64::NAN; original.len()];
        for (k, e) in residuals.iter().enumerate().skip(start) {
            fitted[k + d] = original[k + d] - e;
        }

        let valid = &residuals[start..];
        if !valid.is_empty() {
            let variance = valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64;
            self.residual_variance = Some(variance);

            let n_eff = valid.len() as f64;
            let k = self.num_params() as f64;
            let ll = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
            self.aic = Some(-2.0 * ll + 2.0 * k);
            self.bic = Some(-2.0 * ll + k * n_eff.ln());
        }

        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
    }

    /// MA(infinity) weights of the integrated model, `psi[0] = 1`.
    ///
    /// The AR side is `phi(B) (1 - B)^d`, so the weights of differenced
    /// models do not decay and interval widths keep growing.
    pub fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        if horizon == 0 {
            return vec![];
        }

        let mut ar_poly = Vec::with_capacity(self.spec.p + 1);
        ar_poly.push(1.0);
        ar_poly.extend(self.ar_coefficients.iter().map(|c| -c));
        for _ in 0..self.spec.d {
            ar_poly = multiply_polynomials(&ar_poly, &[1.0, -1.0]);
        }
        let phi: Vec<f64> = ar_poly[1..].iter().map(|c| -c).collect();

        let mut psi = vec![0.0; horizon];
        psi[0] = 1.0;
        for j in 1..horizon {
            let mut value = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            for i in 1..=phi.len().min(j) {
                value += phi[i - 1] * psi[j - i];
            }
            psi[j] = value;
        }
        psi
    }
}

fn multiply_polynomials(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::from_spec(ARIMASpec::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }

        let min_len = self.spec.min_observations();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let diff_series = difference(values, self.spec.d);
        self.estimate_parameters(&diff_series);
        self.calculate_fitted(values, &diff_series);

        tracing::debug!(
            p = self.spec.p,
            d = self.spec.d,
            q = self.spec.q,
            ar = ?self.ar_coefficients,
            ma = ?self.ma_coefficients,
            intercept = self.intercept,
            sigma2 = ?self.residual_variance,
            aic = ?self.aic,
            "fitted ARIMA"
        );

        self.original = Some(values.to_vec());
        self.differenced = Some(diff_series);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let diff_series = self
            .differenced
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mut extended_diff = diff_series.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended_diff.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += phi * (extended_diff[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += theta * extended_residuals[t - 1 - i];
                }
            }
            extended_diff.push(pred);
            // Future shocks have zero expectation.
            extended_residuals.push(0.0);
        }

        let forecast_diff = &extended_diff[diff_series.len()..];
        let predictions = integrate(forecast_diff, original, self.spec.d);

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "ARIMA forecast diverged".to_string(),
            ));
        }

        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }

        let forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }

        let variance = self.residual_variance.ok_or(ForecastError::FitRequired)?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ComputationError(e.to_string()))?;
        let z = normal.inverse_cdf((1.0 + level) / 2.0);

        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (point, weight) in forecast.point().iter().zip(&psi) {
            cumulative += weight * weight;
            let se = (variance * cumulative).sqrt();
            lower.push(point - z * se);
            upper.push(point + z * se);
        }

        Forecast::from_values_with_intervals(forecast.into_point(), lower, upper)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
