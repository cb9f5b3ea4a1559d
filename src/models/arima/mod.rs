//! ARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with arbitrary (p, d, q) orders
//! - Differencing and integration helpers

mod diff;
mod model;

pub use diff::{difference, integrate};
pub use model::{ARIMASpec, ARIMA};
