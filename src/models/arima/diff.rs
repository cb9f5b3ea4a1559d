//! Differencing utilities for ARIMA models.

/// Apply differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d`-th order differencing of values that continue `original`.
///
/// `differenced` holds future values on the differenced scale; the result
/// holds the same steps on the original scale.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();

    // Innermost level first: each pass cumulates from the last value of the
    // series differenced one order less.
    for level in (0..d).rev() {
        let anchor = difference(original, level).last().copied().unwrap_or(0.0);
        let mut cumsum = anchor;
        for value in result.iter_mut() {
            cumsum += *value;
            *value = cumsum;
        }
    }

    result
}
