//! Property-based tests for windowing, scaling and differencing.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated series.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use sigforecast::core::{business_days_after, calendar_days_after, is_weekday};
use sigforecast::models::arima::{difference, integrate};
use sigforecast::transform::{
    holdout_input, latest_input, training_pair_count, training_pairs, MinMaxScaler,
};

/// Strategy for generating series values.
fn values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| prop::collection::vec(-500.0..500.0_f64, len))
}

/// Series length together with lag and horizon sizes that leave at least one
/// full training pair.
fn window_sizes_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..20, 1usize..20).prop_flat_map(|(lags, horizon)| {
        let min_len = 2 * horizon + lags;
        (min_len..min_len + 60).prop_map(move |n| (n, lags, horizon))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn pair_count_matches_formula((n, lags, horizon) in window_sizes_strategy()) {
        let series: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let pairs = training_pairs(&series, lags, horizon).unwrap();

        prop_assert_eq!(pairs.len(), n - horizon - horizon - lags + 1);
        prop_assert_eq!(pairs.len(), training_pair_count(n, lags, horizon));
        for pair in &pairs {
            prop_assert_eq!(pair.input.len(), lags);
            prop_assert_eq!(pair.target.len(), horizon);
        }
    }

    #[test]
    fn pairs_stay_inside_training_segment((n, lags, horizon) in window_sizes_strategy()) {
        let series: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let pairs = training_pairs(&series, lags, horizon).unwrap();
        let train_end = (n - horizon) as f64;

        for (i, pair) in pairs.iter().enumerate() {
            // Values equal their positions
            prop_assert_eq!(pair.input[0], i as f64);
            prop_assert_eq!(pair.target[0], (i + lags) as f64);
            prop_assert!(*pair.target.last().unwrap() < train_end);
        }
    }

    #[test]
    fn holdout_input_precedes_held_out_segment((n, lags, horizon) in window_sizes_strategy()) {
        let series: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let input = holdout_input(&series, lags, horizon).unwrap();

        prop_assert_eq!(input.len(), lags);
        prop_assert_eq!(input[0], (n - horizon - lags) as f64);
        prop_assert_eq!(*input.last().unwrap(), (n - horizon - 1) as f64);
        prop_assert_eq!(latest_input(&series, lags).unwrap(), &series[n - lags..]);
    }

    #[test]
    fn too_short_series_yields_no_pairs(lags in 1usize..20, horizon in 1usize..20) {
        let n = 2 * horizon + lags - 1;
        let series = vec![0.0; n];
        prop_assert!(training_pairs(&series, lags, horizon).is_err());
        prop_assert_eq!(training_pair_count(n, lags, horizon), 0);
    }

    #[test]
    fn scaling_round_trips(values in values_strategy(2, 200)) {
        let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        let scaled = scaler.fit_transform(&values).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (original, back) in values.iter().zip(&restored) {
            prop_assert!((original - back).abs() < 1e-9);
        }
        for v in &scaled {
            prop_assert!(*v >= -1.0 - 1e-12 && *v <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn fitted_scaler_is_reused_for_new_values(
        values in values_strategy(2, 100),
        extra in -1000.0..1000.0_f64,
    ) {
        let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        scaler.fit(&values).unwrap();
        let before = scaler.data_range();

        let scaled = scaler.transform(&[extra]).unwrap();
        let back = scaler.inverse_transform(&scaled).unwrap();

        prop_assert_eq!(scaler.data_range(), before);
        prop_assert!((back[0] - extra).abs() < 1e-6);
    }

    #[test]
    fn differencing_and_integration_are_inverse(
        values in values_strategy(10, 80),
        d in 1usize..3,
        split in 3usize..7,
    ) {
        let history = &values[..values.len() - split];
        let future = &values[values.len() - split..];

        let full_diff = difference(&values, d);
        let future_diff = &full_diff[full_diff.len() - split..];
        let restored = integrate(future_diff, history, d);

        for (expected, got) in future.iter().zip(&restored) {
            prop_assert!((expected - got).abs() < 1e-6);
        }
    }

    #[test]
    fn business_days_are_weekdays_after_last(offset in 0i64..3650, n in 0usize..60) {
        let last = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset);
        let days = business_days_after(last, n, None);

        prop_assert_eq!(days.len(), n);
        prop_assert!(days.iter().all(is_weekday));
        prop_assert!(days.iter().all(|d| *d > last));
        prop_assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn calendar_days_are_one_day_apart(offset in 0i64..3650, n in 1usize..60) {
        let last = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset);
        let days = calendar_days_after(last, n);

        prop_assert_eq!(days[0], last + Duration::days(1));
        prop_assert!(days.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
    }
}
