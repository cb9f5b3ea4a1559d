//! Data transformations for supervised forecasting.
//!
//! Provides a stateful min-max scaler and sliding window pair construction.
//!
//! # Example
//!
//! ```
//! use sigforecast::transform::{training_pairs, MinMaxScaler};
//!
//! let series: Vec<f64> = (0..20).map(|i| i as f64).collect();
//!
//! let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
//! let scaled = scaler.fit_transform(&series).unwrap();
//!
//! // 3 past values -> 4 future values, last 4 values held out
//! let pairs = training_pairs(&scaled, 3, 4).unwrap();
//! assert_eq!(pairs.len(), 20 - 4 - 4 - 3 + 1);
//! ```

pub mod scale;
pub mod window;

pub use scale::MinMaxScaler;
pub use window::{holdout_input, latest_input, training_pair_count, training_pairs, WindowPair};
