//! LSTM network configuration.

use serde::{Deserialize, Serialize};

/// Shape and training settings of an [`LstmNetwork`](super::LstmNetwork).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstmConfig {
    /// Size of the hidden state
    pub hidden_units: usize,
    /// Length of the predicted window
    pub output_len: usize,
    /// Adam step size
    pub learning_rate: f64,
    /// Samples per gradient step
    pub batch_size: usize,
    /// Maximum global gradient norm
    pub gradient_clip: Option<f64>,
    /// Seed for weight initialisation and per-epoch shuffling
    pub seed: u64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            hidden_units: 32,
            output_len: 1,
            learning_rate: 0.001,
            batch_size: 32,
            gradient_clip: None,
            seed: 42,
        }
    }
}

impl LstmConfig {
    pub fn new(hidden_units: usize, output_len: usize) -> Self {
        Self {
            hidden_units,
            output_len,
            ..Default::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_gradient_clip(mut self, max_norm: f64) -> Self {
        self.gradient_clip = Some(max_norm);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = LstmConfig::new(16, 5)
            .with_learning_rate(0.01)
            .with_batch_size(8)
            .with_gradient_clip(1.0)
            .with_seed(7);

        assert_eq!(config.hidden_units, 16);
        assert_eq!(config.output_len, 5);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.gradient_clip, Some(1.0));
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: LstmConfig =
            serde_json::from_str(r#"{"hidden_units": 4, "output_len": 3}"#).unwrap();

        assert_eq!(config.hidden_units, 4);
        assert_eq!(config.output_len, 3);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.gradient_clip, None);
    }
}
