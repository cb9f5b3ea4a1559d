//! Adam optimiser over the network tensors.

use super::params::LstmParams;
use serde::{Deserialize, Serialize};

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

/// Adam state: first and second moment estimates plus the step count.
#[derive(Debug, Clone)]
pub(crate) struct Adam {
    config: AdamConfig,
    m: LstmParams,
    v: LstmParams,
    step: i32,
}

impl Adam {
    pub(crate) fn new(config: AdamConfig, like: &LstmParams) -> Self {
        Self {
            config,
            m: LstmParams::zeros_like(like),
            v: LstmParams::zeros_like(like),
            step: 0,
        }
    }

    pub(crate) fn step(&mut self, params: &mut LstmParams, grads: &LstmParams) {
        self.step += 1;
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        // Bias correction folded into the step size.
        let lr_t = learning_rate * (1.0 - beta2.powi(self.step)).sqrt()
            / (1.0 - beta1.powi(self.step));

        params.update_with(grads, &mut self.m, &mut self.v, |p, g, m, v| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            *p -= lr_t * *m / (v.sqrt() + epsilon);
        });
    }
}
