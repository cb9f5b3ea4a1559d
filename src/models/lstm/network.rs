//! Single-layer LSTM followed by a dense projection of the last hidden state.

use super::adam::{Adam, AdamConfig};
use super::config::LstmConfig;
use super::params::LstmParams;
use crate::error::{ForecastError, Result};
use crate::transform::WindowPair;
use ndarray::{s, Array2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;

/// One row of [`NetworkSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub name: String,
    pub kind: String,
    /// Output width; the batch dimension is left open.
    pub units: usize,
    pub params: usize,
}

/// Layer table of a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSummary {
    pub layers: Vec<LayerSummary>,
}

impl NetworkSummary {
    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|l| l.params).sum()
    }
}

impl fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} {:<16} {:>10}", "Layer (type)", "Output Shape", "Param #")?;
        for layer in &self.layers {
            let label = format!("{} ({})", layer.name, layer.kind);
            let shape = format!("(None, {})", layer.units);
            writeln!(f, "{:<20} {:<16} {:>10}", label, shape, layer.params)?;
        }
        write!(f, "Total params: {}", self.total_params())
    }
}

/// Activations kept from a forward pass for backpropagation.
struct ForwardCache {
    /// `steps + 1` hidden states, the first all zero.
    hidden: Vec<Array2<f64>>,
    /// `steps + 1` cell states, the first all zero.
    cells: Vec<Array2<f64>>,
    /// Activated gates per step, `batch x 4H`.
    gates: Vec<Array2<f64>>,
    output: Array2<f64>,
}

/// LSTM regressor mapping an input window of scalars to `output_len` values.
///
/// # Example
/// ```
/// use sigforecast::models::{LstmConfig, LstmNetwork};
///
/// let network = LstmNetwork::new(LstmConfig::new(4, 2)).unwrap();
/// let prediction = network.predict(&[0.1, 0.2, 0.3]).unwrap();
///
/// assert_eq!(prediction.len(), 2);
/// assert_eq!(network.parameter_count(), 4 * (4 * (1 + 4) + 4) + 4 * 2 + 2);
/// ```
#[derive(Debug, Clone)]
pub struct LstmNetwork {
    config: LstmConfig,
    params: LstmParams,
    optimizer: Adam,
    rng: StdRng,
}

impl LstmNetwork {
    pub fn new(config: LstmConfig) -> Result<Self> {
        validate_config(&config)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let h = config.hidden_units;
        let out = config.output_len;

        let mut params = LstmParams::zeros(h, out);
        params.w_input = glorot_uniform(&mut rng, 4 * h, 1, 4 * h).into_shape(4 * h).map_err(
            |e| ForecastError::ComputationError(format!("input kernel shape: {e}")),
        )?;
        params.w_recurrent = glorot_uniform(&mut rng, 4 * h, h, 4 * h);
        params.w_dense = glorot_uniform(&mut rng, out, h, out);
        params.bias.slice_mut(s![h..2 * h]).fill(1.0);

        let optimizer = Adam::new(
            AdamConfig {
                learning_rate: config.learning_rate,
                ..Default::default()
            },
            &params,
        );

        Ok(Self {
            config,
            params,
            optimizer,
            rng,
        })
    }

    pub fn config(&self) -> &LstmConfig {
        &self.config
    }

    pub fn hidden_units(&self) -> usize {
        self.config.hidden_units
    }

    pub fn output_len(&self) -> usize {
        self.config.output_len
    }

    /// LSTM parameters `4 (H (1 + H) + H)` plus dense parameters `H F + F`.
    pub fn parameter_count(&self) -> usize {
        self.summary().total_params()
    }

    pub fn summary(&self) -> NetworkSummary {
        let h = self.config.hidden_units;
        let out = self.config.output_len;
        NetworkSummary {
            layers: vec![
                LayerSummary {
                    name: "lstm".to_string(),
                    kind: "LSTM".to_string(),
                    units: h,
                    params: 4 * (h * (1 + h) + h),
                },
                LayerSummary {
                    name: "dense".to_string(),
                    kind: "Dense".to_string(),
                    units: out,
                    params: h * out + out,
                },
            ],
        }
    }

    /// Train for `epochs` passes over `pairs` and return the mean loss of
    /// each epoch.
    pub fn fit(&mut self, pairs: &[WindowPair], epochs: usize) -> Result<Vec<f64>> {
        let lags = self.validate_pairs(pairs)?;
        let batch_size = self.config.batch_size.min(pairs.len());
        let mut order: Vec<usize> = (0..pairs.len()).collect();
        let mut history = Vec::with_capacity(epochs);

        for epoch in 0..epochs {
            order.shuffle(&mut self.rng);
            let mut total = 0.0;

            for batch in order.chunks(batch_size) {
                let (inputs, targets) = stack_pairs(pairs, batch, lags);
                let (loss, mut grads) = self.loss_and_gradients(&inputs, &targets);

                if let Some(max_norm) = self.config.gradient_clip {
                    let norm = grads.norm();
                    if norm > max_norm {
                        grads.scale(max_norm / norm);
                    }
                }
                self.optimizer.step(&mut self.params, &grads);
                total += loss * batch.len() as f64;
            }

            let epoch_loss = total / pairs.len() as f64;
            if !epoch_loss.is_finite() {
                tracing::warn!(epoch = epoch + 1, "training loss is not finite");
                return Err(ForecastError::ComputationError(format!(
                    "training loss diverged at epoch {}",
                    epoch + 1
                )));
            }
            tracing::debug!(epoch = epoch + 1, epochs, loss = epoch_loss, "epoch complete");
            history.push(epoch_loss);
        }

        Ok(history)
    }

    /// Predict the output window for a single input window.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut outputs = self.predict_batch(&[input])?;
        outputs
            .pop()
            .ok_or_else(|| ForecastError::ComputationError("empty prediction batch".to_string()))
    }

    /// Predict output windows for equally long input windows.
    pub fn predict_batch<I: AsRef<[f64]>>(&self, inputs: &[I]) -> Result<Vec<Vec<f64>>> {
        let Some(first) = inputs.first() else {
            return Ok(vec![]);
        };
        let steps = first.as_ref().len();
        if steps == 0 {
            return Err(ForecastError::EmptyData);
        }
        for input in inputs {
            if input.as_ref().len() != steps {
                return Err(ForecastError::DimensionMismatch {
                    expected: steps,
                    got: input.as_ref().len(),
                });
            }
        }

        let batch = Array2::from_shape_fn((inputs.len(), steps), |(r, c)| inputs[r].as_ref()[c]);
        let cache = self.forward(&batch);
        if cache.output.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "LSTM output is not finite".to_string(),
            ));
        }
        Ok(cache.output.outer_iter().map(|row| row.to_vec()).collect())
    }

    /// Mean squared error over `pairs`.
    pub fn evaluate(&self, pairs: &[WindowPair]) -> Result<f64> {
        let lags = self.validate_pairs(pairs)?;
        let indices: Vec<usize> = (0..pairs.len()).collect();
        let (inputs, targets) = stack_pairs(pairs, &indices, lags);
        let cache = self.forward(&inputs);
        Ok(mse(&cache.output, &targets))
    }

    fn validate_pairs(&self, pairs: &[WindowPair]) -> Result<usize> {
        let first = pairs.first().ok_or(ForecastError::EmptyData)?;
        let lags = first.input.len();
        if lags == 0 {
            return Err(ForecastError::EmptyData);
        }
        for pair in pairs {
            if pair.input.len() != lags {
                return Err(ForecastError::DimensionMismatch {
                    expected: lags,
                    got: pair.input.len(),
                });
            }
            if pair.target.len() != self.config.output_len {
                return Err(ForecastError::DimensionMismatch {
                    expected: self.config.output_len,
                    got: pair.target.len(),
                });
            }
        }
        Ok(lags)
    }

    fn forward(&self, inputs: &Array2<f64>) -> ForwardCache {
        let (batch, steps) = inputs.dim();
        let h = self.config.hidden_units;
        let w_recurrent_t = self.params.w_recurrent.t();

        let mut hidden = Vec::with_capacity(steps + 1);
        let mut cells = Vec::with_capacity(steps + 1);
        let mut gates = Vec::with_capacity(steps);
        hidden.push(Array2::zeros((batch, h)));
        cells.push(Array2::zeros((batch, h)));

        for t in 0..steps {
            let mut z = hidden[t].dot(&w_recurrent_t);
            for (mut row, &x) in z.outer_iter_mut().zip(inputs.column(t).iter()) {
                row.scaled_add(x, &self.params.w_input);
                row += &self.params.bias;
            }
            z.slice_mut(s![.., 0..2 * h]).mapv_inplace(sigmoid);
            z.slice_mut(s![.., 2 * h..3 * h]).mapv_inplace(f64::tanh);
            z.slice_mut(s![.., 3 * h..]).mapv_inplace(sigmoid);

            let i = z.slice(s![.., 0..h]);
            let f = z.slice(s![.., h..2 * h]);
            let g = z.slice(s![.., 2 * h..3 * h]);
            let o = z.slice(s![.., 3 * h..]);

            let c = &f * &cells[t] + &i * &g;
            let h_next = &o * &c.mapv(f64::tanh);

            cells.push(c);
            hidden.push(h_next);
            gates.push(z);
        }

        let output = hidden[steps].dot(&self.params.w_dense.t()) + &self.params.b_dense;
        ForwardCache {
            hidden,
            cells,
            gates,
            output,
        }
    }

    /// Batch MSE and its gradient with respect to every parameter.
    fn loss_and_gradients(
        &self,
        inputs: &Array2<f64>,
        targets: &Array2<f64>,
    ) -> (f64, LstmParams) {
        let cache = self.forward(inputs);
        let loss = mse(&cache.output, targets);
        let scale = 2.0 / cache.output.len() as f64;
        let d_output = (&cache.output - targets) * scale;
        (loss, self.backward(inputs, &cache, &d_output))
    }

    fn backward(
        &self,
        inputs: &Array2<f64>,
        cache: &ForwardCache,
        d_output: &Array2<f64>,
    ) -> LstmParams {
        let (batch, steps) = inputs.dim();
        let h = self.config.hidden_units;
        let mut grads = LstmParams::zeros_like(&self.params);

        grads.w_dense = d_output.t().dot(&cache.hidden[steps]);
        grads.b_dense = d_output.sum_axis(Axis(0));

        let mut dh = d_output.dot(&self.params.w_dense);
        let mut dc: Array2<f64> = Array2::zeros((batch, h));

        for t in (0..steps).rev() {
            let z = &cache.gates[t];
            let i = z.slice(s![.., 0..h]);
            let f = z.slice(s![.., h..2 * h]);
            let g = z.slice(s![.., 2 * h..3 * h]);
            let o = z.slice(s![.., 3 * h..]);
            let tanh_c = cache.cells[t + 1].mapv(f64::tanh);

            let d_o = &dh * &tanh_c;
            dc += &(&dh * &o * &tanh_c.mapv(|v| 1.0 - v * v));
            let d_i = &dc * &g;
            let d_g = &dc * &i;
            let d_f = &dc * &cache.cells[t];

            let mut dz: Array2<f64> = Array2::zeros((batch, 4 * h));
            dz.slice_mut(s![.., 0..h])
                .assign(&(d_i * &i.mapv(sigmoid_derivative)));
            dz.slice_mut(s![.., h..2 * h])
                .assign(&(d_f * &f.mapv(sigmoid_derivative)));
            dz.slice_mut(s![.., 2 * h..3 * h])
                .assign(&(d_g * &g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * h..])
                .assign(&(d_o * &o.mapv(sigmoid_derivative)));

            dc = &dc * &f;
            grads.w_input += &dz.t().dot(&inputs.column(t));
            grads.w_recurrent += &dz.t().dot(&cache.hidden[t]);
            grads.bias += &dz.sum_axis(Axis(0));
            dh = dz.dot(&self.params.w_recurrent);
        }

        grads
    }
}

fn validate_config(config: &LstmConfig) -> Result<()> {
    if config.hidden_units == 0 {
        return Err(ForecastError::InvalidParameter(
            "hidden units must be positive".to_string(),
        ));
    }
    if config.output_len == 0 {
        return Err(ForecastError::InvalidParameter(
            "output length must be positive".to_string(),
        ));
    }
    if config.batch_size == 0 {
        return Err(ForecastError::InvalidParameter(
            "batch size must be positive".to_string(),
        ));
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "learning rate must be positive, got {}",
            config.learning_rate
        )));
    }
    if let Some(clip) = config.gradient_clip {
        if !(clip.is_finite() && clip > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "gradient clip must be positive, got {clip}"
            )));
        }
    }
    Ok(())
}

/// `rows x cols` weights drawn from U(-l, l), `l = sqrt(6 / (fan_in + fan_out))`.
fn glorot_uniform(rng: &mut StdRng, rows: usize, cols: usize, fan_out: usize) -> Array2<f64> {
    let limit = (6.0 / (cols + fan_out) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    Array2::from_shape_fn((rows, cols), |_| dist.sample(rng))
}

fn stack_pairs(pairs: &[WindowPair], indices: &[usize], lags: usize) -> (Array2<f64>, Array2<f64>) {
    let out = pairs[indices[0]].target.len();
    let inputs = Array2::from_shape_fn((indices.len(), lags), |(r, c)| pairs[indices[r]].input[c]);
    let targets = Array2::from_shape_fn((indices.len(), out), |(r, c)| pairs[indices[r]].target[c]);
    (inputs, targets)
}

fn mse(predicted: &Array2<f64>, targets: &Array2<f64>) -> f64 {
    let diff = predicted - targets;
    diff.mapv(|d| d * d).mean().unwrap_or(0.0)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of the sigmoid expressed through its output.
fn sigmoid_derivative(s: f64) -> f64 {
    s * (1.0 - s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine_pairs(n: usize, lags: usize, out: usize) -> Vec<WindowPair> {
        let series: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin() * 0.8).collect();
        series
            .windows(lags + out)
            .map(|w| WindowPair {
                input: w[..lags].to_vec(),
                target: w[lags..].to_vec(),
            })
            .collect()
    }

    #[test]
    fn summary_counts_parameters() {
        let network = LstmNetwork::new(LstmConfig::new(252, 252)).unwrap();
        let summary = network.summary();

        assert_eq!(summary.layers.len(), 2);
        assert_eq!(summary.layers[0].params, 4 * (252 * 253 + 252));
        assert_eq!(summary.layers[1].params, 252 * 252 + 252);
        assert_eq!(network.parameter_count(), summary.total_params());

        let table = summary.to_string();
        assert!(table.contains("lstm (LSTM)"));
        assert!(table.contains("(None, 252)"));
        assert!(table.ends_with(&format!("Total params: {}", summary.total_params())));
    }

    #[test]
    fn initial_weights_follow_glorot_bounds_and_forget_bias() {
        let network = LstmNetwork::new(LstmConfig::new(6, 3)).unwrap();
        let params = &network.params;
        let limit = (6.0f64 / (6 + 24) as f64).sqrt();

        assert!(params.w_recurrent.iter().all(|w| w.abs() <= limit));
        assert_eq!(params.bias.slice(s![6..12]).to_vec(), vec![1.0; 6]);
        assert!(params.bias.slice(s![0..6]).iter().all(|&b| b == 0.0));
        assert!(params.b_dense.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn same_seed_same_network() {
        let a = LstmNetwork::new(LstmConfig::new(5, 2).with_seed(9)).unwrap();
        let b = LstmNetwork::new(LstmConfig::new(5, 2).with_seed(9)).unwrap();
        let c = LstmNetwork::new(LstmConfig::new(5, 2).with_seed(10)).unwrap();

        assert_eq!(a.params, b.params);
        assert_ne!(a.params, c.params);
    }

    #[test]
    fn predict_shapes() {
        let network = LstmNetwork::new(LstmConfig::new(4, 3)).unwrap();
        let single = network.predict(&[0.1, -0.2, 0.3, 0.0]).unwrap();
        assert_eq!(single.len(), 3);

        let batch = network
            .predict_batch(&[vec![0.1, -0.2, 0.3, 0.0], vec![0.5, 0.5, 0.5, 0.5]])
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], single);

        assert!(matches!(
            network.predict_batch(&[vec![0.1, 0.2], vec![0.1]]),
            Err(ForecastError::DimensionMismatch { expected: 2, got: 1 })
        ));
        assert!(matches!(network.predict(&[]), Err(ForecastError::EmptyData)));
    }

    #[test]
    fn non_finite_output_rejected() {
        let network = LstmNetwork::new(LstmConfig::new(4, 3)).unwrap();
        assert!(matches!(
            network.predict(&[0.1, f64::NAN, 0.3]),
            Err(ForecastError::ComputationError(_))
        ));
    }

    #[test]
    fn analytic_gradients_match_finite_differences() {
        let network = LstmNetwork::new(LstmConfig::new(3, 2).with_seed(3)).unwrap();
        let inputs = Array2::from_shape_vec(
            (2, 4),
            vec![0.5, -0.1, 0.3, 0.8, -0.6, 0.2, 0.9, -0.4],
        )
        .unwrap();
        let targets = Array2::from_shape_vec((2, 2), vec![0.2, -0.3, 0.7, 0.1]).unwrap();
        let (_, grads) = network.loss_and_gradients(&inputs, &targets);

        let eps = 1e-6;
        let loss_at = |params: LstmParams| {
            let mut probe = network.clone();
            probe.params = params;
            mse(&probe.forward(&inputs).output, &targets)
        };
        let check = |numeric: f64, analytic: f64| {
            assert_relative_eq!(numeric, analytic, epsilon = 1e-6, max_relative = 1e-4);
        };

        for k in [0, 4, 7, 11] {
            let mut plus = network.params.clone();
            let mut minus = network.params.clone();
            plus.w_input[k] += eps;
            minus.w_input[k] -= eps;
            check((loss_at(plus) - loss_at(minus)) / (2.0 * eps), grads.w_input[k]);
        }
        for (r, c) in [(0, 0), (5, 2), (9, 1), (11, 0)] {
            let mut plus = network.params.clone();
            let mut minus = network.params.clone();
            plus.w_recurrent[[r, c]] += eps;
            minus.w_recurrent[[r, c]] -= eps;
            check((loss_at(plus) - loss_at(minus)) / (2.0 * eps), grads.w_recurrent[[r, c]]);
        }
        for k in [1, 3, 6, 10] {
            let mut plus = network.params.clone();
            let mut minus = network.params.clone();
            plus.bias[k] += eps;
            minus.bias[k] -= eps;
            check((loss_at(plus) - loss_at(minus)) / (2.0 * eps), grads.bias[k]);
        }
        for (r, c) in [(0, 0), (1, 2)] {
            let mut plus = network.params.clone();
            let mut minus = network.params.clone();
            plus.w_dense[[r, c]] += eps;
            minus.w_dense[[r, c]] -= eps;
            check((loss_at(plus) - loss_at(minus)) / (2.0 * eps), grads.w_dense[[r, c]]);
        }
        let mut plus = network.params.clone();
        let mut minus = network.params.clone();
        plus.b_dense[1] += eps;
        minus.b_dense[1] -= eps;
        check((loss_at(plus) - loss_at(minus)) / (2.0 * eps), grads.b_dense[1]);
    }

    #[test]
    fn training_reduces_loss_on_sine() {
        let pairs = sine_pairs(120, 10, 3);
        let config = LstmConfig::new(8, 3).with_learning_rate(0.01).with_batch_size(16);
        let mut network = LstmNetwork::new(config).unwrap();

        let before = network.evaluate(&pairs).unwrap();
        let history = network.fit(&pairs, 60).unwrap();
        let after = network.evaluate(&pairs).unwrap();

        assert_eq!(history.len(), 60);
        assert!(history.iter().all(|l| l.is_finite()));
        assert!(history[59] < history[0]);
        assert!(after < before * 0.5);
    }

    #[test]
    fn gradient_clip_keeps_training_finite() {
        let pairs = sine_pairs(60, 5, 2);
        let config = LstmConfig::new(4, 2)
            .with_learning_rate(0.05)
            .with_gradient_clip(0.1);
        let mut network = LstmNetwork::new(config).unwrap();

        let history = network.fit(&pairs, 5).unwrap();
        assert!(history.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn fit_validates_pairs() {
        let mut network = LstmNetwork::new(LstmConfig::new(4, 2)).unwrap();
        assert!(matches!(network.fit(&[], 1), Err(ForecastError::EmptyData)));

        let wrong_target = vec![WindowPair {
            input: vec![0.0; 3],
            target: vec![0.0; 5],
        }];
        assert!(matches!(
            network.fit(&wrong_target, 1),
            Err(ForecastError::DimensionMismatch { expected: 2, got: 5 })
        ));
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(LstmNetwork::new(LstmConfig::new(0, 2)).is_err());
        assert!(LstmNetwork::new(LstmConfig::new(2, 0)).is_err());
        assert!(LstmNetwork::new(LstmConfig::new(2, 2).with_batch_size(0)).is_err());
        assert!(LstmNetwork::new(LstmConfig::new(2, 2).with_learning_rate(-1.0)).is_err());
        assert!(LstmNetwork::new(LstmConfig::new(2, 2).with_gradient_clip(0.0)).is_err());
    }
}
