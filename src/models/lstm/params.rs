//! Trainable tensors of the network, also used for gradients and moments.

use ndarray::{Array, Array1, Array2, Dimension, Zip};

/// Gate blocks are stacked as input, forget, cell candidate, output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LstmParams {
    /// Input kernel, `4H` (scalar input).
    pub(crate) w_input: Array1<f64>,
    /// Recurrent kernel, `4H x H`.
    pub(crate) w_recurrent: Array2<f64>,
    /// Gate bias, `4H`.
    pub(crate) bias: Array1<f64>,
    /// Dense kernel, `F x H`.
    pub(crate) w_dense: Array2<f64>,
    /// Dense bias, `F`.
    pub(crate) b_dense: Array1<f64>,
}

impl LstmParams {
    pub(crate) fn zeros(hidden_units: usize, output_len: usize) -> Self {
        Self {
            w_input: Array1::zeros(4 * hidden_units),
            w_recurrent: Array2::zeros((4 * hidden_units, hidden_units)),
            bias: Array1::zeros(4 * hidden_units),
            w_dense: Array2::zeros((output_len, hidden_units)),
            b_dense: Array1::zeros(output_len),
        }
    }

    pub(crate) fn zeros_like(other: &Self) -> Self {
        Self::zeros(other.w_recurrent.ncols(), other.b_dense.len())
    }

    /// Global L2 norm over every tensor.
    pub(crate) fn norm(&self) -> f64 {
        let squares = |a: f64, x: &f64| a + x * x;
        (self.w_input.iter().fold(0.0, squares)
            + self.w_recurrent.iter().fold(0.0, squares)
            + self.bias.iter().fold(0.0, squares)
            + self.w_dense.iter().fold(0.0, squares)
            + self.b_dense.iter().fold(0.0, squares))
        .sqrt()
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        self.w_input *= factor;
        self.w_recurrent *= factor;
        self.bias *= factor;
        self.w_dense *= factor;
        self.b_dense *= factor;
    }

    /// Apply `update(param, grad, first_moment, second_moment)` to every
    /// element, pairing tensors field by field.
    pub(crate) fn update_with<F>(&mut self, grads: &Self, m: &mut Self, v: &mut Self, update: F)
    where
        F: Fn(&mut f64, f64, &mut f64, &mut f64) + Copy,
    {
        zip_update(&mut self.w_input, &grads.w_input, &mut m.w_input, &mut v.w_input, update);
        zip_update(
            &mut self.w_recurrent,
            &grads.w_recurrent,
            &mut m.w_recurrent,
            &mut v.w_recurrent,
            update,
        );
        zip_update(&mut self.bias, &grads.bias, &mut m.bias, &mut v.bias, update);
        zip_update(&mut self.w_dense, &grads.w_dense, &mut m.w_dense, &mut v.w_dense, update);
        zip_update(&mut self.b_dense, &grads.b_dense, &mut m.b_dense, &mut v.b_dense, update);
    }
}

fn zip_update<D, F>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    update: F,
) where
    D: Dimension,
    F: Fn(&mut f64, f64, &mut f64, &mut f64),
{
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| update(p, g, m, v));
}
