use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// a fully connected layer computing `x · W + b` for a batch of rows, with
/// `W` stored as (in_features, out_features).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Linear {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGrads {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Linear {
    /// weights and biases drawn from U(-1/√in_features, 1/√in_features).
    pub fn new(in_features: usize, out_features: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        let weight = Array2::from_shape_simple_fn((in_features, out_features), || {
            rng.random_range(-bound..bound)
        });
        let bias = Array1::from_shape_simple_fn(out_features, || rng.random_range(-bound..bound));
        Self { weight, bias }
    }

    pub fn in_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn forward(&self, x: &ArrayView2<f32>) -> Array2<f32> {
        x.dot(&self.weight) + &self.bias
    }

    /// returns the parameter gradients and the gradient with respect to the
    /// layer input.
    pub fn backward(
        &self,
        x: &ArrayView2<f32>,
        grad_out: &ArrayView2<f32>,
    ) -> (LinearGrads, Array2<f32>) {
        let grads = LinearGrads {
            weight: x.t().dot(grad_out),
            bias: grad_out.sum_axis(Axis(0)),
        };
        let grad_in = grad_out.dot(&self.weight.t());
        (grads, grad_in)
    }
}

impl LinearGrads {
    pub fn zeros_like(layer: &Linear) -> Self {
        Self {
            weight: Array2::zeros(layer.weight.raw_dim()),
            bias: Array1::zeros(layer.bias.raw_dim()),
        }
    }

    pub fn accumulate(&mut self, other: &LinearGrads) {
        self.weight += &other.weight;
        self.bias += &other.bias;
    }
}
