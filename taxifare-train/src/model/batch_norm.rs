use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::TrainError;

pub const DEFAULT_MOMENTUM: f32 = 0.1;
pub const DEFAULT_EPS: f32 = 1e-5;

/// batch normalization over the feature axis of a (batch, features) input.
///
/// in training mode the batch is normalized with its own mean and biased
/// variance, and the observed statistics are returned so the caller can fold
/// them into the running estimates. in evaluation mode the running estimates
/// are used instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchNorm1d {
    pub gamma: Array1<f32>,
    pub beta: Array1<f32>,
    pub running_mean: Array1<f32>,
    pub running_var: Array1<f32>,
    pub momentum: f32,
    pub eps: f32,
}

/// per-feature mean and biased variance observed over `count` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStats {
    pub mean: Array1<f32>,
    pub var: Array1<f32>,
    pub count: usize,
}

/// intermediate values of a training forward pass needed by the backward pass.
#[derive(Debug, Clone)]
pub struct NormCache {
    pub x_hat: Array2<f32>,
    pub inv_std: Array1<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormGrads {
    pub gamma: Array1<f32>,
    pub beta: Array1<f32>,
}

impl BatchNorm1d {
    pub fn new(num_features: usize) -> Self {
        Self {
            gamma: Array1::ones(num_features),
            beta: Array1::zeros(num_features),
            running_mean: Array1::zeros(num_features),
            running_var: Array1::ones(num_features),
            momentum: DEFAULT_MOMENTUM,
            eps: DEFAULT_EPS,
        }
    }

    pub fn num_features(&self) -> usize {
        self.gamma.len()
    }

    pub fn forward_train(
        &self,
        x: &ArrayView2<f32>,
    ) -> Result<(Array2<f32>, NormCache, BatchStats), TrainError> {
        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            TrainError::EmptyDataset(String::from("batch normalization of an empty batch"))
        })?;
        let centered = x - &mean;
        let var = centered
            .mapv(|v| v * v)
            .mean_axis(Axis(0))
            .ok_or_else(|| TrainError::Internal(String::from("variance of an empty batch")))?;
        let inv_std = var.mapv(|v| 1.0 / (v + self.eps).sqrt());
        let x_hat = centered * &inv_std;
        let output = &x_hat * &self.gamma + &self.beta;
        let stats = BatchStats {
            mean,
            var,
            count: x.nrows(),
        };
        Ok((output, NormCache { x_hat, inv_std }, stats))
    }

    pub fn forward_eval(&self, x: &ArrayView2<f32>) -> Array2<f32> {
        let inv_std = self.running_var.mapv(|v| 1.0 / (v + self.eps).sqrt());
        (x - &self.running_mean) * &inv_std * &self.gamma + &self.beta
    }

    /// gradients of γ and β and of the layer input, for a forward pass that
    /// normalized with batch statistics.
    pub fn backward(&self, cache: &NormCache, grad_out: &ArrayView2<f32>) -> (NormGrads, Array2<f32>) {
        let n = grad_out.nrows() as f32;
        let grads = NormGrads {
            gamma: (grad_out * &cache.x_hat).sum_axis(Axis(0)),
            beta: grad_out.sum_axis(Axis(0)),
        };
        let d_x_hat = grad_out * &self.gamma;
        let sum_d = d_x_hat.sum_axis(Axis(0));
        let sum_d_x_hat = (&d_x_hat * &cache.x_hat).sum_axis(Axis(0));
        let grad_in = (d_x_hat * n - &sum_d - &cache.x_hat * &sum_d_x_hat) * &cache.inv_std / n;
        (grads, grad_in)
    }

    /// folds observed batch statistics into the running estimates. the
    /// running variance tracks the unbiased estimate.
    pub fn update_running(&mut self, stats: &BatchStats) -> Result<(), TrainError> {
        if stats.mean.len() != self.num_features() || stats.var.len() != self.num_features() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![self.num_features()],
                found: vec![stats.mean.len()],
            });
        }
        let n = stats.count as f32;
        let correction = if stats.count > 1 { n / (n - 1.0) } else { 1.0 };
        let m = self.momentum;
        self.running_mean = &self.running_mean * (1.0 - m) + &stats.mean * m;
        self.running_var = &self.running_var * (1.0 - m) + &stats.var * (m * correction);
        Ok(())
    }
}

impl BatchStats {
    /// combines statistics observed on disjoint shards into the statistics of
    /// their union.
    pub fn merge<'a, I>(parts: I) -> Result<BatchStats, TrainError>
    where
        I: IntoIterator<Item = &'a BatchStats>,
    {
        let parts = parts.into_iter().collect::<Vec<_>>();
        let first = parts
            .first()
            .ok_or_else(|| TrainError::Internal(String::from("no batch statistics to merge")))?;
        let count = parts.iter().map(|p| p.count).sum::<usize>();
        if count == 0 {
            return Err(TrainError::Internal(String::from(
                "cannot merge statistics of zero rows",
            )));
        }
        let total = count as f32;
        let mut mean = Array1::<f32>::zeros(first.mean.raw_dim());
        for part in parts.iter() {
            mean += &(&part.mean * (part.count as f32 / total));
        }
        let mut var = Array1::<f32>::zeros(first.var.raw_dim());
        for part in parts.iter() {
            let shift = (&part.mean - &mean).mapv(|d| d * d);
            var += &((&part.var + &shift) * (part.count as f32 / total));
        }
        Ok(BatchStats { mean, var, count })
    }
}
