//! regression losses over a vector of predictions.
use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// a pointwise regression loss. `gradient` is the derivative of `sum` with
/// respect to each prediction.
pub trait Loss: Send + Sync {
    fn pointwise(&self, prediction: f32, target: f32) -> f32;

    fn pointwise_gradient(&self, prediction: f32, target: f32) -> f32;

    fn sum(&self, predictions: &ArrayView1<f32>, targets: &ArrayView1<f32>) -> f32 {
        Zip::from(predictions)
            .and(targets)
            .fold(0.0, |acc, p, t| acc + self.pointwise(*p, *t))
    }

    /// mean reduction. an empty input has a loss of zero.
    fn mean(&self, predictions: &ArrayView1<f32>, targets: &ArrayView1<f32>) -> f32 {
        if predictions.is_empty() {
            return 0.0;
        }
        self.sum(predictions, targets) / predictions.len() as f32
    }

    fn gradient(&self, predictions: &ArrayView1<f32>, targets: &ArrayView1<f32>) -> Array1<f32> {
        Zip::from(predictions)
            .and(targets)
            .map_collect(|p, t| self.pointwise_gradient(*p, *t))
    }
}

/// Huber-style loss that is quadratic for residuals below `beta` and linear
/// above it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SmoothL1Loss {
    pub beta: f32,
}

impl Default for SmoothL1Loss {
    fn default() -> Self {
        Self { beta: 1.0 }
    }
}

impl Loss for SmoothL1Loss {
    fn pointwise(&self, prediction: f32, target: f32) -> f32 {
        let d = (prediction - target).abs();
        if d < self.beta {
            0.5 * d * d / self.beta
        } else {
            d - 0.5 * self.beta
        }
    }

    fn pointwise_gradient(&self, prediction: f32, target: f32) -> f32 {
        let d = prediction - target;
        if d.abs() < self.beta {
            d / self.beta
        } else {
            d.signum()
        }
    }
}
