use std::collections::HashMap;

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};
use serde::{Deserialize, Serialize};

use super::Optimizer;
use crate::TrainError;

/// Adam without weight decay.
///
/// ```text
/// m_t = β1 m_{t-1} + (1 - β1) g_t
/// v_t = β2 v_{t-1} + (1 - β2) g_t²
/// θ_t = θ_{t-1} - lr · (m_t / (1 - β1^t)) / (√(v_t / (1 - β2^t)) + ε)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// first and second moment per parameter position
    state: HashMap<usize, (ArrayD<f32>, ArrayD<f32>)>,
    steps: u64,
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            state: HashMap::new(),
            steps: 0,
        }
    }

    pub fn with_betas(mut self, beta1: f32, beta2: f32) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(0.001)
    }
}

impl Optimizer for Adam {
    fn step(
        &mut self,
        params: Vec<ArrayViewMutD<'_, f32>>,
        grads: Vec<ArrayViewD<'_, f32>>,
    ) -> Result<(), TrainError> {
        if params.len() != grads.len() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![params.len()],
                found: vec![grads.len()],
            });
        }
        for (idx, (param, grad)) in params.iter().zip(grads.iter()).enumerate() {
            let expected = self.state.get(&idx).map(|(m, _)| m.shape()).unwrap_or(param.shape());
            if param.shape() != grad.shape() || param.shape() != expected {
                return Err(TrainError::ShapeMismatch {
                    expected: param.shape().to_vec(),
                    found: grad.shape().to_vec(),
                });
            }
        }

        self.steps += 1;
        let t = self.steps as i32;
        let (b1, b2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let bias_correction1 = 1.0 - b1.powi(t);
        let bias_correction2 = 1.0 - b2.powi(t);

        for (idx, (mut param, grad)) in params.into_iter().zip(grads).enumerate() {
            let (m, v) = self
                .state
                .entry(idx)
                .or_insert_with(|| (ArrayD::zeros(param.raw_dim()), ArrayD::zeros(param.raw_dim())));
            Zip::from(&mut param)
                .and(&grad)
                .and(m)
                .and(v)
                .for_each(|p, g, m, v| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    let m_hat = *m / bias_correction1;
                    let v_hat = *v / bias_correction2;
                    *p -= lr * m_hat / (v_hat.sqrt() + eps);
                });
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn reset(&mut self) {
        self.state.clear();
        self.steps = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_adam_defaults() {
        let adam = Adam::default();
        assert_eq!(adam.learning_rate, 0.001);
        assert_eq!(adam.beta1, 0.9);
        assert_eq!(adam.beta2, 0.999);
        assert_eq!(adam.epsilon, 1e-8);
    }

    #[test]
    fn test_first_step_moves_against_gradient_by_lr() {
        let mut adam = Adam::new(0.1);
        let mut param = array![1.0_f32, -2.0, 0.5];
        let grad = array![0.1_f32, -3.0, 0.0];
        adam.step(vec![param.view_mut().into_dyn()], vec![grad.view().into_dyn()])
            .unwrap();
        // the first bias-corrected step has magnitude lr for any non-zero gradient
        assert!((param[0] - 0.9).abs() < 1e-5);
        assert!((param[1] - -1.9).abs() < 1e-5);
        assert_eq!(param[2], 0.5);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut adam = Adam::new(0.05);
        let target = array![3.0_f32, -1.0];
        let mut param = Array1::<f32>::zeros(2);
        for _ in 0..500 {
            let grad = (&param - &target) * 2.0;
            adam.step(vec![param.view_mut().into_dyn()], vec![grad.view().into_dyn()])
                .unwrap();
        }
        assert!((param[0] - 3.0).abs() < 0.05);
        assert!((param[1] + 1.0).abs() < 0.05);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let mut adam = Adam::default();
        let mut param = array![1.0_f32, 2.0];
        let grad = array![1.0_f32];
        let result = adam.step(vec![param.view_mut().into_dyn()], vec![grad.view().into_dyn()]);
        assert!(matches!(result, Err(TrainError::ShapeMismatch { .. })));
        assert_eq!(adam.steps(), 0);
    }
}
