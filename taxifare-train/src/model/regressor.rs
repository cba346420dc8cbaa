use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewD, ArrayViewMutD, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    relu, relu_backward, BatchNorm1d, BatchStats, Linear, LinearGrads, NormCache, NormGrads,
};
use crate::TrainError;

/// widths of the hidden blocks between the input features and the output.
pub const HIDDEN_SIZES: [usize; 4] = [256, 128, 64, 16];

/// a hidden block: Linear → ReLU → BatchNorm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HiddenBlock {
    pub linear: Linear,
    pub norm: BatchNorm1d,
}

/// feed-forward fare regressor. a stack of [`HiddenBlock`]s followed by a
/// linear head with a single output, squeezed to one prediction per row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareRegressor {
    blocks: Vec<HiddenBlock>,
    head: Linear,
}

/// values recorded by a training forward pass of one block.
#[derive(Debug, Clone)]
pub struct BlockTrace {
    pub input: Array2<f32>,
    pub pre_activation: Array2<f32>,
    pub norm_cache: NormCache,
}

/// output of a training forward pass along with everything the backward
/// pass and the running statistics update need.
#[derive(Debug, Clone)]
pub struct ForwardTrace {
    pub output: Array1<f32>,
    pub blocks: Vec<BlockTrace>,
    pub head_input: Array2<f32>,
    pub norm_stats: Vec<BatchStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockGrads {
    pub linear: LinearGrads,
    pub norm: NormGrads,
}

/// gradients for every trainable parameter of a [`FareRegressor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegressorGrads {
    pub blocks: Vec<BlockGrads>,
    pub head: LinearGrads,
}

impl FareRegressor {
    /// builds the regressor with the default hidden widths.
    pub fn new(n_features: usize, rng: &mut StdRng) -> Result<Self, TrainError> {
        FareRegressor::with_hidden_sizes(n_features, &HIDDEN_SIZES, rng)
    }

    pub fn with_hidden_sizes(
        n_features: usize,
        hidden_sizes: &[usize],
        rng: &mut StdRng,
    ) -> Result<Self, TrainError> {
        if n_features == 0 {
            return Err(TrainError::InvalidConfig(String::from(
                "regressor needs at least one input feature",
            )));
        }
        if hidden_sizes.contains(&0) {
            return Err(TrainError::InvalidConfig(format!(
                "hidden layer widths must be positive, found {hidden_sizes:?}"
            )));
        }
        let widths = std::iter::once(n_features)
            .chain(hidden_sizes.iter().copied())
            .collect_vec();
        let blocks = widths
            .iter()
            .tuple_windows()
            .map(|(inp, out)| HiddenBlock {
                linear: Linear::new(*inp, *out, rng),
                norm: BatchNorm1d::new(*out),
            })
            .collect_vec();
        let last = widths.last().copied().unwrap_or(n_features);
        let head = Linear::new(last, 1, rng);
        Ok(Self { blocks, head })
    }

    pub fn n_features(&self) -> usize {
        self.blocks
            .first()
            .map(|b| b.linear.in_features())
            .unwrap_or_else(|| self.head.in_features())
    }

    pub fn blocks(&self) -> &[HiddenBlock] {
        &self.blocks
    }

    pub fn head(&self) -> &Linear {
        &self.head
    }

    pub fn num_parameters(&self) -> usize {
        self.parameter_views().iter().map(|p| p.len()).sum()
    }

    fn check_input(&self, x: &ArrayView2<f32>) -> Result<(), TrainError> {
        if x.ncols() != self.n_features() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![x.nrows(), self.n_features()],
                found: vec![x.nrows(), x.ncols()],
            });
        }
        Ok(())
    }

    /// inference with the running normalization statistics. returns one
    /// prediction per input row.
    pub fn predict(&self, x: &ArrayView2<f32>) -> Result<Array1<f32>, TrainError> {
        self.check_input(x)?;
        let mut h = x.to_owned();
        for block in self.blocks.iter() {
            let pre = block.linear.forward(&h.view());
            h = block.norm.forward_eval(&relu(&pre.view()).view());
        }
        let out = self.head.forward(&h.view());
        Ok(out.index_axis_move(Axis(1), 0))
    }

    /// training-mode forward pass using batch statistics.
    pub fn forward_train(&self, x: &ArrayView2<f32>) -> Result<ForwardTrace, TrainError> {
        self.check_input(x)?;
        let mut h = x.to_owned();
        let mut traces = Vec::with_capacity(self.blocks.len());
        let mut norm_stats = Vec::with_capacity(self.blocks.len());
        for block in self.blocks.iter() {
            let pre = block.linear.forward(&h.view());
            let (normed, cache, stats) = block.norm.forward_train(&relu(&pre.view()).view())?;
            traces.push(BlockTrace {
                input: h,
                pre_activation: pre,
                norm_cache: cache,
            });
            norm_stats.push(stats);
            h = normed;
        }
        let out = self.head.forward(&h.view());
        Ok(ForwardTrace {
            output: out.index_axis_move(Axis(1), 0),
            blocks: traces,
            head_input: h,
            norm_stats,
        })
    }

    /// backpropagates the gradient of the loss with respect to the outputs
    /// of a training forward pass.
    pub fn backward(
        &self,
        trace: &ForwardTrace,
        grad_output: &ArrayView1<f32>,
    ) -> Result<RegressorGrads, TrainError> {
        if grad_output.len() != trace.output.len() || trace.blocks.len() != self.blocks.len() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![trace.output.len()],
                found: vec![grad_output.len()],
            });
        }
        let g = grad_output.to_owned().insert_axis(Axis(1));
        let (head, mut grad) = self.head.backward(&trace.head_input.view(), &g.view());
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (block, block_trace) in self.blocks.iter().zip(trace.blocks.iter()).rev() {
            let (norm, d_act) = block.norm.backward(&block_trace.norm_cache, &grad.view());
            let d_pre = relu_backward(&block_trace.pre_activation.view(), &d_act.view());
            let (linear, d_in) = block.linear.backward(&block_trace.input.view(), &d_pre.view());
            blocks.push(BlockGrads { linear, norm });
            grad = d_in;
        }
        blocks.reverse();
        Ok(RegressorGrads { blocks, head })
    }

    /// folds one set of batch statistics per hidden block into the running
    /// estimates.
    pub fn update_norm_stats(&mut self, stats: &[BatchStats]) -> Result<(), TrainError> {
        if stats.len() != self.blocks.len() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![self.blocks.len()],
                found: vec![stats.len()],
            });
        }
        for (block, s) in self.blocks.iter_mut().zip(stats) {
            block.norm.update_running(s)?;
        }
        Ok(())
    }

    /// trainable parameters in a fixed order: per block W, b, γ, β, then the
    /// head W, b. matches [`RegressorGrads::views`].
    pub fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        let mut params = Vec::with_capacity(4 * self.blocks.len() + 2);
        for block in self.blocks.iter_mut() {
            params.push(block.linear.weight.view_mut().into_dyn());
            params.push(block.linear.bias.view_mut().into_dyn());
            params.push(block.norm.gamma.view_mut().into_dyn());
            params.push(block.norm.beta.view_mut().into_dyn());
        }
        params.push(self.head.weight.view_mut().into_dyn());
        params.push(self.head.bias.view_mut().into_dyn());
        params
    }

    fn parameter_views(&self) -> Vec<ArrayViewD<'_, f32>> {
        let mut params = Vec::with_capacity(4 * self.blocks.len() + 2);
        for block in self.blocks.iter() {
            params.push(block.linear.weight.view().into_dyn());
            params.push(block.linear.bias.view().into_dyn());
            params.push(block.norm.gamma.view().into_dyn());
            params.push(block.norm.beta.view().into_dyn());
        }
        params.push(self.head.weight.view().into_dyn());
        params.push(self.head.bias.view().into_dyn());
        params
    }
}

impl RegressorGrads {
    pub fn zeros_like(model: &FareRegressor) -> Self {
        let blocks = model
            .blocks
            .iter()
            .map(|b| BlockGrads {
                linear: LinearGrads::zeros_like(&b.linear),
                norm: NormGrads {
                    gamma: Array1::zeros(b.norm.num_features()),
                    beta: Array1::zeros(b.norm.num_features()),
                },
            })
            .collect_vec();
        Self {
            blocks,
            head: LinearGrads::zeros_like(&model.head),
        }
    }

    /// element-wise sum with gradients computed for the same model.
    pub fn accumulate(&mut self, other: &RegressorGrads) -> Result<(), TrainError> {
        if self.blocks.len() != other.blocks.len() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![self.blocks.len()],
                found: vec![other.blocks.len()],
            });
        }
        for (mine, theirs) in self.blocks.iter_mut().zip(other.blocks.iter()) {
            mine.linear.accumulate(&theirs.linear);
            mine.norm.gamma += &theirs.norm.gamma;
            mine.norm.beta += &theirs.norm.beta;
        }
        self.head.accumulate(&other.head);
        Ok(())
    }

    /// gradient views in the order of [`FareRegressor::parameters_mut`].
    pub fn views(&self) -> Vec<ArrayViewD<'_, f32>> {
        let mut grads = Vec::with_capacity(4 * self.blocks.len() + 2);
        for block in self.blocks.iter() {
            grads.push(block.linear.weight.view().into_dyn());
            grads.push(block.linear.bias.view().into_dyn());
            grads.push(block.norm.gamma.view().into_dyn());
            grads.push(block.norm.beta.view().into_dyn());
        }
        grads.push(self.head.weight.view().into_dyn());
        grads.push(self.head.bias.view().into_dyn());
        grads
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loss::{Loss, SmoothL1Loss};

    fn inputs(n: usize, f: usize, seed: u64) -> Array2<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_simple_fn((n, f), || rng.random_range(-2.0..2.0))
    }

    #[test]
    fn test_predict_returns_one_value_per_row() {
        let mut rng = StdRng::seed_from_u64(1);
        let model = FareRegressor::new(17, &mut rng).unwrap();
        assert_eq!(model.n_features(), 17);
        assert_eq!(model.blocks().len(), 4);
        let x = inputs(33, 17, 2);
        assert_eq!(model.predict(&x.view()).unwrap().len(), 33);
        assert_eq!(model.forward_train(&x.view()).unwrap().output.len(), 33);
        // 17*256+256 + 2*256 + 256*128+128 + 2*128 + 128*64+64 + 2*64 + 64*16+16 + 2*16 + 16+1
        assert_eq!(model.num_parameters(), 47_745);
    }

    #[test]
    fn test_feature_count_mismatch_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let model = FareRegressor::new(17, &mut rng).unwrap();
        let x = inputs(4, 16, 2);
        assert!(matches!(
            model.predict(&x.view()),
            Err(TrainError::ShapeMismatch { .. })
        ));
        assert!(model.forward_train(&x.view()).is_err());
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(5);
        let model = FareRegressor::with_hidden_sizes(3, &[6, 4], &mut rng).unwrap();
        let x = inputs(16, 3, 9);
        let y = Array1::from_shape_fn(16, |i| (i as f32 * 0.7).sin() * 3.0);
        let loss = SmoothL1Loss::default();
        let loss_at = |m: &FareRegressor| {
            let trace = m.forward_train(&x.view()).unwrap();
            loss.sum(&trace.output.view(), &y.view()) as f64
        };
        let trace = model.forward_train(&x.view()).unwrap();
        let g = loss.gradient(&trace.output.view(), &y.view());
        let grads = model.backward(&trace, &g.view()).unwrap();
        let analytic = grads
            .views()
            .iter()
            .map(|v| v.iter().copied().collect_vec())
            .collect_vec();

        // relu and smooth l1 kinks can make an individual central difference
        // unreliable, so a small share of disagreements is tolerated
        let h = 1e-2_f32;
        let mut checks = 0;
        let mut mismatches = vec![];
        for (p, values) in analytic.iter().enumerate() {
            for k in [0, values.len() / 2, values.len() - 1] {
                let mut plus = model.clone();
                if let Some(v) = plus.parameters_mut()[p].iter_mut().nth(k) {
                    *v += h;
                }
                let mut minus = model.clone();
                if let Some(v) = minus.parameters_mut()[p].iter_mut().nth(k) {
                    *v -= h;
                }
                let numeric = (loss_at(&plus) - loss_at(&minus)) / (2.0 * h as f64);
                let a = values[k] as f64;
                checks += 1;
                if (numeric - a).abs() > 2e-2 + 5e-2 * a.abs() {
                    mismatches.push(format!("parameter {p}[{k}]: numeric {numeric}, analytic {a}"));
                }
            }
        }
        assert!(
            mismatches.len() * 10 <= checks,
            "{} of {checks} gradient checks failed: {mismatches:?}",
            mismatches.len()
        );
    }

    #[test]
    fn test_accumulate_sums_gradients() {
        let mut rng = StdRng::seed_from_u64(3);
        let model = FareRegressor::with_hidden_sizes(2, &[3], &mut rng).unwrap();
        let x = inputs(4, 2, 4);
        let trace = model.forward_train(&x.view()).unwrap();
        let g = Array1::from_elem(4, 1.0_f32);
        let grads = model.backward(&trace, &g.view()).unwrap();
        let mut total = RegressorGrads::zeros_like(&model);
        total.accumulate(&grads).unwrap();
        total.accumulate(&grads).unwrap();
        for (sum, one) in total.views().iter().zip(grads.views().iter()) {
            for (s, o) in sum.iter().zip(one.iter()) {
                assert!((s - 2.0 * o).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let mut rng = StdRng::seed_from_u64(8);
        let model = FareRegressor::with_hidden_sizes(3, &[4], &mut rng).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: FareRegressor = serde_json::from_str(&json).unwrap();
        let x = inputs(5, 3, 1);
        let before = model.predict(&x.view()).unwrap();
        let after = restored.predict(&x.view()).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
