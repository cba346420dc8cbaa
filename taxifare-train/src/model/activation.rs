use ndarray::{Array2, ArrayView2, Zip};

pub fn relu(x: &ArrayView2<f32>) -> Array2<f32> {
    x.mapv(|v| v.max(0.0))
}

/// gradient of [`relu`] given the pre-activation input. the subgradient at
/// zero is taken as zero.
pub fn relu_backward(pre_activation: &ArrayView2<f32>, grad_out: &ArrayView2<f32>) -> Array2<f32> {
    Zip::from(pre_activation)
        .and(grad_out)
        .map_collect(|x, g| if *x > 0.0 { *g } else { 0.0 })
}
