//! first-order optimizers over the parameter list of a model.
mod adam;

pub use adam::Adam;

use ndarray::{ArrayViewD, ArrayViewMutD};

use crate::TrainError;

pub trait Optimizer: Send {
    /// applies one update. `params` and `grads` are matched by position and
    /// must keep the same order and shapes from step to step.
    fn step(
        &mut self,
        params: Vec<ArrayViewMutD<'_, f32>>,
        grads: Vec<ArrayViewD<'_, f32>>,
    ) -> Result<(), TrainError>;

    fn learning_rate(&self) -> f32;

    /// forgets all accumulated state, as if no step had been taken.
    fn reset(&mut self);
}
