use serde::{Deserialize, Serialize};
use taxifare_train::estimator::EstimatorConfig;

use crate::app::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    pub num_workers: usize,
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    /// share of the engineered rows used for training, the rest is held out
    pub train_fraction: f64,
    /// fixes the split, weight initialization and shuffling. fresh entropy
    /// is drawn for each when unset.
    pub seed: Option<u64>,
    pub progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_workers: 2,
            batch_size: 256,
            epochs: 30,
            learning_rate: 0.001,
            train_fraction: 0.9,
            seed: None,
            progress: true,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AppError::InvalidConfig(format!(
                "learning_rate must be positive, found {}",
                self.learning_rate
            )));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(AppError::InvalidConfig(format!(
                "train_fraction must be in (0, 1), found {}",
                self.train_fraction
            )));
        }
        self.estimator_config().validate()?;
        Ok(())
    }

    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            num_workers: self.num_workers,
            batch_size: self.batch_size,
            epochs: self.epochs,
            seed: self.seed,
            progress: self.progress,
        }
    }
}
