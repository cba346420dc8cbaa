use serde::{Deserialize, Serialize};

use crate::TrainError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    /// threads in the worker pool, and the number of shards each mini-batch
    /// is split into
    pub num_workers: usize,
    /// rows per mini-batch, summed over all workers
    pub batch_size: usize,
    pub epochs: usize,
    /// fixes the shuffling order. drawn from entropy when unset.
    pub seed: Option<u64>,
    /// show a progress bar over the mini-batches of each epoch
    pub progress: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            num_workers: 2,
            batch_size: 256,
            epochs: 30,
            seed: None,
            progress: true,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.num_workers == 0 {
            return Err(TrainError::InvalidConfig(String::from(
                "num_workers must be at least 1",
            )));
        }
        if self.batch_size == 0 {
            return Err(TrainError::InvalidConfig(String::from(
                "batch_size must be at least 1",
            )));
        }
        Ok(())
    }
}
