//! synchronous data-parallel training of the fare regressor.
mod checkpoint;
mod estimator_config;
mod evaluation;
mod shard;
mod trainer;
mod training_history;

pub use checkpoint::Checkpoint;
pub use estimator_config::EstimatorConfig;
pub use evaluation::Evaluation;
pub use shard::shard_ranges;
pub use trainer::Estimator;
pub use training_history::{EpochRecord, TrainingHistory};
