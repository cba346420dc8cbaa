use std::path::{Path, PathBuf};

use rand::prelude::*;
use taxifare_core::{
    features::{columns, feature_columns, FeaturePipeline},
    session::Session,
    split::train_test_split,
};
use taxifare_train::{
    estimator::{Estimator, TrainingHistory},
    loss::SmoothL1Loss,
    model::FareRegressor,
    optim::Adam,
};

use super::{write_history, AppError};
use crate::config::AppConfig;

/// optional artifacts of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunOutputs {
    pub history_file: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
}

/// reads the trip records, engineers features, splits them and trains the
/// fare regressor. the worker pool and the session are released whether or
/// not training succeeds.
pub fn run_pipeline(
    data: &Path,
    config: &AppConfig,
    outputs: &RunOutputs,
) -> Result<TrainingHistory, AppError> {
    let session = Session::start(config.session.clone())?;
    let trained = train_in_session(&session, data, config, outputs);
    session.stop();
    let history = trained?;

    if let Some(path) = &outputs.history_file {
        write_history(&history, path)?;
    }
    Ok(history)
}

fn train_in_session(
    session: &Session,
    data: &Path,
    config: &AppConfig,
    outputs: &RunOutputs,
) -> Result<TrainingHistory, AppError> {
    let raw = session.read_csv(data)?;
    let pipeline = FeaturePipeline::new(config.features.clone())?;
    let engineered = pipeline.run(&raw)?;
    let training = &config.training;
    let (train, test) = train_test_split(&engineered, training.train_fraction, training.seed)?;
    let feature_cols = feature_columns(&train, columns::FARE_AMOUNT);
    log::info!("training with features: {}", feature_cols.join(", "));

    let init_seed = training.seed.unwrap_or_else(|| rand::rng().random::<u64>());
    let mut rng = StdRng::seed_from_u64(init_seed);
    let model = FareRegressor::new(feature_cols.len(), &mut rng)?;
    let mut estimator = Estimator::new(
        model,
        Adam::new(training.learning_rate),
        SmoothL1Loss::default(),
        training.estimator_config(),
    )?;
    let fitted = estimator
        .fit(&train, Some(&test), &feature_cols, columns::FARE_AMOUNT)
        .map_err(AppError::from)
        .and_then(|history| {
            if let Some(path) = &outputs.checkpoint {
                estimator.save_checkpoint(path, &feature_cols, columns::FARE_AMOUNT)?;
            }
            Ok(history)
        });
    estimator.shutdown();
    fitted
}
