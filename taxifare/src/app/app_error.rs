use std::path::PathBuf;

use taxifare_core::{features::FeatureError, session::SessionError, split::SplitError};
use taxifare_train::TrainError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("session failure: {source}")]
    Session {
        #[from]
        source: SessionError,
    },
    #[error("feature pipeline failure: {source}")]
    Feature {
        #[from]
        source: FeatureError,
    },
    #[error("dataset split failure: {source}")]
    Split {
        #[from]
        source: SplitError,
    },
    #[error("training failure: {source}")]
    Train {
        #[from]
        source: TrainError,
    },
}
