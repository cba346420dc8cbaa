use std::path::PathBuf;

use taxifare_core::session::SessionError;

#[derive(thiserror::Error, Debug)]
pub enum TrainError {
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),
    #[error("column '{column}' holds {count} null value(s), which cannot be used for training")]
    NullValue { column: String, count: usize },
    #[error("empty dataset: {0}")]
    EmptyDataset(String),
    #[error(transparent)]
    Frame {
        #[from]
        source: SessionError,
    },
    #[error("failure with checkpoint '{path}': {message}")]
    Checkpoint { path: PathBuf, message: String },
    #[error("failure building worker pool: {0}")]
    WorkerPool(String),
    #[error("{0}")]
    Internal(String),
}
