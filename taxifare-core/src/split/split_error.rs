use crate::session::SessionError;

#[derive(thiserror::Error, Debug)]
pub enum SplitError {
    #[error("invalid split weights {weights:?}: {message}")]
    InvalidWeights { weights: Vec<f64>, message: String },
    #[error(transparent)]
    Session {
        #[from]
        source: SessionError,
    },
}
