use crate::session::SessionError;

#[derive(thiserror::Error, Debug)]
pub enum FeatureError {
    #[error("invalid feature configuration: {0}")]
    InvalidConfig(String),
    #[error("failure applying feature transformation: {source}")]
    Session {
        #[from]
        source: SessionError,
    },
}
