use std::path::PathBuf;

use arrow::error::ArrowError;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("unsupported cluster mode '{0}', expected 'local', 'local[N]' or 'local[*]'")]
    UnsupportedClusterMode(String),
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
    #[error("failure building executor pool: {0}")]
    ExecutorPool(String),
    #[error("Error reading from '{path}': {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("column '{0}' not found in dataframe schema")]
    ColumnNotFound(String),
    #[error("column '{column}' has an unexpected type: {message}")]
    ColumnType { column: String, message: String },
    #[error("partitions disagree on schema: {0}")]
    SchemaMismatch(String),
    #[error("arrow failure: {source}")]
    Arrow {
        #[from]
        source: ArrowError,
    },
    #[error("{0}")]
    Internal(String),
}
