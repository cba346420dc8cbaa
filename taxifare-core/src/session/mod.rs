//! a local stand-in for a distributed dataframe runtime: a fixed pool of
//! executor threads and partitioned Arrow record batches that run one task
//! per partition on that pool.
mod cluster_mode;
mod data_frame;
mod executor_memory;
mod local_session;
mod session_config;
mod session_error;

pub mod batch_ops;

pub use cluster_mode::ClusterMode;
pub use data_frame::DataFrame;
pub use executor_memory::ExecutorMemory;
pub use local_session::Session;
pub use session_config::SessionConfig;
pub use session_error::SessionError;
