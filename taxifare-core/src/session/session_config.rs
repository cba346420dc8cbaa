use serde::{Deserialize, Serialize};

use super::{ClusterMode, ExecutorMemory, SessionError};

/// describes how the executor pool backing a [`super::Session`] is laid out
/// and how input files are partitioned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// `local`, `local[N]` or `local[*]`
    pub cluster_mode: String,
    pub num_executors: usize,
    pub executor_cores: usize,
    /// size string such as `10g`
    pub executor_memory: String,
    /// rows per partition when reading delimited files
    pub partition_rows: usize,
    /// rows sampled for column type inference. all rows when None.
    pub schema_inference_rows: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cluster_mode: String::from("local"),
            num_executors: 2,
            executor_cores: 4,
            executor_memory: String::from("10g"),
            partition_rows: 65_536,
            schema_inference_rows: None,
        }
    }
}

impl SessionConfig {
    /// checks the layout and returns the parsed cluster mode and executor memory.
    pub fn validate(&self) -> Result<(ClusterMode, ExecutorMemory), SessionError> {
        if self.num_executors == 0 {
            return Err(SessionError::InvalidConfig(String::from(
                "num_executors must be at least 1",
            )));
        }
        if self.executor_cores == 0 {
            return Err(SessionError::InvalidConfig(String::from(
                "executor_cores must be at least 1",
            )));
        }
        if self.num_executors.checked_mul(self.executor_cores).is_none() {
            return Err(SessionError::InvalidConfig(format!(
                "{} executors x {} cores overflows the executor thread count",
                self.num_executors, self.executor_cores
            )));
        }
        if self.partition_rows == 0 {
            return Err(SessionError::InvalidConfig(String::from(
                "partition_rows must be at least 1",
            )));
        }
        if self.schema_inference_rows == Some(0) {
            return Err(SessionError::InvalidConfig(String::from(
                "schema_inference_rows must be at least 1 when provided",
            )));
        }
        let cluster_mode = self.cluster_mode.parse::<ClusterMode>()?;
        let executor_memory = self.executor_memory.parse::<ExecutorMemory>()?;
        Ok((cluster_mode, executor_memory))
    }
}
