use std::{fmt::Display, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use super::SessionError;

/// where executors are placed. only in-process execution is available; the
/// thread count either comes from the executor layout, an explicit `local[N]`
/// or every available core with `local[*]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterMode {
    Local,
    LocalThreads(NonZeroUsize),
    LocalAllCores,
}

impl ClusterMode {
    /// number of executor threads for this mode given the configured
    /// executor layout. saturates on overflow; [`super::SessionConfig::validate`]
    /// rejects such layouts.
    pub fn threads(&self, num_executors: usize, executor_cores: usize) -> usize {
        match self {
            ClusterMode::Local => num_executors.saturating_mul(executor_cores),
            ClusterMode::LocalThreads(n) => n.get(),
            ClusterMode::LocalAllCores => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl FromStr for ClusterMode {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        if trimmed == "local" {
            return Ok(ClusterMode::Local);
        }
        let inner = trimmed
            .strip_prefix("local[")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| SessionError::UnsupportedClusterMode(s.to_string()))?;
        if inner == "*" {
            return Ok(ClusterMode::LocalAllCores);
        }
        inner
            .parse::<NonZeroUsize>()
            .map(ClusterMode::LocalThreads)
            .map_err(|_| SessionError::UnsupportedClusterMode(s.to_string()))
    }
}

impl Display for ClusterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterMode::Local => write!(f, "local"),
            ClusterMode::LocalThreads(n) => write!(f, "local[{n}]"),
            ClusterMode::LocalAllCores => write!(f, "local[*]"),
        }
    }
}
