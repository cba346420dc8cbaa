use std::time::Instant;

use super::{
    add_distance_features_with, add_time_features_with, clean_up_with, drop_col_with,
    FeatureConfig, FeatureError,
};
use crate::session::DataFrame;

/// chains clean-up, time features, distance features and column pruning.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: FeatureConfig,
}

impl FeaturePipeline {
    pub fn new(config: FeatureConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn run(&self, raw: &DataFrame) -> Result<DataFrame, FeatureError> {
        let start = Instant::now();
        let n_raw = raw.num_rows();
        let cleaned = clean_up_with(raw, &self.config.bounds)?;
        let n_clean = cleaned.num_rows();
        log::info!(
            "clean up kept {n_clean} of {n_raw} rows ({} dropped)",
            n_raw - n_clean
        );
        let timed = add_time_features_with(&cleaned, &self.config.time)?;
        let distanced = add_distance_features_with(&timed, &self.config.landmarks)?;
        let engineered = drop_col_with(&distanced, &self.config.drop_columns)?;
        log::info!(
            "feature pipeline produced {} columns in {:?}",
            engineered.columns().len(),
            start.elapsed()
        );
        log::debug!("engineered columns: {:?}", engineered.columns());
        Ok(engineered)
    }
}

/// every column of the frame except the label, in frame order.
pub fn feature_columns(df: &DataFrame, label: &str) -> Vec<String> {
    df.columns().into_iter().filter(|c| c != label).collect()
}
