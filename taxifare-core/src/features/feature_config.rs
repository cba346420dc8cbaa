use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{columns, FeatureError, Landmark, TimeFeatureConfig, TripBounds};

/// configures every stage of the [`super::FeaturePipeline`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub bounds: TripBounds,
    pub time: TimeFeatureConfig,
    pub landmarks: Vec<Landmark>,
    pub drop_columns: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            bounds: TripBounds::default(),
            time: TimeFeatureConfig::default(),
            landmarks: Landmark::nyc_defaults(),
            drop_columns: columns::DEFAULT_DROPPED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), FeatureError> {
        self.bounds.validate()?;
        let duplicates = self
            .landmarks
            .iter()
            .map(|l| l.name.as_str())
            .duplicates()
            .collect_vec();
        if !duplicates.is_empty() {
            return Err(FeatureError::InvalidConfig(format!(
                "landmark names must be unique, found duplicates: {}",
                duplicates.join(", ")
            )));
        }
        if let Some(bad) = self
            .landmarks
            .iter()
            .find(|l| !l.longitude.is_finite() || !l.latitude.is_finite())
        {
            return Err(FeatureError::InvalidConfig(format!(
                "landmark '{}' has non-finite coordinates",
                bad.name
            )));
        }
        if self.drop_columns.iter().any(|c| c == columns::FARE_AMOUNT) {
            return Err(FeatureError::InvalidConfig(format!(
                "the label column '{}' cannot be dropped",
                columns::FARE_AMOUNT
            )));
        }
        Ok(())
    }
}
