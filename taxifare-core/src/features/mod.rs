//! column transformations turning raw trip records into model features.
mod clean_up;
mod distance_features;
mod drop_col;
mod feature_config;
mod feature_error;
mod landmark;
mod pipeline;
mod time_features;
mod trip_bounds;

pub mod columns;
pub mod datetime_ops;

#[cfg(test)]
mod test_frames;

pub use clean_up::{clean_up, clean_up_mask, clean_up_with};
pub use datetime_ops::LateNightRule;
pub use distance_features::{
    add_distance_features, add_distance_features_with, distance_feature_columns,
};
pub use drop_col::{drop_col, drop_col_with};
pub use feature_config::FeatureConfig;
pub use feature_error::FeatureError;
pub use landmark::Landmark;
pub use pipeline::{feature_columns, FeaturePipeline};
pub use time_features::{
    add_time_features, add_time_features_with, time_feature_columns, TimeFeatureConfig,
};
pub use trip_bounds::{TripBounds, TripEndpoints};
