use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, RecordBatch};

use super::{columns, FeatureError, Landmark};
use crate::session::{batch_ops, DataFrame, SessionError};

/// appends the absolute pickup-to-dropoff coordinate deltas, their sum and
/// the Manhattan distance from each endpoint to the default landmarks.
pub fn add_distance_features(df: &DataFrame) -> Result<DataFrame, FeatureError> {
    add_distance_features_with(df, &Landmark::nyc_defaults())
}

pub fn add_distance_features_with(
    df: &DataFrame,
    landmarks: &[Landmark],
) -> Result<DataFrame, FeatureError> {
    let result = df.with_columns(|batch| distance_feature_columns(batch, landmarks))?;
    Ok(result)
}

/// computes the distance feature columns for one partition. a null coordinate
/// yields a null distance.
pub fn distance_feature_columns(
    batch: &RecordBatch,
    landmarks: &[Landmark],
) -> Result<Vec<(String, ArrayRef)>, SessionError> {
    let pickup_lon = batch_ops::float_column(batch, columns::PICKUP_LONGITUDE)?;
    let pickup_lat = batch_ops::float_column(batch, columns::PICKUP_LATITUDE)?;
    let dropoff_lon = batch_ops::float_column(batch, columns::DROPOFF_LONGITUDE)?;
    let dropoff_lat = batch_ops::float_column(batch, columns::DROPOFF_LATITUDE)?;

    let abs_diff_lon = abs_diff(&pickup_lon, &dropoff_lon);
    let abs_diff_lat = abs_diff(&pickup_lat, &dropoff_lat);
    let manhattan = abs_diff_lon
        .iter()
        .zip(abs_diff_lat.iter())
        .map(|(lon, lat)| Some(lon? + lat?))
        .collect::<Float64Array>();

    let mut result: Vec<(String, ArrayRef)> = vec![
        (columns::ABS_DIFF_LONGITUDE.to_string(), Arc::new(abs_diff_lon) as ArrayRef),
        (columns::ABS_DIFF_LATITUDE.to_string(), Arc::new(abs_diff_lat) as ArrayRef),
        (columns::MANHATTAN.to_string(), Arc::new(manhattan) as ArrayRef),
    ];
    for landmark in landmarks.iter() {
        let endpoints = [
            ("pickup", &pickup_lon, &pickup_lat),
            ("dropoff", &dropoff_lon, &dropoff_lat),
        ];
        for (endpoint, lon, lat) in endpoints {
            let distance = lon
                .iter()
                .zip(lat.iter())
                .map(|(lon, lat)| Some(landmark.manhattan_distance(lon?, lat?)))
                .collect::<Float64Array>();
            let name = columns::landmark_distance_column(endpoint, &landmark.name);
            result.push((name, Arc::new(distance) as ArrayRef));
        }
    }
    Ok(result)
}

fn abs_diff(from: &Float64Array, to: &Float64Array) -> Float64Array {
    from.iter()
        .zip(to.iter())
        .map(|(a, b)| Some((b? - a?).abs()))
        .collect()
}
