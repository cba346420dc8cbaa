use arrow::{
    array::{BooleanArray, RecordBatch},
    compute::filter_record_batch,
};
use rand::prelude::*;

use super::SplitError;
use crate::session::{DataFrame, SessionError};

/// partitions the rows of a frame into disjoint subsets with approximately
/// the given proportions. each row lands in exactly one subset. the weights
/// are normalized and must be non-negative with a positive sum.
///
/// with a seed the assignment is deterministic for a given partitioning of
/// the input; without one a fresh seed is drawn.
pub fn random_split(
    df: &DataFrame,
    weights: &[f64],
    seed: Option<u64>,
) -> Result<Vec<DataFrame>, SplitError> {
    let thresholds = cumulative_thresholds(weights)?;
    let master_seed = seed.unwrap_or_else(|| rand::rng().random::<u64>());
    let mut master = StdRng::seed_from_u64(master_seed);
    let partition_seeds = (0..df.num_partitions())
        .map(|_| master.random::<u64>())
        .collect::<Vec<_>>();
    log::debug!(
        "splitting {} rows across {} partitions with weights {weights:?} (seed {master_seed})",
        df.num_rows(),
        df.num_partitions()
    );

    let n_outputs = thresholds.len();
    let result = df.fan_out_partitions(n_outputs, |idx, batch| {
        let seed = partition_seeds.get(idx).copied().ok_or_else(|| {
            SessionError::Internal(format!("no split seed for partition {idx}"))
        })?;
        let mut rng = StdRng::seed_from_u64(seed);
        let buckets = (0..batch.num_rows())
            .map(|_| bucket(&thresholds, rng.random::<f64>()))
            .collect::<Vec<_>>();
        (0..n_outputs)
            .map(|out| -> Result<RecordBatch, SessionError> {
                let mask = buckets.iter().map(|b| *b == out).collect::<BooleanArray>();
                let selected = filter_record_batch(batch, &mask)?;
                Ok(selected)
            })
            .collect::<Result<Vec<_>, _>>()
    })?;
    Ok(result)
}

/// splits a frame into a training and a held-out test subset, where
/// `train_fraction` of the rows go to training in expectation.
pub fn train_test_split(
    df: &DataFrame,
    train_fraction: f64,
    seed: Option<u64>,
) -> Result<(DataFrame, DataFrame), SplitError> {
    if !(0.0..=1.0).contains(&train_fraction) {
        return Err(SplitError::InvalidWeights {
            weights: vec![train_fraction, 1.0 - train_fraction],
            message: String::from("train fraction must be in [0, 1]"),
        });
    }
    let mut splits = random_split(df, &[train_fraction, 1.0 - train_fraction], seed)?;
    let test = splits.pop();
    let train = splits.pop();
    match (train, test) {
        (Some(train), Some(test)) => {
            log::info!(
                "train/test split of {} rows: {} train, {} test",
                df.num_rows(),
                train.num_rows(),
                test.num_rows()
            );
            Ok((train, test))
        }
        _ => Err(SplitError::Session {
            source: SessionError::Internal(String::from("split did not produce two subsets")),
        }),
    }
}

/// upper bounds of each bucket on [0, 1), with the last bound pinned to 1.
fn cumulative_thresholds(weights: &[f64]) -> Result<Vec<f64>, SplitError> {
    let invalid = |message: &str| SplitError::InvalidWeights {
        weights: weights.to_vec(),
        message: message.to_string(),
    };
    if weights.is_empty() {
        return Err(invalid("at least one weight is required"));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(invalid("weights must be finite and non-negative"));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(invalid("weights must have a positive sum"));
    }
    let mut acc = 0.0;
    let mut thresholds = weights
        .iter()
        .map(|w| {
            acc += w / total;
            acc
        })
        .collect::<Vec<_>>();
    if let Some(last) = thresholds.last_mut() {
        *last = 1.0;
    }
    Ok(thresholds)
}

fn bucket(thresholds: &[f64], draw: f64) -> usize {
    thresholds
        .iter()
        .position(|t| draw < *t)
        .unwrap_or(thresholds.len() - 1)
}
