use serde::{Deserialize, Serialize};

use super::Evaluation;

/// metrics of a single training epoch. validation metrics are absent when
/// no held-out rows were available.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpochRecord {
    pub epoch: usize,
    pub train_loss: f32,
    pub train_rows: usize,
    pub val_loss: Option<f32>,
    pub val_mae: Option<f32>,
    pub val_rmse: Option<f32>,
}

impl EpochRecord {
    pub fn new(epoch: usize, train_loss: f32, train_rows: usize, val: Option<Evaluation>) -> Self {
        Self {
            epoch,
            train_loss,
            train_rows,
            val_loss: val.map(|v| v.loss),
            val_mae: val.map(|v| v.mae),
            val_rmse: val.map(|v| v.rmse),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn push(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EpochRecord> {
        self.epochs.iter()
    }
}
