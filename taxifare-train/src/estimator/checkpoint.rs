use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{model::FareRegressor, TrainError};

/// a trained model along with the column layout it expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub feature_columns: Vec<String>,
    pub label_column: String,
    pub epochs_trained: usize,
    pub model: FareRegressor,
}

impl Checkpoint {
    pub fn write(&self, path: &Path) -> Result<(), TrainError> {
        let file = File::create(path).map_err(|e| checkpoint_error(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| checkpoint_error(path, e))?;
        writer.flush().map_err(|e| checkpoint_error(path, e))?;
        log::info!("wrote checkpoint to {}", path.display());
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Checkpoint, TrainError> {
        let file = File::open(path).map_err(|e| checkpoint_error(path, e))?;
        let checkpoint: Checkpoint = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| checkpoint_error(path, e))?;
        if checkpoint.feature_columns.len() != checkpoint.model.n_features() {
            return Err(TrainError::Checkpoint {
                path: path.to_owned(),
                message: format!(
                    "checkpoint lists {} feature columns but the model expects {}",
                    checkpoint.feature_columns.len(),
                    checkpoint.model.n_features()
                ),
            });
        }
        Ok(checkpoint)
    }
}

fn checkpoint_error(path: &Path, e: impl std::fmt::Display) -> TrainError {
    TrainError::Checkpoint {
        path: path.to_owned(),
        message: e.to_string(),
    }
}
