use std::path::Path;

use taxifare_train::estimator::TrainingHistory;

use super::AppError;

/// writes one CSV row per epoch. missing validation metrics are left empty.
pub fn write_history(history: &TrainingHistory, path: &Path) -> Result<(), AppError> {
    let write_error = |message: String| AppError::WriteError {
        path: path.to_owned(),
        message,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| write_error(format!("failure opening file: {e}")))?;
    for record in history.iter() {
        writer
            .serialize(record)
            .map_err(|e| write_error(format!("failure writing epoch {}: {e}", record.epoch)))?;
    }
    writer
        .flush()
        .map_err(|e| write_error(format!("failure flushing file: {e}")))?;
    log::info!("wrote {} epochs of training history to {}", history.len(), path.display());
    Ok(())
}
