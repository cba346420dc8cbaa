use std::path::Path;

use taxifare_core::{features::FeaturePipeline, session::Session};

use super::AppError;
use crate::config::AppConfig;

/// runs the session bootstrap and feature pipeline only, writing the
/// engineered frame to `output`. the session is stopped on failure too.
pub fn write_features(data: &Path, config: &AppConfig, output: &Path) -> Result<(), AppError> {
    let session = Session::start(config.session.clone())?;
    let written = engineer_and_write(&session, data, config, output);
    session.stop();
    written
}

fn engineer_and_write(
    session: &Session,
    data: &Path,
    config: &AppConfig,
    output: &Path,
) -> Result<(), AppError> {
    let raw = session.read_csv(data)?;
    let pipeline = FeaturePipeline::new(config.features.clone())?;
    let engineered = pipeline.run(&raw)?;
    engineered.write_csv(output)?;
    log::info!(
        "wrote {} engineered rows with {} columns to {}",
        engineered.num_rows(),
        engineered.columns().len(),
        output.display()
    );
    Ok(())
}
