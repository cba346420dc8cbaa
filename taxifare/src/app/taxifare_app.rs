use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use super::{run_pipeline, write_features, AppError, RunOutputs};
use crate::config::AppConfig;

pub const DEFAULT_DATA_FILE: &str = "data/nyc_taxi_fare/train.csv";

/// NYC taxi fare feature engineering and data-parallel regression training
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct TaxiFareApp {
    #[command(subcommand)]
    pub op: TaxiFareOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum TaxiFareOperation {
    /// engineer features, split, and train the fare regressor
    Run {
        /// delimited trip records with a header row
        #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
        data: String,

        /// TOML file overriding keys of the default configuration
        #[arg(short, long)]
        config: Option<String>,

        /// write per-epoch training metrics to this CSV file
        #[arg(long)]
        history_file: Option<String>,

        /// write the trained model and its feature layout to this JSON file
        #[arg(long)]
        checkpoint: Option<String>,
    },
    /// engineer features only and write the resulting columns as CSV
    Features {
        /// delimited trip records with a header row
        #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
        data: String,

        /// TOML file overriding keys of the default configuration
        #[arg(short, long)]
        config: Option<String>,

        /// destination of the engineered records
        #[arg(short, long)]
        output: String,
    },
}

impl TaxiFareOperation {
    pub fn run(&self) -> Result<(), AppError> {
        log::info!("starting taxifare at {}", chrono::Local::now().to_rfc3339());
        match self {
            TaxiFareOperation::Run {
                data,
                config,
                history_file,
                checkpoint,
            } => {
                let app_config = load_config(config.as_deref())?;
                let outputs = RunOutputs {
                    history_file: history_file.as_ref().map(PathBuf::from),
                    checkpoint: checkpoint.as_ref().map(PathBuf::from),
                };
                let history = run_pipeline(Path::new(data), &app_config, &outputs)?;
                if let Some(last) = history.last() {
                    let summary = serde_json::to_string(last).unwrap_or_default();
                    log::info!("final epoch: {summary}");
                }
                Ok(())
            }
            TaxiFareOperation::Features {
                data,
                config,
                output,
            } => {
                let app_config = load_config(config.as_deref())?;
                write_features(Path::new(data), &app_config, Path::new(output))
            }
        }
    }
}

fn load_config(user_file: Option<&str>) -> Result<AppConfig, AppError> {
    let config = AppConfig::load(user_file.map(Path::new))?;
    log::info!("resolved configuration:\n{}", config.to_toml()?);
    Ok(config)
}
