use std::path::Path;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use taxifare_core::{features::FeatureConfig, session::SessionConfig};

use super::{TrainingConfig, DEFAULT_CONFIG};
use crate::app::AppError;

/// complete runtime configuration of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
}

impl AppConfig {
    /// loads the embedded defaults, overridden by the keys of `user_file`
    /// when given, and validates the result.
    pub fn load(user_file: Option<&Path>) -> Result<AppConfig, AppError> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(path) = user_file {
            builder = builder.add_source(File::from(path));
        }
        let source = user_file
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| String::from("<default>"));
        let config = builder.build().map_err(|e| {
            AppError::InvalidConfig(format!("file '{source}' produced error: {e}"))
        })?;
        let app_config = config.try_deserialize::<AppConfig>().map_err(|e| {
            AppError::InvalidConfig(format!("error reading configuration '{source}': {e}"))
        })?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.session.validate()?;
        self.features.validate()?;
        self.training.validate()?;
        Ok(())
    }

    /// the configuration rendered as TOML, for logging
    pub fn to_toml(&self) -> Result<String, AppError> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::InvalidConfig(format!("failure rendering configuration: {e}")))
    }
}

#[cfg(test)]
mod test {
    use std::{fs, path::PathBuf};

    use taxifare_core::features::LateNightRule;

    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{name}", std::process::id()));
        fs::write(&path, contents).expect("test invariant failed: cannot write temp file");
        path
    }

    #[test]
    fn test_embedded_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session.cluster_mode, "local");
        assert_eq!(config.session.num_executors, 2);
        assert_eq!(config.session.executor_cores, 4);
        assert_eq!(config.session.executor_memory, "10g");
        assert_eq!(config.training.num_workers, 2);
        assert_eq!(config.training.batch_size, 256);
        assert_eq!(config.training.epochs, 30);
        assert_eq!(config.training.learning_rate, 0.001);
        assert_eq!(config.features.landmarks.len(), 4);
        assert_eq!(config.features.time.late_night_rule, LateNightRule::AsRecorded);
    }

    #[test]
    fn test_user_file_overrides_keys() {
        let path = temp_file(
            "override.toml",
            r#"
[session]
cluster_mode = "local[3]"

[features.time]
late_night_rule = "wrapped"

[training]
epochs = 4
seed = 99
"#,
        );
        let config = AppConfig::load(Some(&path)).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.session.cluster_mode, "local[3]");
        assert_eq!(config.session.num_executors, 2);
        assert_eq!(config.features.time.late_night_rule, LateNightRule::Wrapped);
        assert_eq!(config.training.epochs, 4);
        assert_eq!(config.training.seed, Some(99));
        assert_eq!(config.training.batch_size, 256);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let path = temp_file("yarn.toml", "[session]\ncluster_mode = \"yarn\"\n");
        let result = AppConfig::load(Some(&path));
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());

        let path = temp_file("fraction.toml", "[training]\ntrain_fraction = 1.5\n");
        let result = AppConfig::load(Some(&path));
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_renders_as_toml() {
        let rendered = AppConfig::default().to_toml().unwrap();
        assert!(rendered.contains("cluster_mode = \"local\""));
        assert!(rendered.contains("[training]"));
    }
}
