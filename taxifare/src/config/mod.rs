mod app_config;
mod training_config;

pub use app_config::AppConfig;
pub use training_config::TrainingConfig;

/// configuration used when no user file is given. a user file overrides any
/// of its keys.
pub const DEFAULT_CONFIG: &str = include_str!("taxifare-default.toml");
