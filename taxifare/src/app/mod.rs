mod app_error;
mod features;
mod history;
mod run;
mod taxifare_app;

pub use app_error::AppError;
pub use features::write_features;
pub use history::write_history;
pub use run::{run_pipeline, RunOutputs};
pub use taxifare_app::{TaxiFareApp, TaxiFareOperation};
