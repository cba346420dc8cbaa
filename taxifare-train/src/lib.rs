pub mod dataset;
pub mod estimator;
pub mod loss;
pub mod model;
pub mod optim;

mod train_error;

pub use train_error::TrainError;
