//! the fare regressor and the layers it is built from.
mod activation;
mod batch_norm;
mod linear;
mod regressor;

pub use activation::{relu, relu_backward};
pub use batch_norm::{BatchNorm1d, BatchStats, NormCache, NormGrads};
pub use linear::{Linear, LinearGrads};
pub use regressor::{
    BlockGrads, BlockTrace, FareRegressor, ForwardTrace, HiddenBlock, RegressorGrads,
    HIDDEN_SIZES,
};
