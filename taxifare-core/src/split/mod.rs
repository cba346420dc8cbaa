//! randomized partitioning of a frame into disjoint subsets.
mod random_split;
mod split_error;

pub use random_split::{random_split, train_test_split};
pub use split_error::SplitError;
