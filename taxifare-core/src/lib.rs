pub mod features;
pub mod session;
pub mod split;
