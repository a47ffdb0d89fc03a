pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod prelude;
pub mod services;
pub mod utils;

// Re-export types
pub use crate::core::{Dense, EpochListener, EpochReport};
pub use crate::data::Sample;
pub use crate::error::{NNError, Result};
pub use crate::models::{Network, NetworkBuilder};
