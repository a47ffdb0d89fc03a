pub use serde::{Serialize, Deserialize};

pub use ndarray::*;
pub use ndarray_rand::RandomExt;

pub use crate::models::{Network, NetworkBuilder};
pub use crate::data::Sample;
pub use crate::error::*;
pub use crate::config::{JudgeConfig, TrainConfig};

// Internal re-exports
pub use crate::core::{
    Dense,
    Optimization,
    EpochListener,
    EpochReport,
    History,
    LogListener,
    DEFAULT_LEARNING_RATE,
};
