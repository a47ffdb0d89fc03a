// src/core.rs
pub mod activations;
pub mod layers;
pub mod losses;
pub mod optimizers;
pub mod progress;

// Re-export commonly used items
pub use activations::{sigmoid, sigmoid_prime};
pub use layers::Dense;
pub use optimizers::{apply_optimization, Optimization, DEFAULT_LEARNING_RATE};
pub use progress::{EpochListener, EpochReport, History, LogListener};
