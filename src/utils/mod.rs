//! Shared utilities for the layer chain
//!
//! Activation functions, weight regularizers, cost functions and seeded
//! random number generation.

pub mod activations;
pub mod cost;
pub mod regularizers;
pub mod rng;

pub use activations::Activation;
pub use cost::{Cost, MeanSquare};
pub use regularizers::Regularizer;
