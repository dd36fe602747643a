//! Configuration structures for training
//!
//! This module provides the training configuration read from JSON: which
//! update strategy to use, its hyperparameters and the minibatch schedule.

use crate::error::{NetworkError, Result};
use crate::optimizers::{Adam, GradientDescent, Momentum, OptimizerKind, RmsProp, Vanilla};
use crate::utils::rng::seed_from_time;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const OPTIMIZERS: [&str; 4] = ["vanilla", "sgd", "rmsprop", "adam"];

/// Configuration for training
///
/// This structure is used to parse training configuration from JSON files.
/// Optimizer hyperparameters are optional and fall back to each optimizer's
/// defaults:
///
/// - **vanilla**: No parameters
/// - **sgd**: Optional `momentum` (default 0.9)
/// - **rmsprop**: Optional `decay` (default 0.9) and `epsilon` (default 1e-8)
/// - **adam**: Optional `beta1` (0.9), `beta2` (0.999) and `epsilon` (1e-8)
///
/// # Example
///
/// ```json
/// {
///   "optimizer": "adam",
///   "batch_size": 4,
///   "learning_rate": 0.1,
///   "epochs": 2000,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Update strategy: "vanilla", "sgd", "rmsprop" or "adam"
    pub optimizer: String,

    pub batch_size: usize,

    pub learning_rate: f64,

    /// Number of calls to `run`
    pub epochs: usize,

    /// Shuffling seed; drawn from the clock when absent
    pub seed: Option<u64>,

    pub momentum: Option<f64>,

    pub decay: Option<f64>,

    pub beta1: Option<f64>,

    pub beta2: Option<f64>,

    pub epsilon: Option<f64>,
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into a `TrainingConfig`.
///
/// # Returns
///
/// `Ok(TrainingConfig)` on success, or an error if the file cannot be read,
/// the JSON is invalid or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use neural_chain::config::load_config;
///
/// let cfg = load_config("config/xor_adam.json").unwrap();
/// assert_eq!(cfg.optimizer, "adam");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !OPTIMIZERS.contains(&self.optimizer.as_str()) {
            return Err(NetworkError::config(format!(
                "Invalid optimizer '{}'. Must be one of: {}",
                self.optimizer,
                OPTIMIZERS.join(", ")
            )));
        }

        if self.batch_size == 0 {
            return Err(NetworkError::config("batch_size must be positive"));
        }

        if !(self.learning_rate > 0.0) {
            return Err(NetworkError::config("learning_rate must be positive"));
        }

        if self.epochs == 0 {
            return Err(NetworkError::config("epochs must be positive"));
        }

        // Range checks for the hyperparameters live in the optimizer constructors.
        self.build_optimizer().map(|_| ())
    }

    /// Builds the configured optimizer.
    pub fn build_optimizer(&self) -> Result<OptimizerKind> {
        let optimizer = match self.optimizer.as_str() {
            "vanilla" => OptimizerKind::Vanilla(Vanilla),
            "sgd" => OptimizerKind::Momentum(Momentum::new(self.momentum.unwrap_or(0.9))?),
            "rmsprop" => OptimizerKind::RmsProp(RmsProp::new(
                self.decay.unwrap_or(0.9),
                self.epsilon.unwrap_or(1e-8),
            )?),
            "adam" => OptimizerKind::Adam(Adam::new(
                self.beta1.unwrap_or(0.9),
                self.beta2.unwrap_or(0.999),
                self.epsilon.unwrap_or(1e-8),
            )?),
            other => {
                return Err(NetworkError::config(format!("Invalid optimizer '{}'", other)));
            }
        };
        Ok(optimizer)
    }

    /// Builds the training driver described by this configuration.
    pub fn build_trainer(&self) -> Result<GradientDescent<OptimizerKind>> {
        let seed = self.seed.unwrap_or_else(seed_from_time);
        GradientDescent::new(
            self.batch_size,
            self.learning_rate,
            self.build_optimizer()?,
            seed,
        )
    }
}
