//! Architecture configuration structures
//!
//! This module provides configuration structures for defining layer chains via
//! JSON configuration files. This enables architecture experimentation without
//! code changes. Layer shapes are never written out: each layer's input shape
//! is the output shape of the layer before it, starting from `input_shape`.

use crate::error::{NetworkError, Result};
use crate::layers::BatchNormConfig;
use crate::model::Model;
use crate::network::Network;
use crate::utils::rng::seed_from_time;
use crate::utils::{Activation, Regularizer};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Configuration for a single layer in the chain.
///
/// Defines the layer type and its parameters. Different layer types require different fields:
///
/// - **Dense**: Requires `units`; optional `activation` (default linear),
///   `regularizer` ("none", "l1" or "l2") and `lambda`
/// - **BatchNorm**: Optional `momentum` (default 0.999), `epsilon` (default 1e-8),
///   `channelled` (default false), `affine` (default true) and `activation`
/// - **Dropout**: Requires `drop_rate` (probability of dropping units, range [0.0, 1.0))
/// - **Flatten**: No parameters
///
/// # Examples
///
/// ```json
/// {
///   "layer_type": "dense",
///   "units": 8,
///   "activation": "tanh",
///   "regularizer": "l2",
///   "lambda": 0.001
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    /// Type of layer: "dense", "batchnorm", "dropout" or "flatten"
    pub layer_type: String,

    // Dense layer parameters
    pub units: Option<usize>,
    pub activation: Option<Activation>,
    pub regularizer: Option<String>,
    pub lambda: Option<f64>,

    // BatchNorm layer parameters
    pub momentum: Option<f64>,
    pub epsilon: Option<f64>,
    pub channelled: Option<bool>,
    pub affine: Option<bool>,

    // Dropout layer parameters
    /// Drop rate for Dropout layer (probability of dropping units)
    pub drop_rate: Option<f64>,
}

/// Configuration for the entire chain.
///
/// Layers are appended in the order they appear in the configuration.
///
/// # Example
///
/// ```json
/// {
///   "input_shape": [2],
///   "seed": 42,
///   "layers": [
///     { "layer_type": "dense", "units": 8, "activation": "tanh" },
///     { "layer_type": "dense", "units": 1, "activation": "sigmoid" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    /// Shape of one input sample
    pub input_shape: Vec<usize>,

    /// Seed for weight initialization and dropout masks; drawn from the clock when absent
    pub seed: Option<u64>,

    /// Sequence of layer configurations defining the chain
    pub layers: Vec<LayerConfig>,
}

/// Loads an architecture configuration from a JSON file.
///
/// Reads the file at `path`, deserializes its JSON contents into an
/// `ArchitectureConfig` and validates every layer entry.
///
/// # Examples
///
/// ```no_run
/// use neural_chain::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/xor_mlp.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

/// Validates an architecture configuration.
///
/// Checks that the input shape is usable, that there is at least one layer and
/// that each layer has the fields its type requires.
pub fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    if config.input_shape.is_empty() || config.input_shape.contains(&0) {
        return Err(NetworkError::config(format!(
            "input_shape {:?} must be non-empty with positive dimensions",
            config.input_shape
        )));
    }

    if config.layers.is_empty() {
        return Err(NetworkError::config(
            "Architecture must have at least one layer",
        ));
    }

    for (i, layer) in config.layers.iter().enumerate() {
        validate_layer(layer, i)?;
    }
    Ok(())
}

/// Validates a single layer configuration.
fn validate_layer(layer: &LayerConfig, index: usize) -> Result<()> {
    match layer.layer_type.to_lowercase().as_str() {
        "dense" => {
            match layer.units {
                None => {
                    return Err(NetworkError::config(format!(
                        "Layer {}: Dense layer requires 'units'",
                        index
                    )))
                }
                Some(0) => {
                    return Err(NetworkError::config(format!(
                        "Layer {}: Dense layer 'units' must be positive",
                        index
                    )))
                }
                Some(_) => {}
            }
            regularizer(layer, index)?;
        }
        "batchnorm" => {
            batch_norm_config(layer).validate().map_err(|e| {
                NetworkError::config(format!("Layer {}: {}", index, e))
            })?;
        }
        "dropout" => match layer.drop_rate {
            None => {
                return Err(NetworkError::config(format!(
                    "Layer {}: Dropout layer requires 'drop_rate'",
                    index
                )))
            }
            Some(p) if !(0.0..1.0).contains(&p) => {
                return Err(NetworkError::config(format!(
                    "Layer {}: drop_rate must be in range [0.0, 1.0), got {}",
                    index, p
                )))
            }
            Some(_) => {}
        },
        "flatten" => {}
        other => {
            return Err(NetworkError::config(format!(
                "Layer {}: Unknown layer type: {}",
                index, other
            )))
        }
    }
    Ok(())
}

fn regularizer(layer: &LayerConfig, index: usize) -> Result<Regularizer> {
    let lambda = layer.lambda.unwrap_or(0.0);
    match layer.regularizer.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("none") => Ok(Regularizer::None),
        Some("l1") => Regularizer::l1(lambda),
        Some("l2") => Regularizer::l2(lambda),
        Some(other) => Err(NetworkError::config(format!(
            "Layer {}: Invalid regularizer '{}'. Must be one of: none, l1, l2",
            index, other
        ))),
    }
}

fn batch_norm_config(layer: &LayerConfig) -> BatchNormConfig {
    let defaults = BatchNormConfig::default();
    BatchNormConfig {
        momentum: layer.momentum.unwrap_or(defaults.momentum),
        epsilon: layer.epsilon.unwrap_or(defaults.epsilon),
        channelled: layer.channelled.unwrap_or(defaults.channelled),
        affine: layer.affine.unwrap_or(defaults.affine),
        activation: layer.activation.unwrap_or(defaults.activation),
    }
}

/// Builds a model from an architecture configuration.
///
/// Creates an input layer of `input_shape` followed by each configured layer
/// in order, initializing parameters from `seed`.
///
/// # Errors
///
/// Returns an error if a layer configuration is invalid or if layer construction fails.
///
/// # Examples
///
/// ```no_run
/// use neural_chain::architecture::{build_model, load_architecture};
///
/// let config = load_architecture("config/architectures/xor_mlp.json").unwrap();
/// let model = build_model(&config).unwrap();
/// assert_eq!(model.output_shape().unwrap().dims(), &[1]);
/// ```
pub fn build_model(config: &ArchitectureConfig) -> Result<Model> {
    validate_architecture(config)?;

    let mut network = Network::new(config.seed.unwrap_or_else(seed_from_time));
    let input = network.input(&config.input_shape)?;
    let mut last = input;

    for (i, layer) in config.layers.iter().enumerate() {
        let activation = layer.activation.unwrap_or_default();
        last = match layer.layer_type.to_lowercase().as_str() {
            "dense" => {
                let units = layer.units.unwrap_or_default();
                network.dense_with(last, units, activation, regularizer(layer, i)?)?
            }
            "batchnorm" => network.batch_norm(last, batch_norm_config(layer))?,
            "dropout" => network.dropout(last, layer.drop_rate.unwrap_or_default())?,
            "flatten" => network.flatten(last)?,
            other => {
                return Err(NetworkError::config(format!(
                    "Layer {}: Unknown layer type: {}",
                    i, other
                )))
            }
        };
    }

    let model = Model::new(network, input, last)?;
    info!(
        layers = config.layers.len() + 1,
        parameters = model.parameter_count()?,
        "built model from architecture"
    );
    Ok(model)
}
