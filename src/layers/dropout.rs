//! Dropout layer implementation for regularization
//!
//! This module provides a DropoutLayer that randomly drops (sets to zero) a fraction
//! of input units during training to prevent overfitting. During inference, all units
//! are kept and outputs are passed through unchanged.

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerId};
use crate::optimizers::Optimizer;
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::utils::rng::dropout_mask;
use ndarray::IxDyn;
use rand::rngs::StdRng;
use std::any::Any;

/// Dropout layer for regularization.
///
/// During training, randomly sets a fraction of input units to zero with probability
/// `probability`, and scales the remaining units by 1/(1-probability) to maintain
/// expected values. During inference, passes inputs through unchanged.
///
/// The mask has the shape of a single sample and is shared by every sample of
/// a batch.
///
/// # Fields
///
/// * `shape` - Sample shape (dropout doesn't change dimensions)
/// * `probability` - Probability of dropping each unit
/// * `mask` - Scaled mask drawn by the last training forward pass, `None` after inference
pub struct DropoutLayer {
    shape: Shape,
    probability: f64,
    mask: Option<Tensor>,
    last_output: Tensor,
}

impl DropoutLayer {
    /// Creates a new dropout layer.
    ///
    /// # Arguments
    ///
    /// * `shape` - Sample shape of the predecessor's output
    /// * `probability` - Probability of dropping each unit, in range [0.0, 1.0)
    ///
    /// # Examples
    ///
    /// ```
    /// use neural_chain::layers::DropoutLayer;
    /// use neural_chain::shape::Shape;
    ///
    /// let layer = DropoutLayer::new(Shape::new(&[128]).unwrap(), 0.3).unwrap();
    /// assert_eq!(layer.probability(), 0.3);
    /// assert!(DropoutLayer::new(Shape::new(&[128]).unwrap(), 1.0).is_err());
    /// ```
    pub fn new(shape: Shape, probability: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&probability) {
            return Err(NetworkError::config(format!(
                "dropout probability must be in [0, 1), got {}",
                probability
            )));
        }

        Ok(Self {
            shape,
            probability,
            mask: None,
            last_output: Tensor::zeros(IxDyn(&[0])),
        })
    }

    /// Get the dropout probability.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Mask applied by the most recent training forward pass.
    pub fn mask(&self) -> Option<&Tensor> {
        self.mask.as_ref()
    }
}

impl Layer for DropoutLayer {
    fn kind(&self) -> &'static str {
        "dropout"
    }

    fn input_shape(&self) -> &Shape {
        &self.shape
    }

    fn output_shape(&self) -> &Shape {
        &self.shape
    }

    /// Forward pass through dropout layer.
    ///
    /// In training mode a fresh mask is drawn from `rng` and multiplied into the
    /// input, broadcasting over the batch axis. In inference mode the input is
    /// returned unchanged.
    fn compute(
        &mut self,
        input: Option<&Tensor>,
        training: bool,
        batched: bool,
        rng: &mut StdRng,
    ) -> Result<Tensor> {
        let input = input.ok_or(NetworkError::MissingInput)?;
        self.shape.check(input, batched, self.kind())?;

        self.last_output = if training {
            let mask = dropout_mask(self.shape.dims(), 1.0 - self.probability, rng)?;
            let output = input * &mask;
            self.mask = Some(mask);
            output
        } else {
            self.mask = None;
            input.clone()
        };

        Ok(self.last_output.clone())
    }

    /// Only units that survived the forward pass receive gradient.
    fn backward(
        &mut self,
        error: &Tensor,
        _input: Option<&Tensor>,
        batched: bool,
    ) -> Result<Option<Tensor>> {
        self.shape.check(error, batched, self.kind())?;

        Ok(Some(match &self.mask {
            Some(mask) => error * mask,
            None => error.clone(),
        }))
    }

    fn update_weights(
        &mut self,
        _id: LayerId,
        _optimizer: &mut dyn Optimizer,
        _scale: f64,
    ) -> Result<()> {
        Ok(())
    }

    fn reset_deltas(&mut self) {}

    fn last_output(&self) -> &Tensor {
        &self.last_output
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    /// Dropout has no trainable parameters.
    fn parameter_count(&self) -> usize {
        0
    }
}
