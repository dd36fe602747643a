//! Layer trait definition for neural network layers
//!
//! This module defines the core Layer trait that all layer types implement.
//! A layer only ever sees its own parameters plus the tensors handed to it by
//! the [`Network`](crate::network::Network) that owns the chain; walking the
//! chain (pulling outputs forward, pushing gradients back) is the network's job.

use crate::error::Result;
use crate::layers::{InputLayer, LayerId};
use crate::optimizers::Optimizer;
use crate::shape::Shape;
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use std::any::Any;

/// Core trait for neural network layers.
///
/// All layer types (Input, Dense, Dropout, BatchNorm, Flatten) implement this
/// trait to provide a uniform interface for forward propagation, backward
/// propagation and parameter updates.
///
/// # Shape contracts
///
/// Every layer declares an input and output [`Shape`] for a single sample.
/// `batched` calls carry an extra leading batch axis; implementations must
/// validate every tensor they receive against their contract and return
/// [`NetworkError::ShapeMismatch`](crate::error::NetworkError::ShapeMismatch)
/// rather than coercing.
///
/// # Example
///
/// ```ignore
/// // Forward pass: the predecessor's output goes in, this layer's output comes out
/// let output = layer.compute(Some(&input), true, true, &mut rng)?;
///
/// // Backward pass: accumulate parameter gradients, return the input gradient
/// let grad_input = layer.backward(&grad_output, Some(&input), true)?;
/// ```
pub trait Layer {
    /// Short lowercase name used in logs and error messages.
    fn kind(&self) -> &'static str;

    /// Shape of one input sample.
    fn input_shape(&self) -> &Shape;

    /// Shape of one output sample.
    fn output_shape(&self) -> &Shape;

    /// Forward propagation through the layer.
    ///
    /// `input` is the predecessor's output, or `None` for the input layer.
    /// The result is cached and returned by [`Layer::last_output`] until the
    /// next call.
    ///
    /// # Arguments
    ///
    /// * `input` - Predecessor output (with leading batch axis when `batched`)
    /// * `training` - Selects stochastic / batch-statistics behavior
    /// * `batched` - Whether a leading batch axis is present
    /// * `rng` - Generator for stochastic layers such as dropout
    fn compute(
        &mut self,
        input: Option<&Tensor>,
        training: bool,
        batched: bool,
        rng: &mut StdRng,
    ) -> Result<Tensor>;

    /// Backward propagation through the layer.
    ///
    /// Given the gradient of the loss with respect to this layer's output,
    /// accumulates parameter gradients internally and returns the gradient with
    /// respect to the layer's input (`None` for the input layer).
    ///
    /// # Arguments
    ///
    /// * `error` - Gradient of the loss w.r.t. this layer's last output
    /// * `input` - The predecessor's last output (the input of the matching forward)
    /// * `batched` - Whether a leading batch axis is present
    fn backward(
        &mut self,
        error: &Tensor,
        input: Option<&Tensor>,
        batched: bool,
    ) -> Result<Option<Tensor>>;

    /// Update layer parameters using accumulated gradients.
    ///
    /// The optimizer transforms the accumulated deltas first; the layer then
    /// applies `param -= scale * delta`.
    fn update_weights(
        &mut self,
        id: LayerId,
        optimizer: &mut dyn Optimizer,
        scale: f64,
    ) -> Result<()>;

    /// Zero the accumulated gradients.
    fn reset_deltas(&mut self);

    /// Output of the most recent `compute` call (empty before the first call).
    fn last_output(&self) -> &Tensor;

    /// Get the number of trainable parameters in the layer.
    fn parameter_count(&self) -> usize;

    /// Concrete layer, for inspecting parameters through
    /// [`Network::get`](crate::network::Network::get).
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Downcast hook used to feed data into the chain.
    fn as_input_mut(&mut self) -> Option<&mut InputLayer> {
        None
    }
}
