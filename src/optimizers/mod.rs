//! Optimizer abstractions for neural network parameter updates
//!
//! This module provides the Optimizer trait, the strategies implementing it and
//! the [`GradientDescent`] driver that runs them over a dataset.
//!
//! # Overview
//!
//! Layers accumulate raw gradients during backward propagation. When a
//! minibatch is done the driver asks its optimizer to walk the chain: each
//! layer hands its accumulated weight and bias deltas to
//! [`Optimizer::compute_deltas`], which may rewrite them in place, and then
//! applies `param -= scale * delta` with `scale = learning_rate / samples`.
//!
//! # Available Optimizers
//!
//! - Vanilla: deltas are applied unchanged
//! - Momentum: velocity accumulation
//! - RMSProp: deltas divided by a running RMS of past deltas
//! - Adam: bias-corrected first and second moment estimates
//!
//! # Example
//!
//! ```ignore
//! use neural_chain::optimizers::{Adam, GradientDescent};
//!
//! let mut trainer = GradientDescent::new(4, 0.1, Adam::default(), 42)?;
//! for _ in 0..epochs {
//!     let loss = trainer.run(&mut model, &inputs, &targets)?;
//! }
//! ```

pub mod adam;
pub mod driver;
pub mod rmsprop;
pub mod sgd;
pub mod vanilla;

pub use adam::Adam;
pub use driver::GradientDescent;
pub use rmsprop::RmsProp;
pub use sgd::Momentum;
pub use vanilla::Vanilla;

use crate::error::{NetworkError, Result};
use crate::layers::LayerId;
use crate::network::Network;
use crate::tensor::Tensor;
use std::collections::HashMap;

/// Core trait for neural network optimizers.
///
/// # State Management
///
/// Stateful optimizers keep one state tensor per layer, keyed by the layer's
/// [`LayerId`]. An optimizer instance therefore belongs to a single model;
/// sharing one between models mixes their histories.
pub trait Optimizer {
    /// Transform the accumulated deltas of layer `id` in place.
    ///
    /// `d_weight` holds the layer's weight gradient and `d_bias` its bias
    /// gradient. Bias deltas pass through unchanged for every strategy in
    /// this crate.
    ///
    /// Returns [`NetworkError::ShapeMismatch`] if stored state for `id` does
    /// not match the incoming delta.
    fn compute_deltas(
        &mut self,
        id: LayerId,
        d_weight: &mut Tensor,
        d_bias: &mut Tensor,
    ) -> Result<()>;

    /// Hook executed once per `run`, before the first minibatch.
    fn setup(&mut self) {}

    /// Clear all per-layer state.
    fn reset(&mut self) {}

    /// Apply one minibatch worth of accumulated gradients to the chain ending
    /// at `output`, then zero them.
    fn update_weights(
        &mut self,
        network: &mut Network,
        output: LayerId,
        samples: usize,
        learning_rate: f64,
    ) -> Result<()>
    where
        Self: Sized,
    {
        descend(self, network, output, samples, learning_rate)
    }
}

/// Default minibatch update shared by every strategy.
pub fn descend(
    optimizer: &mut dyn Optimizer,
    network: &mut Network,
    output: LayerId,
    samples: usize,
    learning_rate: f64,
) -> Result<()> {
    if samples == 0 {
        return Ok(());
    }
    let scale = learning_rate / samples as f64;
    network.update_weights(output, optimizer, scale)?;
    network.reset_deltas(output)
}

/// Per-layer state tensor, zero-initialized on first use.
pub(crate) fn state_slot<'a>(
    states: &'a mut HashMap<LayerId, Tensor>,
    id: LayerId,
    like: &Tensor,
) -> Result<&'a mut Tensor> {
    let slot = states
        .entry(id)
        .or_insert_with(|| Tensor::zeros(like.raw_dim()));
    if slot.shape() != like.shape() {
        return Err(NetworkError::ShapeMismatch {
            layer: "optimizer",
            expected: slot.shape().to_vec(),
            actual: like.shape().to_vec(),
        });
    }
    Ok(slot)
}

/// Optimizer selected at runtime, e.g. from a configuration file.
#[derive(Debug, Clone)]
pub enum OptimizerKind {
    Vanilla(Vanilla),
    Momentum(Momentum),
    RmsProp(RmsProp),
    Adam(Adam),
}

impl OptimizerKind {
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Vanilla(_) => "vanilla",
            OptimizerKind::Momentum(_) => "sgd",
            OptimizerKind::RmsProp(_) => "rmsprop",
            OptimizerKind::Adam(_) => "adam",
        }
    }
}

impl Optimizer for OptimizerKind {
    fn compute_deltas(
        &mut self,
        id: LayerId,
        d_weight: &mut Tensor,
        d_bias: &mut Tensor,
    ) -> Result<()> {
        match self {
            OptimizerKind::Vanilla(o) => o.compute_deltas(id, d_weight, d_bias),
            OptimizerKind::Momentum(o) => o.compute_deltas(id, d_weight, d_bias),
            OptimizerKind::RmsProp(o) => o.compute_deltas(id, d_weight, d_bias),
            OptimizerKind::Adam(o) => o.compute_deltas(id, d_weight, d_bias),
        }
    }

    fn setup(&mut self) {
        match self {
            OptimizerKind::Vanilla(o) => o.setup(),
            OptimizerKind::Momentum(o) => o.setup(),
            OptimizerKind::RmsProp(o) => o.setup(),
            OptimizerKind::Adam(o) => o.setup(),
        }
    }

    fn reset(&mut self) {
        match self {
            OptimizerKind::Vanilla(o) => o.reset(),
            OptimizerKind::Momentum(o) => o.reset(),
            OptimizerKind::RmsProp(o) => o.reset(),
            OptimizerKind::Adam(o) => o.reset(),
        }
    }

    fn update_weights(
        &mut self,
        network: &mut Network,
        output: LayerId,
        samples: usize,
        learning_rate: f64,
    ) -> Result<()> {
        match self {
            OptimizerKind::Vanilla(o) => o.update_weights(network, output, samples, learning_rate),
            OptimizerKind::Momentum(o) => o.update_weights(network, output, samples, learning_rate),
            OptimizerKind::RmsProp(o) => o.update_weights(network, output, samples, learning_rate),
            OptimizerKind::Adam(o) => o.update_weights(network, output, samples, learning_rate),
        }
    }
}
