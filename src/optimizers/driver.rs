//! Minibatch gradient descent over a dataset.

use crate::error::{NetworkError, Result};
use crate::model::Model;
use crate::optimizers::Optimizer;
use crate::tensor::{stack, Tensor};
use crate::utils::rng::{seeded, shuffled_indices};
use crate::utils::{Cost, MeanSquare};
use rand::rngs::StdRng;
use tracing::{debug, trace};

/// Training driver parameterized by an update strategy `O` and a cost `C`.
///
/// Each call to [`GradientDescent::run`] is one epoch: the samples are
/// shuffled with the driver's own generator, split into minibatches of
/// `batch_size` (the last one may be smaller) and every minibatch is
/// forwarded, backpropagated and applied through the strategy.
pub struct GradientDescent<O, C = MeanSquare> {
    batch_size: usize,
    learning_rate: f64,
    rng: StdRng,
    cost: C,
    optimizer: O,
}

impl<O: Optimizer> GradientDescent<O> {
    /// Creates a driver using [`MeanSquare`] cost.
    ///
    /// Rejects a zero batch size and non-positive or non-finite learning rates.
    pub fn new(batch_size: usize, learning_rate: f64, optimizer: O, seed: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(NetworkError::config("batch size must be at least 1"));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(NetworkError::config(format!(
                "learning rate must be positive, got {}",
                learning_rate
            )));
        }

        Ok(Self {
            batch_size,
            learning_rate,
            rng: seeded(seed),
            cost: MeanSquare,
            optimizer,
        })
    }
}

impl<O: Optimizer, C: Cost> GradientDescent<O, C> {
    /// Replaces the cost function.
    pub fn with_cost<C2: Cost>(self, cost: C2) -> GradientDescent<O, C2> {
        GradientDescent {
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            rng: self.rng,
            cost,
            optimizer: self.optimizer,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn cost(&self) -> &C {
        &self.cost
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn optimizer_mut(&mut self) -> &mut O {
        &mut self.optimizer
    }

    /// Runs one epoch over `(inputs[i], targets[i])` pairs.
    ///
    /// Returns the mean of the per-minibatch costs measured on the training
    /// forward passes, or 0 when there are no samples.
    pub fn run(&mut self, model: &mut Model, inputs: &[Tensor], targets: &[Tensor]) -> Result<f64> {
        if inputs.len() != targets.len() {
            return Err(NetworkError::LengthMismatch {
                inputs: inputs.len(),
                targets: targets.len(),
            });
        }
        if inputs.is_empty() {
            return Ok(0.0);
        }

        self.optimizer.setup();
        let order = shuffled_indices(inputs.len(), &mut self.rng);
        let output = model.output_id();

        let mut total = 0.0;
        let mut batches = 0usize;
        for chunk in order.chunks(self.batch_size) {
            let x = stack(chunk.iter().map(|&i| &inputs[i]))?;
            let y = stack(chunk.iter().map(|&i| &targets[i]))?;

            let prediction = model.train_forward(x, true)?;
            let loss = self.cost.calculate(&y, &prediction)?;
            let error = self.cost.derivative(&y, &prediction)?;
            model.backward(&error, true)?;

            self.optimizer.update_weights(
                model.network_mut(),
                output,
                chunk.len(),
                self.learning_rate,
            )?;

            trace!(batch = batches, samples = chunk.len(), loss, "minibatch");
            total += loss;
            batches += 1;
        }

        let mean = total / batches as f64;
        debug!(samples = inputs.len(), batches, loss = mean, "epoch complete");
        Ok(mean)
    }
}
