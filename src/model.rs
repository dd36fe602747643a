//! A trainable chain: a [`Network`] plus the ids of its input and output layers.

use crate::error::{NetworkError, Result};
use crate::layers::LayerId;
use crate::network::Network;
use crate::shape::Shape;
use crate::tensor::{stack, Tensor};
use crate::utils::Cost;
use tracing::debug;

/// Model wrapping a linear chain from `input` to `output`.
///
/// # Example
///
/// ```
/// use neural_chain::model::Model;
/// use neural_chain::network::Network;
/// use neural_chain::tensor::vector;
/// use neural_chain::utils::Activation;
///
/// let mut net = Network::new(7);
/// let input = net.input(&[2]).unwrap();
/// let output = net.dense(input, 1, Activation::Sigmoid).unwrap();
/// let mut model = Model::new(net, input, output).unwrap();
///
/// let y = model.predict(&vector(&[0.0, 1.0])).unwrap();
/// assert_eq!(y.shape(), &[1]);
/// ```
pub struct Model {
    network: Network,
    input: LayerId,
    output: LayerId,
}

impl Model {
    /// Fails unless `input` is an input layer and the head of the chain
    /// ending at `output`.
    pub fn new(network: Network, input: LayerId, output: LayerId) -> Result<Self> {
        if network.layer(input)?.kind() != "input" {
            return Err(NetworkError::config(format!(
                "layer {} is not an input layer",
                input.index()
            )));
        }
        if network.head(output)? != input {
            return Err(NetworkError::config(format!(
                "layer {} is not reachable from input layer {}",
                output.index(),
                input.index()
            )));
        }

        debug!(
            layers = network.len(),
            parameters = network.parameter_count(output)?,
            "model assembled"
        );
        Ok(Self {
            network,
            input,
            output,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn input_id(&self) -> LayerId {
        self.input
    }

    pub fn output_id(&self) -> LayerId {
        self.output
    }

    pub fn input_shape(&self) -> Result<&Shape> {
        Ok(self.network.layer(self.input)?.input_shape())
    }

    pub fn output_shape(&self) -> Result<&Shape> {
        Ok(self.network.layer(self.output)?.output_shape())
    }

    pub fn parameter_count(&self) -> Result<usize> {
        self.network.parameter_count(self.output)
    }

    /// Inference on a single, unbatched sample.
    pub fn predict(&mut self, input: &Tensor) -> Result<Tensor> {
        self.network.feed(self.input, input.clone(), false)?;
        self.network.compute(self.output, false, false)
    }

    /// Inference on a batch with a leading batch axis.
    pub fn predict_batch(&mut self, inputs: &Tensor) -> Result<Tensor> {
        self.network.feed(self.input, inputs.clone(), true)?;
        self.network.compute(self.output, false, true)
    }

    /// Feeds `input` without computing anything.
    pub fn train_feed(&mut self, input: Tensor, batched: bool) -> Result<()> {
        self.network.feed(self.input, input, batched)
    }

    /// Feeds `input` and runs a training-mode forward pass.
    pub fn train_forward(&mut self, input: Tensor, batched: bool) -> Result<Tensor> {
        self.train_feed(input, batched)?;
        self.network.compute(self.output, true, batched)
    }

    /// Backpropagates the loss gradient w.r.t. the last output.
    pub fn backward(&mut self, error: &Tensor, batched: bool) -> Result<()> {
        self.network.backward(self.output, error, batched)
    }

    /// Mean cost of inference predictions over a dataset.
    ///
    /// Samples are evaluated as one batch; an empty dataset costs 0.
    pub fn evaluate<C: Cost>(
        &mut self,
        inputs: &[Tensor],
        targets: &[Tensor],
        cost: &C,
    ) -> Result<f64> {
        if inputs.len() != targets.len() {
            return Err(NetworkError::LengthMismatch {
                inputs: inputs.len(),
                targets: targets.len(),
            });
        }
        if inputs.is_empty() {
            return Ok(0.0);
        }

        let predictions = self.predict_batch(&stack(inputs)?)?;
        cost.calculate(&stack(targets)?, &predictions)
    }
}
