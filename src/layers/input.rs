//! Input layer: the head of every chain.

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerId};
use crate::optimizers::Optimizer;
use crate::shape::Shape;
use crate::tensor::Tensor;
use ndarray::IxDyn;
use rand::rngs::StdRng;
use std::any::Any;

/// Holds the externally supplied sample or batch.
///
/// Has no parameters and no predecessor; its `backward` and `update_weights`
/// end the recursion down the chain.
pub struct InputLayer {
    shape: Shape,
    fed: Option<Tensor>,
    last_output: Tensor,
}

impl InputLayer {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            fed: None,
            last_output: Tensor::zeros(IxDyn(&[0])),
        }
    }

    /// Store `input` for the next `compute`, validating it immediately.
    pub fn feed(&mut self, input: Tensor, batched: bool) -> Result<()> {
        self.shape.check(&input, batched, self.kind())?;
        self.fed = Some(input);
        Ok(())
    }
}

impl Layer for InputLayer {
    fn kind(&self) -> &'static str {
        "input"
    }

    fn input_shape(&self) -> &Shape {
        &self.shape
    }

    fn output_shape(&self) -> &Shape {
        &self.shape
    }

    fn compute(
        &mut self,
        _input: Option<&Tensor>,
        _training: bool,
        batched: bool,
        _rng: &mut StdRng,
    ) -> Result<Tensor> {
        let fed = self.fed.as_ref().ok_or(NetworkError::MissingInput)?;
        self.shape.check(fed, batched, "input")?;
        self.last_output = fed.clone();
        Ok(self.last_output.clone())
    }

    fn backward(
        &mut self,
        _error: &Tensor,
        _input: Option<&Tensor>,
        _batched: bool,
    ) -> Result<Option<Tensor>> {
        Ok(None)
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

    fn parameter_count(&self) -> usize {
        0
    }

    fn as_input_mut(&mut self) -> Option<&mut InputLayer> {
        Some(self)
    }
}
