//! Flatten layer: collapses every sample axis into one.

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerId};
use crate::optimizers::Optimizer;
use crate::shape::Shape;
use crate::tensor::{reshape, Tensor};
use ndarray::IxDyn;
use rand::rngs::StdRng;
use std::any::Any;

/// Reshapes `(…sample dims)` into `(size)` in row-major order, keeping the
/// batch axis when present.
pub struct FlattenLayer {
    input_shape: Shape,
    output_shape: Shape,
    last_output: Tensor,
}

impl FlattenLayer {
    pub fn new(input_shape: Shape) -> Self {
        Self {
            output_shape: input_shape.flattened(),
            input_shape,
            last_output: Tensor::zeros(IxDyn(&[0])),
        }
    }
}

impl Layer for FlattenLayer {
    fn kind(&self) -> &'static str {
        "flatten"
    }

    fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    fn output_shape(&self) -> &Shape {
        &self.output_shape
    }

    fn compute(
        &mut self,
        input: Option<&Tensor>,
        _training: bool,
        batched: bool,
        _rng: &mut StdRng,
    ) -> Result<Tensor> {
        let input = input.ok_or(NetworkError::MissingInput)?;
        let batch = self.input_shape.check(input, batched, self.kind())?;

        let dims = self.output_shape.tensor_dims(batched.then_some(batch));
        self.last_output = reshape(input, &dims)?;
        Ok(self.last_output.clone())
    }

    fn backward(
        &mut self,
        error: &Tensor,
        _input: Option<&Tensor>,
        batched: bool,
    ) -> Result<Option<Tensor>> {
        let batch = self.output_shape.check(error, batched, self.kind())?;
        let dims = self.input_shape.tensor_dims(batched.then_some(batch));
        Ok(Some(reshape(error, &dims)?))
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::tensor;
    use crate::utils::rng::seeded;

    #[test]
    fn test_flatten_shapes() {
        let layer = FlattenLayer::new(Shape::new(&[2, 3, 4]).unwrap());
        assert_eq!(layer.output_shape().dims(), &[24]);
    }

    #[test]
    fn test_flatten_row_major_and_back() {
        let mut layer = FlattenLayer::new(Shape::new(&[2, 3]).unwrap());
        let mut rng = seeded(0);
        let input = tensor(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let out = layer.compute(Some(&input), true, false, &mut rng).unwrap();
        assert_eq!(out.shape(), &[6]);
        assert_eq!(out[[4]], 5.0);

        let back = layer.backward(&out, Some(&input), false).unwrap().unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_flatten_keeps_batch_axis() {
        let mut layer = FlattenLayer::new(Shape::new(&[2, 2]).unwrap());
        let mut rng = seeded(0);
        let input = tensor(&[3, 2, 2], (0..12).map(f64::from).collect()).unwrap();

        let out = layer.compute(Some(&input), false, true, &mut rng).unwrap();
        assert_eq!(out.shape(), &[3, 4]);
        assert_eq!(out[[2, 0]], 8.0);

        let back = layer.backward(&out, Some(&input), true).unwrap().unwrap();
        assert_eq!(back, input);
    }
}
