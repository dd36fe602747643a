//! Cost functions comparing a prediction against its target.

use crate::error::{NetworkError, Result};
use crate::tensor::Tensor;

/// Loss used by the training driver.
pub trait Cost {
    /// Scalar loss of `prediction` against `target`.
    fn calculate(&self, target: &Tensor, prediction: &Tensor) -> Result<f64>;

    /// Gradient of the loss with respect to `prediction`.
    fn derivative(&self, target: &Tensor, prediction: &Tensor) -> Result<Tensor>;
}

/// Half mean squared error: `sum(0.5 * (p - t)^2) / len`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquare;

impl Cost for MeanSquare {
    fn calculate(&self, target: &Tensor, prediction: &Tensor) -> Result<f64> {
        check_same_shape(target, prediction)?;
        if target.is_empty() {
            return Ok(0.0);
        }
        let total: f64 = prediction
            .iter()
            .zip(target.iter())
            .map(|(p, t)| 0.5 * (p - t) * (p - t))
            .sum();
        Ok(total / target.len() as f64)
    }

    fn derivative(&self, target: &Tensor, prediction: &Tensor) -> Result<Tensor> {
        check_same_shape(target, prediction)?;
        Ok(prediction - target)
    }
}

fn check_same_shape(target: &Tensor, prediction: &Tensor) -> Result<()> {
    if target.shape() != prediction.shape() {
        return Err(NetworkError::ShapeMismatch {
            layer: "cost",
            expected: prediction.shape().to_vec(),
            actual: target.shape().to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::vector;

    #[test]
    fn test_mean_square_value() {
        let target = vector(&[0.0, 1.0]);
        let prediction = vector(&[1.0, 1.0]);
        let loss = MeanSquare.calculate(&target, &prediction).unwrap();
        assert!((loss - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_mean_square_derivative() {
        let target = vector(&[0.5, 1.0]);
        let prediction = vector(&[1.0, 0.0]);
        let d = MeanSquare.derivative(&target, &prediction).unwrap();
        assert_eq!(d, vector(&[0.5, -1.0]));
    }

    #[test]
    fn test_shape_mismatch() {
        let target = vector(&[0.5]);
        let prediction = vector(&[1.0, 0.0]);
        assert!(MeanSquare.derivative(&target, &prediction).is_err());
        assert!(MeanSquare.calculate(&target, &prediction).is_err());
    }
}
