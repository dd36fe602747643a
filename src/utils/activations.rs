//! Activation functions for neural network layers
//!
//! Each activation maps a tensor elementwise. Derivatives are expressed in
//! terms of the activation's *output* rather than its input: for sigmoid,
//! `d/dz sigmoid(z) = s * (1 - s)` where `s` is the value already produced by
//! the forward pass. Layers only keep their output around, so this is the
//! form the backward pass can evaluate.

use crate::tensor::Tensor;
use serde::Deserialize;

/// Elementwise activation applied at the end of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Identity.
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Applies the activation to every element of `input`.
    pub fn forward(&self, input: &Tensor) -> Tensor {
        match self {
            Activation::Linear => input.clone(),
            Activation::Relu => input.mapv(|x| if x <= 0.0 { 0.0 } else { x }),
            Activation::Sigmoid => input.mapv(sigmoid),
            Activation::Tanh => input.mapv(f64::tanh),
        }
    }

    /// Derivative evaluated at an already-activated `output`.
    pub fn derivative(&self, output: &Tensor) -> Tensor {
        match self {
            Activation::Linear => Tensor::ones(output.raw_dim()),
            Activation::Relu => output.mapv(|y| if y <= 0.0 { 0.0 } else { 1.0 }),
            Activation::Sigmoid => output.mapv(sigmoid_derivative),
            Activation::Tanh => output.mapv(|y| 1.0 - y * y),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Linear => "linear",
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
        }
    }
}

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative assuming x = sigmoid(z).
///
/// Returns the derivative: x * (1 - x)
pub fn sigmoid_derivative(x: f64) -> f64 {
    x * (1.0 - x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::vector;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_sigmoid_zero() {
        let result = sigmoid(0.0);
        assert!((result - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_sigmoid_derivative_at_half() {
        let result = sigmoid_derivative(0.5);
        assert!((result - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_relu_mixed() {
        let out = Activation::Relu.forward(&vector(&[-2.0, -1.0, 0.0, 1.0, 2.0]));
        assert_eq!(out, vector(&[0.0, 0.0, 0.0, 1.0, 2.0]));
        assert_eq!(
            Activation::Relu.derivative(&out),
            vector(&[0.0, 0.0, 0.0, 1.0, 1.0])
        );
    }

    #[test]
    fn test_linear_is_identity() {
        let input = vector(&[-3.0, 0.5, 7.0]);
        assert_eq!(Activation::Linear.forward(&input), input);
        assert_eq!(Activation::Linear.derivative(&input), vector(&[1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_tanh_derivative_from_output() {
        let z = 0.7f64;
        let out = Activation::Tanh.forward(&vector(&[z]));
        let d = Activation::Tanh.derivative(&out);
        let expected = 1.0 / z.cosh().powi(2);
        assert!((d[[0]] - expected).abs() < EPSILON);
    }

    #[test]
    fn test_deserialize_names() {
        let a: Activation = serde_json::from_str("\"sigmoid\"").unwrap();
        assert_eq!(a, Activation::Sigmoid);
        let a: Activation = serde_json::from_str("\"relu\"").unwrap();
        assert_eq!(a, Activation::Relu);
        assert!(serde_json::from_str::<Activation>("\"swish\"").is_err());
    }
}
