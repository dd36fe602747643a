//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer that performs the transformation:
//! output = activation(input × weightsᵀ + biases)
//!
//! The layer only operates on the last axis of its input and leaves every
//! other axis intact: a `(5, 3, 4)` input through a dense layer of width 7
//! yields `(5, 3, 7)`.

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerId};
use crate::optimizers::Optimizer;
use crate::shape::Shape;
use crate::tensor::{as_rows, reshape, Tensor};
use crate::utils::rng::{normal_matrix, normal_vector};
use crate::utils::{Activation, Regularizer};
use ndarray::{Array1, Array2, Axis, Ix1, Ix2, IxDyn};
use rand::rngs::StdRng;
use std::any::Any;

/// Dense (fully connected) layer with weights and biases.
///
/// # Fields
///
/// * `weights` - Weight matrix `(units, input_last)`
/// * `weights_t` - Transposed copy of `weights`, refreshed after every update
/// * `biases` - Bias vector `(units)`
/// * `d_weight` / `d_bias` - Gradients accumulated over the current minibatch
///
/// # Example
///
/// ```ignore
/// use neural_chain::layers::DenseLayer;
/// use neural_chain::utils::{Activation, Regularizer};
///
/// let mut rng = neural_chain::utils::rng::seeded(42);
/// let shape = Shape::new(&[784])?;
/// let layer = DenseLayer::new(shape, 512, Activation::Relu, Regularizer::None, &mut rng)?;
/// assert_eq!(layer.output_shape().dims(), &[512]);
/// ```
pub struct DenseLayer {
    input_shape: Shape,
    output_shape: Shape,
    activation: Activation,
    regularizer: Regularizer,
    weights: Array2<f64>,
    weights_t: Array2<f64>,
    transpose_stale: bool,
    biases: Array1<f64>,
    d_weight: Array2<f64>,
    d_bias: Array1<f64>,
    last_output: Tensor,
}

impl DenseLayer {
    /// Create a new DenseLayer with normally distributed weights and biases.
    ///
    /// # Arguments
    ///
    /// * `input_shape` - Shape of one input sample; its last axis is contracted
    /// * `units` - Width of the output's last axis
    /// * `activation` - Activation applied to the affine output
    /// * `regularizer` - Penalty whose derivative is added to every weight update
    /// * `rng` - Random number generator for parameter initialization
    pub fn new(
        input_shape: Shape,
        units: usize,
        activation: Activation,
        regularizer: Regularizer,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let output_shape = input_shape.with_last(units)?;
        let fan_in = input_shape.last();

        let weights = normal_matrix(units, fan_in, rng);
        let biases = normal_vector(units, rng);

        Ok(Self {
            input_shape,
            output_shape,
            activation,
            regularizer,
            weights_t: weights.t().to_owned(),
            weights,
            transpose_stale: false,
            biases,
            d_weight: Array2::zeros((units, fan_in)),
            d_bias: Array1::zeros(units),
            last_output: Tensor::zeros(IxDyn(&[0])),
        })
    }

    pub fn units(&self) -> usize {
        self.biases.len()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Mutable access to the weights; the transposed cache is rebuilt on the
    /// next forward pass.
    pub fn weights_mut(&mut self) -> &mut Array2<f64> {
        self.transpose_stale = true;
        &mut self.weights
    }

    pub fn biases(&self) -> &Array1<f64> {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut Array1<f64> {
        &mut self.biases
    }

    /// Weight gradient accumulated since the last reset.
    pub fn weight_gradient(&self) -> &Array2<f64> {
        &self.d_weight
    }

    /// Bias gradient accumulated since the last reset.
    pub fn bias_gradient(&self) -> &Array1<f64> {
        &self.d_bias
    }

    /// Regularization penalty of the current weights.
    pub fn penalty(&self) -> f64 {
        self.regularizer.penalty(&self.weights)
    }

    fn refresh_transpose(&mut self) {
        if self.transpose_stale {
            self.weights_t = self.weights.t().to_owned();
            self.transpose_stale = false;
        }
    }
}

impl Layer for DenseLayer {
    fn kind(&self) -> &'static str {
        "dense"
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
        self.refresh_transpose();

        let rows = as_rows(input, self.input_shape.last())?;
        let affine = rows.dot(&self.weights_t) + &self.biases;

        let dims = self.output_shape.tensor_dims(batched.then_some(batch));
        let output = reshape(&affine.into_dyn(), &dims)?;

        self.last_output = self.activation.forward(&output);
        Ok(self.last_output.clone())
    }

    fn backward(
        &mut self,
        error: &Tensor,
        input: Option<&Tensor>,
        batched: bool,
    ) -> Result<Option<Tensor>> {
        let input = input.ok_or(NetworkError::MissingInput)?;
        let batch = self.output_shape.check(error, batched, self.kind())?;
        if error.shape() != self.last_output.shape() {
            return Err(NetworkError::ShapeMismatch {
                layer: self.kind(),
                expected: self.last_output.shape().to_vec(),
                actual: error.shape().to_vec(),
            });
        }
        if self.input_shape.check(input, batched, self.kind())? != batch {
            return Err(NetworkError::ShapeMismatch {
                layer: self.kind(),
                expected: self.input_shape.tensor_dims(Some(batch)),
                actual: input.shape().to_vec(),
            });
        }

        let gradient = error * &self.activation.derivative(&self.last_output);
        let gradient = as_rows(&gradient, self.units())?;
        let previous = as_rows(input, self.input_shape.last())?;

        // outer products summed over every leading (batch or spatial) row
        self.d_weight += &gradient.t().dot(&previous);
        self.d_bias += &gradient.sum_axis(Axis(0));

        let grad_input = gradient.dot(&self.weights);
        Ok(Some(reshape(&grad_input.into_dyn(), input.shape())?))
    }

    fn update_weights(
        &mut self,
        id: LayerId,
        optimizer: &mut dyn Optimizer,
        scale: f64,
    ) -> Result<()> {
        let mut dw = self.d_weight.clone().into_dyn();
        let mut db = self.d_bias.clone().into_dyn();
        optimizer.compute_deltas(id, &mut dw, &mut db)?;

        let dw = dw.into_dimensionality::<Ix2>()?;
        let db = db.into_dimensionality::<Ix1>()?;

        let penalty = self.regularizer.derivative(&self.weights);
        self.weights.scaled_add(-scale, &(dw + penalty));
        self.biases.scaled_add(-scale, &db);
        self.transpose_stale = true;
        self.refresh_transpose();
        Ok(())
    }

    fn reset_deltas(&mut self) {
        self.d_weight.fill(0.0);
        self.d_bias.fill(0.0);
    }

    fn last_output(&self) -> &Tensor {
        &self.last_output
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    /// Returns units × input_last (weights) + units (biases).
    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::Vanilla;
    use crate::tensor::{tensor, vector};
    use crate::utils::rng::seeded;
    use ndarray::array;

    fn layer(input: &[usize], units: usize, activation: Activation) -> DenseLayer {
        let mut rng = seeded(42);
        DenseLayer::new(
            Shape::new(input).unwrap(),
            units,
            activation,
            Regularizer::None,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_dense_layer_creation() {
        let layer = layer(&[10], 5, Activation::Linear);

        assert_eq!(layer.input_shape().dims(), &[10]);
        assert_eq!(layer.output_shape().dims(), &[5]);
        assert_eq!(layer.weights.dim(), (5, 10));
        assert_eq!(layer.biases.len(), 5);
    }

    #[test]
    fn test_dense_layer_parameter_count() {
        let layer = layer(&[784], 512, Activation::Linear);
        assert_eq!(layer.parameter_count(), 784 * 512 + 512);
    }

    #[test]
    fn test_deterministic_initialization() {
        let layer1 = layer(&[10], 5, Activation::Linear);
        let layer2 = layer(&[10], 5, Activation::Linear);

        // Same seed should produce identical weights
        assert_eq!(layer1.weights, layer2.weights);
        assert_eq!(layer1.biases, layer2.biases);
    }

    #[test]
    fn test_forward_known_values() {
        let mut layer = layer(&[2], 2, Activation::Linear);
        *layer.weights_mut() = array![[1.0, 2.0], [3.0, 4.0]];
        *layer.biases_mut() = array![0.5, -0.5];

        let mut rng = seeded(0);
        let out = layer
            .compute(Some(&vector(&[1.0, 1.0])), false, false, &mut rng)
            .unwrap();
        assert_eq!(out, vector(&[3.5, 6.5]));
    }

    #[test]
    fn test_forward_keeps_leading_axes() {
        let mut layer = layer(&[3, 4], 7, Activation::Sigmoid);
        let mut rng = seeded(0);

        let out = layer
            .compute(Some(&Tensor::zeros(vec![3, 4])), false, false, &mut rng)
            .unwrap();
        assert_eq!(out.shape(), &[3, 7]);

        let batched = layer
            .compute(Some(&Tensor::zeros(vec![5, 3, 4])), false, true, &mut rng)
            .unwrap();
        assert_eq!(batched.shape(), &[5, 3, 7]);
    }

    #[test]
    fn test_forward_rejects_wrong_shape() {
        let mut layer = layer(&[3], 2, Activation::Linear);
        let mut rng = seeded(0);
        let result = layer.compute(Some(&vector(&[1.0, 2.0])), false, false, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_backward_accumulates_outer_product() {
        let mut layer = layer(&[2], 1, Activation::Linear);
        *layer.weights_mut() = array![[2.0, -1.0]];
        let mut rng = seeded(0);
        let x = vector(&[3.0, 4.0]);

        layer.compute(Some(&x), true, false, &mut rng).unwrap();
        let grad = layer.backward(&vector(&[0.5]), Some(&x), false).unwrap().unwrap();

        assert_eq!(layer.weight_gradient(), &array![[1.5, 2.0]]);
        assert_eq!(layer.bias_gradient(), &array![0.5]);
        assert_eq!(grad, vector(&[1.0, -0.5]));
    }

    #[test]
    fn test_batched_gradient_matches_sum_of_samples() {
        let mut batched = layer(&[3], 2, Activation::Tanh);
        let mut single = layer(&[3], 2, Activation::Tanh);
        let mut rng = seeded(0);

        let x = tensor(&[2, 3], vec![0.1, -0.2, 0.3, 0.7, 0.0, -0.5]).unwrap();
        let err = tensor(&[2, 2], vec![1.0, -1.0, 0.5, 2.0]).unwrap();

        batched.compute(Some(&x), true, true, &mut rng).unwrap();
        batched.backward(&err, Some(&x), true).unwrap();

        for i in 0..2 {
            let xi = x.index_axis(Axis(0), i).to_owned();
            let ei = err.index_axis(Axis(0), i).to_owned();
            single.compute(Some(&xi), true, false, &mut rng).unwrap();
            single.backward(&ei, Some(&xi), false).unwrap();
        }

        for (a, b) in batched.d_weight.iter().zip(single.d_weight.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        for (a, b) in batched.d_bias.iter().zip(single.d_bias.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_update_and_reset() {
        let mut layer = layer(&[2], 1, Activation::Linear);
        *layer.weights_mut() = array![[1.0, 1.0]];
        *layer.biases_mut() = array![0.0];
        layer.d_weight = array![[2.0, -4.0]];
        layer.d_bias = array![1.0];

        layer.update_weights(LayerId(1), &mut Vanilla, 0.5).unwrap();
        assert_eq!(layer.weights, array![[0.0, 3.0]]);
        assert_eq!(layer.biases, array![-0.5]);
        assert_eq!(layer.weights_t, array![[0.0], [3.0]]);

        layer.reset_deltas();
        layer.reset_deltas();
        assert!(layer.d_weight.iter().all(|&g| g == 0.0));
        assert!(layer.d_bias.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_l2_regularizer_shrinks_weights() {
        let mut rng = seeded(3);
        let mut layer = DenseLayer::new(
            Shape::new(&[2]).unwrap(),
            1,
            Activation::Linear,
            Regularizer::l2(1.0).unwrap(),
            &mut rng,
        )
        .unwrap();
        *layer.weights_mut() = array![[2.0, -2.0]];

        // no data gradient: only the penalty moves the weights
        layer.update_weights(LayerId(1), &mut Vanilla, 0.1).unwrap();
        assert!((layer.weights[[0, 0]] - 1.8).abs() < 1e-12);
        assert!((layer.weights[[0, 1]] + 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_backward_rejects_other_batch_extent() {
        let mut layer = layer(&[2], 1, Activation::Sigmoid);
        let mut rng = seeded(0);
        layer
            .compute(Some(&Tensor::zeros(vec![4, 2])), true, true, &mut rng)
            .unwrap();

        let result = layer.backward(
            &Tensor::zeros(vec![3, 1]),
            Some(&Tensor::zeros(vec![3, 2])),
            true,
        );
        assert!(matches!(result, Err(NetworkError::ShapeMismatch { .. })));

        // error matches the forward pass but the input does not
        let result = layer.backward(
            &Tensor::zeros(vec![4, 1]),
            Some(&Tensor::zeros(vec![3, 2])),
            true,
        );
        assert!(matches!(result, Err(NetworkError::ShapeMismatch { .. })));
        assert!(layer.d_weight.iter().all(|&g| g == 0.0));
    }
}
