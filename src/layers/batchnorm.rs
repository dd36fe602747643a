//! Batch normalization layer implementation
//!
//! This module provides a BatchNormLayer that normalizes activations, improving
//! training stability and enabling higher learning rates.
//!
//! # Batch Normalization Theory
//!
//! Batch normalization normalizes the inputs to have zero mean and unit variance, then
//! applies learnable scale (gamma) and shift (beta) parameters:
//!
//! 1. Compute statistics: mean μ and variance σ² over the reduced axes
//! 2. Normalize: x_norm = (x - μ) / sqrt(σ² + ε)
//! 3. Scale and shift: y = γ * x_norm + β
//!
//! # Reduced axes
//!
//! When the layer is *channelled*, the last sample axis holds channels and one
//! statistic is kept per channel, reduced over every other axis. Otherwise a
//! single statistic is reduced over every axis. The batch axis is always
//! reduced when present, so a batched forward uses true batch statistics.
//!
//! Means, variances and the backward pass all divide by `N`, the number of
//! elements reduced into one statistic (batch extent times every non-channel
//! sample axis), rather than by the batch size alone.
//!
//! During training the running statistics are updated as an exponential moving
//! average; during inference they replace the batch statistics.
//!
//! # References
//!
//! Ioffe, S., & Szegedy, C. (2015). Batch Normalization: Accelerating Deep Network Training
//! by Reducing Internal Covariate Shift. ICML.

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerId};
use crate::optimizers::Optimizer;
use crate::shape::Shape;
use crate::tensor::{as_rows, reshape, Tensor};
use crate::utils::Activation;
use ndarray::{Array1, Array2, Axis, Ix1, IxDyn};
use rand::rngs::StdRng;
use std::any::Any;

/// Hyperparameters of a [`BatchNormLayer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchNormConfig {
    /// Weight of the newest batch statistic in the running average, in (0, 1].
    pub momentum: f64,
    /// Added to the variance before the square root; must be positive.
    pub epsilon: f64,
    /// Keep one statistic per entry of the last sample axis.
    pub channelled: bool,
    /// Learn γ and β.
    pub affine: bool,
    pub activation: Activation,
}

impl Default for BatchNormConfig {
    fn default() -> Self {
        Self {
            momentum: 0.999,
            epsilon: 1e-8,
            channelled: false,
            affine: true,
            activation: Activation::Linear,
        }
    }
}

impl BatchNormConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.momentum > 0.0 && self.momentum <= 1.0) {
            return Err(NetworkError::config(format!(
                "batch norm momentum must be in (0, 1], got {}",
                self.momentum
            )));
        }
        if !(self.epsilon > 0.0) {
            return Err(NetworkError::config(format!(
                "batch norm epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

// Values from the last forward pass that the backward pass needs.
struct ForwardCache {
    centered: Array2<f64>,
    stddev_inv: Array1<f64>,
    normalized: Array2<f64>,
    from_batch: bool,
}

/// Batch normalization layer with learnable scale and shift parameters.
///
/// # Fields
///
/// * `gamma` - Learnable scale parameter (initialized to 1.0)
/// * `beta` - Learnable shift parameter (initialized to 0.0)
/// * `moving_mean` - Running average of means (initialized to 0.0)
/// * `moving_variance` - Running average of variances (initialized to 1.0)
///
/// # Example
///
/// ```ignore
/// let config = BatchNormConfig { channelled: true, ..Default::default() };
/// let layer = BatchNormLayer::new(Shape::new(&[8, 16])?, config)?;
/// assert_eq!(layer.parameter_count(), 32); // 16 gamma + 16 beta
/// ```
pub struct BatchNormLayer {
    shape: Shape,
    config: BatchNormConfig,

    // Learnable parameters
    gamma: Array1<f64>,
    beta: Array1<f64>,
    d_gamma: Array1<f64>,
    d_beta: Array1<f64>,

    // Running statistics (updated during training, used during inference)
    moving_mean: Array1<f64>,
    moving_variance: Array1<f64>,

    cache: Option<ForwardCache>,
    last_output: Tensor,
}

impl BatchNormLayer {
    /// Creates a new batch normalization layer.
    ///
    /// # Arguments
    ///
    /// * `shape` - Sample shape of the predecessor's output
    /// * `config` - Momentum, epsilon, channel/affine flags and activation
    pub fn new(shape: Shape, config: BatchNormConfig) -> Result<Self> {
        config.validate()?;
        let channels = if config.channelled { shape.last() } else { 1 };

        Ok(Self {
            shape,
            config,
            gamma: Array1::ones(channels),
            beta: Array1::zeros(channels),
            d_gamma: Array1::zeros(channels),
            d_beta: Array1::zeros(channels),
            moving_mean: Array1::zeros(channels),
            moving_variance: Array1::ones(channels),
            cache: None,
            last_output: Tensor::zeros(IxDyn(&[0])),
        })
    }

    pub fn config(&self) -> &BatchNormConfig {
        &self.config
    }

    /// Number of independent statistics (channels, or 1 when unchannelled).
    pub fn channels(&self) -> usize {
        self.gamma.len()
    }

    pub fn gamma(&self) -> &Array1<f64> {
        &self.gamma
    }

    pub fn gamma_mut(&mut self) -> &mut Array1<f64> {
        &mut self.gamma
    }

    pub fn beta(&self) -> &Array1<f64> {
        &self.beta
    }

    pub fn beta_mut(&mut self) -> &mut Array1<f64> {
        &mut self.beta
    }

    pub fn gamma_gradient(&self) -> &Array1<f64> {
        &self.d_gamma
    }

    pub fn beta_gradient(&self) -> &Array1<f64> {
        &self.d_beta
    }

    pub fn moving_mean(&self) -> &Array1<f64> {
        &self.moving_mean
    }

    pub fn moving_variance(&self) -> &Array1<f64> {
        &self.moving_variance
    }
}

impl Layer for BatchNormLayer {
    fn kind(&self) -> &'static str {
        "batch_norm"
    }

    fn input_shape(&self) -> &Shape {
        &self.shape
    }

    fn output_shape(&self) -> &Shape {
        &self.shape
    }

    fn compute(
        &mut self,
        input: Option<&Tensor>,
        training: bool,
        batched: bool,
        _rng: &mut StdRng,
    ) -> Result<Tensor> {
        let input = input.ok_or(NetworkError::MissingInput)?;
        self.shape.check(input, batched, self.kind())?;

        let x = as_rows(input, self.channels())?;
        let count = x.nrows() as f64;

        let (mean, variance) = if training {
            let mean = x.sum_axis(Axis(0)) / count;
            let variance = (&x - &mean).mapv(|d| d * d).sum_axis(Axis(0)) / count;

            let m = self.config.momentum;
            self.moving_mean = &mean * m + &self.moving_mean * (1.0 - m);
            self.moving_variance = &variance * m + &self.moving_variance * (1.0 - m);
            (mean, variance)
        } else {
            (self.moving_mean.clone(), self.moving_variance.clone())
        };

        let epsilon = self.config.epsilon;
        let stddev_inv = variance.mapv(|v| 1.0 / (v + epsilon).sqrt());
        let centered = &x - &mean;
        let normalized = &centered * &stddev_inv;

        let scaled = if self.config.affine {
            &normalized * &self.gamma + &self.beta
        } else {
            normalized.clone()
        };

        let output = reshape(&scaled.into_dyn(), input.shape())?;
        self.last_output = self.config.activation.forward(&output);
        self.cache = Some(ForwardCache {
            centered,
            stddev_inv,
            normalized,
            from_batch: training,
        });

        Ok(self.last_output.clone())
    }

    fn backward(
        &mut self,
        error: &Tensor,
        _input: Option<&Tensor>,
        batched: bool,
    ) -> Result<Option<Tensor>> {
        self.shape.check(error, batched, self.kind())?;
        let cache = self
            .cache
            .as_ref()
            .ok_or_else(|| NetworkError::config("batch norm backward called before compute"))?;

        if error.shape() != self.last_output.shape() {
            return Err(NetworkError::ShapeMismatch {
                layer: "batch_norm",
                expected: self.last_output.shape().to_vec(),
                actual: error.shape().to_vec(),
            });
        }

        let grad = error * &self.config.activation.derivative(&self.last_output);
        let dy = as_rows(&grad, self.channels())?;

        let d_norm = if self.config.affine {
            self.d_gamma += &(&dy * &cache.normalized).sum_axis(Axis(0));
            self.d_beta += &dy.sum_axis(Axis(0));
            &dy * &self.gamma
        } else {
            dy
        };

        let s = &cache.stddev_inv;
        let d_x = if cache.from_batch {
            let n = d_norm.nrows() as f64;
            let c = &cache.centered;

            let d_var = (&d_norm * c).sum_axis(Axis(0)) * -0.5 * &s.mapv(|v| v * v * v);
            let d_mean = (&d_norm * &s.mapv(|v| -v)).sum_axis(Axis(0))
                + &d_var * &(c.mapv(|v| -2.0 * v).sum_axis(Axis(0)) / n);

            &d_norm * s + &(c * &d_var) * (2.0 / n) + &d_mean / n
        } else {
            // moving statistics are constants
            &d_norm * s
        };

        Ok(Some(reshape(&d_x.into_dyn(), error.shape())?))
    }

    fn update_weights(
        &mut self,
        id: LayerId,
        optimizer: &mut dyn Optimizer,
        scale: f64,
    ) -> Result<()> {
        if !self.config.affine {
            return Ok(());
        }

        let mut d_gamma = self.d_gamma.clone().into_dyn();
        let mut d_beta = self.d_beta.clone().into_dyn();
        optimizer.compute_deltas(id, &mut d_gamma, &mut d_beta)?;

        self.gamma
            .scaled_add(-scale, &d_gamma.into_dimensionality::<Ix1>()?);
        self.beta
            .scaled_add(-scale, &d_beta.into_dimensionality::<Ix1>()?);
        Ok(())
    }

    fn reset_deltas(&mut self) {
        self.d_gamma.fill(0.0);
        self.d_beta.fill(0.0);
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

    /// Returns 2 × channels (gamma + beta) when affine, otherwise 0.
    fn parameter_count(&self) -> usize {
        if self.config.affine {
            self.gamma.len() + self.beta.len()
        } else {
            0
        }
    }
}
