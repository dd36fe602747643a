//! Adam (Adaptive Moment Estimation) optimizer implementation
//!
//! This module provides the Adam optimizer, which combines momentum and
//! adaptive learning rates with bias correction for improved convergence.

use crate::error::{NetworkError, Result};
use crate::layers::LayerId;
use crate::network::Network;
use crate::optimizers::{descend, state_slot, Optimizer};
use crate::tensor::Tensor;
use std::collections::HashMap;

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// Adam maintains two moving averages for each layer's weights:
///
/// 1. First moment (mean) of gradients (momentum)
/// 2. Second moment (uncentered variance) of gradients (adaptive learning rate)
///
/// The update rule is:
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * gradient
/// v_t = β2 * v_{t-1} + (1 - β2) * gradient²
/// m_hat = m_t / (1 - β1^t)
/// v_hat = v_t / (1 - β2^t)
/// gradient = m_hat / (√v_hat + ε)
/// ```
///
/// The time step `t` is global: it advances once per minibatch, before any
/// layer is updated, so every layer of the chain sees the same correction.
///
/// # Fields
///
/// * `beta1` - Exponential decay rate for first moment estimates (typically 0.9)
/// * `beta2` - Exponential decay rate for second moment estimates (typically 0.999)
/// * `epsilon` - Small constant for numerical stability (typically 1e-8)
/// * `m` - First moment estimates for each layer
/// * `v` - Second moment estimates for each layer
/// * `t` - Time step counter for bias correction
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone)]
pub struct Adam {
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: HashMap<LayerId, Tensor>,
    v: HashMap<LayerId, Tensor>,
    t: u32,
}

impl Adam {
    /// Creates a new Adam optimizer with the specified hyperparameters.
    ///
    /// # Arguments
    ///
    /// * `beta1` - Exponential decay rate for first moment estimates (0 ≤ β1 < 1)
    /// * `beta2` - Exponential decay rate for second moment estimates (0 ≤ β2 < 1)
    /// * `epsilon` - Small constant for numerical stability (must be positive)
    ///
    /// # Examples
    ///
    /// ```
    /// use neural_chain::optimizers::Adam;
    ///
    /// let optimizer = Adam::new(0.9, 0.999, 1e-8).unwrap();
    /// assert_eq!(optimizer.timestep(), 0);
    /// assert!(Adam::new(1.0, 0.999, 1e-8).is_err());
    /// ```
    ///
    /// # Typical Values
    ///
    /// The original Adam paper recommends beta1 = 0.9, beta2 = 0.999 and
    /// epsilon = 1e-8, which is what [`Adam::default`] uses.
    pub fn new(beta1: f64, beta2: f64, epsilon: f64) -> Result<Self> {
        for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(NetworkError::config(format!(
                    "adam {} must be in [0, 1), got {}",
                    name, beta
                )));
            }
        }
        if !(epsilon > 0.0) {
            return Err(NetworkError::config(format!(
                "adam epsilon must be positive, got {}",
                epsilon
            )));
        }

        Ok(Self {
            beta1,
            beta2,
            epsilon,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        })
    }

    /// Number of minibatch updates applied so far.
    pub fn timestep(&self) -> u32 {
        self.t
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }
}

impl Optimizer for Adam {
    /// Applies the Adam transform with bias correction:
    /// 1. Update biased first moment estimate (momentum)
    /// 2. Update biased second moment estimate (adaptive learning rate)
    /// 3. Replace the gradient with the bias-corrected ratio
    fn compute_deltas(
        &mut self,
        id: LayerId,
        d_weight: &mut Tensor,
        _d_bias: &mut Tensor,
    ) -> Result<()> {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        // compute_deltas outside of update_weights still gets a valid correction
        let t = self.t.max(1) as i32;
        let bias_correction1 = 1.0 - beta1.powi(t);
        let bias_correction2 = 1.0 - beta2.powi(t);

        let m = state_slot(&mut self.m, id, d_weight)?;
        m.zip_mut_with(d_weight, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);

        let v = state_slot(&mut self.v, id, d_weight)?;
        v.zip_mut_with(d_weight, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let m = &self.m[&id];
        let v = &self.v[&id];
        ndarray::Zip::from(d_weight)
            .and(m)
            .and(v)
            .for_each(|g, &m, &v| {
                let m_hat = m / bias_correction1;
                let v_hat = v / bias_correction2;
                *g = m_hat / (v_hat.sqrt() + epsilon);
            });
        Ok(())
    }

    /// Reset optimizer state.
    ///
    /// Clears both moment estimates and the time step.
    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }

    fn update_weights(
        &mut self,
        network: &mut Network,
        output: LayerId,
        samples: usize,
        learning_rate: f64,
    ) -> Result<()> {
        self.t += 1;
        descend(self, network, output, samples, learning_rate)
    }
}
