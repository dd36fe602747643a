//! Stochastic Gradient Descent with momentum
//!
//! This module provides an SGD variant that accumulates a per-layer velocity
//! and applies it in place of the raw gradient.

use crate::error::{NetworkError, Result};
use crate::layers::LayerId;
use crate::optimizers::{state_slot, Optimizer};
use crate::tensor::Tensor;
use std::collections::HashMap;

/// Momentum SGD optimizer.
///
/// ```text
/// v = μ * v + ∇L/∂w
/// w = w - η * v
/// ```
///
/// where μ (mu) is the momentum and η the learning rate applied by the driver.
///
/// # Fields
///
/// * `momentum` - Fraction of the previous velocity carried over (μ, in [0, 1))
/// * `velocity` - Velocity of each layer's weights
///
/// # Example
///
/// ```
/// use neural_chain::optimizers::Momentum;
///
/// let optimizer = Momentum::new(0.9).unwrap();
/// assert_eq!(optimizer.momentum(), 0.9);
/// assert!(Momentum::new(1.0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Momentum {
    momentum: f64,
    velocity: HashMap<LayerId, Tensor>,
}

impl Momentum {
    /// Creates a new momentum optimizer.
    ///
    /// # Typical Values
    ///
    /// Momentum is usually 0.9; 0 reduces to vanilla gradient descent.
    pub fn new(momentum: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&momentum) {
            return Err(NetworkError::config(format!(
                "momentum must be in [0, 1), got {}",
                momentum
            )));
        }
        Ok(Self {
            momentum,
            velocity: HashMap::new(),
        })
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self {
            momentum: 0.9,
            velocity: HashMap::new(),
        }
    }
}

impl Optimizer for Momentum {
    fn compute_deltas(
        &mut self,
        id: LayerId,
        d_weight: &mut Tensor,
        _d_bias: &mut Tensor,
    ) -> Result<()> {
        let velocity = state_slot(&mut self.velocity, id, d_weight)?;
        *velocity *= self.momentum;
        *velocity += &*d_weight;
        d_weight.assign(velocity);
        Ok(())
    }

    fn reset(&mut self) {
        self.velocity.clear();
    }
}
