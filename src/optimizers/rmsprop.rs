//! RMSProp optimizer implementation

use crate::error::{NetworkError, Result};
use crate::layers::LayerId;
use crate::optimizers::{state_slot, Optimizer};
use crate::tensor::Tensor;
use std::collections::HashMap;

/// RMSProp: divides each gradient by a running root mean square of its history.
///
/// ```text
/// h = ρ * h + (1 - ρ) * gradient²
/// gradient = gradient / (√h + ε)
/// ```
#[derive(Debug, Clone)]
pub struct RmsProp {
    decay: f64,
    epsilon: f64,
    history: HashMap<LayerId, Tensor>,
}

impl RmsProp {
    /// # Arguments
    ///
    /// * `decay` - Weight of the history (ρ, in [0, 1))
    /// * `epsilon` - Small positive constant for numerical stability
    pub fn new(decay: f64, epsilon: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&decay) {
            return Err(NetworkError::config(format!(
                "rmsprop decay must be in [0, 1), got {}",
                decay
            )));
        }
        if !(epsilon > 0.0) {
            return Err(NetworkError::config(format!(
                "rmsprop epsilon must be positive, got {}",
                epsilon
            )));
        }
        Ok(Self {
            decay,
            epsilon,
            history: HashMap::new(),
        })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for RmsProp {
    fn default() -> Self {
        Self {
            decay: 0.9,
            epsilon: 1e-8,
            history: HashMap::new(),
        }
    }
}

impl Optimizer for RmsProp {
    fn compute_deltas(
        &mut self,
        id: LayerId,
        d_weight: &mut Tensor,
        _d_bias: &mut Tensor,
    ) -> Result<()> {
        let (decay, epsilon) = (self.decay, self.epsilon);
        let history = state_slot(&mut self.history, id, d_weight)?;

        history.zip_mut_with(d_weight, |h, &g| *h = decay * *h + (1.0 - decay) * g * g);
        d_weight.zip_mut_with(history, |g, &h| *g /= h.sqrt() + epsilon);
        Ok(())
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::vector;

    #[test]
    fn test_rmsprop_invalid_hyperparameters() {
        assert!(RmsProp::new(1.0, 1e-8).is_err());
        assert!(RmsProp::new(0.9, 0.0).is_err());
        assert!(RmsProp::new(0.9, 1e-8).is_ok());
    }

    #[test]
    fn test_rmsprop_first_step() {
        let mut optimizer = RmsProp::new(0.9, 1e-8).unwrap();
        let mut dw = vector(&[2.0, -0.5]);
        let mut db = vector(&[7.0]);

        optimizer.compute_deltas(LayerId(1), &mut dw, &mut db).unwrap();

        // h = 0.1 * g², so g / sqrt(h) = sign(g) / sqrt(0.1)
        let expected = 1.0 / 0.1f64.sqrt();
        assert!((dw[[0]] - expected).abs() < 1e-6);
        assert!((dw[[1]] + expected).abs() < 1e-6);
        assert_eq!(db, vector(&[7.0]));
    }

    #[test]
    fn test_rmsprop_zero_gradient_stays_zero() {
        let mut optimizer = RmsProp::default();
        let mut dw = vector(&[0.0, 0.0]);
        let mut db = vector(&[0.0]);
        optimizer.compute_deltas(LayerId(1), &mut dw, &mut db).unwrap();
        assert_eq!(dw, vector(&[0.0, 0.0]));
    }
}
