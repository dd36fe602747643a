//! Weight regularizers for dense layers.
//!
//! A regularizer adds a penalty on large weights. Only its derivative takes
//! part in training; it is added to the optimizer-transformed weight gradient
//! right before the update is applied.

use crate::error::{NetworkError, Result};
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Regularizer {
    #[default]
    None,
    /// Penalty `0.5 * lambda * |w|`, derivative `lambda * sign(w)`.
    L1(f64),
    /// Penalty `0.5 * lambda * w^2`, derivative `lambda * w`.
    L2(f64),
}

impl Regularizer {
    pub fn l1(lambda: f64) -> Result<Self> {
        check_lambda(lambda)?;
        Ok(Regularizer::L1(lambda))
    }

    pub fn l2(lambda: f64) -> Result<Self> {
        check_lambda(lambda)?;
        Ok(Regularizer::L2(lambda))
    }

    /// Total penalty contributed by `weights`.
    pub fn penalty(&self, weights: &Array2<f64>) -> f64 {
        match *self {
            Regularizer::None => 0.0,
            Regularizer::L1(lambda) => weights.iter().map(|w| 0.5 * lambda * w.abs()).sum(),
            Regularizer::L2(lambda) => weights.iter().map(|w| 0.5 * lambda * w * w).sum(),
        }
    }

    /// Gradient of the penalty with respect to each weight.
    pub fn derivative(&self, weights: &Array2<f64>) -> Array2<f64> {
        match *self {
            Regularizer::None => Array2::zeros(weights.raw_dim()),
            Regularizer::L1(lambda) => weights.mapv(|w| lambda * sign(w)),
            Regularizer::L2(lambda) => weights.mapv(|w| lambda * w),
        }
    }
}

fn check_lambda(lambda: f64) -> Result<()> {
    if !(lambda.is_finite() && lambda >= 0.0) {
        return Err(NetworkError::config(format!(
            "regularizer coefficient must be non-negative, got {}",
            lambda
        )));
    }
    Ok(())
}

// f64::signum maps 0.0 to 1.0; the penalty is flat at zero.
fn sign(w: f64) -> f64 {
    if w > 0.0 {
        1.0
    } else if w < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_none_is_zero() {
        let w = array![[1.0, -2.0], [0.0, 3.0]];
        assert_eq!(Regularizer::None.derivative(&w), Array2::<f64>::zeros((2, 2)));
        assert_eq!(Regularizer::None.penalty(&w), 0.0);
    }

    #[test]
    fn test_l1_derivative_is_signed() {
        let w = array![[1.5, -2.0], [0.0, 3.0]];
        let d = Regularizer::l1(0.1).unwrap().derivative(&w);
        assert_eq!(d, array![[0.1, -0.1], [0.0, 0.1]]);
    }

    #[test]
    fn test_l2_derivative_and_penalty() {
        let w = array![[1.0, -2.0]];
        let reg = Regularizer::l2(0.5).unwrap();
        assert_eq!(reg.derivative(&w), array![[0.5, -1.0]]);
        assert!((reg.penalty(&w) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_negative_lambda_rejected() {
        assert!(Regularizer::l1(-0.1).is_err());
        assert!(Regularizer::l2(f64::NAN).is_err());
    }
}
