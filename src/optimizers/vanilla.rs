//! Plain gradient descent: `parameter = parameter - scale * gradient`.

use crate::error::Result;
use crate::layers::LayerId;
use crate::optimizers::Optimizer;
use crate::tensor::Tensor;

/// Stateless optimizer that applies accumulated deltas unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vanilla;

impl Optimizer for Vanilla {
    fn compute_deltas(
        &mut self,
        _id: LayerId,
        _d_weight: &mut Tensor,
        _d_bias: &mut Tensor,
    ) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::vector;

    #[test]
    fn test_vanilla_is_identity() {
        let mut dw = vector(&[0.1, -0.2]);
        let mut db = vector(&[3.0]);
        Vanilla.compute_deltas(LayerId(1), &mut dw, &mut db).unwrap();
        assert_eq!(dw, vector(&[0.1, -0.2]));
        assert_eq!(db, vector(&[3.0]));
    }
}
