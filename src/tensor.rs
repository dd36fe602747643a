//! Thin helpers over `ndarray` used by the layers.
//!
//! Every tensor in the crate is an `ArrayD<f64>`. The helpers here cover the
//! handful of conversions the layers need: viewing a tensor as a row matrix
//! over its last axis, row-major reshapes and stacking samples into a batch.

use crate::error::{NetworkError, Result};
use ndarray::{Array1, Array2, ArrayD, ArrayView, Axis, IxDyn};

/// N-dimensional tensor of `f64` values.
pub type Tensor = ArrayD<f64>;

/// Builds a tensor of the given dimensions from row-major values.
pub fn tensor(dims: &[usize], values: Vec<f64>) -> Result<Tensor> {
    Ok(Tensor::from_shape_vec(IxDyn(dims), values)?)
}

/// Builds a one-dimensional tensor.
pub fn vector(values: &[f64]) -> Tensor {
    Array1::from(values.to_vec()).into_dyn()
}

/// Row-major reshape that works regardless of the source memory layout.
pub fn reshape(t: &Tensor, dims: &[usize]) -> Result<Tensor> {
    tensor(dims, t.iter().copied().collect())
}

/// Views `t` as a `(rows, cols)` matrix where `cols` is the trailing extent.
///
/// All leading axes (including a batch axis) are folded into the rows.
pub fn as_rows(t: &Tensor, cols: usize) -> Result<Array2<f64>> {
    let rows = if cols == 0 { 0 } else { t.len() / cols };
    Ok(Array2::from_shape_vec(
        (rows, cols),
        t.iter().copied().collect(),
    )?)
}

/// Stacks equally shaped samples along a new leading axis.
pub fn stack<'a, I>(samples: I) -> Result<Tensor>
where
    I: IntoIterator<Item = &'a Tensor>,
{
    let views: Vec<ArrayView<f64, IxDyn>> = samples.into_iter().map(|s| s.view()).collect();
    let first = views
        .first()
        .ok_or_else(|| NetworkError::config("cannot stack an empty batch"))?;

    if let Some(odd) = views.iter().find(|v| v.shape() != first.shape()) {
        return Err(NetworkError::ShapeMismatch {
            layer: "batch",
            expected: first.shape().to_vec(),
            actual: odd.shape().to_vec(),
        });
    }

    Ok(ndarray::stack(Axis(0), &views)?)
}
