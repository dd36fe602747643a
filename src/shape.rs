//! Shape contracts attached to every layer's input and output.
//!
//! A [`Shape`] describes a single sample; the batch dimension is never part
//! of it. A batched tensor carries one extra leading axis whose extent is the
//! minibatch size, and its trailing axes must equal the shape exactly.

use crate::error::{NetworkError, Result};
use crate::tensor::Tensor;
use std::fmt;

/// Fixed, non-empty sequence of positive dimension sizes for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Creates a shape, rejecting empty shapes and zero-sized dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use neural_chain::shape::Shape;
    ///
    /// let shape = Shape::new(&[3, 4]).unwrap();
    /// assert_eq!(shape.size(), 12);
    /// assert!(Shape::new(&[]).is_err());
    /// assert!(Shape::new(&[2, 0]).is_err());
    /// ```
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() {
            return Err(NetworkError::config("shape cannot be 0-dimensional"));
        }
        if dims.contains(&0) {
            return Err(NetworkError::config(format!(
                "shape {:?} has a zero-sized dimension",
                dims
            )));
        }
        Ok(Shape(dims.to_vec()))
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of elements in one sample.
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// Extent of the last axis.
    pub fn last(&self) -> usize {
        // non-empty by construction
        self.0[self.0.len() - 1]
    }

    /// Same shape with the last axis replaced by `n`.
    pub fn with_last(&self, n: usize) -> Result<Shape> {
        let mut dims = self.0.clone();
        let last = dims.len() - 1;
        dims[last] = n;
        Shape::new(&dims)
    }

    /// One-dimensional shape holding every element of `self`.
    pub fn flattened(&self) -> Shape {
        Shape(vec![self.size()])
    }

    /// Concrete tensor dimensions, with a leading batch axis when `batch` is set.
    pub fn tensor_dims(&self, batch: Option<usize>) -> Vec<usize> {
        match batch {
            Some(n) => std::iter::once(n).chain(self.0.iter().copied()).collect(),
            None => self.0.clone(),
        }
    }

    /// Validates `t` against this contract.
    ///
    /// Unbatched tensors must match exactly; batched tensors must have one
    /// extra, non-empty leading axis followed by exactly this shape. Returns
    /// the batch extent (1 when unbatched).
    pub fn check(&self, t: &Tensor, batched: bool, layer: &'static str) -> Result<usize> {
        let actual = t.shape();
        let ok = if batched {
            actual.len() == self.0.len() + 1 && actual[0] > 0 && actual[1..] == self.0[..]
        } else {
            actual == &self.0[..]
        };

        if !ok {
            let expected = if batched {
                self.tensor_dims(Some(actual.first().copied().unwrap_or(0)))
            } else {
                self.0.clone()
            };
            return Err(NetworkError::ShapeMismatch {
                layer,
                expected,
                actual: actual.to_vec(),
            });
        }

        Ok(if batched { actual[0] } else { 1 })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}
