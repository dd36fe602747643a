//! Layer abstractions for neural networks
//!
//! This module provides the Layer trait and implementations for the layer types
//! a chain is built from.

mod r#trait;
pub mod batchnorm;
pub mod dense;
pub mod dropout;
pub mod flatten;
pub mod input;

// Re-export the Layer trait for convenience
pub use batchnorm::{BatchNormConfig, BatchNormLayer};
pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use flatten::FlattenLayer;
pub use input::InputLayer;
pub use r#trait::Layer;

/// Handle to a layer inside a [`Network`](crate::network::Network).
///
/// Ids are only meaningful for the network that issued them. A layer's id is
/// always greater than its predecessor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub(crate) usize);

impl LayerId {
    /// Position of the layer in its network's arena.
    pub fn index(&self) -> usize {
        self.0
    }
}
