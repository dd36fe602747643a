//! Feed-forward neural network library
//!
//! Layers are chained into a [`Network`](network::Network), wrapped in a
//! [`Model`](model::Model) and trained with minibatch gradient descent using
//! a pluggable update strategy.
//!
//! # Modules
//!
//! - `layers`: Layer trait and implementations (Input, Dense, Dropout, BatchNorm, Flatten)
//! - `network`: Arena owning a chain of layers and driving forward/backward passes
//! - `model`: Input/output pair over a network with predict and training entry points
//! - `optimizers`: Optimizer trait, strategies (Vanilla, Momentum, RMSProp, Adam) and the driver
//! - `utils`: Activations, regularizers, cost functions and seeded RNG helpers
//! - `shape` / `tensor`: Shape contracts and ndarray helpers
//! - `config`: Training configuration structures
//! - `architecture`: Architecture configuration and model building
//!
//! # Example
//!
//! ```
//! use neural_chain::prelude::*;
//!
//! let mut net = Network::new(42);
//! let input = net.input(&[2]).unwrap();
//! let hidden = net.dense(input, 8, Activation::Tanh).unwrap();
//! let output = net.dense(hidden, 1, Activation::Sigmoid).unwrap();
//! let mut model = Model::new(net, input, output).unwrap();
//!
//! let inputs = vec![vector(&[0.0, 1.0]), vector(&[1.0, 1.0])];
//! let targets = vec![vector(&[1.0]), vector(&[0.0])];
//! let mut trainer = GradientDescent::new(2, 0.1, Adam::default(), 7).unwrap();
//! let loss = trainer.run(&mut model, &inputs, &targets).unwrap();
//! assert!(loss.is_finite());
//! ```

pub mod architecture;
pub mod config;
pub mod error;
pub mod layers;
pub mod model;
pub mod network;
pub mod optimizers;
pub mod shape;
pub mod tensor;
pub mod utils;

pub use error::{NetworkError, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::error::{NetworkError, Result};
    pub use crate::layers::{BatchNormConfig, Layer, LayerId};
    pub use crate::model::Model;
    pub use crate::network::Network;
    pub use crate::optimizers::{
        Adam, GradientDescent, Momentum, Optimizer, OptimizerKind, RmsProp, Vanilla,
    };
    pub use crate::shape::Shape;
    pub use crate::tensor::{stack, tensor, vector, Tensor};
    pub use crate::utils::{Activation, Cost, MeanSquare, Regularizer};
}
