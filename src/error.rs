//! Error types shared by every layer, optimizer and configuration loader.

use thiserror::Error;

/// Errors raised while building or running a layer chain.
///
/// Shape and configuration errors are programming errors: they abort the
/// operation that detected them and leave no partial result behind.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A tensor did not match the shape contract of the layer it was given to.
    #[error("{layer}: shape mismatch, expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        layer: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A hyperparameter or chain topology was rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `run` was handed a different number of inputs and targets.
    #[error("got {inputs} inputs but {targets} targets")]
    LengthMismatch { inputs: usize, targets: usize },

    /// A `LayerId` that does not belong to this network.
    #[error("unknown layer id {0}")]
    UnknownLayer(usize),

    /// The input layer was computed before anything was fed to it.
    #[error("input layer has not been fed")]
    MissingInput,

    #[error(transparent)]
    Tensor(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NetworkError {
    /// Shorthand for [`NetworkError::InvalidConfiguration`].
    pub fn config(message: impl Into<String>) -> Self {
        NetworkError::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
