//! Arena that owns every layer of a chain.
//!
//! Layers are stored in insertion order and addressed by [`LayerId`]. Each
//! node records its predecessor and successor, so forward propagation pulls
//! outputs up from the head of the chain and backward propagation pushes
//! gradients down toward it. A layer can only be appended after its
//! predecessor, which keeps every predecessor at a lower index than its
//! successor.

use crate::error::{NetworkError, Result};
use crate::layers::{
    BatchNormConfig, BatchNormLayer, DenseLayer, DropoutLayer, FlattenLayer, InputLayer, Layer,
    LayerId,
};
use crate::optimizers::Optimizer;
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::utils::rng::seeded;
use crate::utils::{Activation, Regularizer};
use rand::rngs::StdRng;
use tracing::{debug, trace};

struct Node {
    layer: Box<dyn Layer>,
    prev: Option<LayerId>,
    next: Option<LayerId>,
}

/// Layer chain plus the generator used for weight initialization and dropout.
///
/// # Example
///
/// ```
/// use neural_chain::network::Network;
/// use neural_chain::utils::Activation;
///
/// let mut net = Network::new(42);
/// let input = net.input(&[2]).unwrap();
/// let hidden = net.dense(input, 8, Activation::Tanh).unwrap();
/// let output = net.dense(hidden, 1, Activation::Sigmoid).unwrap();
/// assert_eq!(net.layer(output).unwrap().output_shape().dims(), &[1]);
/// assert_eq!(net.parameter_count(output).unwrap(), 2 * 8 + 8 + 8 + 1);
/// ```
pub struct Network {
    nodes: Vec<Node>,
    rng: StdRng,
}

impl Network {
    pub fn new(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            rng: seeded(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: LayerId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(NetworkError::UnknownLayer(id.0))
    }

    fn node_mut(&mut self, id: LayerId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(NetworkError::UnknownLayer(id.0))
    }

    pub fn layer(&self, id: LayerId) -> Result<&dyn Layer> {
        Ok(self.node(id)?.layer.as_ref())
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut dyn Layer> {
        Ok(self.node_mut(id)?.layer.as_mut())
    }

    /// Layer `id` as its concrete type, `None` if it is of another type.
    ///
    /// ```
    /// use neural_chain::layers::DenseLayer;
    /// use neural_chain::network::Network;
    /// use neural_chain::utils::Activation;
    ///
    /// let mut net = Network::new(1);
    /// let input = net.input(&[3]).unwrap();
    /// let dense = net.dense(input, 2, Activation::Relu).unwrap();
    /// assert_eq!(net.get::<DenseLayer>(dense).unwrap().weights().dim(), (2, 3));
    /// assert!(net.get::<DenseLayer>(input).is_none());
    /// ```
    pub fn get<T: Layer + 'static>(&self, id: LayerId) -> Option<&T> {
        self.nodes.get(id.0)?.layer.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Layer + 'static>(&mut self, id: LayerId) -> Option<&mut T> {
        self.nodes.get_mut(id.0)?.layer.as_any_mut().downcast_mut::<T>()
    }

    /// Predecessor of `id`, `None` for an input layer.
    pub fn prev(&self, id: LayerId) -> Result<Option<LayerId>> {
        Ok(self.node(id)?.prev)
    }

    /// Successor of `id`, `None` for the end of a chain.
    pub fn next(&self, id: LayerId) -> Result<Option<LayerId>> {
        Ok(self.node(id)?.next)
    }

    /// Walks from `id` back to the head of its chain.
    pub fn head(&self, id: LayerId) -> Result<LayerId> {
        let mut current = id;
        while let Some(prev) = self.prev(current)? {
            current = prev;
        }
        Ok(current)
    }

    fn output_shape(&self, id: LayerId) -> Result<Shape> {
        Ok(self.layer(id)?.output_shape().clone())
    }

    /// Appends `layer` after `prev`.
    ///
    /// Fails if `prev` already has a successor or if its output shape differs
    /// from the new layer's input shape. Input layers are pushed with
    /// `prev = None`.
    pub fn push(&mut self, prev: Option<LayerId>, layer: Box<dyn Layer>) -> Result<LayerId> {
        if let Some(p) = prev {
            let node = self.node(p)?;
            if node.next.is_some() {
                return Err(NetworkError::config(format!(
                    "layer {} already has a successor",
                    p.0
                )));
            }
            let produced = node.layer.output_shape();
            if produced != layer.input_shape() {
                return Err(NetworkError::ShapeMismatch {
                    layer: layer.kind(),
                    expected: layer.input_shape().dims().to_vec(),
                    actual: produced.dims().to_vec(),
                });
            }
        }

        let id = LayerId(self.nodes.len());
        debug!(
            id = id.0,
            kind = layer.kind(),
            input = %layer.input_shape(),
            output = %layer.output_shape(),
            parameters = layer.parameter_count(),
            "adding layer"
        );

        if let Some(p) = prev {
            self.node_mut(p)?.next = Some(id);
        }
        self.nodes.push(Node {
            layer,
            prev,
            next: None,
        });
        Ok(id)
    }

    /// Starts a new chain with an input layer of the given sample shape.
    pub fn input(&mut self, dims: &[usize]) -> Result<LayerId> {
        let shape = Shape::new(dims)?;
        self.push(None, Box::new(InputLayer::new(shape)))
    }

    pub fn dense(&mut self, prev: LayerId, units: usize, activation: Activation) -> Result<LayerId> {
        self.dense_with(prev, units, activation, Regularizer::None)
    }

    pub fn dense_with(
        &mut self,
        prev: LayerId,
        units: usize,
        activation: Activation,
        regularizer: Regularizer,
    ) -> Result<LayerId> {
        let shape = self.output_shape(prev)?;
        let layer = DenseLayer::new(shape, units, activation, regularizer, &mut self.rng)?;
        self.push(Some(prev), Box::new(layer))
    }

    pub fn dropout(&mut self, prev: LayerId, probability: f64) -> Result<LayerId> {
        let shape = self.output_shape(prev)?;
        self.push(Some(prev), Box::new(DropoutLayer::new(shape, probability)?))
    }

    pub fn batch_norm(&mut self, prev: LayerId, config: BatchNormConfig) -> Result<LayerId> {
        let shape = self.output_shape(prev)?;
        self.push(Some(prev), Box::new(BatchNormLayer::new(shape, config)?))
    }

    pub fn flatten(&mut self, prev: LayerId) -> Result<LayerId> {
        let shape = self.output_shape(prev)?;
        self.push(Some(prev), Box::new(FlattenLayer::new(shape)))
    }

    /// Hands `input` to the input layer `id` for the next forward pass.
    pub fn feed(&mut self, id: LayerId, input: Tensor, batched: bool) -> Result<()> {
        let layer = self.node_mut(id)?.layer.as_mut();
        let kind = layer.kind();
        let input_layer = layer
            .as_input_mut()
            .ok_or_else(|| NetworkError::config(format!("layer {} ({}) is not an input", id.0, kind)))?;
        input_layer.feed(input, batched)
    }

    /// Computes layer `id`, recursively computing its predecessors first.
    pub fn compute(&mut self, id: LayerId, training: bool, batched: bool) -> Result<Tensor> {
        let input = match self.prev(id)? {
            Some(prev) => Some(self.compute(prev, training, batched)?),
            None => None,
        };

        let node = &mut self.nodes[id.0];
        trace!(id = id.0, kind = node.layer.kind(), training, batched, "compute");
        node.layer
            .compute(input.as_ref(), training, batched, &mut self.rng)
    }

    /// Propagates `error` (the loss gradient w.r.t. the output of `id`) back
    /// through `id` and every predecessor, accumulating parameter gradients.
    pub fn backward(&mut self, id: LayerId, error: &Tensor, batched: bool) -> Result<()> {
        let prev = self.prev(id)?;

        let grad = {
            let (before, rest) = self.nodes.split_at_mut(id.0);
            let input = prev.map(|p| before[p.0].layer.last_output());
            trace!(id = id.0, kind = rest[0].layer.kind(), "backward");
            rest[0].layer.backward(error, input, batched)?
        };

        match (prev, grad) {
            (Some(p), Some(grad)) => self.backward(p, &grad, batched),
            _ => Ok(()),
        }
    }

    /// Applies accumulated gradients of `id` and all its predecessors.
    pub fn update_weights(
        &mut self,
        id: LayerId,
        optimizer: &mut dyn Optimizer,
        scale: f64,
    ) -> Result<()> {
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = self.node_mut(cid)?;
            node.layer.update_weights(cid, optimizer, scale)?;
            current = node.prev;
        }
        Ok(())
    }

    /// Zeroes accumulated gradients of `id` and all its predecessors.
    pub fn reset_deltas(&mut self, id: LayerId) -> Result<()> {
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = self.node_mut(cid)?;
            node.layer.reset_deltas();
            current = node.prev;
        }
        Ok(())
    }

    /// Trainable parameters of `id` and all its predecessors.
    pub fn parameter_count(&self, id: LayerId) -> Result<usize> {
        let mut total = 0;
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = self.node(cid)?;
            total += node.layer.parameter_count();
            current = node.prev;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::vector;

    #[test]
    fn test_builder_links_layers() {
        let mut net = Network::new(1);
        let input = net.input(&[3]).unwrap();
        let dense = net.dense(input, 2, Activation::Relu).unwrap();

        assert_eq!(net.prev(dense).unwrap(), Some(input));
        assert_eq!(net.next(input).unwrap(), Some(dense));
        assert_eq!(net.head(dense).unwrap(), input);
        assert!(net.index_ordered());
    }

    #[test]
    fn test_builder_rejects_second_successor() {
        let mut net = Network::new(1);
        let input = net.input(&[3]).unwrap();
        net.dense(input, 2, Activation::Relu).unwrap();
        assert!(net.dense(input, 4, Activation::Relu).is_err());
    }

    #[test]
    fn test_push_rejects_incompatible_shape() {
        let mut net = Network::new(1);
        let input = net.input(&[3]).unwrap();
        let flatten = FlattenLayer::new(Shape::new(&[2, 2]).unwrap());
        assert!(matches!(
            net.push(Some(input), Box::new(flatten)),
            Err(NetworkError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_layer() {
        let net = Network::new(1);
        assert!(matches!(
            net.layer(LayerId(5)),
            Err(NetworkError::UnknownLayer(5))
        ));
    }

    #[test]
    fn test_feed_requires_input_layer() {
        let mut net = Network::new(1);
        let input = net.input(&[2]).unwrap();
        let dense = net.dense(input, 2, Activation::Linear).unwrap();
        assert!(net.feed(dense, vector(&[1.0, 2.0]), false).is_err());
        assert!(net.feed(input, vector(&[1.0, 2.0]), false).is_ok());
    }

    #[test]
    fn test_compute_and_backward_through_chain() {
        let mut net = Network::new(1);
        let input = net.input(&[2]).unwrap();
        let hidden = net.dense(input, 3, Activation::Tanh).unwrap();
        let output = net.dense(hidden, 1, Activation::Linear).unwrap();

        net.feed(input, vector(&[0.5, -0.5]), false).unwrap();
        let out = net.compute(output, true, false).unwrap();
        assert_eq!(out.shape(), &[1]);

        net.backward(output, &vector(&[1.0]), false).unwrap();
        net.reset_deltas(output).unwrap();
    }

    impl Network {
        fn index_ordered(&self) -> bool {
            self.nodes
                .iter()
                .enumerate()
                .all(|(i, n)| n.prev.map_or(true, |p| p.0 < i))
        }
    }
}
