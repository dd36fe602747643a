// Tests for backward propagation through a chain: gradient accumulation,
// reset_deltas and weight updates through the optimizer strategies.

use neural_chain::layers::{BatchNormLayer, DenseLayer};
use neural_chain::optimizers::descend;
use neural_chain::prelude::*;

fn build(seed: u64) -> (Network, LayerId, LayerId, LayerId) {
    let mut net = Network::new(seed);
    let input = net.input(&[3]).unwrap();
    let hidden = net.dense(input, 4, Activation::Tanh).unwrap();
    let norm = net.batch_norm(hidden, BatchNormConfig::default()).unwrap();
    let output = net.dense(norm, 2, Activation::Linear).unwrap();
    (net, input, hidden, output)
}

fn batch() -> Tensor {
    tensor(&[2, 3], vec![0.5, -1.0, 0.25, 1.5, 0.0, -0.75]).unwrap()
}

fn forward_backward(net: &mut Network, input: LayerId, output: LayerId, error: &Tensor) {
    net.feed(input, batch(), true).unwrap();
    net.compute(output, true, true).unwrap();
    net.backward(output, error, true).unwrap();
}

// ============================================================================
// Gradient accumulation
// ============================================================================

mod accumulation_tests {
    use super::*;

    #[test]
    fn test_backward_accumulates() {
        let (mut net, input, hidden, output) = build(1);
        let error = tensor(&[2, 2], vec![1.0, -0.5, 0.25, 2.0]).unwrap();

        forward_backward(&mut net, input, output, &error);
        let once = net.get::<DenseLayer>(hidden).unwrap().weight_gradient().clone();
        forward_backward(&mut net, input, output, &error);
        let twice = net.get::<DenseLayer>(hidden).unwrap().weight_gradient().clone();

        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((2.0 * a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_reset_deltas_is_idempotent() {
        let (mut net, input, hidden, output) = build(2);
        let error = tensor(&[2, 2], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        forward_backward(&mut net, input, output, &error);

        let norm = net.prev(output).unwrap().unwrap();
        assert!(net
            .get::<DenseLayer>(output)
            .unwrap()
            .weight_gradient()
            .iter()
            .any(|&g| g != 0.0));

        net.reset_deltas(output).unwrap();
        net.reset_deltas(output).unwrap();

        for id in [hidden, output] {
            let layer = net.get::<DenseLayer>(id).unwrap();
            assert!(layer.weight_gradient().iter().all(|&g| g == 0.0));
            assert!(layer.bias_gradient().iter().all(|&g| g == 0.0));
        }
        let bn = net.get::<BatchNormLayer>(norm).unwrap();
        assert!(bn.gamma_gradient().iter().all(|&g| g == 0.0));
        assert!(bn.beta_gradient().iter().all(|&g| g == 0.0));
    }
}

// ============================================================================
// Weight updates
// ============================================================================

mod update_tests {
    use super::*;

    fn loss(net: &mut Network, input: LayerId, output: LayerId, target: &Tensor) -> f64 {
        net.feed(input, batch(), true).unwrap();
        let prediction = net.compute(output, true, true).unwrap();
        MeanSquare.calculate(target, &prediction).unwrap()
    }

    fn descent_step_reduces_loss<O: Optimizer>(mut optimizer: O, learning_rate: f64) {
        let (mut net, input, _, output) = build(3);
        let target = tensor(&[2, 2], vec![0.0, 1.0, 1.0, 0.0]).unwrap();

        net.feed(input, batch(), true).unwrap();
        let prediction = net.compute(output, true, true).unwrap();
        let before = MeanSquare.calculate(&target, &prediction).unwrap();
        let error = MeanSquare.derivative(&target, &prediction).unwrap();
        net.backward(output, &error, true).unwrap();
        optimizer
            .update_weights(&mut net, output, 2, learning_rate)
            .unwrap();

        let after = loss(&mut net, input, output, &target);
        assert!(after < before, "{} !< {}", after, before);
    }

    #[test]
    fn test_vanilla_step() {
        descent_step_reduces_loss(Vanilla, 0.01);
    }

    #[test]
    fn test_momentum_step() {
        descent_step_reduces_loss(Momentum::default(), 0.01);
    }

    #[test]
    fn test_rmsprop_step() {
        descent_step_reduces_loss(RmsProp::default(), 0.001);
    }

    #[test]
    fn test_adam_step() {
        descent_step_reduces_loss(Adam::default(), 0.001);
    }

    #[test]
    fn test_update_resets_deltas() {
        let (mut net, input, hidden, output) = build(4);
        let error = tensor(&[2, 2], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        forward_backward(&mut net, input, output, &error);

        descend(&mut Vanilla, &mut net, output, 2, 0.1).unwrap();
        let layer = net.get::<DenseLayer>(hidden).unwrap();
        assert!(layer.weight_gradient().iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_adam_timestep_advances_per_minibatch() {
        let (mut net, input, _, output) = build(5);
        let error = tensor(&[2, 2], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let mut adam = Adam::default();

        for step in 1..=3 {
            forward_backward(&mut net, input, output, &error);
            adam.update_weights(&mut net, output, 2, 0.01).unwrap();
            assert_eq!(adam.timestep(), step);
        }
    }
}
