// Tests for batch normalization inside a chain: training vs inference
// behavior and running statistics.

use approx::assert_abs_diff_eq;
use neural_chain::layers::BatchNormLayer;
use neural_chain::prelude::*;

fn norm_chain(config: BatchNormConfig, dims: &[usize]) -> (Network, LayerId, LayerId) {
    let mut net = Network::new(9);
    let input = net.input(dims).unwrap();
    let norm = net.batch_norm(input, config).unwrap();
    (net, input, norm)
}

#[test]
fn test_training_normalizes_each_channel() {
    let config = BatchNormConfig {
        channelled: true,
        ..Default::default()
    };
    let (mut net, input, norm) = norm_chain(config, &[2, 2]);
    let x = tensor(
        &[2, 2, 2],
        vec![1.0, 100.0, 3.0, 300.0, 5.0, 500.0, 7.0, 700.0],
    )
    .unwrap();

    net.feed(input, x, true).unwrap();
    let out = net.compute(norm, true, true).unwrap();
    let rows = neural_chain::tensor::as_rows(&out, 2).unwrap();

    for channel in rows.columns() {
        assert_abs_diff_eq!(channel.mean().unwrap(), 0.0, epsilon = 1e-9);
        let var = channel.mapv(|v| v * v).mean().unwrap();
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-6);
    }
}

#[test]
fn test_inference_uses_moving_statistics() {
    let config = BatchNormConfig {
        momentum: 1.0,
        channelled: true,
        ..Default::default()
    };
    let (mut net, input, norm) = norm_chain(config, &[1]);
    let x = tensor(&[4, 1], vec![2.0, 4.0, 6.0, 8.0]).unwrap();

    // with momentum 1 the moving statistics equal the last batch statistics
    net.feed(input, x, true).unwrap();
    net.compute(norm, true, true).unwrap();
    let layer = net.get::<BatchNormLayer>(norm).unwrap();
    assert_abs_diff_eq!(layer.moving_mean()[0], 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(layer.moving_variance()[0], 5.0, epsilon = 1e-12);

    net.feed(input, vector(&[5.0 + 5f64.sqrt()]), false).unwrap();
    let out = net.compute(norm, false, false).unwrap();
    assert_abs_diff_eq!(out[[0]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_inference_does_not_update_statistics() {
    let (mut net, input, norm) = norm_chain(BatchNormConfig::default(), &[3]);
    net.feed(input, vector(&[10.0, 20.0, 30.0]), false).unwrap();
    net.compute(norm, false, false).unwrap();

    let layer = net.get::<BatchNormLayer>(norm).unwrap();
    assert_eq!(layer.moving_mean()[0], 0.0);
    assert_eq!(layer.moving_variance()[0], 1.0);
}

#[test]
fn test_non_affine_has_no_parameters() {
    let config = BatchNormConfig {
        affine: false,
        ..Default::default()
    };
    let (mut net, input, norm) = norm_chain(config, &[4]);
    assert_eq!(net.parameter_count(norm).unwrap(), 0);

    net.feed(input, vector(&[1.0, 2.0, 3.0, 4.0]), false).unwrap();
    net.compute(norm, true, false).unwrap();
    net.backward(norm, &vector(&[1.0, 0.0, 0.0, 0.0]), false).unwrap();
    let layer = net.get::<BatchNormLayer>(norm).unwrap();
    assert!(layer.gamma_gradient().iter().all(|&g| g == 0.0));
}

#[test]
fn test_invalid_config_rejected_by_builder() {
    let mut net = Network::new(1);
    let input = net.input(&[2]).unwrap();
    let config = BatchNormConfig {
        epsilon: 0.0,
        ..Default::default()
    };
    assert!(matches!(
        net.batch_norm(input, config),
        Err(NetworkError::InvalidConfiguration(_))
    ));
}
