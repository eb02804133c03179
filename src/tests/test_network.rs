use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::error::PongError;
use crate::network::{argmax, NeuralNetwork};
use crate::optimizer::SGD;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn test_q_network_shape() {
    let mut network = NeuralNetwork::q_network(6, &[16, 8], 3, &mut rng()).unwrap();

    assert_eq!(network.layers.len(), 3);
    assert_eq!(network.input_size(), 6);
    assert_eq!(network.output_size(), 3);
    assert_eq!(network.layers[0].activation, Activation::Relu);
    assert_eq!(network.layers[2].activation, Activation::Linear);

    let output = network.forward(array![0.1, -0.2, 0.3, 0.0, 0.5, -0.5].view());
    assert_eq!(output.len(), 3);

    let batch = network.forward_batch(Array2::from_elem((2, 6), 0.5).view());
    assert_eq!(batch.dim(), (2, 3));
}

#[test]
fn test_invalid_layouts_rejected() {
    let mismatched = NeuralNetwork::new(&[4, 8, 2], &[Activation::Relu], &mut rng());
    assert!(matches!(mismatched, Err(PongError::InvalidParameter { .. })));

    let too_short = NeuralNetwork::new(&[4], &[], &mut rng());
    assert!(too_short.is_err());

    let empty_layer = NeuralNetwork::new(&[4, 0, 2], &[Activation::Relu, Activation::Linear], &mut rng());
    assert!(empty_layer.is_err());
}

#[test]
fn test_argmax_ties_and_nan() {
    assert_eq!(argmax(array![1.0, 3.0, 3.0].view()), 1);
    assert_eq!(argmax(array![2.0, 2.0, 2.0].view()), 0);
    assert_eq!(argmax(array![f32::NAN, 0.5, -1.0].view()), 1);
    assert_eq!(argmax(array![-5.0, -1.0, -3.0].view()), 1);
}

#[test]
fn test_copy_parameters_makes_networks_equal() {
    let source = NeuralNetwork::q_network(4, &[8], 2, &mut StdRng::seed_from_u64(1)).unwrap();
    let mut copy = NeuralNetwork::q_network(4, &[8], 2, &mut StdRng::seed_from_u64(2)).unwrap();

    assert!(copy.same_architecture(&source));
    assert!(!copy.same_parameters(&source));

    copy.copy_parameters_from(&source);
    assert!(copy.same_parameters(&source));
}

#[test]
fn test_architecture_mismatch_detected() {
    let a = NeuralNetwork::q_network(4, &[8], 2, &mut rng()).unwrap();
    let b = NeuralNetwork::q_network(4, &[9], 2, &mut rng()).unwrap();
    assert!(!a.same_architecture(&b));
}

#[test]
fn test_gradient_steps_reduce_loss() {
    let mut network = NeuralNetwork::new(&[2, 1], &[Activation::Linear], &mut rng()).unwrap();
    let mut optimizer = SGD::new();
    let inputs = array![[1.0, 0.5]];
    let target = 1.0;

    let initial_error = (network.forward_batch(inputs.view())[[0, 0]] - target).abs();
    for _ in 0..100 {
        let prediction = network.forward_batch(inputs.view())[[0, 0]];
        let errors = array![[2.0 * (prediction - target)]];
        let gradients = network.backward_batch(errors.view());
        network.apply_gradients(&gradients, &mut optimizer, 0.05);
    }
    let final_error = (network.forward_batch(inputs.view())[[0, 0]] - target).abs();

    assert!(final_error < initial_error || initial_error < 1e-4);
    assert!(final_error < 1e-3);
}

#[test]
fn test_greedy_action_matches_argmax() {
    let mut network = NeuralNetwork::q_network(3, &[5], 4, &mut rng()).unwrap();
    let input = array![0.3, -0.7, 0.9];

    let values = network.forward(input.view());
    assert_eq!(network.greedy_action(input.view()), argmax(values.view()));
}

#[test]
fn test_shape_mismatch_reported() {
    let mut network = NeuralNetwork::q_network(6, &[8], 3, &mut rng()).unwrap();
    assert_eq!(network.shape_mismatch(), None);

    network.layers[1].weights = Array2::zeros((9, 3));
    let reason = network.shape_mismatch().unwrap();
    assert!(reason.contains("layer 0 outputs 8"));

    let mut short_bias = NeuralNetwork::q_network(6, &[8], 3, &mut rng()).unwrap();
    short_bias.layers[0].biases = ndarray::Array1::zeros(5);
    assert!(short_bias.shape_mismatch().unwrap().contains("5 biases"));

    assert!(NeuralNetwork { layers: Vec::new() }.shape_mismatch().is_some());
}
