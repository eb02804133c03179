use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::layers::{DenseLayer, WeightInit};

#[test]
fn test_dense_forward_shape() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut layer = DenseLayer::new(4, 3, Activation::Relu, &mut rng).unwrap();
    let inputs = array![[0.1, 0.2, 0.3, 0.4], [1.0, -1.0, 0.5, 0.0]];

    let outputs = layer.forward_batch(inputs.view());

    assert_eq!(outputs.dim(), (2, 3));
    assert!(outputs.iter().all(|&v| v >= 0.0));
    assert_eq!(layer.input_size(), 4);
    assert_eq!(layer.output_size(), 3);
}

#[test]
fn test_dense_backward_known_values() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut layer = DenseLayer::new_with_init(2, 2, Activation::Linear, WeightInit::Zeros, &mut rng).unwrap();
    layer.weights = array![[1.0, 2.0], [3.0, 4.0]];

    let outputs = layer.forward_batch(array![[1.0, 1.0]].view());
    assert_eq!(outputs, array![[4.0, 6.0]]);

    let (input_errors, gradients) = layer.backward_batch(array![[1.0, 0.0]].view());
    assert_eq!(gradients.weights, array![[1.0, 0.0], [1.0, 0.0]]);
    assert_eq!(gradients.biases, array![1.0, 0.0]);
    assert_eq!(input_errors, array![[1.0, 3.0]]);
}

#[test]
fn test_relu_blocks_gradient_of_inactive_units() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut layer = DenseLayer::new_with_init(1, 2, Activation::Relu, WeightInit::Zeros, &mut rng).unwrap();
    layer.weights = array![[1.0, -1.0]];

    layer.forward_batch(array![[2.0]].view());
    let (_, gradients) = layer.backward_batch(array![[1.0, 1.0]].view());

    assert_eq!(gradients.weights, array![[2.0, 0.0]]);
    assert_eq!(gradients.biases, array![1.0, 0.0]);
}

#[test]
fn test_weight_init_schemes() {
    let mut rng = StdRng::seed_from_u64(11);

    let zeros = WeightInit::Zeros.initialize_weights((3, 5), &mut rng).unwrap();
    assert!(zeros.iter().all(|&w| w == 0.0));

    let limit = (6.0f32 / 8.0).sqrt();
    let xavier = WeightInit::XavierUniform.initialize_weights((3, 5), &mut rng).unwrap();
    assert_eq!(xavier.dim(), (3, 5));
    assert!(xavier.iter().all(|&w| w.abs() <= limit));

    let uniform = WeightInit::Uniform { min: -0.1, max: 0.1 }.initialize_weights((4, 4), &mut rng).unwrap();
    assert!(uniform.iter().all(|&w| (-0.1..0.1).contains(&w)));

    assert!(WeightInit::Uniform { min: 1.0, max: 1.0 }.initialize_weights((2, 2), &mut rng).is_err());
    assert_eq!(WeightInit::Zeros.initialize_biases(7).len(), 7);
}

#[test]
fn test_init_follows_activation() {
    assert_eq!(WeightInit::for_activation(&Activation::Relu), WeightInit::HeNormal);
    assert_eq!(WeightInit::for_activation(&Activation::Linear), WeightInit::XavierUniform);
}

#[test]
fn test_same_seed_same_layer() {
    let a = DenseLayer::new(6, 8, Activation::Relu, &mut StdRng::seed_from_u64(5)).unwrap();
    let b = DenseLayer::new(6, 8, Activation::Relu, &mut StdRng::seed_from_u64(5)).unwrap();
    let c = DenseLayer::new(6, 8, Activation::Relu, &mut StdRng::seed_from_u64(6)).unwrap();

    assert!(a.same_parameters(&b));
    assert!(!a.same_parameters(&c));
}
