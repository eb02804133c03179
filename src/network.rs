use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{PongError, Result};
use crate::layers::DenseLayer;
use crate::layers::dense::LayerGradients;
use crate::optimizer::Optimizer;

/// A feed-forward network of dense layers used as the action-value estimator.
///
/// The network maps an observation vector to one value per action. The agent
/// owns two instances: the live network, updated by gradient steps, and the
/// target network, which only ever changes through [`NeuralNetwork::copy_parameters_from`].
/// Optimizer state is held by the agent rather than the network so that the
/// target copy carries parameters only.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
}

impl NeuralNetwork {
    /// Create a new network with the given layer sizes and activations.
    ///
    /// `layer_sizes` includes the input and output sizes, so it needs exactly
    /// one more entry than `activations`.
    pub fn new<R: Rng + ?Sized>(layer_sizes: &[usize], activations: &[Activation], rng: &mut R) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(PongError::invalid_parameter("layer_sizes", "need at least input and output sizes"));
        }
        if layer_sizes.len() - 1 != activations.len() {
            return Err(PongError::invalid_parameter(
                "activations".to_string(),
                format!("expected {} activations, got {}", layer_sizes.len() - 1, activations.len()),
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(PongError::invalid_parameter("layer_sizes", "every layer needs at least one unit"));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(NeuralNetwork { layers })
    }

    /// Create a Q-network: ReLU hidden layers and a linear output layer.
    pub fn q_network<R: Rng + ?Sized>(input_size: usize, hidden: &[usize], output_size: usize, rng: &mut R) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(hidden.len() + 2);
        layer_sizes.push(input_size);
        layer_sizes.extend_from_slice(hidden);
        layer_sizes.push(output_size);

        let mut activations = vec![Activation::Relu; hidden.len()];
        activations.push(Activation::Linear);

        Self::new(&layer_sizes, &activations, rng)
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    /// Perform a forward pass for a single input vector.
    pub fn forward(&mut self, input: ArrayView1<f32>) -> Array1<f32> {
        let output = self.forward_batch(input.insert_axis(Axis(0)));
        output.index_axis_move(Axis(0), 0)
    }

    /// Perform a forward pass for a batch of input vectors, one per row.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    /// Index of the highest value the network assigns to `input`.
    ///
    /// Ties resolve to the lowest index; NaN values never win.
    pub fn greedy_action(&mut self, input: ArrayView1<f32>) -> usize {
        argmax(self.forward(input).view())
    }

    /// Backpropagate output errors from the most recent `forward_batch`.
    pub fn backward_batch(&mut self, output_errors: ArrayView2<f32>) -> Vec<LayerGradients> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for layer in self.layers.iter().rev() {
            let (input_error, layer_gradients) = layer.backward_batch(current_error.view());
            gradients.push(layer_gradients);
            current_error = input_error;
        }

        gradients.reverse();
        gradients
    }

    /// Apply one optimizer step with precomputed gradients.
    pub fn apply_gradients<O: Optimizer>(&mut self, gradients: &[LayerGradients], optimizer: &mut O, learning_rate: f32) {
        for (index, (layer, grads)) in self.layers.iter_mut().zip(gradients).enumerate() {
            optimizer.update_weights(index, &mut layer.weights, &grads.weights, learning_rate);
            optimizer.update_biases(index, &mut layer.biases, &grads.biases, learning_rate);
        }
        optimizer.finish_step();
    }

    /// Overwrite every parameter with those of `source` (hard sync).
    pub fn copy_parameters_from(&mut self, source: &NeuralNetwork) {
        self.layers = source.layers.clone();
    }

    /// True when both networks hold bit-identical parameters
    pub fn same_parameters(&self, other: &NeuralNetwork) -> bool {
        self.layers.len() == other.layers.len()
            && self.layers.iter().zip(&other.layers).all(|(a, b)| a.same_parameters(b))
    }

    /// Describe the first layer whose shape cannot feed the next, if any.
    ///
    /// Each layer's bias length must equal its output width, and each
    /// layer's output width must equal the next layer's input width.
    pub fn shape_mismatch(&self) -> Option<String> {
        if self.layers.is_empty() {
            return Some("network has no layers".to_string());
        }
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.biases.len() != layer.output_size() {
                return Some(format!(
                    "layer {} has {} biases for {} outputs",
                    index,
                    layer.biases.len(),
                    layer.output_size()
                ));
            }
        }
        self.layers.windows(2).enumerate().find_map(|(index, pair)| {
            (pair[0].output_size() != pair[1].input_size()).then(|| {
                format!(
                    "layer {} outputs {} values but layer {} takes {}",
                    index,
                    pair[0].output_size(),
                    index + 1,
                    pair[1].input_size()
                )
            })
        })
    }

    /// True when both networks have the same layer shapes and activations
    pub fn same_architecture(&self, other: &NeuralNetwork) -> bool {
        self.layers.len() == other.layers.len()
            && self.layers.iter().zip(&other.layers).all(|(a, b)| {
                a.weights.dim() == b.weights.dim()
                    && a.biases.dim() == b.biases.dim()
                    && a.activation == b.activation
            })
    }
}

/// Index of the largest finite-comparable value, lowest index on ties
pub fn argmax(values: ArrayView1<f32>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_value), (idx, &value)| {
            if value > best_value {
                (idx, value)
            } else {
                (best, best_value)
            }
        })
        .0
}
