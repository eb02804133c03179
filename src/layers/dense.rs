use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::Result;
use super::initialization::WeightInit;

/// A fully connected (dense) layer in the action-value estimator.
///
/// The layer caches its last batch of inputs and pre-activation outputs so
/// that `backward_batch` can be called right after `forward_batch`. The caches
/// are not part of the persisted parameters.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

/// Gradients produced by one backward pass through a dense layer
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl DenseLayer {
    /// Create a layer whose weights are drawn with the initialization
    /// recommended for `activation`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        Self::new_with_init(input_size, output_size, activation, WeightInit::for_activation(&activation), rng)
    }

    pub fn new_with_init<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        let weights = init.initialize_weights((input_size, output_size), rng)?;
        let biases = init.initialize_biases(output_size);
        Ok(DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        })
    }

    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Backpropagate `output_errors` (dLoss/dOutput) through the layer.
    ///
    /// Returns the error with respect to the layer inputs alongside the
    /// parameter gradients. Panics if no forward pass preceded the call,
    /// which is a programming error inside the network.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> (Array2<f32>, LayerGradients) {
        let pre_activation_output = self.pre_activation_output.as_ref()
            .expect("forward_batch() must be called before backward_batch()");
        let inputs = self.inputs.as_ref()
            .expect("forward_batch() must be called before backward_batch()");

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        let input_errors = adjusted_error.dot(&self.weights.t());

        (input_errors, LayerGradients { weights: weight_gradients, biases: bias_gradients })
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    /// True when both layers hold exactly the same parameters
    pub fn same_parameters(&self, other: &DenseLayer) -> bool {
        self.weights == other.weights && self.biases == other.biases
    }
}
