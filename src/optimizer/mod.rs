//! Gradient-descent optimizers for the live estimator.
//!
//! Optimizers keep per-layer state (Adam's moments, RMSProp's running
//! squares) indexed by layer position, and that state is part of every
//! checkpoint so a resumed run continues with the same update dynamics.

pub mod gradient_clipper;

use ndarray::{Array2, Array1};
use serde::{Serialize, Deserialize};

use crate::layers::DenseLayer;

pub use gradient_clipper::GradientClipper;

pub trait Optimizer {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);

    /// Called once every layer has been updated for the current step
    fn finish_step(&mut self) {}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
    RMSProp(RMSProp),
}

impl OptimizerWrapper {
    /// Whether the optimizer state was built for layers of these shapes
    pub fn matches_layers(&self, layers: &[DenseLayer]) -> bool {
        match self {
            OptimizerWrapper::SGD(_) => true,
            OptimizerWrapper::Adam(adam) => {
                shapes_match(&adam.m_weights, &adam.m_biases, layers)
                    && shapes_match(&adam.v_weights, &adam.v_biases, layers)
            }
            OptimizerWrapper::RMSProp(rms) => shapes_match(&rms.v_weights, &rms.v_biases, layers),
        }
    }
}

fn shapes_match(weights: &[Array2<f32>], biases: &[Array1<f32>], layers: &[DenseLayer]) -> bool {
    weights.len() == layers.len()
        && biases.len() == layers.len()
        && layers.iter().zip(weights).zip(biases).all(|((layer, w), b)| {
            w.dim() == layer.weights.dim() && b.dim() == layer.biases.dim()
        })
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
        }
    }

    fn finish_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.finish_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.finish_step(),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.finish_step(),
        }
    }
}

/// Optimizer selection as it appears in configuration files
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum OptimizerConfig {
    Sgd,
    Adam { beta1: f32, beta2: f32, epsilon: f32 },
    RmsProp { beta: f32, epsilon: f32 },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam { beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

impl OptimizerConfig {
    /// Build fresh optimizer state sized for `layers`
    pub fn build(&self, layers: &[DenseLayer]) -> OptimizerWrapper {
        match *self {
            OptimizerConfig::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerConfig::Adam { beta1, beta2, epsilon } => {
                OptimizerWrapper::Adam(Adam::new(layers, beta1, beta2, epsilon))
            }
            OptimizerConfig::RmsProp { beta, epsilon } => {
                OptimizerWrapper::RMSProp(RMSProp::new(layers, beta, epsilon))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    /// 1-based step counter used for bias correction
    pub t: usize,
}

impl Adam {
    pub fn new(layers: &[DenseLayer], beta1: f32, beta2: f32, epsilon: f32) -> Self {
        let m_weights = layers
            .iter()
            .map(|layer| Array2::<f32>::zeros(layer.weights.dim()))
            .collect();
        let v_weights = layers
            .iter()
            .map(|layer| Array2::<f32>::zeros(layer.weights.dim()))
            .collect();
        let m_biases = layers
            .iter()
            .map(|layer| Array1::<f32>::zeros(layer.biases.dim()))
            .collect();
        let v_biases = layers
            .iter()
            .map(|layer| Array1::<f32>::zeros(layer.biases.dim()))
            .collect();

        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights,
            v_weights,
            m_biases,
            v_biases,
            t: 1,
        }
    }

    pub fn default(layers: &[DenseLayer]) -> Self {
        Self::new(layers, 0.9, 0.999, 1e-8)
    }

    fn corrections(&self) -> (f32, f32) {
        (
            1.0 - self.beta1.powi(self.t as i32),
            1.0 - self.beta2.powi(self.t as i32),
        )
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.corrections();

        let m = &mut self.m_weights[layer];
        let v = &mut self.v_weights[layer];

        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(weights)
            .and(&*m)
            .and(&*v)
            .for_each(|w, &m, &v| *w -= learning_rate * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.corrections();

        let m = &mut self.m_biases[layer];
        let v = &mut self.v_biases[layer];

        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(biases)
            .and(&*m)
            .and(&*v)
            .for_each(|b, &m, &v| *b -= learning_rate * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn finish_step(&mut self) {
        self.t += 1;
    }
}

/// RMSProp optimizer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RMSProp {
    pub beta: f32,
    pub epsilon: f32,
    v_weights: Vec<Array2<f32>>,
    v_biases: Vec<Array1<f32>>,
}

impl RMSProp {
    pub fn new(layers: &[DenseLayer], beta: f32, epsilon: f32) -> Self {
        let v_weights = layers
            .iter()
            .map(|layer| Array2::<f32>::zeros(layer.weights.dim()))
            .collect();
        let v_biases = layers
            .iter()
            .map(|layer| Array1::<f32>::zeros(layer.biases.dim()))
            .collect();

        RMSProp {
            beta,
            epsilon,
            v_weights,
            v_biases,
        }
    }
}

impl Optimizer for RMSProp {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta, eps) = (self.beta, self.epsilon);
        let v = &mut self.v_weights[layer];

        v.zip_mut_with(gradients, |v, &g| *v = beta * *v + (1.0 - beta) * g * g);

        ndarray::Zip::from(weights)
            .and(gradients)
            .and(&*v)
            .for_each(|w, &g, &v| *w -= learning_rate * g / (v.sqrt() + eps));
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta, eps) = (self.beta, self.epsilon);
        let v = &mut self.v_biases[layer];

        v.zip_mut_with(gradients, |v, &g| *v = beta * *v + (1.0 - beta) * g * g);

        ndarray::Zip::from(biases)
            .and(gradients)
            .and(&*v)
            .for_each(|b, &g, &v| *b -= learning_rate * g / (v.sqrt() + eps));
    }
}
