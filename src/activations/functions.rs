use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

/// Non-linearity applied element-wise after a dense layer's affine map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Relu,
    /// Identity; used on the value output layer
    Linear,
    Tanh,
    LeakyRelu { alpha: f32 },
}

impl Activation {
    /// Activation of a single pre-activation value
    pub fn value(&self, x: f32) -> f32 {
        match *self {
            Activation::Relu => x.max(0.0),
            Activation::Linear => x,
            Activation::Tanh => x.tanh(),
            Activation::LeakyRelu { alpha } => if x > 0.0 { x } else { alpha * x },
        }
    }

    /// Slope at a single pre-activation value. ReLU-style kinks take the left slope.
    pub fn slope(&self, x: f32) -> f32 {
        match *self {
            Activation::Relu => if x > 0.0 { 1.0 } else { 0.0 },
            Activation::Linear => 1.0,
            Activation::Tanh => 1.0 - x.tanh().powi(2),
            Activation::LeakyRelu { alpha } => if x > 0.0 { 1.0 } else { alpha },
        }
    }

    /// Activate a `(batch, units)` matrix in place.
    pub fn apply_batch(&self, pre_activation: &mut Array2<f32>) {
        if *self != Activation::Linear {
            pre_activation.mapv_inplace(|x| self.value(x));
        }
    }

    /// Element-wise slopes for a `(batch, units)` pre-activation matrix.
    pub fn derivative_batch(&self, pre_activation: ArrayView2<f32>) -> Array2<f32> {
        pre_activation.mapv(|x| self.slope(x))
    }
}
