use serde::{Serialize, Deserialize};

use crate::error::{PongError, Result};
use crate::layers::dense::LayerGradients;

/// Gradient clipping methods
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum GradientClipper {
    /// Clip every gradient component into `[min, max]`
    ClipByValue { min: f32, max: f32 },

    /// Rescale each layer's gradients so their norm is at most `max_norm`
    ClipByNorm { max_norm: f32 },

    /// Rescale all gradients together so the global norm is at most `max_norm`
    ClipByGlobalNorm { max_norm: f32 },

    /// No clipping
    #[default]
    None,
}

impl GradientClipper {
    /// Bounds must be finite with `min <= max`; norms must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        match *self {
            GradientClipper::ClipByValue { min, max } => {
                if !(min.is_finite() && max.is_finite() && min <= max) {
                    return Err(PongError::invalid_parameter(
                        "gradient_clip".to_string(),
                        format!("value bounds must be finite with min <= max, got [{}, {}]", min, max),
                    ));
                }
            }
            GradientClipper::ClipByNorm { max_norm } | GradientClipper::ClipByGlobalNorm { max_norm } => {
                if !(max_norm.is_finite() && max_norm > 0.0) {
                    return Err(PongError::invalid_parameter(
                        "gradient_clip".to_string(),
                        format!("max_norm must be finite and positive, got {}", max_norm),
                    ));
                }
            }
            GradientClipper::None => {}
        }
        Ok(())
    }

    /// Clip one step's gradients for every layer in place
    pub fn clip(&self, gradients: &mut [LayerGradients]) {
        match *self {
            GradientClipper::ClipByValue { min, max } => {
                for grads in gradients.iter_mut() {
                    grads.weights.mapv_inplace(|g| g.clamp(min, max));
                    grads.biases.mapv_inplace(|g| g.clamp(min, max));
                }
            }

            GradientClipper::ClipByNorm { max_norm } => {
                for grads in gradients.iter_mut() {
                    let norm = squared_norm(grads).sqrt();
                    if norm > max_norm {
                        scale(grads, max_norm / norm);
                    }
                }
            }

            GradientClipper::ClipByGlobalNorm { max_norm } => {
                let norm = gradients.iter().map(squared_norm).sum::<f32>().sqrt();
                if norm > max_norm {
                    let factor = max_norm / norm;
                    for grads in gradients.iter_mut() {
                        scale(grads, factor);
                    }
                }
            }

            GradientClipper::None => {}
        }
    }
}

fn squared_norm(grads: &LayerGradients) -> f32 {
    grads.weights.iter().map(|&g| g * g).sum::<f32>()
        + grads.biases.iter().map(|&g| g * g).sum::<f32>()
}

fn scale(grads: &mut LayerGradients, factor: f32) {
    grads.weights.mapv_inplace(|g| g * factor);
    grads.biases.mapv_inplace(|g| g * factor);
}
