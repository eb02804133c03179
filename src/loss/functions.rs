use ndarray::{Array1, ArrayView1};
use serde::{Serialize, Deserialize};

/// Regression loss between the estimator's values for the taken actions and
/// their bootstrapped targets.
pub trait Loss: Send + Sync {
    /// Mean loss over the batch
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32;

    /// Gradient of the mean loss with respect to each prediction
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32>;
}

/// Mean Squared Error loss
pub struct MSE;

impl Loss for MSE {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        let diff = &predictions - &targets;
        (&diff * &diff).sum() / predictions.len() as f32
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        (&predictions - &targets) * (2.0 / predictions.len() as f32)
    }
}

/// Huber loss (smooth L1)
pub struct HuberLoss {
    pub delta: f32,
}

impl HuberLoss {
    pub fn new(delta: f32) -> Self {
        HuberLoss { delta }
    }
}

impl Loss for HuberLoss {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| {
            let abs_x = x.abs();
            if abs_x <= self.delta {
                0.5 * x * x
            } else {
                self.delta * abs_x - 0.5 * self.delta * self.delta
            }
        }).sum() / predictions.len() as f32
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let diff = &predictions - &targets;
        diff.mapv(|x| {
            if x.abs() <= self.delta {
                x
            } else {
                self.delta * x.signum()
            }
        }) / predictions.len() as f32
    }
}

/// Serializable choice of loss, selected through the agent configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum LossKind {
    #[default]
    Mse,
    Huber { delta: f32 },
}

impl Loss for LossKind {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        match self {
            LossKind::Mse => MSE.compute(predictions, targets),
            LossKind::Huber { delta } => HuberLoss::new(*delta).compute(predictions, targets),
        }
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        match self {
            LossKind::Mse => MSE.gradient(predictions, targets),
            LossKind::Huber { delta } => HuberLoss::new(*delta).gradient(predictions, targets),
        }
    }
}
