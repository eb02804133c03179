pub mod functions;

pub use functions::{Loss, LossKind, HuberLoss, MSE};
