//! Configuration of [`DqnAgent`](super::DqnAgent).
use serde::{Deserialize, Serialize};

use crate::error::{PongError, Result};
use crate::loss::LossKind;
use crate::optimizer::{GradientClipper, OptimizerConfig};

/// Hyperparameters of the DQN agent.
///
/// Everything here is fixed once the agent is built; only the exploration
/// value moves during training.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Discount factor
    pub gamma: f32,
    pub epsilon_start: f32,
    /// Exploration floor
    pub epsilon_min: f32,
    /// Multiplicative decay applied after every learning step
    pub epsilon_decay: f32,
    pub learning_rate: f32,
    pub batch_size: usize,
    /// Transitions required in replay before learning starts
    pub min_replay_size: usize,
    pub replay_capacity: usize,
    /// Learning steps between hard target syncs
    pub target_sync_interval: u64,
    pub hidden_layers: Vec<usize>,
    pub optimizer: OptimizerConfig,
    pub loss: LossKind,
    pub gradient_clip: GradientClipper,
    /// Seeds weight initialization, exploration and replay sampling
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay: 0.9995,
            learning_rate: 5e-4,
            batch_size: 128,
            min_replay_size: 1000,
            replay_capacity: 50_000,
            target_sync_interval: 100,
            hidden_layers: vec![128, 128],
            optimizer: OptimizerConfig::default(),
            loss: LossKind::Mse,
            gradient_clip: GradientClipper::None,
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Exploration schedule: start value, floor and per-step decay.
    pub fn epsilon(mut self, start: f32, min: f32, decay: f32) -> Self {
        self.epsilon_start = start;
        self.epsilon_min = min;
        self.epsilon_decay = decay;
        self
    }

    /// Learning rate.
    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Transitions required before the first learning step.
    pub fn min_replay_size(mut self, v: usize) -> Self {
        self.min_replay_size = v;
        self
    }

    /// Replay memory capacity.
    pub fn replay_capacity(mut self, v: usize) -> Self {
        self.replay_capacity = v;
        self
    }

    /// Learning steps between target syncs.
    pub fn target_sync_interval(mut self, v: u64) -> Self {
        self.target_sync_interval = v;
        self
    }

    /// Hidden layer widths.
    pub fn hidden_layers(mut self, v: &[usize]) -> Self {
        self.hidden_layers = v.to_vec();
        self
    }

    /// Optimizer.
    pub fn optimizer(mut self, v: OptimizerConfig) -> Self {
        self.optimizer = v;
        self
    }

    /// Loss.
    pub fn loss(mut self, v: LossKind) -> Self {
        self.loss = v;
        self
    }

    /// Gradient clipping.
    pub fn gradient_clip(mut self, v: GradientClipper) -> Self {
        self.gradient_clip = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(PongError::invalid_parameter("gamma".to_string(), format!("must be in (0, 1), got {}", self.gamma)));
        }
        if !(0.0 <= self.epsilon_min && self.epsilon_min <= self.epsilon_start && self.epsilon_start <= 1.0) {
            return Err(PongError::invalid_parameter("epsilon", "require 0 <= epsilon_min <= epsilon_start <= 1"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(PongError::invalid_parameter("epsilon_decay", "must be in (0, 1]"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(PongError::invalid_parameter("learning_rate", "must be positive"));
        }
        if self.batch_size == 0 {
            return Err(PongError::invalid_parameter("batch_size", "must be greater than 0"));
        }
        if self.replay_capacity < self.batch_size {
            return Err(PongError::invalid_parameter("replay_capacity", "must hold at least one batch"));
        }
        if self.min_replay_size > self.replay_capacity {
            return Err(PongError::invalid_parameter("min_replay_size", "must not exceed replay_capacity"));
        }
        if self.target_sync_interval == 0 {
            return Err(PongError::invalid_parameter("target_sync_interval", "must be greater than 0"));
        }
        if self.hidden_layers.iter().any(|&units| units == 0) {
            return Err(PongError::invalid_parameter("hidden_layers", "every layer needs at least one unit"));
        }
        self.gradient_clip.validate()
    }
}
