use std::collections::VecDeque;

use serde::{Serialize, Deserialize};

use crate::env::Outcome;

/// Sliding window of episode returns with its running average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWindow {
    capacity: usize,
    returns: VecDeque<f32>,
}

impl ScoreWindow {
    pub fn new(capacity: usize) -> Self {
        ScoreWindow {
            capacity: capacity.max(1),
            returns: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Rebuild a window from saved returns, keeping the most recent ones.
    pub fn from_returns(capacity: usize, returns: &[f32]) -> Self {
        let mut window = Self::new(capacity);
        for &value in returns {
            window.push(value);
        }
        window
    }

    pub fn push(&mut self, value: f32) {
        if self.returns.len() >= self.capacity {
            self.returns.pop_front();
        }
        self.returns.push_back(value);
    }

    /// Mean of the stored returns, `None` before the first episode
    pub fn average(&self) -> Option<f32> {
        if self.returns.is_empty() {
            return None;
        }
        Some(self.returns.iter().sum::<f32>() / self.returns.len() as f32)
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored returns, oldest first
    pub fn returns(&self) -> Vec<f32> {
        self.returns.iter().copied().collect()
    }
}

/// What one finished episode looked like
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    /// 1-based episode index, continuing across resumes
    pub episode: u64,
    pub total_reward: f32,
    pub steps: u64,
    pub agent_hits: u32,
    /// `None` when the episode was cut at the step limit
    pub outcome: Option<Outcome>,
    /// Mean loss over the learning steps taken during the episode
    pub mean_loss: Option<f32>,
}

/// Trainer bookkeeping persisted next to the checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerState {
    /// Episodes completed so far
    pub episode: u64,
    /// Best running average recorded at a save point
    pub best_average: Option<f32>,
    pub recent_returns: Vec<f32>,
    /// Name of the most recently written resumable checkpoint
    pub last_checkpoint: Option<String>,
    pub epsilon: f32,
    pub train_steps: u64,
}

/// Incremental mean of the losses seen in one episode
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LossAccumulator {
    sum: f64,
    count: u64,
}

impl LossAccumulator {
    pub(crate) fn add(&mut self, loss: f32) {
        self.sum += f64::from(loss);
        self.count += 1;
    }

    pub(crate) fn mean(&self) -> Option<f32> {
        (self.count > 0).then(|| (self.sum / self.count as f64) as f32)
    }
}
