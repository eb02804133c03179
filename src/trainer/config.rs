//! Configuration of [`Trainer`](super::Trainer).
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PongError, Result};

/// Which checkpoint a run resumes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResumeFrom {
    /// The most recently written checkpoint, periodic or interrupted
    #[default]
    Latest,
    /// The checkpoint with the best running average
    Best,
    /// Always start from fresh parameters
    None,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct TrainerConfig {
    pub checkpoint_dir: PathBuf,
    /// Episodes between numbered checkpoints
    pub save_interval: u64,
    /// Episodes in the running-average window
    pub window: usize,
    /// Episodes between progress log lines
    pub log_interval: u64,
    pub resume: ResumeFrom,
    /// Exploration value forced after a successful resume
    pub resume_epsilon: Option<f32>,
    /// Start fresh, with a warning, instead of failing on a corrupt checkpoint
    pub fallback_on_corrupt: bool,
    /// Stop after this many episodes in this run; `None` runs until stopped
    pub max_episodes: Option<u64>,
    /// Cut an episode after this many steps
    pub max_episode_steps: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("checkpoints"),
            save_interval: 50,
            window: 100,
            log_interval: 10,
            resume: ResumeFrom::Latest,
            resume_epsilon: None,
            fallback_on_corrupt: true,
            max_episodes: None,
            max_episode_steps: None,
        }
    }
}

impl TrainerConfig {
    /// Directory checkpoints and bookkeeping are written to.
    pub fn checkpoint_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = v.into();
        self
    }

    /// Episodes between numbered checkpoints.
    pub fn save_interval(mut self, v: u64) -> Self {
        self.save_interval = v;
        self
    }

    /// Running-average window.
    pub fn window(mut self, v: usize) -> Self {
        self.window = v;
        self
    }

    /// Episodes between progress log lines.
    pub fn log_interval(mut self, v: u64) -> Self {
        self.log_interval = v;
        self
    }

    /// Resume policy.
    pub fn resume(mut self, v: ResumeFrom) -> Self {
        self.resume = v;
        self
    }

    /// Exploration value applied after resuming.
    pub fn resume_epsilon(mut self, v: f32) -> Self {
        self.resume_epsilon = Some(v);
        self
    }

    /// Behaviour on a corrupt checkpoint.
    pub fn fallback_on_corrupt(mut self, v: bool) -> Self {
        self.fallback_on_corrupt = v;
        self
    }

    /// Episode budget for this run.
    pub fn max_episodes(mut self, v: u64) -> Self {
        self.max_episodes = Some(v);
        self
    }

    /// Per-episode step limit.
    pub fn max_episode_steps(mut self, v: u64) -> Self {
        self.max_episode_steps = Some(v);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.save_interval == 0 {
            return Err(PongError::invalid_parameter("save_interval", "must be greater than 0"));
        }
        if self.window == 0 {
            return Err(PongError::invalid_parameter("window", "must be greater than 0"));
        }
        if self.log_interval == 0 {
            return Err(PongError::invalid_parameter("log_interval", "must be greater than 0"));
        }
        if let Some(epsilon) = self.resume_epsilon {
            if !(0.0..=1.0).contains(&epsilon) {
                return Err(PongError::invalid_parameter("resume_epsilon", "must be in [0, 1]"));
            }
        }
        if self.max_episode_steps == Some(0) {
            return Err(PongError::invalid_parameter("max_episode_steps", "must be greater than 0"));
        }
        Ok(())
    }
}
