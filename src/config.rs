//! Top-level run configuration, stored as JSON.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::env::{EnvConfig, OpponentConfig};
use crate::error::{PongError, Result};
use crate::trainer::TrainerConfig;

/// Everything a training run needs. Missing sections and fields take their defaults.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct Config {
    pub env: EnvConfig,
    pub opponent: OpponentConfig,
    pub agent: AgentConfig,
    pub trainer: TrainerConfig,
}

impl Config {
    /// Environment section.
    pub fn env(mut self, v: EnvConfig) -> Self {
        self.env = v;
        self
    }

    /// Opponent section.
    pub fn opponent(mut self, v: OpponentConfig) -> Self {
        self.opponent = v;
        self
    }

    /// Agent section.
    pub fn agent(mut self, v: AgentConfig) -> Self {
        self.agent = v;
        self
    }

    /// Trainer section.
    pub fn trainer(mut self, v: TrainerConfig) -> Self {
        self.trainer = v;
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.env.validate()?;
        self.agent.validate()?;
        self.trainer.validate()?;
        match &self.opponent {
            OpponentConfig::Tracking { difficulty } | OpponentConfig::Predictive { difficulty }
                if !(*difficulty >= 0.0) =>
            {
                Err(PongError::invalid_parameter("difficulty", "must not be negative"))
            }
            _ => Ok(()),
        }
    }
}
