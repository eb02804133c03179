use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use super::{EpisodeMetrics, MetricsSink};
use crate::error::Result;

/// Column-wise record of a training run, as written to `training_stats.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingHistory {
    pub episodes: Vec<u64>,
    pub returns: Vec<f32>,
    pub average_returns: Vec<f32>,
    pub epsilons: Vec<f32>,
    /// Mean episode loss, 0 for episodes without a learning step
    pub losses: Vec<f32>,
}

impl TrainingHistory {
    pub fn push(&mut self, metrics: &EpisodeMetrics) {
        self.episodes.push(metrics.episode);
        self.returns.push(metrics.total_reward);
        self.average_returns.push(metrics.average_reward);
        self.epsilons.push(metrics.epsilon);
        self.losses.push(metrics.mean_loss.unwrap_or(0.0));
    }

    /// Drop every entry after `episode`, so a resumed run does not repeat indices
    pub fn truncate_after(&mut self, episode: u64) {
        let keep = self.episodes.iter().take_while(|&&e| e <= episode).count();
        self.episodes.truncate(keep);
        self.returns.truncate(keep);
        self.average_returns.truncate(keep);
        self.epsilons.truncate(keep);
        self.losses.truncate(keep);
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

/// Accumulates a [`TrainingHistory`] and writes it as JSON on every flush.
#[derive(Debug, Clone)]
pub struct JsonHistorySink {
    path: PathBuf,
    history: TrainingHistory,
}

impl JsonHistorySink {
    /// Start an empty history that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonHistorySink {
            path: path.into(),
            history: TrainingHistory::default(),
        }
    }

    /// Continue the history stored at `path`, keeping entries up to and
    /// including `episode`. A missing file starts an empty history.
    pub fn resume(path: impl Into<PathBuf>, episode: u64) -> Result<Self> {
        let path = path.into();
        let mut history = if path.is_file() {
            serde_json::from_str::<TrainingHistory>(&fs::read_to_string(&path)?)?
        } else {
            TrainingHistory::default()
        };
        history.truncate_after(episode);
        Ok(JsonHistorySink { path, history })
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for JsonHistorySink {
    fn record_episode(&mut self, metrics: &EpisodeMetrics) -> Result<()> {
        self.history.push(metrics);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.history)?)?;
        Ok(())
    }
}
