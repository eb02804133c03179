//! Per-episode training metrics and the sinks that consume them.
//!
//! The trainer hands one [`EpisodeMetrics`] to its [`MetricsSink`] after every
//! episode and flushes the sink at every save point and at shutdown.

mod history;

use std::time::Duration;

use log::info;

use crate::env::Outcome;
use crate::error::Result;

pub use history::{JsonHistorySink, TrainingHistory};

/// Everything reported about one finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeMetrics {
    pub episode: u64,
    pub total_reward: f32,
    /// Running average over the trainer's window
    pub average_reward: f32,
    pub best_average: Option<f32>,
    pub epsilon: f32,
    pub mean_loss: Option<f32>,
    pub steps: u64,
    pub agent_hits: u32,
    pub outcome: Option<Outcome>,
    /// Time since the current run started
    pub elapsed: Duration,
}

pub trait MetricsSink {
    fn record_episode(&mut self, metrics: &EpisodeMetrics) -> Result<()>;

    /// Persist anything buffered
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes a progress line through the `log` facade every `interval` episodes.
#[derive(Debug, Clone)]
pub struct LogSink {
    interval: u64,
}

impl LogSink {
    pub fn new(interval: u64) -> Self {
        LogSink { interval: interval.max(1) }
    }
}

impl MetricsSink for LogSink {
    fn record_episode(&mut self, metrics: &EpisodeMetrics) -> Result<()> {
        if metrics.episode % self.interval != 0 {
            return Ok(());
        }
        let best = metrics
            .best_average
            .map_or_else(|| "n/a".to_string(), |best| format!("{:.2}", best));
        info!(
            "episode {} | elapsed {:.2}h | return {:.2} | average {:.2} | best {} | epsilon {:.3} | loss {:.4} | hits {}",
            metrics.episode,
            metrics.elapsed.as_secs_f64() / 3600.0,
            metrics.total_reward,
            metrics.average_reward,
            best,
            metrics.epsilon,
            metrics.mean_loss.unwrap_or(0.0),
            metrics.agent_hits,
        );
        Ok(())
    }
}

/// Fans every call out to several sinks, in order.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn MetricsSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn MetricsSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MetricsSink for MultiSink {
    fn record_episode(&mut self, metrics: &EpisodeMetrics) -> Result<()> {
        for sink in &mut self.sinks {
            sink.record_episode(metrics)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record_episode(&mut self, _metrics: &EpisodeMetrics) -> Result<()> {
        Ok(())
    }
}
