//! # Training Loop
//!
//! [`Trainer`] drives episodes of the [`PongEnv`] with a [`DqnAgent`]: every
//! step selects an action, steps the court, stores the transition and runs
//! one learning step. Across episodes it keeps a sliding window of returns
//! and writes checkpoints into a [`CheckpointStore`]:
//!
//! | name                | written                                             |
//! |---------------------|-----------------------------------------------------|
//! | `episode_{n}.ckpt`  | every `save_interval` episodes                      |
//! | `latest.ckpt`       | with every numbered checkpoint and at the end of a bounded run |
//! | `best.ckpt`         | at a save point whose running average beats the record |
//! | `interrupted.ckpt`  | when the stop signal ends the run                   |
//! | `trainer_state.json`| with every checkpoint                               |
//!
//! The [`StopSignal`] is polled between steps and between episodes, so a
//! stop request always ends in a final checkpoint write.

pub mod config;
pub mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::agent::DqnAgent;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::env::PongEnv;
use crate::error::{PongError, Result};
use crate::metrics::{EpisodeMetrics, MetricsSink};
use crate::replay_buffer::Transition;

pub use config::{ResumeFrom, TrainerConfig};
pub use stats::{EpisodeRecord, ScoreWindow, TrainerState};

use stats::LossAccumulator;

pub const LATEST_CHECKPOINT: &str = "latest.ckpt";
pub const BEST_CHECKPOINT: &str = "best.ckpt";
pub const INTERRUPTED_CHECKPOINT: &str = "interrupted.ckpt";
pub const STATE_FILE: &str = "trainer_state.json";

/// Name of the numbered checkpoint written after `episode`
pub fn episode_checkpoint_name(episode: u64) -> String {
    format!("episode_{}.ckpt", episode)
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a run picked up its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    Fresh,
    Resumed { checkpoint: String, episode: u64 },
}

/// Result of [`Trainer::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Episodes completed in this run
    pub episodes_run: u64,
    /// Episodes completed overall, including resumed ones
    pub total_episodes: u64,
    pub best_average: Option<f32>,
    pub final_average: Option<f32>,
    pub interrupted: bool,
    pub elapsed: Duration,
}

enum EpisodeEnd {
    Finished(EpisodeRecord),
    Stopped,
}

pub struct Trainer<S: CheckpointStore> {
    env: PongEnv,
    agent: DqnAgent,
    store: S,
    config: TrainerConfig,
    stop: StopSignal,
    window: ScoreWindow,
    episode: u64,
    best_average: Option<f32>,
    last_checkpoint: Option<String>,
}

impl<S: CheckpointStore> Trainer<S> {
    pub fn new(env: PongEnv, agent: DqnAgent, store: S, config: TrainerConfig, stop: StopSignal) -> Result<Self> {
        config.validate()?;
        Ok(Trainer {
            env,
            agent,
            store,
            window: ScoreWindow::new(config.window),
            config,
            stop,
            episode: 0,
            best_average: None,
            last_checkpoint: None,
        })
    }

    /// Apply the configured resume policy.
    ///
    /// A missing checkpoint starts a fresh run with a warning. A corrupt one
    /// fails the call unless `fallback_on_corrupt` is set, in which case the
    /// next candidate is tried and the run starts fresh if none loads. A fresh
    /// start keeps the best running average recorded in the state file.
    pub fn resume(&mut self) -> Result<ResumeOutcome> {
        let candidates = match self.config.resume {
            ResumeFrom::None => return Ok(self.start_fresh()),
            ResumeFrom::Best => vec![BEST_CHECKPOINT.to_string()],
            ResumeFrom::Latest => {
                let mut names = Vec::new();
                if let Some(name) = self.read_state().and_then(|state| state.last_checkpoint) {
                    names.push(name);
                }
                for name in [LATEST_CHECKPOINT, INTERRUPTED_CHECKPOINT] {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
                names
            }
        };

        for name in &candidates {
            match self.load_checkpoint(name) {
                Ok(()) => return Ok(self.finish_resume(name)),
                Err(e) if e.is_not_found() => continue,
                Err(e @ PongError::CheckpointCorrupt { .. }) if self.config.fallback_on_corrupt => {
                    warn!("Skipping unusable checkpoint: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            "No usable checkpoint among {:?} in {}; starting from fresh parameters",
            candidates,
            self.store.locate("").display()
        );
        Ok(self.start_fresh())
    }

    /// Fresh parameters still compete against the recorded best, so an
    /// existing `best.ckpt` is only replaced by a better running average.
    fn start_fresh(&mut self) -> ResumeOutcome {
        if let Some(best) = self.read_state().and_then(|state| state.best_average) {
            info!("Keeping the recorded best running average {:.2} from {}", best, STATE_FILE);
            self.best_average = Some(best);
        }
        ResumeOutcome::Fresh
    }

    fn load_checkpoint(&mut self, name: &str) -> Result<()> {
        let origin = self.store.locate(name);
        let bytes = self.store.read(name)?;
        let checkpoint = Checkpoint::from_bytes(&bytes, &origin)?;
        self.agent.restore(checkpoint, &origin)
    }

    fn finish_resume(&mut self, name: &str) -> ResumeOutcome {
        match self.read_state() {
            Some(state) => {
                self.episode = state.episode;
                self.best_average = state.best_average;
                self.window = ScoreWindow::from_returns(self.config.window, &state.recent_returns);
                self.last_checkpoint = state.last_checkpoint;
            }
            None => warn!("No readable {}; episode counter and best record start over", STATE_FILE),
        }
        if let Some(epsilon) = self.config.resume_epsilon {
            self.agent.set_epsilon(epsilon);
        }
        info!(
            "Resumed from {} at episode {} (epsilon {:.3}, {} learning steps)",
            name,
            self.episode,
            self.agent.epsilon(),
            self.agent.train_steps()
        );
        ResumeOutcome::Resumed {
            checkpoint: name.to_string(),
            episode: self.episode,
        }
    }

    fn read_state(&self) -> Option<TrainerState> {
        let bytes = self.store.read(STATE_FILE).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", STATE_FILE, e);
                None
            }
        }
    }

    /// Run episodes until stopped or until `max_episodes` have been played.
    pub fn run(&mut self, sink: &mut dyn MetricsSink) -> Result<TrainingSummary> {
        let started = Instant::now();
        let first_episode = self.episode;
        info!(
            "Training against the {} opponent from episode {} (epsilon {:.3}, decay {}, floor {})",
            self.env.opponent_name(),
            self.episode + 1,
            self.agent.epsilon(),
            self.agent.config().epsilon_decay,
            self.agent.config().epsilon_min
        );

        let mut interrupted = false;
        loop {
            if self.stop.is_stopped() {
                interrupted = true;
                break;
            }
            if let Some(max) = self.config.max_episodes {
                if self.episode - first_episode >= max {
                    break;
                }
            }

            let record = match self.play_episode()? {
                EpisodeEnd::Finished(record) => record,
                EpisodeEnd::Stopped => {
                    interrupted = true;
                    break;
                }
            };

            self.episode = record.episode;
            self.window.push(record.total_reward);
            let average = self.window.average().unwrap_or(record.total_reward);
            sink.record_episode(&EpisodeMetrics {
                episode: record.episode,
                total_reward: record.total_reward,
                average_reward: average,
                best_average: self.best_average,
                epsilon: self.agent.epsilon(),
                mean_loss: record.mean_loss,
                steps: record.steps,
                agent_hits: record.agent_hits,
                outcome: record.outcome,
                elapsed: started.elapsed(),
            })?;

            if self.episode % self.config.save_interval == 0 {
                self.save_point(sink)?;
            }
        }

        if interrupted {
            info!("Stop requested; writing {}", INTERRUPTED_CHECKPOINT);
            self.final_save(INTERRUPTED_CHECKPOINT, sink)?;
        } else {
            self.final_save(LATEST_CHECKPOINT, sink)?;
        }

        let summary = TrainingSummary {
            episodes_run: self.episode - first_episode,
            total_episodes: self.episode,
            best_average: self.best_average,
            final_average: self.window.average(),
            interrupted,
            elapsed: started.elapsed(),
        };
        info!(
            "Training finished after {:.2}h: {} episodes in total, best average {}",
            summary.elapsed.as_secs_f64() / 3600.0,
            summary.total_episodes,
            summary.best_average.map_or_else(|| "n/a".to_string(), |best| format!("{:.2}", best))
        );
        Ok(summary)
    }

    fn play_episode(&mut self) -> Result<EpisodeEnd> {
        let mut observation = self.env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0u64;
        let mut losses = LossAccumulator::default();

        let outcome = loop {
            if self.stop.is_stopped() {
                return Ok(EpisodeEnd::Stopped);
            }

            let action = self.agent.select_action(observation.view());
            let step = self.env.step_index(action)?;
            total_reward += step.reward;
            steps += 1;

            let next_observation = step.observation;
            self.agent.remember(Transition {
                observation,
                action,
                reward: step.reward,
                next_observation: next_observation.clone(),
                terminal: step.terminal,
            })?;
            if let Some(loss) = self.agent.learn()? {
                losses.add(loss);
            }
            observation = next_observation;

            if step.terminal {
                break step.outcome;
            }
            if self.config.max_episode_steps.map_or(false, |max| steps >= max) {
                break None;
            }
        };

        Ok(EpisodeEnd::Finished(EpisodeRecord {
            episode: self.episode + 1,
            total_reward,
            steps,
            agent_hits: self.env.agent_hits(),
            outcome,
            mean_loss: losses.mean(),
        }))
    }

    /// Numbered checkpoint, `latest`, `best` when the average improved, state.
    fn save_point(&mut self, sink: &mut dyn MetricsSink) -> Result<()> {
        let blob = self.agent.snapshot().to_bytes()?;
        let numbered = episode_checkpoint_name(self.episode);
        self.store.write(&numbered, &blob)?;
        self.store.write(LATEST_CHECKPOINT, &blob)?;
        self.last_checkpoint = Some(LATEST_CHECKPOINT.to_string());
        info!("Saved {} at episode {}", numbered, self.episode);

        self.save_best_if_improved(&blob)?;
        self.write_state()?;
        sink.flush()
    }

    fn final_save(&mut self, name: &str, sink: &mut dyn MetricsSink) -> Result<()> {
        let blob = self.agent.snapshot().to_bytes()?;
        self.store.write(name, &blob)?;
        self.last_checkpoint = Some(name.to_string());
        info!("Saved {} at episode {}", name, self.episode);

        self.save_best_if_improved(&blob)?;
        self.write_state()?;
        sink.flush()
    }

    fn save_best_if_improved(&mut self, blob: &[u8]) -> Result<()> {
        let average = match self.window.average() {
            Some(average) => average,
            None => return Ok(()),
        };
        if self.best_average.is_none() && self.store.exists(BEST_CHECKPOINT) {
            debug!("{} exists without a recorded average; leaving it in place", BEST_CHECKPOINT);
            return Ok(());
        }
        if self.best_average.map_or(true, |best| average > best) {
            self.store.write(BEST_CHECKPOINT, blob)?;
            self.best_average = Some(average);
            info!("New best running average {:.2} at episode {}", average, self.episode);
        }
        Ok(())
    }

    fn write_state(&self) -> Result<()> {
        let state = self.state();
        self.store.write(STATE_FILE, &serde_json::to_vec_pretty(&state)?)
    }

    /// Current bookkeeping as it would be persisted
    pub fn state(&self) -> TrainerState {
        TrainerState {
            episode: self.episode,
            best_average: self.best_average,
            recent_returns: self.window.returns(),
            last_checkpoint: self.last_checkpoint.clone(),
            epsilon: self.agent.epsilon(),
            train_steps: self.agent.train_steps(),
        }
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DqnAgent {
        &mut self.agent
    }

    pub fn env(&self) -> &PongEnv {
        &self.env
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Episodes completed so far, including resumed ones
    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn best_average(&self) -> Option<f32> {
        self.best_average
    }

    pub fn window(&self) -> &ScoreWindow {
        &self.window
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }
}
