//! # Volley - Deep Q-Learning for a Paddle-and-Ball Court
//!
//! Volley trains a value-based agent to play the left paddle of a two-paddle
//! ball-volley game. It bundles the deterministic court physics, a DQN agent
//! built on a small dense network, and a resumable training loop that writes
//! checkpoints as it goes.
//!
//! ## Key Features
//!
//! - **Environment**: ball and paddle kinematics, shaped rewards, a 6-component observation in `[-1, 1]`
//! - **Agent**: experience replay, live and hard-synced target networks, epsilon-greedy exploration
//! - **Trainer**: sliding-window statistics, numbered/best/interrupted checkpoints, resume policies
//! - **Opponents**: noisy tracker, trajectory predictor, or a frozen network from an earlier run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use volley::agent::{AgentConfig, DqnAgent};
//! use volley::checkpoint::DirectoryStore;
//! use volley::env::{EnvConfig, PongEnv, TrackingOpponent};
//! use volley::metrics::LogSink;
//! use volley::trainer::{StopSignal, Trainer, TrainerConfig};
//!
//! let env = PongEnv::new(EnvConfig::default(), Box::new(TrackingOpponent::new(0.2)), None).unwrap();
//! let agent = DqnAgent::new(AgentConfig::default()).unwrap();
//! let store = DirectoryStore::new("checkpoints").unwrap();
//! let config = TrainerConfig::default().max_episodes(500);
//!
//! let mut trainer = Trainer::new(env, agent, store, config, StopSignal::new()).unwrap();
//! trainer.resume().unwrap();
//! let summary = trainer.run(&mut LogSink::new(10)).unwrap();
//! println!("best average: {:?}", summary.best_average);
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions for the dense layers
//! - [`agent`] - The DQN agent and its configuration
//! - [`checkpoint`] - Checkpoint encoding and storage
//! - [`config`] - JSON run configuration
//! - [`env`] - Court physics, observations, rewards and opponents
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`loss`] - Regression losses for the value targets
//! - [`metrics`] - Per-episode metrics sinks
//! - [`network`] - The action-value network
//! - [`optimizer`] - SGD, Adam, RMSProp and gradient clipping
//! - [`replay_buffer`] - Experience replay memory
//! - [`trainer`] - The episode loop, checkpointing and resume

pub mod activations;
pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;

#[cfg(test)]
mod tests;
