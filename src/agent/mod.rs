//! # DQN Agent
//!
//! The learning side of the trainer: an action-value estimator, a frozen
//! target copy of it, an experience replay memory and an epsilon-greedy
//! exploration policy, coupled in [`DqnAgent`].
//!
//! ## Learning step
//!
//! 1. Sample a batch of transitions uniformly from replay
//! 2. Bootstrap targets from the target estimator: `r + (1 - terminal)·γ·max_a Q'(s', a)`
//! 3. One optimizer step on the loss between `Q(s, a)` and the targets
//! 4. Decay epsilon toward its floor
//! 5. Every `target_sync_interval` steps, copy the live parameters into the target
//!
//! Nothing happens until replay holds `min_replay_size` transitions.
//!
//! ## Checkpoints
//!
//! [`DqnAgent::save`] and [`DqnAgent::load`] persist both estimators, the
//! optimizer state, epsilon and the learning step counter. A failed load
//! leaves the agent exactly as it was.

pub mod config;
mod dqn;

pub use config::AgentConfig;
pub use dqn::DqnAgent;
