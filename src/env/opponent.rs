//! Policies for the right-hand paddle.
//!
//! Every opponent answers one question per step: which vertical position
//! should my paddle centre move toward? The environment then steps the
//! paddle toward that target. Opponents see the court, never the agent.

use std::convert::TryFrom;
use std::path::{Path, PathBuf};

use rand::{Rng, RngCore};
use serde::{Serialize, Deserialize};

use super::action::{Action, NUM_ACTIONS};
use super::ball::BallState;
use super::config::EnvConfig;
use super::observation::{encode_mirrored, OBSERVATION_SIZE};
use super::paddle::PaddleState;
use crate::checkpoint::Checkpoint;
use crate::error::{PongError, Result};
use crate::network::NeuralNetwork;

/// Read-only snapshot of the court handed to an opponent
pub struct CourtView<'a> {
    pub ball: &'a BallState,
    /// The paddle the opponent controls
    pub own: &'a PaddleState,
    /// The agent's paddle
    pub rival: &'a PaddleState,
    pub config: &'a EnvConfig,
}

pub trait Opponent: Send {
    /// Target centre position for the opponent paddle this step
    fn choose_target(&mut self, view: &CourtView<'_>, rng: &mut dyn RngCore) -> f32;

    fn name(&self) -> &'static str;
}

/// Chases the ball's current height with a uniform aiming error.
///
/// This is the opponent the agent trains against: error in
/// `±error_range · difficulty`, so difficulty `0` is a perfect tracker.
#[derive(Clone, Debug)]
pub struct TrackingOpponent {
    pub difficulty: f32,
    pub error_range: f32,
}

impl TrackingOpponent {
    pub fn new(difficulty: f32) -> Self {
        TrackingOpponent { difficulty, error_range: 50.0 }
    }
}

impl Opponent for TrackingOpponent {
    fn choose_target(&mut self, view: &CourtView<'_>, rng: &mut dyn RngCore) -> f32 {
        let error = if self.error_range > 0.0 {
            rng.gen_range(-self.error_range..=self.error_range) * self.difficulty
        } else {
            0.0
        };
        view.ball.y + error
    }

    fn name(&self) -> &'static str {
        "tracking"
    }
}

/// Leads the ball by extrapolating its trajectory.
///
/// The ball's height is projected `prediction_range` units of horizontal
/// travel ahead. The aiming error shrinks as the ball gets closer, and the
/// target is kept inside the band the paddle centre can reach.
#[derive(Clone, Debug)]
pub struct PredictiveOpponent {
    pub difficulty: f32,
    pub prediction_range: f32,
    pub error_range: f32,
    /// Ball distance at which the aiming error reaches its full size
    pub error_distance: f32,
}

impl PredictiveOpponent {
    pub fn new(difficulty: f32) -> Self {
        PredictiveOpponent {
            difficulty,
            prediction_range: 200.0,
            error_range: 20.0,
            error_distance: 400.0,
        }
    }
}

impl Opponent for PredictiveOpponent {
    fn choose_target(&mut self, view: &CourtView<'_>, rng: &mut dyn RngCore) -> f32 {
        let ball = view.ball;
        let lead = if ball.vx != 0.0 {
            ball.vy * self.prediction_range / ball.vx.abs()
        } else {
            0.0
        };

        let distance = (ball.x - view.own.x).abs();
        let error_factor = (distance / self.error_distance).min(1.0);
        let error = if self.error_range > 0.0 {
            rng.gen_range(-self.error_range..=self.error_range) * self.difficulty * error_factor
        } else {
            0.0
        };

        let half = view.own.height / 2.0;
        (ball.y + lead + error).clamp(half, view.config.height - half)
    }

    fn name(&self) -> &'static str {
        "predictive"
    }
}

/// Plays the right paddle with a frozen action-value estimator.
///
/// The court is mirrored so a model trained on the left paddle sees the
/// same picture from the right. The greedy action is turned into a target one
/// paddle step away from the current centre.
#[derive(Clone, Debug)]
pub struct NetworkOpponent {
    network: NeuralNetwork,
}

impl NetworkOpponent {
    pub fn new(network: NeuralNetwork) -> Result<Self> {
        if let Some(reason) = network.shape_mismatch() {
            return Err(PongError::invalid_parameter("network".to_string(), reason));
        }
        if network.input_size() != OBSERVATION_SIZE || network.output_size() != NUM_ACTIONS {
            return Err(PongError::invalid_parameter(
                "network".to_string(),
                format!(
                    "expected {} inputs and {} outputs, got {} and {}",
                    OBSERVATION_SIZE,
                    NUM_ACTIONS,
                    network.input_size(),
                    network.output_size()
                ),
            ));
        }
        Ok(NetworkOpponent { network })
    }

    /// Use the live estimator stored in a checkpoint file.
    pub fn from_checkpoint(path: impl AsRef<Path>) -> Result<Self> {
        let checkpoint = Checkpoint::read_from(path.as_ref())?;
        Self::new(checkpoint.live)
    }
}

impl Opponent for NetworkOpponent {
    fn choose_target(&mut self, view: &CourtView<'_>, _rng: &mut dyn RngCore) -> f32 {
        let observation = encode_mirrored(view.ball, view.own, view.rival, view.config);
        let center = view.own.center_y();
        match Action::try_from(self.network.greedy_action(observation.view())) {
            Ok(Action::Up) => center - view.config.paddle_speed,
            Ok(Action::Down) => center + view.config.paddle_speed,
            _ => center,
        }
    }

    fn name(&self) -> &'static str {
        "network"
    }
}

/// Opponent selection as it appears in configuration files and on the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpponentConfig {
    Tracking { difficulty: f32 },
    Predictive { difficulty: f32 },
    Network { checkpoint: PathBuf },
}

impl Default for OpponentConfig {
    fn default() -> Self {
        OpponentConfig::Tracking { difficulty: 0.2 }
    }
}

impl OpponentConfig {
    pub fn build(&self) -> Result<Box<dyn Opponent>> {
        let opponent: Box<dyn Opponent> = match self {
            OpponentConfig::Tracking { difficulty } => Box::new(TrackingOpponent::new(*difficulty)),
            OpponentConfig::Predictive { difficulty } => Box::new(PredictiveOpponent::new(*difficulty)),
            OpponentConfig::Network { checkpoint } => Box::new(NetworkOpponent::from_checkpoint(checkpoint)?),
        };
        Ok(opponent)
    }
}
