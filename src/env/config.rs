//! Configuration of [`PongEnv`](super::PongEnv).
use serde::{Deserialize, Serialize};

use crate::error::{PongError, Result};

/// Court geometry, ball kinematics and reward shaping.
///
/// Angles are in degrees and measured from the horizontal axis. Distances
/// and speeds are in court units (pixels of an 800×600 court by default) and
/// units per step.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct EnvConfig {
    pub width: f32,
    pub height: f32,

    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    /// Left edge of the agent paddle
    pub agent_paddle_x: f32,
    /// Left edge of the opponent paddle
    pub opponent_paddle_x: f32,

    pub ball_size: f32,
    pub base_speed: f32,
    pub max_speed: f32,
    /// Speed added on every paddle hit, up to `max_speed`
    pub speed_increment: f32,
    /// Horizontal speed floor enforced on every ball update
    pub min_horizontal_speed: f32,
    /// Largest travel angle the ball may take
    pub max_travel_angle: f32,
    /// Bounce angle for an impact at the very edge of a paddle
    pub max_bounce_angle: f32,
    /// Smallest bounce angle, keeps rallies from going flat
    pub min_bounce_angle: f32,
    /// Range the serve angle is drawn from (sign chosen at random)
    pub serve_angle_min: f32,
    pub serve_angle_max: f32,
    /// Half-width of the uniform perturbation added on wall bounces
    pub wall_perturbation: f32,
    /// Fraction of the paddle's per-step displacement transferred to the ball
    pub paddle_motion_factor: f32,

    pub rewards: RewardConfig,
}

/// Reward shaping terms
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct RewardConfig {
    /// Added when the ball gets past the agent (negative)
    pub miss: f32,
    /// Added when the ball gets past the opponent
    pub score: f32,
    /// Added when the agent returns the ball
    pub hit: f32,
    /// Scaled by how centred the impact was on the agent paddle
    pub accuracy_bonus: f32,
    /// Added when the agent closes in on an approaching ball
    pub approach_bonus: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            miss: -2.0,
            score: 2.0,
            hit: 0.5,
            accuracy_bonus: 0.3,
            approach_bonus: 0.1,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 15.0,
            paddle_height: 90.0,
            paddle_speed: 5.0,
            agent_paddle_x: 50.0,
            opponent_paddle_x: 735.0,
            ball_size: 15.0,
            base_speed: 4.0,
            max_speed: 8.0,
            speed_increment: 0.2,
            min_horizontal_speed: 2.0,
            max_travel_angle: 75.0,
            max_bounce_angle: 60.0,
            min_bounce_angle: 10.0,
            serve_angle_min: 5.0,
            serve_angle_max: 25.0,
            wall_perturbation: 0.5,
            paddle_motion_factor: 0.2,
            rewards: RewardConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Sets the court size.
    pub fn court(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the paddle speed in units per step.
    pub fn paddle_speed(mut self, v: f32) -> Self {
        self.paddle_speed = v;
        self
    }

    /// Sets the wall-bounce perturbation half-width.
    pub fn wall_perturbation(mut self, v: f32) -> Self {
        self.wall_perturbation = v;
        self
    }

    /// Sets the reward terms.
    pub fn rewards(mut self, rewards: RewardConfig) -> Self {
        self.rewards = rewards;
        self
    }

    /// Half the paddle height, the normalizer for impact offsets
    pub(crate) fn paddle_half_height(&self) -> f32 {
        self.paddle_height / 2.0
    }

    /// Checks geometric and kinematic consistency.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("paddle_speed", self.paddle_speed),
            ("ball_size", self.ball_size),
            ("base_speed", self.base_speed),
            ("max_speed", self.max_speed),
            ("min_horizontal_speed", self.min_horizontal_speed),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(PongError::invalid_parameter(name.to_string(), format!("must be positive, got {value}")));
            }
        }

        if self.paddle_height >= self.height {
            return Err(PongError::invalid_parameter("paddle_height", "must be smaller than the court height"));
        }
        if self.min_horizontal_speed > self.base_speed || self.base_speed > self.max_speed {
            return Err(PongError::invalid_parameter(
                "speeds",
                "require min_horizontal_speed <= base_speed <= max_speed",
            ));
        }
        if !(self.agent_paddle_x >= 0.0
            && self.agent_paddle_x + self.paddle_width < self.opponent_paddle_x
            && self.opponent_paddle_x + self.paddle_width <= self.width)
        {
            return Err(PongError::invalid_parameter("paddle_x", "paddles must sit inside the court, agent on the left"));
        }

        let angles_ok = 0.0 < self.min_bounce_angle
            && self.min_bounce_angle <= self.max_bounce_angle
            && self.max_bounce_angle <= self.max_travel_angle
            && self.max_travel_angle < 90.0
            && 0.0 < self.serve_angle_min
            && self.serve_angle_min <= self.serve_angle_max
            && self.serve_angle_max <= self.max_travel_angle;
        if !angles_ok {
            return Err(PongError::invalid_parameter(
                "angles",
                "require 0 < min_bounce <= max_bounce <= max_travel < 90 and 0 < serve_min <= serve_max <= max_travel",
            ));
        }
        if self.wall_perturbation < 0.0 {
            return Err(PongError::invalid_parameter("wall_perturbation", "must not be negative"));
        }

        Ok(())
    }
}
