//! # Volley Environment
//!
//! A two-paddle ball-volley court. The agent controls the left paddle, an
//! [`Opponent`] policy the right one. Each call to [`PongEnv::step`] moves both
//! paddles, advances the ball, resolves wall and paddle collisions, decides
//! whether the rally is over and computes the agent's reward.
//!
//! ## Reward
//!
//! - returning the ball: `hit + accuracy_bonus · (1 − |impact offset|)`
//! - closing in on a ball that travels toward the agent: `approach_bonus`
//! - ball past the agent: `miss` (terminal)
//! - ball past the opponent: `score` (terminal)
//!
//! The terminal term is added after the shaping terms, so one step can carry
//! both a hit reward and an outcome reward.
//!
//! ```rust
//! use volley::env::{Action, EnvConfig, PongEnv, TrackingOpponent};
//!
//! let mut env = PongEnv::new(EnvConfig::default(), Box::new(TrackingOpponent::new(0.2)), Some(7)).unwrap();
//! let observation = env.reset();
//! assert_eq!(observation.len(), 6);
//! let step = env.step(Action::Up);
//! assert!(step.observation.iter().all(|v| (-1.0..=1.0).contains(v)));
//! ```

pub mod action;
pub mod ball;
pub mod config;
pub mod geometry;
pub mod observation;
pub mod opponent;
pub mod paddle;

use std::convert::TryFrom;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use action::{Action, NUM_ACTIONS};
pub use ball::BallState;
pub use config::{EnvConfig, RewardConfig};
pub use observation::{Observation, OBSERVATION_SIZE};
pub use opponent::{CourtView, NetworkOpponent, Opponent, OpponentConfig, PredictiveOpponent, TrackingOpponent};
pub use paddle::PaddleState;

use crate::error::Result;

/// How a rally ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The ball got past the agent
    Missed,
    /// The ball got past the opponent
    Scored,
}

/// Everything one environment step produces
#[derive(Clone, Debug)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub terminal: bool,
    pub outcome: Option<Outcome>,
    /// Whether the agent returned the ball this step
    pub agent_hit: bool,
}

pub struct PongEnv {
    config: EnvConfig,
    ball: BallState,
    agent: PaddleState,
    opponent_paddle: PaddleState,
    opponent: Box<dyn Opponent>,
    rng: StdRng,
    last_distance: f32,
    agent_hits: u32,
    steps: u64,
}

impl PongEnv {
    /// Build an environment; `seed` makes every serve and perturbation reproducible.
    pub fn new(config: EnvConfig, opponent: Box<dyn Opponent>, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let ball = BallState::serve(&config, &mut rng);
        let agent = PaddleState::centered(config.agent_paddle_x, config.paddle_width, config.paddle_height, config.height);
        let opponent_paddle = PaddleState::centered(config.opponent_paddle_x, config.paddle_width, config.paddle_height, config.height);

        let mut env = PongEnv {
            config,
            ball,
            agent,
            opponent_paddle,
            opponent,
            rng,
            last_distance: 0.0,
            agent_hits: 0,
            steps: 0,
        };
        env.last_distance = env.paddle_ball_distance();
        Ok(env)
    }

    /// Start a new rally: fresh serve, both paddles centred, counters cleared.
    pub fn reset(&mut self) -> Observation {
        self.ball = BallState::serve(&self.config, &mut self.rng);
        self.agent = PaddleState::centered(self.config.agent_paddle_x, self.config.paddle_width, self.config.paddle_height, self.config.height);
        self.opponent_paddle = PaddleState::centered(self.config.opponent_paddle_x, self.config.paddle_width, self.config.paddle_height, self.config.height);
        self.agent_hits = 0;
        self.steps = 0;
        self.last_distance = self.paddle_ball_distance();
        self.observation()
    }

    /// Step with a raw action index, rejecting indices outside the action set.
    pub fn step_index(&mut self, action: usize) -> Result<StepResult> {
        Ok(self.step(Action::try_from(action)?))
    }

    /// Advance the court by one step.
    pub fn step(&mut self, action: Action) -> StepResult {
        let config = &self.config;
        self.agent.apply(action, config.paddle_speed, config.height);

        let target = {
            let view = CourtView {
                ball: &self.ball,
                own: &self.opponent_paddle,
                rival: &self.agent,
                config,
            };
            self.opponent.choose_target(&view, &mut self.rng)
        };
        self.opponent_paddle.follow(target, config.paddle_speed, config.height);

        self.ball.advance(config);
        self.ball.bounce_off_walls(config, &mut self.rng);

        let mut reward = 0.0;
        let mut agent_hit = false;
        let ball_rect = self.ball.rect();
        if self.ball.vx < 0.0 && ball_rect.overlaps(&self.agent.rect()) {
            let offset = self.ball.bounce_off_paddle(&self.agent, config, &mut self.rng);
            let accuracy = (1.0 - offset.abs()).max(0.0);
            reward += config.rewards.hit + accuracy * config.rewards.accuracy_bonus;
            self.agent_hits += 1;
            agent_hit = true;
        } else if self.ball.vx > 0.0 && ball_rect.overlaps(&self.opponent_paddle.rect()) {
            self.ball.bounce_off_paddle(&self.opponent_paddle, config, &mut self.rng);
        }

        let distance = self.paddle_ball_distance();
        if self.ball.vx < 0.0 && distance < self.last_distance {
            reward += config.rewards.approach_bonus;
        }
        self.last_distance = distance;

        let ball_rect = self.ball.rect();
        let outcome = if ball_rect.left <= 0.0 {
            self.opponent_paddle.score += 1;
            Some(Outcome::Missed)
        } else if ball_rect.right() >= config.width {
            self.agent.score += 1;
            Some(Outcome::Scored)
        } else {
            None
        };

        match outcome {
            Some(Outcome::Missed) => reward += config.rewards.miss,
            Some(Outcome::Scored) => reward += config.rewards.score,
            None => {}
        }

        self.steps += 1;
        StepResult {
            observation: self.observation(),
            reward,
            terminal: outcome.is_some(),
            outcome,
            agent_hit,
        }
    }

    pub fn observation(&self) -> Observation {
        observation::encode(&self.ball, &self.agent, &self.opponent_paddle, &self.config)
    }

    fn paddle_ball_distance(&self) -> f32 {
        (self.agent.center_y() - self.ball.y).abs()
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn ball(&self) -> &BallState {
        &self.ball
    }

    /// Replace the ball, e.g. to stage a specific rally situation.
    pub fn set_ball(&mut self, ball: BallState) {
        self.ball = ball;
        self.last_distance = self.paddle_ball_distance();
    }

    pub fn agent_paddle(&self) -> &PaddleState {
        &self.agent
    }

    pub fn opponent_paddle(&self) -> &PaddleState {
        &self.opponent_paddle
    }

    /// Agent returns since the last reset
    pub fn agent_hits(&self) -> u32 {
        self.agent_hits
    }

    /// Steps since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn opponent_name(&self) -> &'static str {
        self.opponent.name()
    }
}
