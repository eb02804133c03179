use ndarray::{array, Array1};

use super::ball::BallState;
use super::config::EnvConfig;
use super::paddle::PaddleState;

/// Length of the observation vector
pub const OBSERVATION_SIZE: usize = 6;

/// Normalized view of the court handed to the agent.
///
/// | index | component                         |
/// |-------|-------------------------------------|
/// | 0     | ball x                              |
/// | 1     | ball y                              |
/// | 2     | ball x-velocity / max speed         |
/// | 3     | ball y-velocity / max speed         |
/// | 4     | agent paddle centre y               |
/// | 5     | opponent paddle centre y            |
///
/// Positions map `0..extent` onto `-1..1`; every component is clamped to
/// `[-1, 1]`.
pub type Observation = Array1<f32>;

/// Encode the court as seen from the left (agent) side.
pub fn encode(ball: &BallState, agent: &PaddleState, opponent: &PaddleState, config: &EnvConfig) -> Observation {
    let half_width = config.width / 2.0;
    let half_height = config.height / 2.0;

    let observation = array![
        ball.x / half_width - 1.0,
        ball.y / half_height - 1.0,
        ball.vx / config.max_speed,
        ball.vy / config.max_speed,
        agent.center_y() / half_height - 1.0,
        opponent.center_y() / half_height - 1.0,
    ];
    observation.mapv_into(|v| v.clamp(-1.0, 1.0))
}

/// Encode the court as seen from the right side, mirrored horizontally so a
/// model trained on the left paddle can drive the right one.
pub fn encode_mirrored(ball: &BallState, own: &PaddleState, rival: &PaddleState, config: &EnvConfig) -> Observation {
    let mut observation = encode(ball, own, rival, config);
    observation[0] = -observation[0];
    observation[2] = -observation[2];
    observation
}
