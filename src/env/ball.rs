use rand::Rng;
use serde::{Serialize, Deserialize};

use super::config::EnvConfig;
use super::geometry::Rect;
use super::paddle::PaddleState;

/// Ball kinematics. `x`/`y` is the centre of the ball.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    /// Paddle hits since the serve
    pub hits: u32,
}

impl BallState {
    /// A fresh ball at the centre of the court.
    ///
    /// The horizontal direction is a coin flip; the travel angle is drawn from
    /// the configured serve range with a random vertical sign, so a serve is
    /// never perfectly horizontal.
    pub fn serve<R: Rng + ?Sized>(config: &EnvConfig, rng: &mut R) -> Self {
        let angle = rng
            .gen_range(config.serve_angle_min..=config.serve_angle_max)
            .to_radians();
        let horizontal = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let vertical = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };

        BallState {
            x: config.width / 2.0,
            y: config.height / 2.0,
            vx: horizontal * config.base_speed * angle.cos(),
            vy: vertical * config.base_speed * angle.sin(),
            size: config.ball_size,
            hits: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.x, self.y, self.size, self.size)
    }

    pub fn speed(&self) -> f32 {
        self.vx.hypot(self.vy)
    }

    /// Enforce the kinematic limits, then move one step.
    pub fn advance(&mut self, config: &EnvConfig) {
        self.enforce_limits(config);
        self.x += self.vx;
        self.y += self.vy;
    }

    /// Cap the overall speed, floor the horizontal speed and clamp the travel
    /// angle, in that order.
    pub fn enforce_limits(&mut self, config: &EnvConfig) {
        let speed = self.speed();
        if speed > config.max_speed {
            let scale = config.max_speed / speed;
            self.vx *= scale;
            self.vy *= scale;
        }

        if self.vx.abs() < config.min_horizontal_speed {
            self.vx = config.min_horizontal_speed.copysign(self.vx);
        }

        let max_vy = self.vx.abs() * config.max_travel_angle.to_radians().tan();
        self.vy = self.vy.clamp(-max_vy, max_vy);
    }

    /// Reflect off the top or bottom wall. Returns whether a bounce happened.
    ///
    /// The reflected vertical speed gets a uniform perturbation and always
    /// points back into the court, and the ball is pushed inside the walls so
    /// it cannot stick to them.
    pub fn bounce_off_walls<R: Rng + ?Sized>(&mut self, config: &EnvConfig, rng: &mut R) -> bool {
        let half = self.size / 2.0;
        let hit_top = self.y - half <= 0.0;
        let hit_bottom = self.y + half >= config.height;
        if !hit_top && !hit_bottom {
            return false;
        }

        let perturbation = if config.wall_perturbation > 0.0 {
            rng.gen_range(-config.wall_perturbation..=config.wall_perturbation)
        } else {
            0.0
        };
        let reflected = (-self.vy + perturbation).abs();
        if hit_top {
            self.vy = reflected;
            self.y = half;
        } else {
            self.vy = -reflected;
            self.y = config.height - half;
        }
        self.enforce_limits(config);
        true
    }

    /// Return the ball off `paddle`.
    ///
    /// The bounce angle grows linearly with the distance between the impact
    /// point and the paddle centre, normalized by the paddle half-height, and
    /// never drops below the minimum bounce angle. The paddle's own motion is
    /// added to the vertical speed, and the overall speed grows by the hit
    /// increment up to the maximum. Returns the normalized impact offset in
    /// `[-1, 1]` (0 is a dead-centre hit).
    pub fn bounce_off_paddle<R: Rng + ?Sized>(&mut self, paddle: &PaddleState, config: &EnvConfig, rng: &mut R) -> f32 {
        let offset = ((paddle.center_y() - self.y) / config.paddle_half_height()).clamp(-1.0, 1.0);

        let mut angle = offset * config.max_bounce_angle;
        if angle.abs() < config.min_bounce_angle {
            let sign = if angle > 0.0 {
                1.0
            } else if angle < 0.0 {
                -1.0
            } else if rng.gen_bool(0.5) {
                1.0
            } else {
                -1.0
            };
            angle = sign * config.min_bounce_angle;
        }
        let angle = angle.to_radians();

        let speed = (self.speed() + config.speed_increment).min(config.max_speed);
        let direction = if self.vx > 0.0 { -1.0 } else { 1.0 };

        self.vx = direction * speed * angle.cos();
        self.vy = -speed * angle.sin() + paddle.displacement * config.paddle_motion_factor;

        // Put the ball back in front of the paddle face it just hit
        let half = self.size / 2.0;
        let rect = paddle.rect();
        self.x = if direction > 0.0 { rect.right() + half } else { rect.left - half };

        self.hits += 1;
        self.enforce_limits(config);
        offset
    }
}
