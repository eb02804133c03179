use serde::{Serialize, Deserialize};

use super::action::Action;
use super::geometry::Rect;

/// Tolerance around a target position inside which a following paddle holds
pub const FOLLOW_DEAD_ZONE: f32 = 2.0;

/// One paddle: fixed horizontal position, vertical travel clamped to the court.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaddleState {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Signed vertical displacement applied during the last step
    pub displacement: f32,
    pub score: u32,
}

impl PaddleState {
    /// A paddle vertically centred in a court of height `court_height`
    pub fn centered(x: f32, width: f32, height: f32, court_height: f32) -> Self {
        PaddleState {
            x,
            y: (court_height - height) / 2.0,
            width,
            height,
            displacement: 0.0,
            score: 0,
        }
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn rect(&self) -> Rect {
        Rect {
            left: self.x,
            top: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Move by one step of `speed` in the commanded direction.
    pub fn apply(&mut self, action: Action, speed: f32, court_height: f32) {
        let previous = self.y;
        let delta = match action {
            Action::Hold => 0.0,
            Action::Up => -speed,
            Action::Down => speed,
        };
        self.y = (self.y + delta).clamp(0.0, court_height - self.height);
        self.displacement = self.y - previous;
    }

    /// Step toward `target_y` (a centre position), holding inside the dead zone.
    pub fn follow(&mut self, target_y: f32, speed: f32, court_height: f32) {
        let center = self.center_y();
        let action = if center < target_y - FOLLOW_DEAD_ZONE {
            Action::Down
        } else if center > target_y + FOLLOW_DEAD_ZONE {
            Action::Up
        } else {
            Action::Hold
        };
        self.apply(action, speed, court_height);
    }
}
