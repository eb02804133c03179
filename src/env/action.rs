use std::convert::TryFrom;

use serde::{Serialize, Deserialize};

use crate::error::PongError;

/// Number of discrete actions available to a paddle
pub const NUM_ACTIONS: usize = 3;

/// A paddle command for one step.
///
/// The discriminants are the action indices produced by the agent:
/// `0` holds, `1` moves toward decreasing y (up the screen), `2` toward
/// increasing y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Hold = 0,
    Up = 1,
    Down = 2,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [Action::Hold, Action::Up, Action::Down];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for Action {
    type Error = PongError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Action::ALL
            .get(index)
            .copied()
            .ok_or(PongError::InvalidAction { action: index, max_actions: NUM_ACTIONS })
    }
}

impl From<Action> for usize {
    fn from(action: Action) -> usize {
        action.index()
    }
}
