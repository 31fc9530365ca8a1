//! Input commands queued by controllers.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// What the player did with a direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    /// Pressed the panel
    Tap,
    /// Released the panel
    Lift,
}

/// A timestamped pad event, in song seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputCommand {
    pub direction: Direction,
    pub action: InputAction,
    pub time: f64,
}

impl InputCommand {
    pub const fn tap(direction: Direction, time: f64) -> Self {
        Self { direction, action: InputAction::Tap, time }
    }

    pub const fn lift(direction: Direction, time: f64) -> Self {
        Self { direction, action: InputAction::Lift, time }
    }
}
