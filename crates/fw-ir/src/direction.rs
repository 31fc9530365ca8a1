//! Pad directions.

use serde::{Deserialize, Serialize};

/// One of the four arrows of a dance pad.
///
/// The discriminant doubles as the column index (Left = 0 .. Right = 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Down,
    Up,
    Right,
}

impl Direction {
    /// Number of directions on the pad.
    pub const COUNT: usize = 4;

    /// All directions in column order.
    pub const ALL: [Direction; Self::COUNT] =
        [Direction::Left, Direction::Down, Direction::Up, Direction::Right];

    /// Column index of this direction.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for a column index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}
