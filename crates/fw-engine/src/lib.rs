//! Gameplay engine for the footwork dance game.
//!
//! Resolves pad input against a chart in real time: per-note state
//! machines, step aggregation, the timing judge and the deferred timers
//! that drive holds and rolls.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod clock;
mod engine;
mod error;
mod event_queue;
pub mod judge;
pub mod note;
pub mod scheduler;
mod stats;
mod step;

pub use clock::{ManualClock, SongClock};
pub use engine::{Engine, INPUT_QUEUE_CAPACITY};
pub use error::ConfigError;
pub use event_queue::{EventQueue, GameEvent};
pub use judge::{Band, Grade, Judge, JudgeConfig, PointTable};
pub use note::{Note, NoteInput, NoteRef, NoteState};
pub use scheduler::{ActionKey, Position, Scheduler, TimerKind, When};
pub use stats::{Combo, LifeMeter, Results, Score, StatsTracker};
pub use step::Step;
