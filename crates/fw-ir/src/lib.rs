//! Core IR types for the footwork dance engine.
//!
//! This crate defines the chart data consumed by the gameplay engine:
//! steps with their arrows, the tempo map converting beats to seconds,
//! and the input commands fed by controllers.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chart;
mod direction;
mod input;
pub mod tempo;

pub use chart::{Arrow, Chart, ChartError, ChartStep, NoteType, MAX_ARROWS};
pub use direction::Direction;
pub use input::{InputAction, InputCommand};
pub use tempo::{BpmChange, Stop, TempoError, TempoMap, TempoSection};
