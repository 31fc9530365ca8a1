//! Chart structure: steps and their arrows.

use alloc::string::String;
use alloc::vec::Vec;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::direction::Direction;
use crate::tempo::TempoMap;

/// Maximum number of arrows on one step (one per direction).
pub const MAX_ARROWS: usize = Direction::COUNT;

/// Kind of arrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    /// Step on it
    Tap,
    /// Stay off it
    Mine,
    /// Release on it
    Lift,
    /// Decorative, cannot be hit
    Fake,
    /// Tap repeatedly until its end
    Roll,
    /// Keep pressed until its end
    Hold,
}

impl NoteType {
    /// Hold and roll notes span a duration.
    pub const fn is_durable(self) -> bool {
        matches!(self, NoteType::Hold | NoteType::Roll)
    }

    pub const fn is_mine(self) -> bool {
        matches!(self, NoteType::Mine)
    }
}

/// One arrow of a step, as delivered by the chart loader.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub direction: Direction,
    pub note_type: NoteType,
    /// Length in beats (0 for instantaneous notes)
    #[serde(default)]
    pub duration: f64,
    /// Length in seconds, derived from the tempo map
    #[serde(default)]
    pub duration_s: f64,
}

impl Arrow {
    /// An instantaneous arrow.
    pub const fn new(direction: Direction, note_type: NoteType) -> Self {
        Self { direction, note_type, duration: 0.0, duration_s: 0.0 }
    }

    /// A hold or roll lasting `duration` beats.
    pub const fn durable(direction: Direction, note_type: NoteType, duration: f64) -> Self {
        Self { direction, note_type, duration, duration_s: 0.0 }
    }
}

/// All arrows sharing one beat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartStep {
    pub beat: f64,
    /// Song time in seconds, derived from the tempo map
    #[serde(default)]
    pub time: f64,
    pub arrows: ArrayVec<Arrow, MAX_ARROWS>,
}

impl ChartStep {
    pub fn new(beat: f64) -> Self {
        Self { beat, time: 0.0, arrows: ArrayVec::new() }
    }

    /// Add an arrow, builder style. Arrows beyond one per direction are ignored.
    pub fn with(mut self, arrow: Arrow) -> Self {
        let _ = self.arrows.try_push(arrow);
        self
    }

    /// End time of the longest arrow on this step.
    pub fn end_time(&self) -> f64 {
        self.arrows.iter().fold(self.time, |end, a| end.max(self.time + a.duration_s))
    }
}

/// Error found while validating a chart.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("step {index} at beat {beat} is not after the previous step")]
    Unordered { index: usize, beat: f64 },
    #[error("step {index} has two arrows for {direction:?}")]
    DuplicateDirection { index: usize, direction: Direction },
    #[error("step {index}: {note_type:?} arrow has invalid duration {duration}")]
    InvalidDuration { index: usize, note_type: NoteType, duration: f64 },
}

/// One difficulty of a song.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub difficulty: String,
    /// Difficulty rating; weights the step scores
    pub meter: u32,
    pub tempo: TempoMap,
    pub steps: Vec<ChartStep>,
}

impl Chart {
    /// Create an empty chart.
    pub fn new(title: &str, meter: u32, tempo: TempoMap) -> Self {
        Self {
            title: String::from(title),
            difficulty: String::new(),
            meter,
            tempo,
            steps: Vec::new(),
        }
    }

    /// Append a step, builder style.
    pub fn with_step(mut self, step: ChartStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Derive step times and arrow lengths in seconds from the tempo map.
    pub fn populate_times(&mut self) {
        let mut section = 0;
        for step in &mut self.steps {
            let (time, index) = self.tempo.time_at(step.beat, section);
            step.time = time;
            section = index;

            for arrow in &mut step.arrows {
                if arrow.duration > 0.0 {
                    let (end, _) = self.tempo.time_at(step.beat + arrow.duration, section);
                    arrow.duration_s = end - time;
                }
            }
        }
    }

    /// Check the ordering and arrow invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ChartError> {
        let mut previous: Option<f64> = None;
        for (index, step) in self.steps.iter().enumerate() {
            if previous.is_some_and(|beat| !(step.beat > beat)) {
                return Err(ChartError::Unordered { index, beat: step.beat });
            }
            previous = Some(step.beat);

            let mut seen = [false; Direction::COUNT];
            for arrow in &step.arrows {
                let slot = &mut seen[arrow.direction.index()];
                if *slot {
                    return Err(ChartError::DuplicateDirection {
                        index,
                        direction: arrow.direction,
                    });
                }
                *slot = true;

                let valid = if arrow.note_type.is_durable() {
                    arrow.duration > 0.0
                } else {
                    arrow.duration == 0.0
                };
                if !valid {
                    return Err(ChartError::InvalidDuration {
                        index,
                        note_type: arrow.note_type,
                        duration: arrow.duration,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of arrows of a kind.
    pub fn count(&self, note_type: NoteType) -> usize {
        self.steps
            .iter()
            .flat_map(|s| s.arrows.iter())
            .filter(|a| a.note_type == note_type)
            .count()
    }

    /// Song time at which the last arrow ends.
    pub fn end_time(&self) -> f64 {
        self.steps.iter().map(ChartStep::end_time).fold(0.0, f64::max)
    }
}
