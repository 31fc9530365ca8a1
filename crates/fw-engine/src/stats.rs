//! Aggregators fed by the engine's event stream.

use crate::event_queue::GameEvent;
use crate::judge::{Band, Grade, Judge};

/// Sum of step scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub total: u64,
}

impl Score {
    pub fn on_event(&mut self, event: &GameEvent) {
        if let GameEvent::StepHit { score, .. } = *event {
            self.total += score;
        }
    }
}

/// Consecutive good hits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Combo {
    pub current: u32,
    pub max: u32,
}

impl Combo {
    pub fn on_event(&mut self, event: &GameEvent, judge: &Judge) {
        match *event {
            GameEvent::NoteHit { band, .. } if judge.is_good(band) => {
                self.current += 1;
                self.max = self.max.max(self.current);
            }
            GameEvent::NoteHit { .. } | GameEvent::NoteMiss { .. } => self.current = 0,
            _ => {}
        }
    }
}

/// Life bar plus the unclamped point total used for grading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifeMeter {
    pub life: i32,
    pub points: i64,
}

impl LifeMeter {
    pub const MAX: i32 = 100;
    pub const START: i32 = 50;

    pub fn new() -> Self {
        Self { life: Self::START, points: 0 }
    }

    pub fn on_event(&mut self, event: &GameEvent, judge: &Judge) {
        let band = match *event {
            GameEvent::NoteHit { band, .. }
            | GameEvent::NoteMiss { band, .. }
            | GameEvent::NoteFinish { band, .. } => band,
            _ => return,
        };
        let delta = judge.points_for(band);
        self.points += i64::from(delta);
        self.life = (self.life + delta).clamp(0, Self::MAX);
    }
}

impl Default for LifeMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-band tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsTracker {
    /// Counts in `Band::COUNTED` order
    pub counts: [u32; Band::COUNTED.len()],
    /// Holds and rolls kept to their end
    pub held: u32,
}

impl StatsTracker {
    pub fn on_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::NoteHit { band, .. } | GameEvent::NoteMiss { band, .. } => {
                if let Some(i) = band.counter_index() {
                    self.counts[i] += 1;
                }
            }
            GameEvent::NoteFinish { success: true, .. } => self.held += 1,
            _ => {}
        }
    }

    pub fn count(&self, band: Band) -> u32 {
        band.counter_index().map_or(0, |i| self.counts[i])
    }
}

/// End-of-play summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Results {
    /// Counts in `Band::COUNTED` order
    pub timing_counts: [u32; Band::COUNTED.len()],
    pub held: u32,
    pub max_combo: u32,
    pub score: u64,
    pub grade: Grade,
    pub points: i64,
    pub life: i32,
}

impl Results {
    pub fn count(&self, band: Band) -> u32 {
        band.counter_index().map_or(0, |i| self.timing_counts[i])
    }
}
