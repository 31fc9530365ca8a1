//! Steps: the notes sharing one beat, judged together.

use arrayvec::ArrayVec;
use fw_ir::{ChartStep, NoteType, MAX_ARROWS};

use crate::event_queue::GameEvent;
use crate::judge::Judge;
use crate::note::{Note, NoteEnv, NoteInput, NoteRef, StepTiming};

/// A step of the chart with its live notes.
#[derive(Clone, Debug)]
pub struct Step {
    pub beat: f64,
    /// Song time in seconds
    pub time: f64,
    pub notes: ArrayVec<Note, MAX_ARROWS>,
    /// Number of non-mine notes
    pub to_hit: usize,
    /// Delays of the notes hit so far
    pub delays: ArrayVec<f64, MAX_ARROWS>,
    /// Score before the band multiplier
    pub base_score: u64,
    pub hold_timing: f64,
    pub roll_timing: f64,
}

impl Step {
    pub fn new(beat: f64, time: f64) -> Self {
        Self {
            beat,
            time,
            notes: ArrayVec::new(),
            to_hit: 0,
            delays: ArrayVec::new(),
            base_score: 0,
            hold_timing: 0.0,
            roll_timing: 0.0,
        }
    }

    pub fn from_chart(chart_step: &ChartStep) -> Self {
        let mut step = Self::new(chart_step.beat, chart_step.time);
        for arrow in &chart_step.arrows {
            step.add_note(Note::from_arrow(arrow));
        }
        step
    }

    /// Add a note. Mines do not count toward the notes to hit.
    pub fn add_note(&mut self, note: Note) {
        let counts = !note.note_type.is_mine();
        if self.notes.try_push(note).is_ok() && counts {
            self.to_hit += 1;
        }
    }

    pub fn timing(&self) -> StepTiming {
        StepTiming {
            beat: self.beat,
            time: self.time,
            hold: self.hold_timing,
            roll: self.roll_timing,
        }
    }

    /// Has every note to hit been hit?
    pub fn is_complete(&self) -> bool {
        self.to_hit > 0 && self.delays.len() == self.to_hit
    }

    /// Feed an input to one of the step's notes.
    pub fn apply(&mut self, index: usize, slot: usize, input: NoteInput, env: &mut NoteEnv<'_>) {
        let timing = self.timing();
        if let Some(note) = self.notes.get_mut(slot) {
            note.apply(input, NoteRef { step: index, slot }, &timing, env);
        }
    }

    /// Record a note hit. Returns the step hit once the last note lands,
    /// judged on the slowest delay.
    pub fn on_note_hit(
        &mut self,
        index: usize,
        note_type: NoteType,
        delay: f64,
        judge: &Judge,
    ) -> Option<GameEvent> {
        if note_type.is_mine() || self.delays.len() >= self.to_hit {
            return None;
        }
        self.delays.push(delay);
        if self.delays.len() < self.to_hit {
            return None;
        }

        let slowest = self.delays.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (band, score) = judge.classify_step_hit(self, slowest);
        Some(GameEvent::StepHit { step: index, band, score })
    }
}
