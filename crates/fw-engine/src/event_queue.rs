//! FIFO of gameplay events.

use alloc::vec::Vec;
use fw_ir::NoteType;

use crate::judge::Band;
use crate::note::NoteRef;

/// Something that happened during play.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    /// A note was hit (or a mine stepped on)
    NoteHit { note: NoteRef, note_type: NoteType, delay: f64, band: Band, score: u64 },
    /// A note left the hit window untouched
    NoteMiss { note: NoteRef, note_type: NoteType, band: Band },
    /// A mine was avoided
    NoteDodge { note: NoteRef },
    /// A hold or roll ended, kept (`Ok`) or dropped (`Ng`)
    NoteFinish { note: NoteRef, note_type: NoteType, success: bool, band: Band },
    /// Every note of a step was hit
    StepHit { step: usize, band: Band, score: u64 },
}

impl GameEvent {
    /// The note this event is about, if any.
    pub fn note(&self) -> Option<NoteRef> {
        match *self {
            GameEvent::NoteHit { note, .. }
            | GameEvent::NoteMiss { note, .. }
            | GameEvent::NoteDodge { note }
            | GameEvent::NoteFinish { note, .. } => Some(note),
            GameEvent::StepHit { .. } => None,
        }
    }

    pub fn band(&self) -> Option<Band> {
        match *self {
            GameEvent::NoteHit { band, .. }
            | GameEvent::NoteMiss { band, .. }
            | GameEvent::NoteFinish { band, .. }
            | GameEvent::StepHit { band, .. } => Some(band),
            GameEvent::NoteDodge { .. } => None,
        }
    }
}

/// Events in emission order.
///
/// Events are consumed through a cursor; storage is reset once the cursor
/// catches up so steady-state play reuses the same allocation.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
    /// Next event index to hand out
    cursor: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new(), cursor: 0 }
    }

    /// Append an event.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Peek at the next event without consuming it.
    pub fn peek(&self) -> Option<&GameEvent> {
        self.events.get(self.cursor)
    }

    /// Take the oldest pending event.
    pub fn pop(&mut self) -> Option<GameEvent> {
        let event = self.events.get(self.cursor).copied();
        if event.is_some() {
            self.cursor += 1;
        }
        if self.cursor == self.events.len() {
            self.clear();
        }
        event
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.cursor = 0;
    }

    /// Returns true if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.cursor == self.events.len()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len() - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_hit(step: usize) -> GameEvent {
        GameEvent::StepHit { step, band: Band::W1, score: 0 }
    }

    #[test]
    fn events_come_out_in_push_order() {
        let mut queue = EventQueue::new();
        queue.push(step_hit(2));
        queue.push(step_hit(0));
        queue.push(step_hit(1));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(step_hit(2)));
        assert_eq!(queue.pop(), Some(step_hit(0)));
        assert_eq!(queue.pop(), Some(step_hit(1)));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn push_while_draining() {
        let mut queue = EventQueue::new();
        queue.push(step_hit(0));

        let first = queue.pop();
        queue.push(step_hit(1));

        assert_eq!(first, Some(step_hit(0)));
        assert_eq!(queue.peek(), Some(&step_hit(1)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(step_hit(1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn note_accessor() {
        let note = NoteRef { step: 3, slot: 1 };
        assert_eq!(GameEvent::NoteDodge { note }.note(), Some(note));
        assert_eq!(step_hit(0).note(), None);
        assert_eq!(GameEvent::NoteDodge { note }.band(), None);
    }
}
