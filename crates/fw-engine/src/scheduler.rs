//! Deferred note timers.
//!
//! The scheduler is polled once per tick: every action whose beat or time
//! deadline has passed is handed back to the engine and removed. Keys are
//! generation-stamped, so a key held by a note can be compared against a
//! firing timer, and a removed key is never confused with a newer one.

use alloc::vec::Vec;
use slotmap::{new_key_type, SlotMap};

use crate::note::NoteRef;

new_key_type! {
    /// Handle to a scheduled action.
    pub struct ActionKey;
}

/// Current position in the song.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Position {
    pub beat: f64,
    pub time: f64,
}

/// When an action should fire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum When {
    /// Relative, in beats
    BeatsFromNow(f64),
    /// Absolute chart beat
    AtBeat(f64),
    /// Relative, in seconds
    SecondsFromNow(f64),
    /// Absolute song time
    AtTime(f64),
}

/// Resolved deadline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Deadline {
    Beat(f64),
    Time(f64),
}

impl Deadline {
    fn resolve(when: When, now: Position) -> Self {
        match when {
            When::BeatsFromNow(beats) => Deadline::Beat(now.beat + beats),
            When::AtBeat(beat) => Deadline::Beat(beat),
            When::SecondsFromNow(seconds) => Deadline::Time(now.time + seconds),
            When::AtTime(time) => Deadline::Time(time),
        }
    }

    /// Has the deadline been reached at `now`?
    pub fn reached(&self, now: Position) -> bool {
        match *self {
            Deadline::Beat(beat) => beat <= now.beat,
            Deadline::Time(time) => time <= now.time,
        }
    }
}

/// Kind of note timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// End of a hold or roll body
    End,
    /// Released hold grace period
    Release,
    /// Roll re-tap liveness
    Roll,
}

/// What happens when a timer fires: the note receives `expire(timer, key)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Action {
    pub note: NoteRef,
    pub timer: TimerKind,
}

#[derive(Clone, Debug)]
struct ScheduledAction {
    deadline: Deadline,
    action: Action,
}

/// Pending actions, keyed by generation-stamped handles.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    pending: SlotMap<ActionKey, ScheduledAction>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { pending: SlotMap::with_key() }
    }

    /// Schedule an action. When `existing` still refers to a pending action,
    /// that action is moved to the new deadline in place and keeps its key.
    pub fn schedule(
        &mut self,
        when: When,
        now: Position,
        action: Action,
        existing: Option<ActionKey>,
    ) -> ActionKey {
        let deadline = Deadline::resolve(when, now);

        if let Some(key) = existing {
            if let Some(slot) = self.pending.get_mut(key) {
                slot.deadline = deadline;
                slot.action = action;
                log::trace!(
                    "rescheduled {:?} timer for {:?} to {:?}",
                    action.timer,
                    action.note,
                    deadline
                );
                return key;
            }
        }

        log::trace!("scheduled {:?} timer for {:?} at {:?}", action.timer, action.note, deadline);
        self.pending.insert(ScheduledAction { deadline, action })
    }

    /// Deadline of a pending action.
    pub fn deadline(&self, key: ActionKey) -> Option<Deadline> {
        self.pending.get(key).map(|s| s.deadline)
    }

    pub fn contains(&self, key: ActionKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Remove every action due at `now`, appending it to `out`.
    ///
    /// Order among actions due on the same tick is unspecified.
    pub fn take_due(&mut self, now: Position, out: &mut Vec<(ActionKey, Action)>) {
        let start = out.len();
        out.extend(
            self.pending
                .iter()
                .filter(|(_, s)| s.deadline.reached(now))
                .map(|(key, s)| (key, s.action)),
        );
        for &(key, _) in &out[start..] {
            self.pending.remove(key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
