//! Per-note state machine.
//!
//! A transition is computed from the current state and an input without
//! side effects. Entering the new state then emits events and schedules
//! timers through a [`NoteEnv`].

use fw_ir::{Arrow, Direction, NoteType};

use crate::event_queue::{EventQueue, GameEvent};
use crate::judge::{Band, Judge};
use crate::scheduler::{Action, ActionKey, Position, Scheduler, TimerKind, When};

/// Address of a note: step index and slot within the step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteRef {
    pub step: usize,
    pub slot: usize,
}

/// Something that happens to a note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoteInput {
    /// Direction pressed; carries the timing error
    Tap(f64),
    /// Direction released; carries the timing error
    Lift(f64),
    /// Hit window elapsed
    Miss,
    /// Mine window elapsed untouched
    Dodge,
    /// Direction held while a mine passes
    Collide,
    /// Note scrolled out of the visible field
    Out,
    /// A timer fired
    Expire(TimerKind, ActionKey),
}

/// Note state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoteState {
    Fresh,
    Hit { delay: f64 },
    Missed,
    Dodged,
    /// Hold or roll currently grabbed
    Activated { roll_timer: Option<ActionKey> },
    /// Hold let go, may still be grabbed back
    Released { timer: ActionKey },
    Deactivated { missed: bool },
    Finished,
}

impl NoteState {
    /// Terminal states reject every input.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NoteState::Hit { .. }
                | NoteState::Missed
                | NoteState::Dodged
                | NoteState::Deactivated { .. }
                | NoteState::Finished
        )
    }
}

/// State a transition leads to, before its entry effects run.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Target {
    Hit(f64),
    Missed,
    Dodged,
    Activated(Option<f64>),
    Released,
    Deactivated { missed: bool },
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Transition {
    Stay,
    /// Push the roll timer back without changing state
    RenewRoll(ActionKey),
    Enter(Target),
}

/// Timing constants of the step owning a note.
#[derive(Clone, Copy, Debug)]
pub struct StepTiming {
    pub beat: f64,
    pub time: f64,
    pub hold: f64,
    pub roll: f64,
}

/// Everything a note touches while entering a state.
pub struct NoteEnv<'a> {
    pub judge: &'a Judge,
    pub scheduler: &'a mut Scheduler,
    pub events: &'a mut EventQueue,
    pub now: Position,
}

/// One arrow of one step.
#[derive(Clone, Debug)]
pub struct Note {
    pub note_type: NoteType,
    pub direction: Direction,
    /// Body length in beats
    pub duration: f64,
    /// Body length in seconds
    pub duration_s: f64,
    state: NoteState,
    end_timer: Option<ActionKey>,
}

impl Note {
    pub fn new(note_type: NoteType, direction: Direction) -> Self {
        Self {
            note_type,
            direction,
            duration: 0.0,
            duration_s: 0.0,
            state: NoteState::Fresh,
            end_timer: None,
        }
    }

    pub fn from_arrow(arrow: &Arrow) -> Self {
        Self {
            duration: arrow.duration,
            duration_s: arrow.duration_s,
            ..Self::new(arrow.note_type, arrow.direction)
        }
    }

    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Can a tap or lift resolve against this note?
    pub fn accepts_input(&self) -> bool {
        !self.is_terminal() && !matches!(self.note_type, NoteType::Mine | NoteType::Fake)
    }

    /// Distance in seconds between `time` and this note, for a note whose
    /// step sits at `step_time`. Zero anywhere inside a hold or roll body.
    pub fn distance(&self, step_time: f64, time: f64) -> f64 {
        if !self.note_type.is_durable() {
            return libm::fabs(time - step_time);
        }
        let end = step_time + self.duration_s;
        if time >= step_time && time <= end {
            0.0
        } else {
            libm::fmin(libm::fabs(time - step_time), libm::fabs(time - end))
        }
    }

    /// Timing error of an input at `time`, as judged. Holds and rolls are
    /// judged against their nearest endpoint, even from inside the body.
    pub fn delay(&self, step_time: f64, time: f64) -> f64 {
        let start = libm::fabs(time - step_time);
        if self.note_type.is_durable() {
            libm::fmin(start, libm::fabs(time - (step_time + self.duration_s)))
        } else {
            start
        }
    }

    /// Feed an input to the note.
    pub fn apply(
        &mut self,
        input: NoteInput,
        me: NoteRef,
        timing: &StepTiming,
        env: &mut NoteEnv<'_>,
    ) {
        match self.transition(input) {
            Transition::Stay => {}
            Transition::RenewRoll(key) => {
                let action = Action { note: me, timer: TimerKind::Roll };
                let when = When::SecondsFromNow(timing.roll);
                env.scheduler.schedule(when, env.now, action, Some(key));
            }
            Transition::Enter(target) => {
                self.state = self.enter(target, me, timing, env);
            }
        }
    }

    fn transition(&self, input: NoteInput) -> Transition {
        if self.note_type.is_durable() {
            self.durable_transition(input)
        } else {
            self.instant_transition(input)
        }
    }

    fn instant_transition(&self, input: NoteInput) -> Transition {
        if self.state != NoteState::Fresh {
            return Transition::Stay;
        }
        let target = match (self.note_type, input) {
            (NoteType::Tap, NoteInput::Tap(delay)) | (NoteType::Lift, NoteInput::Lift(delay)) => {
                Target::Hit(delay)
            }
            (NoteType::Mine, NoteInput::Collide) => Target::Hit(0.0),
            (_, NoteInput::Miss) => Target::Missed,
            (_, NoteInput::Dodge) => Target::Dodged,
            _ => return Transition::Stay,
        };
        Transition::Enter(target)
    }

    fn durable_transition(&self, input: NoteInput) -> Transition {
        use NoteInput as I;
        use NoteState as S;

        let is_roll = self.note_type == NoteType::Roll;
        let is_hold = self.note_type == NoteType::Hold;
        let target = match (self.state, input) {
            (S::Fresh, I::Tap(delay)) => Target::Activated(Some(delay)),
            (S::Fresh, I::Miss) => Target::Deactivated { missed: true },

            (S::Activated { roll_timer: Some(key) }, I::Tap(_)) if is_roll => {
                return Transition::RenewRoll(key);
            }
            (S::Activated { .. }, I::Lift(_)) if is_hold => Target::Released,
            (S::Activated { .. }, I::Expire(TimerKind::End, _)) => Target::Finished,
            (S::Activated { roll_timer: Some(key) }, I::Expire(TimerKind::Roll, fired))
                if key == fired =>
            {
                Target::Deactivated { missed: false }
            }

            (S::Released { .. }, I::Tap(_)) => Target::Activated(None),
            (S::Released { .. }, I::Expire(TimerKind::End, _)) => Target::Finished,
            (S::Released { timer }, I::Expire(TimerKind::Release, fired)) if timer == fired => {
                Target::Deactivated { missed: false }
            }

            _ => return Transition::Stay,
        };
        Transition::Enter(target)
    }

    fn enter(
        &mut self,
        target: Target,
        me: NoteRef,
        timing: &StepTiming,
        env: &mut NoteEnv<'_>,
    ) -> NoteState {
        let note_type = self.note_type;
        match target {
            Target::Hit(delay) => {
                self.emit_hit(delay, me, env);
                NoteState::Hit { delay }
            }
            Target::Missed => {
                env.events.push(GameEvent::NoteMiss { note: me, note_type, band: Band::Miss });
                NoteState::Missed
            }
            Target::Dodged => {
                env.events.push(GameEvent::NoteDodge { note: me });
                NoteState::Dodged
            }
            Target::Activated(delay) => {
                if let Some(delay) = delay {
                    self.emit_hit(delay, me, env);
                }
                let end = When::AtBeat(timing.beat + self.duration);
                let action = Action { note: me, timer: TimerKind::End };
                self.end_timer = Some(env.scheduler.schedule(end, env.now, action, self.end_timer));

                let roll_timer = (note_type == NoteType::Roll).then(|| {
                    let action = Action { note: me, timer: TimerKind::Roll };
                    env.scheduler.schedule(When::SecondsFromNow(timing.roll), env.now, action, None)
                });
                NoteState::Activated { roll_timer }
            }
            Target::Released => {
                let action = Action { note: me, timer: TimerKind::Release };
                let when = When::SecondsFromNow(timing.hold);
                let timer = env.scheduler.schedule(when, env.now, action, None);
                NoteState::Released { timer }
            }
            Target::Deactivated { missed } => {
                let event = if missed {
                    GameEvent::NoteMiss { note: me, note_type, band: Band::Miss }
                } else {
                    GameEvent::NoteFinish { note: me, note_type, success: false, band: Band::Ng }
                };
                env.events.push(event);
                NoteState::Deactivated { missed }
            }
            Target::Finished => {
                env.events.push(GameEvent::NoteFinish {
                    note: me,
                    note_type,
                    success: true,
                    band: Band::Ok,
                });
                NoteState::Finished
            }
        }
    }

    fn emit_hit(&self, delay: f64, me: NoteRef, env: &mut NoteEnv<'_>) {
        let (band, score) = env.judge.classify_note_hit(self.note_type, delay);
        let note_type = self.note_type;
        env.events.push(GameEvent::NoteHit { note: me, note_type, delay, band, score });
    }
}
