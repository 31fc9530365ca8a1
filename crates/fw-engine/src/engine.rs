//! Per-player gameplay engine.
//!
//! Each tick the engine admits upcoming steps into per-direction candidate
//! lists, forces misses and mine collisions on passing steps, and fires due
//! note timers. Queued input is dispatched by a separate call so that
//! timer-driven transitions are visible before new input is resolved.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use fw_ir::{Chart, Direction, InputAction, InputCommand, TempoMap};
use heapless::Deque;
use log::{debug, trace, warn};

use crate::clock::SongClock;
use crate::error::ConfigError;
use crate::event_queue::{EventQueue, GameEvent};
use crate::judge::{Judge, JudgeConfig};
use crate::note::{Note, NoteEnv, NoteInput, NoteRef};
use crate::scheduler::{Action, ActionKey, Position, Scheduler};
use crate::stats::{Combo, LifeMeter, Results, Score, StatsTracker};
use crate::step::Step;

/// Maximum number of input commands waiting for dispatch.
pub const INPUT_QUEUE_CAPACITY: usize = 64;

/// Gameplay state of one player on one chart.
pub struct Engine {
    judge: Judge,
    tempo: TempoMap,
    steps: Vec<Step>,
    /// Points of a perfect play, for grading
    max_points: i64,

    /// Hittable notes per direction, in admission order
    action_notes: [VecDeque<NoteRef>; Direction::COUNT],
    /// Next step to admit
    action_index: usize,
    /// Next step to force into miss/dodge
    missed_index: usize,
    /// Next step whose mine window may still be open
    collision_index: usize,
    pressed: [bool; Direction::COUNT],

    scheduler: Scheduler,
    /// Due actions, reused across ticks
    due: Vec<(ActionKey, Action)>,
    events: EventQueue,
    /// Processed events waiting for `drain_events`
    outbox: Vec<GameEvent>,
    inputs: Deque<InputCommand, INPUT_QUEUE_CAPACITY>,

    /// Song time in seconds
    time: f64,
    beat: f64,
    /// Tempo section hint for the next beat lookup
    section: usize,

    score: Score,
    combo: Combo,
    life: LifeMeter,
    stats: StatsTracker,
}

impl Engine {
    /// Create an engine for a chart whose step times are populated.
    pub fn new(chart: &Chart, judge: Judge) -> Self {
        let mut steps: Vec<Step> = chart.steps.iter().map(Step::from_chart).collect();
        let max_points = judge.populate_steps(&mut steps, chart.meter);
        debug!(
            "engine ready: {} steps, meter {}, max points {}",
            steps.len(),
            chart.meter,
            max_points
        );

        Self {
            judge,
            tempo: chart.tempo.clone(),
            steps,
            max_points,
            action_notes: Default::default(),
            action_index: 0,
            missed_index: 0,
            collision_index: 0,
            pressed: [false; Direction::COUNT],
            scheduler: Scheduler::new(),
            due: Vec::new(),
            events: EventQueue::new(),
            outbox: Vec::new(),
            inputs: Deque::new(),
            time: 0.0,
            beat: 0.0,
            section: 0,
            score: Score::default(),
            combo: Combo::default(),
            life: LifeMeter::new(),
            stats: StatsTracker::default(),
        }
    }

    /// Create an engine with its own judge table.
    pub fn with_config(chart: &Chart, config: JudgeConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(chart, Judge::new(config)?))
    }

    /// Advance the engine to the clock's current time.
    pub fn update<C: SongClock + ?Sized>(&mut self, clock: &C) {
        self.time = clock.time();
        let (beat, section) = self.tempo.beat_at(self.time, self.section);
        self.beat = beat;
        self.section = section;

        // 1. Admit upcoming steps
        self.advance_action_window();
        // 2. Collide and miss passing steps
        self.advance_miss_window();
        // 3. Fire due timers
        self.run_scheduled();

        self.settle();
    }

    /// Queue an input command for the next `process_inputs`.
    ///
    /// Returns false when the queue is full; the command is dropped.
    pub fn queue_input(&mut self, command: InputCommand) -> bool {
        match self.inputs.push_back(command) {
            Ok(()) => true,
            Err(dropped) => {
                warn!("input queue full, dropping {:?}", dropped);
                false
            }
        }
    }

    /// Dispatch every queued input command, oldest first.
    pub fn process_inputs(&mut self) {
        while let Some(command) = self.inputs.pop_front() {
            self.dance_input(command.direction, command.action, command.time);
        }
    }

    /// Resolve one pad action against the closest hittable note.
    ///
    /// Without a candidate the action only updates the pressed state.
    pub fn dance_input(&mut self, direction: Direction, action: InputAction, time: f64) {
        self.pressed[direction.index()] = action == InputAction::Tap;

        match self.action_note(direction, time) {
            Some(note) => {
                let step = &self.steps[note.step];
                let delay = step.notes[note.slot].delay(step.time, time);
                let input = match action {
                    InputAction::Tap => NoteInput::Tap(delay),
                    InputAction::Lift => NoteInput::Lift(delay),
                };
                self.dispatch(note, input);
            }
            None => trace!("{:?} {:?} at {:.3}s hit nothing", direction, action, time),
        }

        self.settle();
    }

    /// Candidate note for an input: the closest one that accepts input,
    /// earliest admitted on ties.
    fn action_note(&self, direction: Direction, time: f64) -> Option<NoteRef> {
        let mut best: Option<(NoteRef, f64)> = None;
        for &r in &self.action_notes[direction.index()] {
            let step = &self.steps[r.step];
            let note = &step.notes[r.slot];
            if !note.accepts_input() {
                continue;
            }
            let distance = note.distance(step.time, time);
            if best.map_or(true, |(_, closest)| distance < closest) {
                best = Some((r, distance));
            }
        }
        best.map(|(note, _)| note)
    }

    fn advance_action_window(&mut self) {
        let miss = self.judge.miss_timing();
        while let Some(step) = self.steps.get(self.action_index) {
            if !(step.time - self.time < miss) {
                break;
            }

            for (slot, note) in step.notes.iter().enumerate() {
                let list = &mut self.action_notes[note.direction.index()];
                while let Some(&front) = list.front() {
                    let stale = &self.steps[front.step];
                    if stale.notes[front.slot].distance(stale.time, self.time) > miss {
                        list.pop_front();
                    } else {
                        break;
                    }
                }
                list.push_back(NoteRef { step: self.action_index, slot });
            }

            trace!("admitted step {} at {:.3}s", self.action_index, step.time);
            self.action_index += 1;
        }
    }

    fn advance_miss_window(&mut self) {
        let miss = self.judge.miss_timing();
        let mine = self.judge.mine_timing();

        let mut index = self.missed_index.min(self.collision_index);
        while let Some(step) = self.steps.get(index) {
            let step_time = step.time;
            let count = step.notes.len();
            if !(step_time - mine <= self.time) {
                break;
            }

            // Collisions come first so a held direction cannot dodge a mine
            // on a coarse tick
            if index >= self.collision_index {
                for slot in 0..count {
                    let direction = self.steps[index].notes[slot].direction;
                    if self.pressed[direction.index()] {
                        self.dispatch(NoteRef { step: index, slot }, NoteInput::Collide);
                    }
                }
                if index == self.collision_index && step_time + mine <= self.time {
                    self.collision_index += 1;
                }
            }

            if index == self.missed_index && step_time + miss <= self.time {
                for slot in 0..count {
                    let input = if self.steps[index].notes[slot].note_type.is_mine() {
                        NoteInput::Dodge
                    } else {
                        NoteInput::Miss
                    };
                    self.dispatch(NoteRef { step: index, slot }, input);
                }
                self.missed_index += 1;
            }

            index += 1;
        }
    }

    fn run_scheduled(&mut self) {
        let mut due = core::mem::take(&mut self.due);
        self.scheduler.take_due(self.position(), &mut due);
        for &(key, action) in &due {
            trace!("{:?} timer fired for {:?}", action.timer, action.note);
            self.dispatch(action.note, NoteInput::Expire(action.timer, key));
        }
        due.clear();
        self.due = due;
    }

    fn dispatch(&mut self, note: NoteRef, input: NoteInput) {
        let now = self.position();
        let Some(step) = self.steps.get_mut(note.step) else {
            return;
        };
        let mut env = NoteEnv {
            judge: &self.judge,
            scheduler: &mut self.scheduler,
            events: &mut self.events,
            now,
        };
        step.apply(note.step, note.slot, input, &mut env);
    }

    /// Feed pending events to the aggregators and steps, then move them to
    /// the outbox. Step hits raised on the way are processed in the same pass.
    fn settle(&mut self) {
        while let Some(event) = self.events.pop() {
            debug!("{:?}", event);
            self.score.on_event(&event);
            self.combo.on_event(&event, &self.judge);
            self.life.on_event(&event, &self.judge);
            self.stats.on_event(&event);

            if let GameEvent::NoteHit { note, note_type, delay, .. } = event {
                if let Some(step) = self.steps.get_mut(note.step) {
                    let step_hit = step.on_note_hit(note.step, note_type, delay, &self.judge);
                    if let Some(step_hit) = step_hit {
                        self.events.push(step_hit);
                    }
                }
            }

            self.outbox.push(event);
        }
    }

    /// Take the events processed since the last call, in emission order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.outbox.drain(..)
    }

    /// Every step has left the hit window and no timer is pending.
    pub fn is_complete(&self) -> bool {
        self.missed_index >= self.steps.len() && self.scheduler.is_empty()
    }

    /// End-of-play summary.
    pub fn results(&self) -> Results {
        Results {
            timing_counts: self.stats.counts,
            held: self.stats.held,
            max_combo: self.combo.max,
            score: self.score.total,
            grade: self.judge.rank_for(self.life.points, self.max_points),
            points: self.life.points,
            life: self.life.life,
        }
    }

    pub fn position(&self) -> Position {
        Position { beat: self.beat, time: self.time }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn beat(&self) -> f64 {
        self.beat
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn note(&self, note: NoteRef) -> Option<&Note> {
        self.steps.get(note.step).and_then(|s| s.notes.get(note.slot))
    }

    /// Candidate notes currently listed for a direction.
    pub fn action_notes(&self, direction: Direction) -> impl Iterator<Item = NoteRef> + '_ {
        self.action_notes[direction.index()].iter().copied()
    }

    pub fn action_index(&self) -> usize {
        self.action_index
    }

    pub fn missed_step_index(&self) -> usize {
        self.missed_index
    }

    pub fn collision_step_index(&self) -> usize {
        self.collision_index
    }

    pub fn is_pressed(&self, direction: Direction) -> bool {
        self.pressed[direction.index()]
    }

    pub fn pending_actions(&self) -> usize {
        self.scheduler.len()
    }

    pub fn pending_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn max_points(&self) -> i64 {
        self.max_points
    }

    pub fn combo(&self) -> Combo {
        self.combo
    }

    pub fn life(&self) -> LifeMeter {
        self.life
    }
}
