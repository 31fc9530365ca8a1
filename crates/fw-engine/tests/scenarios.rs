//! End-to-end engine scenarios driven by a manual clock.

use fw_engine::{Band, Engine, GameEvent, Grade, Judge, ManualClock, NoteRef, NoteState};
use fw_ir::{Arrow, Chart, ChartStep, Direction, InputCommand, NoteType, TempoMap};

/// 120 BPM: beat 4 sits at 2.0s.
fn chart(steps: Vec<ChartStep>) -> Chart {
    let mut chart = Chart::new("scenario", 4, TempoMap::constant(120.0));
    chart.steps = steps;
    chart.populate_times();
    chart
}

fn single(beat: f64, arrow: Arrow) -> Chart {
    chart(vec![ChartStep::new(beat).with(arrow)])
}

struct Harness {
    engine: Engine,
    clock: ManualClock,
    events: Vec<GameEvent>,
}

impl Harness {
    fn new(chart: &Chart) -> Self {
        Self {
            engine: Engine::new(chart, Judge::default()),
            clock: ManualClock::new(0.0),
            events: Vec::new(),
        }
    }

    /// One frame at `time`, dispatching `inputs` after the update.
    fn frame(&mut self, time: f64, inputs: &[InputCommand]) {
        self.clock.set(time);
        self.engine.update(&self.clock);
        for &command in inputs {
            self.engine.queue_input(command);
        }
        self.engine.process_inputs();
        self.events.extend(self.engine.drain_events());
    }

    /// Frames every `dt` seconds from `from` up to `to`, feeding each input
    /// on the first frame at or after its time.
    fn play(&mut self, from: f64, to: f64, dt: f64, inputs: &[InputCommand]) {
        let mut next = 0;
        let frames = ((to - from) / dt).ceil() as usize;
        for i in 0..=frames {
            let time = from + i as f64 * dt;
            let start = next;
            while next < inputs.len() && inputs[next].time <= time {
                next += 1;
            }
            self.frame(time, &inputs[start..next]);
        }
    }

    fn state(&self, step: usize, slot: usize) -> NoteState {
        self.engine.note(NoteRef { step, slot }).map(|n| n.state()).unwrap()
    }

    fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

#[test]
fn tap_on_time_is_w1() {
    let mut h = Harness::new(&single(4.0, Arrow::new(Direction::Left, NoteType::Tap)));

    h.frame(1.9, &[]);
    h.frame(2.01, &[InputCommand::tap(Direction::Left, 2.01)]);

    assert!(matches!(h.state(0, 0), NoteState::Hit { .. }));
    let hits: Vec<_> = h
        .events
        .iter()
        .filter_map(|e| match *e {
            GameEvent::NoteHit { band, delay, .. } => Some((band, delay)),
            _ => None,
        })
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, Band::W1);
    assert!((hits[0].1 - 0.01).abs() < 1e-9);
    assert_eq!(h.count(|e| matches!(e, GameEvent::StepHit { band: Band::W1, .. })), 1);
}

#[test]
fn untouched_tap_is_missed_once() {
    let mut h = Harness::new(&single(4.0, Arrow::new(Direction::Left, NoteType::Tap)));

    h.frame(1.9, &[]);
    h.frame(2.1, &[]);
    assert_eq!(h.engine.missed_step_index(), 0);

    h.frame(2.2, &[]);
    assert_eq!(h.state(0, 0), NoteState::Missed);
    assert_eq!(h.engine.missed_step_index(), 1);

    h.frame(2.5, &[]);
    h.frame(3.0, &[]);
    assert_eq!(h.engine.missed_step_index(), 1);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteMiss { band: Band::Miss, .. })), 1);

    // A late tap finds nothing to hit
    h.frame(3.1, &[InputCommand::tap(Direction::Left, 3.1)]);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteHit { .. })), 0);
}

#[test]
fn held_direction_sets_off_mine() {
    // Beat 10 at 120 BPM is 5.0s
    let mut h = Harness::new(&single(10.0, Arrow::new(Direction::Right, NoteType::Mine)));

    h.frame(4.85, &[]);
    h.frame(4.92, &[InputCommand::tap(Direction::Right, 4.92)]);
    h.frame(4.95, &[]);

    assert_eq!(h.state(0, 0), NoteState::Hit { delay: 0.0 });
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteHit { band: Band::Mine, .. })), 1);

    h.frame(5.08, &[InputCommand::lift(Direction::Right, 5.08)]);
    assert_eq!(h.engine.collision_step_index(), 0);

    h.frame(5.1, &[]);
    assert_eq!(h.engine.collision_step_index(), 1);

    h.frame(5.3, &[]);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteDodge { .. })), 0);
    assert_eq!(h.count(|e| matches!(e, GameEvent::StepHit { .. })), 0);

    let results = h.engine.results();
    assert_eq!(results.count(Band::Mine), 1);
    assert_eq!(results.life, 50 - 8);
}

#[test]
fn press_at_mine_window_entry_collides_next_tick() {
    let mut h = Harness::new(&single(10.0, Arrow::new(Direction::Up, NoteType::Mine)));

    // Input is dispatched after the update, so the collision scan of this
    // frame does not see the press yet
    h.frame(4.91, &[InputCommand::tap(Direction::Up, 4.91)]);
    assert_eq!(h.state(0, 0), NoteState::Fresh);

    h.frame(4.93, &[]);
    assert_eq!(h.state(0, 0), NoteState::Hit { delay: 0.0 });
}

#[test]
fn untouched_mine_is_dodged() {
    let mut h = Harness::new(&single(10.0, Arrow::new(Direction::Up, NoteType::Mine)));
    h.play(4.8, 5.3, 0.01, &[InputCommand::tap(Direction::Left, 5.0)]);

    assert_eq!(h.state(0, 0), NoteState::Dodged);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteDodge { .. })), 1);
    assert!(h.engine.is_complete());
    assert_eq!(h.engine.results().life, 50);
}

#[test]
fn jump_is_judged_on_slowest_note() {
    let step = ChartStep::new(4.0)
        .with(Arrow::new(Direction::Left, NoteType::Tap))
        .with(Arrow::new(Direction::Down, NoteType::Tap))
        .with(Arrow::new(Direction::Right, NoteType::Tap));
    let mut h = Harness::new(&chart(vec![step]));

    h.frame(1.9, &[]);
    h.frame(
        2.06,
        &[
            InputCommand::tap(Direction::Left, 1.99),
            InputCommand::tap(Direction::Down, 2.03),
            InputCommand::tap(Direction::Right, 2.06),
        ],
    );

    let step_hits: Vec<_> = h
        .events
        .iter()
        .filter_map(|e| match *e {
            GameEvent::StepHit { band, score, .. } => Some((band, score)),
            _ => None,
        })
        .collect();
    // Only step: unit = 400000, W3 multiplier 5
    assert_eq!(step_hits, [(Band::W3, 2_000_000)]);
    assert_eq!(h.engine.results().score, 2_000_000);
    assert_eq!(h.engine.combo().current, 3);
}

#[test]
fn step_hit_follows_its_last_note_hit() {
    let step = ChartStep::new(4.0)
        .with(Arrow::new(Direction::Left, NoteType::Tap))
        .with(Arrow::new(Direction::Right, NoteType::Tap));
    let mut h = Harness::new(&chart(vec![step]));

    h.frame(1.9, &[]);
    h.frame(
        2.0,
        &[InputCommand::tap(Direction::Left, 2.0), InputCommand::tap(Direction::Right, 2.0)],
    );

    let kinds: Vec<_> = h
        .events
        .iter()
        .map(|e| matches!(e, GameEvent::StepHit { .. }))
        .collect();
    assert_eq!(kinds, [false, false, true]);
}

#[test]
fn hold_released_too_long_is_dropped() {
    // Two beats long: 2.0s .. 3.0s
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Up, NoteType::Hold, 2.0)));
    h.play(
        1.9,
        3.5,
        1.0 / 100.0,
        &[InputCommand::tap(Direction::Up, 2.0), InputCommand::lift(Direction::Up, 2.4)],
    );

    assert_eq!(h.state(0, 0), NoteState::Deactivated { missed: false });
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteHit { .. })), 1);
    let dropped = |e: &GameEvent| {
        matches!(e, GameEvent::NoteFinish { success: false, band: Band::Ng, .. })
    };
    assert_eq!(h.count(dropped), 1);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteFinish { success: true, .. })), 0);
    assert_eq!(h.engine.results().held, 0);
}

#[test]
fn hold_regrabbed_in_time_finishes() {
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Up, NoteType::Hold, 2.0)));
    h.play(
        1.9,
        3.5,
        1.0 / 100.0,
        &[
            InputCommand::tap(Direction::Up, 2.0),
            InputCommand::lift(Direction::Up, 2.4),
            InputCommand::tap(Direction::Up, 2.5),
            InputCommand::lift(Direction::Up, 3.2),
        ],
    );

    assert_eq!(h.state(0, 0), NoteState::Finished);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteHit { .. })), 1);
    let held =
        |e: &GameEvent| matches!(e, GameEvent::NoteFinish { success: true, band: Band::Ok, .. });
    assert_eq!(h.count(held), 1);
    assert_eq!(h.engine.results().held, 1);
}

#[test]
fn hold_kept_to_end_finishes() {
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Up, NoteType::Hold, 2.0)));
    h.play(
        1.9,
        3.5,
        1.0 / 60.0,
        &[InputCommand::tap(Direction::Up, 2.0), InputCommand::lift(Direction::Up, 3.1)],
    );

    assert_eq!(h.state(0, 0), NoteState::Finished);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteHit { .. })), 1);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteFinish { success: true, .. })), 1);
    assert!(h.engine.is_complete());

    let results = h.engine.results();
    assert_eq!(results.held, 1);
    // One hold: W1 (2) + OK (6) against a maximum of 6
    assert_eq!(results.points, 8);
    assert_eq!(results.grade, Grade::AAA);
}

#[test]
fn late_hold_head_is_judged_from_its_start() {
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Up, NoteType::Hold, 2.0)));
    h.play(1.9, 2.2, 1.0 / 100.0, &[InputCommand::tap(Direction::Up, 2.15)]);

    let hit = h.events.iter().find_map(|e| match *e {
        GameEvent::NoteHit { band, delay, .. } => Some((band, delay)),
        _ => None,
    });
    let (band, delay) = hit.unwrap();
    assert_eq!(band, Band::W5);
    assert!((delay - 0.15).abs() < 1e-9);
    assert!(matches!(h.state(0, 0), NoteState::Activated { .. }));
    assert_eq!(h.count(|e| matches!(e, GameEvent::StepHit { band: Band::W5, score: 0, .. })), 1);
}

#[test]
fn late_roll_head_is_judged_from_its_start() {
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Down, NoteType::Roll, 2.0)));
    h.play(1.9, 2.2, 1.0 / 100.0, &[InputCommand::tap(Direction::Down, 2.1)]);

    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteHit { band: Band::W4, .. })), 1);
}

#[test]
fn missed_hold_never_activates() {
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Up, NoteType::Hold, 2.0)));
    h.play(1.9, 3.5, 1.0 / 60.0, &[]);

    assert_eq!(h.state(0, 0), NoteState::Deactivated { missed: true });
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteMiss { .. })), 1);
    assert_eq!(h.engine.pending_actions(), 0);
}

#[test]
fn roll_kept_alive_by_retaps() {
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Left, NoteType::Roll, 2.0)));
    let mut inputs = Vec::new();
    for i in 0..5 {
        let t = 2.0 + 0.25 * i as f64;
        inputs.push(InputCommand::tap(Direction::Left, t));
        inputs.push(InputCommand::lift(Direction::Left, t + 0.05));
    }
    h.play(1.9, 3.8, 1.0 / 60.0, &inputs);

    assert_eq!(h.state(0, 0), NoteState::Finished);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteHit { .. })), 1);
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteFinish { success: true, .. })), 1);
    assert!(h.engine.is_complete());
}

#[test]
fn roll_dropped_without_retaps() {
    let mut h = Harness::new(&single(4.0, Arrow::durable(Direction::Left, NoteType::Roll, 2.0)));
    h.play(
        1.9,
        3.5,
        1.0 / 60.0,
        &[InputCommand::tap(Direction::Left, 2.0), InputCommand::lift(Direction::Left, 2.05)],
    );

    assert_eq!(h.state(0, 0), NoteState::Deactivated { missed: false });
    assert_eq!(h.count(|e| matches!(e, GameEvent::NoteFinish { success: false, .. })), 1);
}

#[test]
fn perfect_taps_grade_aaa() {
    let steps = (0..8)
        .map(|i| {
            let direction = Direction::ALL[i % 4];
            ChartStep::new(4.0 + i as f64).with(Arrow::new(direction, NoteType::Tap))
        })
        .collect();
    let mut h = Harness::new(&chart(steps));

    let inputs: Vec<_> = (0..8)
        .flat_map(|i| {
            let t = 2.0 + 0.5 * i as f64;
            let direction = Direction::ALL[i % 4];
            [InputCommand::tap(direction, t), InputCommand::lift(direction, t + 0.05)]
        })
        .collect();
    h.play(1.5, 6.0, 1.0 / 120.0, &inputs);

    let results = h.engine.results();
    assert_eq!(results.count(Band::W1), 8);
    assert_eq!(results.max_combo, 8);
    assert_eq!(results.grade, Grade::AAA);
    assert_eq!(results.points, h.engine.max_points());
    // Unit = 400000 * 4 / 36, times (1 + .. + 8), times 10
    assert_eq!(results.score, (400_000 / 36) * 36 * 10);
    assert!(h.engine.is_complete());
}
