//! Perfect input stream for a chart.

use fw_engine::JudgeConfig;
use fw_ir::{Chart, Direction, InputCommand, NoteType};

/// How long a tap keeps its panel pressed.
pub const TAP_LENGTH: f64 = 0.05;

/// Spacing of the re-taps that keep a roll alive.
pub const ROLL_RETAP: f64 = 0.1;

/// Delay between the end of a hold and its release.
const HOLD_OVERRUN: f64 = 0.05;

/// Margin left between a release and the opening of a mine's window in
/// the same lane. Covers one frame at 100 Hz.
const MINE_CLEARANCE: f64 = 0.01;

/// Generate the inputs a perfect player would send, ordered by time.
///
/// Taps, holds and rolls are pressed exactly on their step time and lifts
/// are released on theirs. Mines and fakes are left alone. A tap is
/// released after `TAP_LENGTH`, or halfway to the next arrow of its
/// direction if that comes sooner. Any release comes before the window of
/// a mine that follows in the same lane opens.
pub fn autoplay(chart: &Chart, config: &JudgeConfig) -> Vec<InputCommand> {
    let mut inputs = Vec::new();
    let lane = Lane { chart, mine: config.mine };

    for (index, step) in chart.steps.iter().enumerate() {
        for arrow in &step.arrows {
            let t = step.time;
            let direction = arrow.direction;
            match arrow.note_type {
                NoteType::Tap => {
                    inputs.push(InputCommand::tap(direction, t));
                    let lift = lane.release(index, direction, t, TAP_LENGTH);
                    inputs.push(InputCommand::lift(direction, lift));
                }
                NoteType::Lift => inputs.push(InputCommand::lift(direction, t)),
                NoteType::Hold => {
                    inputs.push(InputCommand::tap(direction, t));
                    let end = t + arrow.duration_s;
                    let lift = lane.release(index, direction, end, HOLD_OVERRUN);
                    inputs.push(InputCommand::lift(direction, lift));
                }
                NoteType::Roll => {
                    let end = t + arrow.duration_s;
                    let tap_length = TAP_LENGTH.min(ROLL_RETAP / 2.0);
                    let mut press = t;
                    while press < end {
                        inputs.push(InputCommand::tap(direction, press));
                        let lift = lane.release(index, direction, press, tap_length);
                        inputs.push(InputCommand::lift(direction, lift));
                        press += ROLL_RETAP;
                    }
                }
                NoteType::Mine | NoteType::Fake => {}
            }
        }
    }

    inputs.sort_by(|a, b| a.time.total_cmp(&b.time));
    log::debug!("autoplay: {} inputs for '{}'", inputs.len(), chart.title);
    inputs
}

/// Looks ahead along a direction's lane.
struct Lane<'a> {
    chart: &'a Chart,
    mine: f64,
}

impl Lane<'_> {
    /// Release time for a panel held until `held` by a note on step
    /// `index`, wanting to stay down `hold` seconds longer. Never earlier
    /// than `held`.
    fn release(&self, index: usize, direction: Direction, held: f64, hold: f64) -> f64 {
        let latest = held + hold;
        let next = self.chart.steps[index + 1..].iter().find_map(|s| {
            s.arrows
                .iter()
                .find(|a| a.direction == direction && a.note_type != NoteType::Fake)
                .map(|a| (s.time, a.note_type))
        });
        let release = match next {
            Some((time, NoteType::Mine)) => latest.min(time - self.mine - MINE_CLEARANCE),
            Some((time, _)) => latest.min((held + time) / 2.0),
            None => latest,
        };
        release.max(held)
    }
}
