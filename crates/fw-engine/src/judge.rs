//! Timing judge: classifies delays into bands, scores steps, grades a play.

use fw_ir::NoteType;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::step::Step;

/// Outcome band of a judged input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    W1,
    W2,
    W3,
    W4,
    W5,
    Miss,
    /// Stepped on a mine
    Mine,
    /// Hold or roll kept until its end
    Ok,
    /// Hold or roll dropped before its end
    Ng,
}

impl Band {
    /// Tap bands, tightest first.
    pub const TAP: [Band; 5] = [Band::W1, Band::W2, Band::W3, Band::W4, Band::W5];

    /// Bands tallied in the timing counts (W1..W5, Miss, Mine).
    pub const COUNTED: [Band; 7] =
        [Band::W1, Band::W2, Band::W3, Band::W4, Band::W5, Band::Miss, Band::Mine];

    /// Slot in [`Band::COUNTED`], if any.
    pub const fn counter_index(self) -> Option<usize> {
        match self {
            Band::W1 => Some(0),
            Band::W2 => Some(1),
            Band::W3 => Some(2),
            Band::W4 => Some(3),
            Band::W5 => Some(4),
            Band::Miss => Some(5),
            Band::Mine => Some(6),
            Band::Ok | Band::Ng => None,
        }
    }
}

/// Letter grade of a finished play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    AAA,
    AA,
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    /// Best first.
    pub const ALL: [Grade; 7] =
        [Grade::AAA, Grade::AA, Grade::A, Grade::B, Grade::C, Grade::D, Grade::E];
}

/// Life points awarded per band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointTable {
    pub w1: i32,
    pub w2: i32,
    pub w3: i32,
    pub w4: i32,
    pub w5: i32,
    pub miss: i32,
    pub mine: i32,
    pub ok: i32,
    pub ng: i32,
}

impl Default for PointTable {
    fn default() -> Self {
        Self { w1: 2, w2: 2, w3: 1, w4: 0, w5: -4, miss: -8, mine: -8, ok: 6, ng: 0 }
    }
}

/// Judge constants. Windows are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Upper bounds of W1..W5, strictly increasing
    pub windows: [f64; 5],
    /// Time a released hold may stay released before it drops
    pub hold: f64,
    /// Distance at which a held direction sets off a mine
    pub mine: f64,
    /// Time a roll stays alive without a re-tap
    pub roll: f64,
    /// Step score multipliers for W1..W5 (Miss scores 0)
    pub multipliers: [u64; 5],
    pub points: PointTable,
    /// Minimum points ratio for each grade, in `Grade::ALL` order
    pub grades: [f64; 7],
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            windows: [0.0225, 0.045, 0.090, 0.135, 0.180],
            hold: 0.250,
            mine: 0.090,
            roll: 0.500,
            multipliers: [10, 10, 5, 0, 0],
            points: PointTable::default(),
            grades: [1.0, 0.93, 0.8, 0.65, 0.45, 0.0, -1.0],
        }
    }
}

impl JudgeConfig {
    /// Check the table invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut previous = 0.0;
        for (i, &value) in self.windows.iter().enumerate() {
            let band = i + 1;
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveWindow { band, value });
            }
            if i > 0 && !(value > previous) {
                return Err(ConfigError::WindowsNotIncreasing { band, value });
            }
            previous = value;
        }

        for (name, value) in [("hold", self.hold), ("mine", self.mine), ("roll", self.roll)] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveSpecial { name, value });
            }
        }

        for (index, pair) in self.grades.windows(2).enumerate() {
            if !(pair[1] < pair[0]) {
                return Err(ConfigError::GradesNotDescending { index: index + 1, value: pair[1] });
            }
        }

        Ok(())
    }
}

/// Immutable timing judge built from a validated [`JudgeConfig`].
#[derive(Clone, Debug)]
pub struct Judge {
    config: JudgeConfig,
}

impl Judge {
    pub fn new(config: JudgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    /// Distance past which a note can no longer be hit (the W5 bound).
    pub fn miss_timing(&self) -> f64 {
        self.config.windows[4]
    }

    pub fn mine_timing(&self) -> f64 {
        self.config.mine
    }

    pub fn hold_timing(&self) -> f64 {
        self.config.hold
    }

    pub fn roll_timing(&self) -> f64 {
        self.config.roll
    }

    /// Band of a delay. Negative or out-of-window delays are misses; a delay
    /// equal to a bound falls in the next wider band.
    pub fn classify_delay(&self, delay: f64) -> Band {
        if delay < 0.0 {
            return Band::Miss;
        }
        self.config
            .windows
            .iter()
            .zip(Band::TAP)
            .find(|(&bound, _)| delay < bound)
            .map_or(Band::Miss, |(_, band)| band)
    }

    /// Band and score of a single note. Notes score nothing on their own.
    pub fn classify_note_hit(&self, note_type: NoteType, delay: f64) -> (Band, u64) {
        if note_type.is_mine() {
            return (Band::Mine, 0);
        }
        (self.classify_delay(delay), 0)
    }

    /// Band and score of a completed step.
    pub fn classify_step_hit(&self, step: &Step, delay: f64) -> (Band, u64) {
        let band = self.classify_delay(delay);
        (band, step.base_score * self.multiplier(band))
    }

    pub fn multiplier(&self, band: Band) -> u64 {
        match band {
            Band::W1 => self.config.multipliers[0],
            Band::W2 => self.config.multipliers[1],
            Band::W3 => self.config.multipliers[2],
            Band::W4 => self.config.multipliers[3],
            Band::W5 => self.config.multipliers[4],
            _ => 0,
        }
    }

    /// Assign base scores and timing constants to every step. Returns the
    /// maximum points reachable on the chart.
    ///
    /// Base scores grow linearly with the step index and sum to
    /// `floor(100000 * meter / S) * S` with `S = N (N + 1) / 2`.
    pub fn populate_steps(&self, steps: &mut [Step], meter: u32) -> i64 {
        let n = steps.len() as u64;
        let sum = n * (n + 1) / 2;
        let unit = if sum == 0 { 0 } else { 100_000 * u64::from(meter) / sum };

        let mut max_points = 0i64;
        for (i, step) in steps.iter_mut().enumerate() {
            step.base_score = unit * (i as u64 + 1);
            step.hold_timing = self.config.hold;
            step.roll_timing = self.config.roll;

            for note in &step.notes {
                max_points += match note.note_type {
                    NoteType::Tap => i64::from(self.config.points.w1),
                    NoteType::Hold => i64::from(self.config.points.ok),
                    _ => 0,
                };
            }
        }
        max_points
    }

    /// Life points for a band.
    pub fn points_for(&self, band: Band) -> i32 {
        let p = &self.config.points;
        match band {
            Band::W1 => p.w1,
            Band::W2 => p.w2,
            Band::W3 => p.w3,
            Band::W4 => p.w4,
            Band::W5 => p.w5,
            Band::Miss => p.miss,
            Band::Mine => p.mine,
            Band::Ok => p.ok,
            Band::Ng => p.ng,
        }
    }

    /// Grade of a play from its accumulated points.
    pub fn rank_for(&self, points: i64, max_points: i64) -> Grade {
        if max_points <= 0 {
            return Grade::E;
        }
        let percent = points as f64 / max_points as f64;
        self.config
            .grades
            .iter()
            .zip(Grade::ALL)
            .find(|(&threshold, _)| percent >= threshold)
            .map_or(Grade::E, |(_, grade)| grade)
    }

    /// Bands that keep the combo going.
    pub fn is_good(&self, band: Band) -> bool {
        matches!(band, Band::W1 | Band::W2 | Band::W3)
    }
}

impl Default for Judge {
    fn default() -> Self {
        Self { config: JudgeConfig::default() }
    }
}
