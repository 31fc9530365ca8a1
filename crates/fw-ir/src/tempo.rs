//! Beat ↔ time conversion.
//!
//! A `TempoMap` is compiled from BPM changes and stops into an ordered
//! list of sections of constant beats-per-second. Each section may start
//! with a pause (a stop) during which time advances but the beat holds.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A BPM change at a beat.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BpmChange {
    pub beat: f64,
    pub bpm: f64,
}

/// A stop: the chart freezes at `beat` for `seconds`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub beat: f64,
    pub seconds: f64,
}

/// Error building a tempo map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TempoError {
    #[error("tempo map has no BPM change")]
    NoBpm,
    #[error("first BPM change must be at beat 0, found beat {0}")]
    FirstBpmNotAtZero(f64),
    #[error("BPM must be positive, found {bpm} at beat {beat}")]
    InvalidBpm { beat: f64, bpm: f64 },
    #[error("stop length must be positive, found {seconds}s at beat {beat}")]
    InvalidStop { beat: f64, seconds: f64 },
}

/// A span of constant tempo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoSection {
    /// Beat where the section starts
    pub start_beat: f64,
    /// Song time (seconds) where the section starts, before its pause
    pub start_time: f64,
    /// Beats per second
    pub bps: f64,
    /// Seconds frozen at `start_beat` before the beat advances
    pub pause: f64,
}

/// Serialized form of a tempo map.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct TempoSpec {
    #[serde(default)]
    offset: f64,
    bpms: Vec<BpmChange>,
    #[serde(default)]
    stops: Vec<Stop>,
}

/// Converts between beats and song seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TempoSpec", into = "TempoSpec")]
pub struct TempoMap {
    /// Song time of beat 0
    offset: f64,
    bpms: Vec<BpmChange>,
    stops: Vec<Stop>,
    sections: Vec<TempoSection>,
}

enum Change {
    Bpm(f64),
    Stop(f64),
}

impl TempoMap {
    /// Build a tempo map. `offset` is the song time of beat 0.
    pub fn new(
        offset: f64,
        mut bpms: Vec<BpmChange>,
        mut stops: Vec<Stop>,
    ) -> Result<Self, TempoError> {
        bpms.sort_by(|a, b| a.beat.total_cmp(&b.beat));
        stops.sort_by(|a, b| a.beat.total_cmp(&b.beat));

        let first = bpms.first().ok_or(TempoError::NoBpm)?;
        if first.beat != 0.0 {
            return Err(TempoError::FirstBpmNotAtZero(first.beat));
        }
        if let Some(bad) = bpms.iter().find(|c| !(c.bpm > 0.0)) {
            return Err(TempoError::InvalidBpm { beat: bad.beat, bpm: bad.bpm });
        }
        if let Some(bad) = stops.iter().find(|s| !(s.seconds > 0.0)) {
            return Err(TempoError::InvalidStop { beat: bad.beat, seconds: bad.seconds });
        }

        let sections = compile_sections(offset, &bpms, &stops);
        Ok(Self { offset, bpms, stops, sections })
    }

    /// A single constant tempo starting at time 0.
    ///
    /// Panics if `bpm` is not positive.
    pub fn constant(bpm: f64) -> Self {
        assert!(bpm > 0.0, "BPM must be positive");
        let bpms = alloc::vec![BpmChange { beat: 0.0, bpm }];
        let sections = compile_sections(0.0, &bpms, &[]);
        Self { offset: 0.0, bpms, stops: Vec::new(), sections }
    }

    /// Song time of beat 0.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn bpms(&self) -> &[BpmChange] {
        &self.bpms
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn sections(&self) -> &[TempoSection] {
        &self.sections
    }

    /// Beat at a song time, plus the index of the section it falls in.
    ///
    /// `hint` is a section index to start scanning from; pass the index
    /// returned by the previous call when time moves forward.
    pub fn beat_at(&self, time: f64, hint: usize) -> (f64, usize) {
        let index = self.seek(hint, |s| s.start_time <= time);
        let s = &self.sections[index];
        let mut local = time - s.start_time;
        if s.pause > 0.0 {
            local = (local - s.pause).max(0.0);
        }
        (s.start_beat + s.bps * local, index)
    }

    /// Song time of a beat, plus the index of the section it falls in.
    ///
    /// A beat sitting exactly on a stop maps to the moment the stop starts.
    pub fn time_at(&self, beat: f64, hint: usize) -> (f64, usize) {
        let index = self.seek(hint, |s| s.start_beat <= beat);
        let s = &self.sections[index];
        let pause = if beat > s.start_beat { s.pause } else { 0.0 };
        (s.start_time + pause + (beat - s.start_beat) / s.bps, index)
    }

    /// Find the last section satisfying `reached`, starting at `hint`.
    fn seek(&self, hint: usize, reached: impl Fn(&TempoSection) -> bool) -> usize {
        let mut index = hint.min(self.sections.len() - 1);
        while index > 0 && !reached(&self.sections[index]) {
            index -= 1;
        }
        while index + 1 < self.sections.len() && reached(&self.sections[index + 1]) {
            index += 1;
        }
        index
    }
}

fn compile_sections(offset: f64, bpms: &[BpmChange], stops: &[Stop]) -> Vec<TempoSection> {
    let mut changes: Vec<(f64, Change)> = bpms
        .iter()
        .skip(1)
        .map(|c| (c.beat, Change::Bpm(c.bpm)))
        .chain(stops.iter().map(|s| (s.beat, Change::Stop(s.seconds))))
        .collect();
    // Stable: BPM changes stay ahead of stops on the same beat
    changes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut sections = Vec::with_capacity(changes.len() + 1);
    let mut current = TempoSection {
        start_beat: 0.0,
        start_time: offset,
        bps: bpms[0].bpm / 60.0,
        pause: 0.0,
    };

    for (beat, change) in changes {
        if beat == current.start_beat {
            match change {
                Change::Bpm(bpm) => current.bps = bpm / 60.0,
                Change::Stop(seconds) => current.pause += seconds,
            }
            continue;
        }

        let start_time =
            current.start_time + current.pause + (beat - current.start_beat) / current.bps;
        let (bps, pause) = match change {
            Change::Bpm(bpm) => (bpm / 60.0, 0.0),
            Change::Stop(seconds) => (current.bps, seconds),
        };
        sections.push(current);
        current = TempoSection { start_beat: beat, start_time, bps, pause };
    }

    sections.push(current);
    sections
}

impl TryFrom<TempoSpec> for TempoMap {
    type Error = TempoError;

    fn try_from(spec: TempoSpec) -> Result<Self, Self::Error> {
        TempoMap::new(spec.offset, spec.bpms, spec.stops)
    }
}

impl From<TempoMap> for TempoSpec {
    fn from(map: TempoMap) -> Self {
        Self { offset: map.offset, bpms: map.bpms, stops: map.stops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn constant_tempo_converts_both_ways() {
        let map = TempoMap::constant(120.0);
        assert!(approx(map.time_at(4.0, 0).0, 2.0));
        assert!(approx(map.beat_at(2.0, 0).0, 4.0));
    }

    #[test]
    fn time_before_offset_gives_negative_beat() {
        let map = TempoMap::new(1.0, vec![BpmChange { beat: 0.0, bpm: 60.0 }], vec![]).unwrap();
        assert!(approx(map.beat_at(0.0, 0).0, -1.0));
        assert!(approx(map.time_at(0.0, 0).0, 1.0));
    }

    #[test]
    fn bpm_change_starts_new_section() {
        let map = TempoMap::new(
            0.0,
            vec![BpmChange { beat: 0.0, bpm: 120.0 }, BpmChange { beat: 4.0, bpm: 240.0 }],
            vec![],
        )
        .unwrap();

        assert_eq!(map.sections().len(), 2);
        let (time, section) = map.time_at(8.0, 0);
        assert!(approx(time, 3.0));
        assert_eq!(section, 1);
        assert!(approx(map.beat_at(3.0, 0).0, 8.0));
    }

    #[test]
    fn stop_freezes_beat_but_not_time() {
        let map = TempoMap::new(
            0.0,
            vec![BpmChange { beat: 0.0, bpm: 120.0 }],
            vec![Stop { beat: 4.0, seconds: 1.0 }],
        )
        .unwrap();

        // Notes on the stop are hit before it starts
        assert!(approx(map.time_at(4.0, 0).0, 2.0));
        assert!(approx(map.time_at(5.0, 0).0, 3.5));

        assert!(approx(map.beat_at(2.5, 0).0, 4.0));
        assert!(approx(map.beat_at(3.0, 0).0, 4.0));
        assert!(approx(map.beat_at(3.5, 0).0, 5.0));
    }

    #[test]
    fn stop_and_bpm_change_on_same_beat_share_a_section() {
        let map = TempoMap::new(
            0.0,
            vec![BpmChange { beat: 0.0, bpm: 120.0 }, BpmChange { beat: 4.0, bpm: 60.0 }],
            vec![Stop { beat: 4.0, seconds: 0.5 }],
        )
        .unwrap();

        assert_eq!(map.sections().len(), 2);
        assert!(approx(map.time_at(5.0, 0).0, 2.0 + 0.5 + 1.0));
    }

    #[test]
    fn stale_hint_still_finds_section() {
        let map = TempoMap::new(
            0.0,
            vec![BpmChange { beat: 0.0, bpm: 120.0 }, BpmChange { beat: 4.0, bpm: 240.0 }],
            vec![],
        )
        .unwrap();
        let (beat, section) = map.beat_at(1.0, 1);
        assert!(approx(beat, 2.0));
        assert_eq!(section, 0);
    }

    #[test]
    fn rejects_invalid_maps() {
        assert_eq!(TempoMap::new(0.0, vec![], vec![]), Err(TempoError::NoBpm));
        assert_eq!(
            TempoMap::new(0.0, vec![BpmChange { beat: 1.0, bpm: 120.0 }], vec![]),
            Err(TempoError::FirstBpmNotAtZero(1.0))
        );
        assert!(matches!(
            TempoMap::new(0.0, vec![BpmChange { beat: 0.0, bpm: 0.0 }], vec![]),
            Err(TempoError::InvalidBpm { .. })
        ));
        assert!(matches!(
            TempoMap::new(
                0.0,
                vec![BpmChange { beat: 0.0, bpm: 120.0 }],
                vec![Stop { beat: 2.0, seconds: -1.0 }]
            ),
            Err(TempoError::InvalidStop { .. })
        ));
    }

    #[test]
    fn deserializes_and_compiles() {
        let json = r#"{
            "offset": 0.5,
            "bpms": [{"beat": 0, "bpm": 120}],
            "stops": [{"beat": 2, "seconds": 0.25}]
        }"#;
        let map: TempoMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.sections().len(), 2);
        assert!(approx(map.time_at(3.0, 0).0, 0.5 + 1.0 + 0.25 + 0.5));
    }
}
