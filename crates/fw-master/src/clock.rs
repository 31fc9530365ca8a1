//! Wall-clock song time.

use std::time::Instant;

use fw_engine::SongClock;

/// Real-time clock. Reads `-lead_in` until started, then counts up so the
/// song begins `lead_in` seconds after `start()`.
#[derive(Clone, Debug)]
pub struct StdClock {
    started: Option<Instant>,
    lead_in: f64,
}

impl StdClock {
    pub fn new(lead_in: f64) -> Self {
        Self { started: None, lead_in }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn is_started(&self) -> bool {
        self.started.is_some()
    }
}

impl SongClock for StdClock {
    fn time(&self) -> f64 {
        let elapsed = self.started.map_or(0.0, |t| t.elapsed().as_secs_f64());
        elapsed - self.lead_in
    }
}
