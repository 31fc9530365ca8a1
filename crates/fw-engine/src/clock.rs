//! Song clock abstraction.

/// Source of the current song time in seconds.
///
/// Negative before the song starts.
pub trait SongClock {
    fn time(&self) -> f64;
}

impl<C: SongClock + ?Sized> SongClock for &C {
    fn time(&self) -> f64 {
        (**self).time()
    }
}

/// A clock moved by hand, for simulation and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualClock {
    time: f64,
}

impl ManualClock {
    pub fn new(time: f64) -> Self {
        Self { time }
    }

    pub fn set(&mut self, time: f64) {
        self.time = time;
    }

    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds;
    }
}

impl SongClock for ManualClock {
    fn time(&self) -> f64 {
        self.time
    }
}
