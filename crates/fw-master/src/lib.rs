//! Headless session controller for footwork.
//!
//! Owns a chart and one engine per player, drives them from a shared song
//! clock and collects their events. Both the CLI and integration tests go
//! through this crate.

mod autoplay;
mod clock;
mod loader;

use thiserror::Error;

// Re-export common types so callers don't need fw-ir/fw-engine directly.
pub use fw_engine::{
    Band, ConfigError, Engine, GameEvent, Grade, JudgeConfig, ManualClock, Results, SongClock,
};
pub use fw_ir::{Chart, Direction, InputAction, InputCommand};

pub use autoplay::{autoplay, ROLL_RETAP, TAP_LENGTH};
pub use clock::StdClock;
pub use loader::{
    load_chart, load_inputs, load_judge_config, read_chart, read_inputs, read_judge_config,
    LoadError,
};

/// Time kept running after the last step ends so trailing timers resolve.
pub const LINGER: f64 = 1.0;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session needs at least one player")]
    NoPlayers,
    #[error("no player {0}")]
    UnknownPlayer(usize),
    #[error("input queue full for player {player}")]
    InputDropped { player: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One chart played by any number of independent players.
pub struct Session {
    chart: Chart,
    engines: Vec<Engine>,
    events: Vec<(usize, GameEvent)>,
    time: f64,
}

impl Session {
    pub fn new(chart: Chart, config: JudgeConfig, players: usize) -> Result<Self, SessionError> {
        if players == 0 {
            return Err(SessionError::NoPlayers);
        }
        let engines = (0..players)
            .map(|_| Engine::with_config(&chart, config.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("session '{}': {} steps, {} player(s)", chart.title, chart.steps.len(), players);
        Ok(Self { chart, engines, events: Vec::new(), time: f64::NEG_INFINITY })
    }

    /// Advance every engine to the clock's time and resolve queued input.
    /// Events from this frame replace those of the previous one.
    pub fn frame<C: SongClock + ?Sized>(&mut self, clock: &C) {
        self.events.clear();
        self.time = clock.time();
        for (player, engine) in self.engines.iter_mut().enumerate() {
            engine.update(clock);
            engine.process_inputs();
            self.events.extend(engine.drain_events().map(|event| (player, event)));
        }
    }

    pub fn push_input(&mut self, player: usize, command: InputCommand) -> Result<(), SessionError> {
        let engine = self.engines.get_mut(player).ok_or(SessionError::UnknownPlayer(player))?;
        if engine.queue_input(command) {
            Ok(())
        } else {
            Err(SessionError::InputDropped { player })
        }
    }

    /// The song has ended and every player's timers have resolved.
    pub fn is_finished(&self) -> bool {
        self.time >= self.chart.end_time() + LINGER && self.engines.iter().all(Engine::is_complete)
    }

    pub fn results(&self) -> Vec<Results> {
        self.engines.iter().map(Engine::results).collect()
    }

    /// Events from the last frame, tagged with their player.
    pub fn events(&self) -> &[(usize, GameEvent)] {
        &self.events
    }

    pub fn engine(&self, player: usize) -> Option<&Engine> {
        self.engines.get(player)
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn players(&self) -> usize {
        self.engines.len()
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}
