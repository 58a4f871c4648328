#![allow(dead_code)]

use std::{
    io,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use maple_bot_core::{Clock, Key, Position};
use maple_bot_system_commands::{Command, Context, Labels, Tuning};
use maple_bot_world::{
    simulation::{KeyEvent, SimulatedGame, SimulationConfig},
    EnabledSwitch, SharedState, WaypointGraph,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{filter::LevelFilter, fmt::MakeWriter};

/// Simulation in which keys never move the player.
pub fn frozen() -> SimulationConfig {
    SimulationConfig {
        teleport_distance: 0.0,
        drop_distance: 0.0,
        walk_speed: 0.0,
        ..SimulationConfig::default()
    }
}

pub struct Rig {
    pub state: SharedState,
    switch: Option<EnabledSwitch>,
    pub game: Arc<SimulatedGame>,
    pub layout: WaypointGraph,
    pub tuning: Tuning,
    pub rng: ChaCha8Rng,
    pub labels: Labels,
    pub cursor: usize,
}

impl Rig {
    pub fn new(config: SimulationConfig, start: Position) -> Self {
        let (state, handles) = SharedState::create();
        handles.switch.enable();
        let game = Arc::new(SimulatedGame::new(config, handles.producer, start));
        Self {
            state,
            switch: Some(handles.switch),
            game,
            layout: WaypointGraph::new(0.15),
            tuning: Tuning::default(),
            rng: ChaCha8Rng::seed_from_u64(7),
            labels: Labels::default(),
            cursor: 0,
        }
    }

    pub fn disable(&self) {
        if let Some(switch) = &self.switch {
            switch.disable();
        }
    }

    /// Hands the switch to a clock that disables execution after `after`
    /// sleeps.
    pub fn disabling_clock(&mut self, after: u32) -> DisablingClock {
        let switch = self.switch.take().expect("switch already handed out");
        DisablingClock::new(Arc::clone(&self.game), switch, after)
    }

    pub fn execute(&mut self, command: &mut Command) {
        let game = Arc::clone(&self.game);
        self.execute_with_clock(command, game.as_ref());
    }

    pub fn execute_with_clock(&mut self, command: &mut Command, clock: &dyn Clock) {
        let mut ctx = Context {
            keys: self.game.as_ref(),
            clock,
            state: &self.state,
            layout: &mut self.layout,
            tuning: &self.tuning,
            rng: &mut self.rng,
            labels: &self.labels,
            cursor: &mut self.cursor,
        };
        command.execute(&mut ctx);
    }

    pub fn position(&self) -> Position {
        self.state.player_pos()
    }

    pub fn log(&self) -> Vec<KeyEvent> {
        self.game.key_log()
    }
}

/// Clock that forwards to the simulation and disables execution after a
/// number of sleeps.
pub struct DisablingClock {
    pub game: Arc<SimulatedGame>,
    pub switch: EnabledSwitch,
    pub after: u32,
    pub sleeps: AtomicU32,
}

impl DisablingClock {
    pub fn new(game: Arc<SimulatedGame>, switch: EnabledSwitch, after: u32) -> Self {
        Self {
            game,
            switch,
            after,
            sleeps: AtomicU32::new(0),
        }
    }
}

impl Clock for DisablingClock {
    fn now(&self) -> Duration {
        self.game.now()
    }

    fn sleep(&self, duration: Duration) {
        self.game.sleep(duration);
        if self.sleeps.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.switch.disable();
        }
    }
}

pub fn downs_of(log: &[KeyEvent], key: Key) -> usize {
    log.iter()
        .filter(|event| **event == KeyEvent::Down(key))
        .count()
}

pub fn ups_of(log: &[KeyEvent], key: Key) -> usize {
    log.iter()
        .filter(|event| **event == KeyEvent::Up(key))
        .count()
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` under a plain-text subscriber and returns everything it logged.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(LevelFilter::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
