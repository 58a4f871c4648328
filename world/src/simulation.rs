//! Simulated game used by tests and the command-line dry run.
//!
//! [`SimulatedGame`] stands in for the key backend, the clock, and the
//! position producer at once: key presses move the simulated player, every
//! primitive call is recorded, and time only advances when something sleeps
//! (unless the simulation runs in real time).

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use maple_bot_core::{Clock, Image, Key, KeyInput, Match, Matcher, Position, PressTiming, Template};

use crate::ProducerHandle;

/// Tuning for the simulated player.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    /// Key whose taps teleport along the held arrow.
    pub teleport_key: Key,
    /// Key whose taps drop the player while `down` is held.
    pub jump_key: Key,
    /// Distance covered by each teleport tap.
    pub teleport_distance: f64,
    /// Distance dropped by each jump tap while `down` is held.
    pub drop_distance: f64,
    /// Horizontal walking speed in units per second.
    pub walk_speed: f64,
    /// Whether sleeping also blocks the calling thread.
    pub realtime: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            teleport_key: Key::Char('e'),
            jump_key: Key::Space,
            teleport_distance: 0.05,
            drop_distance: 0.02,
            walk_speed: 0.1,
            realtime: false,
        }
    }
}

/// Primitive call recorded by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    /// `press(key, count, ..)`.
    Press {
        /// Tapped key.
        key: Key,
        /// Number of taps.
        count: u32,
    },
    /// `key_down(key)`.
    Down(Key),
    /// `key_up(key)`.
    Up(Key),
}

#[derive(Debug)]
struct Sim {
    config: SimulationConfig,
    now: Duration,
    position: Position,
    held: Vec<Key>,
    log: Vec<KeyEvent>,
    producer: ProducerHandle,
}

impl Sim {
    fn held_arrow(&self) -> Option<Key> {
        self.held
            .iter()
            .rev()
            .copied()
            .find(|key| matches!(key, Key::Left | Key::Right | Key::Up | Key::Down))
    }

    fn tap(&mut self, key: Key) {
        let (mut dx, mut dy) = (0.0, 0.0);
        if key == self.config.teleport_key {
            let step = self.config.teleport_distance;
            match self.held_arrow() {
                Some(Key::Left) => dx = -step,
                Some(Key::Right) => dx = step,
                Some(Key::Up) => dy = -step,
                Some(Key::Down) => dy = step,
                _ => {}
            }
        } else if key == self.config.jump_key && self.held.contains(&Key::Down) {
            dy = self.config.drop_distance;
        }
        self.move_by(dx, dy);
    }

    /// Walks along held horizontal arrows for `duration`.
    fn advance(&mut self, duration: Duration) {
        let distance = self.config.walk_speed * duration.as_secs_f64();
        let mut dx = 0.0;
        if self.held.contains(&Key::Left) {
            dx -= distance;
        }
        if self.held.contains(&Key::Right) {
            dx += distance;
        }
        self.now += duration;
        self.move_by(dx, 0.0);
    }

    fn move_by(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.position = self.position.translated(dx, dy);
        self.producer.set_player_pos(self.position);
    }
}

/// Simulated key backend, clock and position producer.
#[derive(Debug)]
pub struct SimulatedGame {
    sim: Mutex<Sim>,
}

impl SimulatedGame {
    /// Creates a simulation with the player standing at `start`.
    #[must_use]
    pub fn new(config: SimulationConfig, producer: ProducerHandle, start: Position) -> Self {
        producer.set_player_pos(start);
        Self {
            sim: Mutex::new(Sim {
                config,
                now: Duration::ZERO,
                position: start,
                held: Vec::new(),
                log: Vec::new(),
                producer,
            }),
        }
    }

    /// Publishes a plain grey frame and minimap so the monitor has input.
    pub fn publish_idle_capture(&self) {
        let sim = self.lock();
        sim.producer.publish_capture(
            Image::filled(800, 600, [96, 96, 96]),
            Image::filled(200, 120, [96, 96, 96]),
        );
    }

    /// Current simulated position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.lock().position
    }

    /// Keys currently held down.
    #[must_use]
    pub fn held_keys(&self) -> Vec<Key> {
        self.lock().held.clone()
    }

    /// Every primitive call recorded so far.
    #[must_use]
    pub fn key_log(&self) -> Vec<KeyEvent> {
        self.lock().log.clone()
    }

    /// Number of `press` calls issued for `key`.
    #[must_use]
    pub fn presses_of(&self, key: Key) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|event| matches!(event, KeyEvent::Press { key: pressed, .. } if *pressed == key))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Sim> {
        self.sim.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn block_if_realtime(realtime: bool, duration: Duration) {
    if realtime {
        std::thread::sleep(duration);
    }
}

impl KeyInput for SimulatedGame {
    fn press(&self, key: Key, count: u32, timing: PressTiming) {
        let realtime = {
            let mut sim = self.lock();
            sim.log.push(KeyEvent::Press { key, count });
            for _ in 0..count {
                sim.tap(key);
                sim.now += timing.down() + timing.up();
            }
            sim.config.realtime
        };
        block_if_realtime(realtime, (timing.down() + timing.up()) * count);
    }

    fn key_down(&self, key: Key) {
        let mut sim = self.lock();
        sim.log.push(KeyEvent::Down(key));
        if !sim.held.contains(&key) {
            sim.held.push(key);
        }
    }

    fn key_up(&self, key: Key) {
        let mut sim = self.lock();
        sim.log.push(KeyEvent::Up(key));
        sim.held.retain(|held| *held != key);
    }
}

impl Clock for SimulatedGame {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let realtime = {
            let mut sim = self.lock();
            sim.advance(duration);
            sim.config.realtime
        };
        block_if_realtime(realtime, duration);
    }
}

/// Matcher that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleMatcher;

impl Matcher for IdleMatcher {
    fn multi_match(&self, _image: &Image, _template: Template, _threshold: f32) -> Vec<Match> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SharedState;

    #[test]
    fn teleport_taps_move_along_held_arrow() {
        let (state, handles) = SharedState::create();
        let game = SimulatedGame::new(
            SimulationConfig::default(),
            handles.producer,
            Position::new(0.5, 0.5),
        );

        game.key_down(Key::Left);
        game.press(Key::Char('e'), 2, PressTiming::DEFAULT);
        game.key_up(Key::Left);

        assert!((state.player_pos().x() - 0.4).abs() < 1e-9);
        assert!(game.held_keys().is_empty());
        assert_eq!(game.now(), Duration::from_millis(300));
    }

    #[test]
    fn holding_an_arrow_walks_while_time_passes() {
        let (state, handles) = SharedState::create();
        let game = SimulatedGame::new(
            SimulationConfig::default(),
            handles.producer,
            Position::new(0.5, 0.5),
        );

        game.key_down(Key::Right);
        game.sleep(Duration::from_secs(1));
        game.key_up(Key::Right);

        assert!((state.player_pos().x() - 0.6).abs() < 1e-9);
    }
}
