#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the maple bot.
//!
//! This crate defines the vocabulary that connects the execution engine, the
//! environment monitor, and the collaborators living outside the bot: the
//! key actuation backend, the clock, the waypoint layout, template matching,
//! and alert playback. Systems only ever talk to those collaborators through
//! the traits declared here, which keeps them testable against a simulated
//! game.

use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use glam::DVec2;
use thiserror::Error;

pub mod vision;

pub use vision::{ColorRange, Image, Match, Matcher, Template};

/// Location of the player in normalised game space.
///
/// Both axes span `0.0..=1.0` across the minimap. The vertical axis grows
/// downwards, matching screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position(DVec2);

impl Position {
    /// Creates a new position from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(self) -> f64 {
        self.0.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(self) -> f64 {
        self.0.y
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f64 {
        self.0.distance(other.0)
    }

    /// Signed horizontal offset required to reach `target`.
    #[must_use]
    pub fn dx_to(self, target: Position) -> f64 {
        target.0.x - self.0.x
    }

    /// Signed vertical offset required to reach `target`.
    #[must_use]
    pub fn dy_to(self, target: Position) -> f64 {
        target.0.y - self.0.y
    }

    /// Returns the position translated by the provided offsets.
    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self(self.0 + DVec2::new(dx, dy))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.0.x, self.0.y)
    }
}

/// Cardinal directions the player can travel in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards decreasing `x`.
    Left,
    /// Towards increasing `x`.
    Right,
    /// Towards decreasing `y`.
    Up,
    /// Towards increasing `y`.
    Down,
}

impl Direction {
    /// Horizontal direction that reduces the provided signed offset.
    #[must_use]
    pub fn horizontal_toward(dx: f64) -> Self {
        if dx < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }

    /// Vertical direction that reduces the provided signed offset.
    #[must_use]
    pub fn vertical_toward(dy: f64) -> Self {
        if dy < 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Reports whether the direction travels along the vertical axis.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Arrow key that moves the player in this direction.
    #[must_use]
    pub const fn key(self) -> Key {
        match self {
            Self::Left => Key::Left,
            Self::Right => Key::Right,
            Self::Up => Key::Up,
            Self::Down => Key::Down,
        }
    }

    /// Lower-case token used in routine files.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error produced when a direction token is not one of the four arrows.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("'{0}' is not a valid direction")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ParseDirectionError(value.to_owned())),
        }
    }
}

/// Physical keys the bot actuates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Space bar.
    Space,
    /// Escape.
    Escape,
    /// Control.
    Ctrl,
    /// Left shift.
    LeftShift,
    /// Function key `F1` through `F12`.
    F(u8),
    /// Any printable key.
    Char(char),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Space => f.write_str("space"),
            Self::Escape => f.write_str("esc"),
            Self::Ctrl => f.write_str("ctrl"),
            Self::LeftShift => f.write_str("lshift"),
            Self::F(index) => write!(f, "f{index}"),
            Self::Char(value) => write!(f, "{value}"),
        }
    }
}

/// Hold and release durations applied to every tap of a [`KeyInput::press`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PressTiming {
    down: Duration,
    up: Duration,
}

impl PressTiming {
    /// Timing used when a command does not ask for anything specific.
    pub const DEFAULT: Self = Self::new(Duration::from_millis(50), Duration::from_millis(100));

    /// Creates a timing with explicit hold and release durations.
    #[must_use]
    pub const fn new(down: Duration, up: Duration) -> Self {
        Self { down, up }
    }

    /// Overrides how long the key stays held per tap.
    #[must_use]
    pub const fn with_down(self, down: Duration) -> Self {
        Self { down, up: self.up }
    }

    /// Overrides the pause after each release.
    #[must_use]
    pub const fn with_up(self, up: Duration) -> Self {
        Self { down: self.down, up }
    }

    /// Time each tap keeps the key held.
    #[must_use]
    pub const fn down(&self) -> Duration {
        self.down
    }

    /// Time waited after each release.
    #[must_use]
    pub const fn up(&self) -> Duration {
        self.up
    }
}

impl Default for PressTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Key actuation backend.
///
/// Calls are assumed reliable and are never retried. Implementations own the
/// timing of `press`, which blocks until every tap completed.
pub trait KeyInput: Send + Sync {
    /// Taps `key` `count` times using the provided timing.
    fn press(&self, key: Key, count: u32, timing: PressTiming);

    /// Holds `key` until a matching [`KeyInput::key_up`].
    fn key_down(&self, key: Key);

    /// Releases a previously held `key`.
    fn key_up(&self, key: Key);
}

/// Monotonic time source used for delays and cooldowns.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Waypoint graph answering shortest-path queries between positions.
pub trait Layout: Send {
    /// Ordered waypoints leading from `from` to `to`, ending at `to`.
    fn shortest_path(&self, from: Position, to: Position) -> Vec<Position>;

    /// Records an observed position as a new waypoint.
    fn add(&mut self, position: Position);
}

/// Audio cues played by the monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Track {
    /// Looping alarm for hazards.
    Siren,
    /// Short notification chime.
    Ding,
    /// Chime announcing a rune on the minimap.
    RuneAppeared,
}

impl Track {
    /// File stem of the track inside the alerts directory.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Siren => "siren",
            Self::Ding => "ding",
            Self::RuneAppeared => "rune_appeared",
        }
    }
}

/// Fire-and-forget audio playback.
pub trait AlertPlayer: Send + Sync {
    /// Starts playing `track`, looping until [`AlertPlayer::stop`] when requested.
    fn play(&self, track: Track, volume: f32, looping: bool);

    /// Stops any playing track.
    fn stop(&self);
}

/// Reports whether the operator is holding the acknowledgement hotkey.
pub trait Hotkey: Send + Sync {
    /// Current state of the hotkey.
    fn is_pressed(&self) -> bool;
}
