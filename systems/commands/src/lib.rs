#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-loop command execution for the maple bot.
//!
//! A [`Routine`] is an ordered list of labels, waypoints and [`Command`]
//! values. The [`Engine`] walks it one entry at a time; movement commands
//! read the live player position on every control iteration and translate
//! the remaining error into primitive key actions. Every loop polls the
//! shared enabled flag at its head and returns early once it drops, releasing
//! any held key on the way out.

use std::time::Duration;

use maple_bot_core::{Clock, KeyInput, Layout, Position};
use maple_bot_world::SharedState;
use rand::RngCore;

mod args;
mod engine;
pub mod keys;
mod movement;
mod routine;
mod sequence;
mod skills;

pub use args::{Argument, CommandError};
pub use engine::{Config, Engine};
pub use movement::{Adjust, Fall, Move, Teleport, Walk};
pub use routine::{Entry, Labels, Point, Routine, RoutineError};
pub use sequence::{Goto, Wait};
pub use skills::{Buff, Shikigami, Yaksha};

/// Tolerances and cooldowns shared by every command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    /// Distance at which a `Move` considers a waypoint reached.
    pub move_tolerance: f64,
    /// Distance at which an `Adjust` considers the target reached.
    pub adjust_tolerance: f64,
    /// Minimum time between two firings of the secondary buffs.
    pub buff_cooldown: Duration,
    /// Whether teleports record the landing position into the layout.
    pub record_layout: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            move_tolerance: 0.1,
            adjust_tolerance: 0.01,
            buff_cooldown: Duration::from_secs(180),
            record_layout: false,
        }
    }
}

/// Everything a command may touch while it executes.
pub struct Context<'a> {
    /// Key actuation backend.
    pub keys: &'a dyn KeyInput,
    /// Time source for delays and cooldowns.
    pub clock: &'a dyn Clock,
    /// Shared runtime state, read for position and the enabled flag.
    pub state: &'a SharedState,
    /// Waypoint graph used for path planning.
    pub layout: &'a mut dyn Layout,
    /// Tolerances and cooldowns.
    pub tuning: &'a Tuning,
    /// Source of randomness for jump decisions.
    pub rng: &'a mut dyn RngCore,
    /// Labels of the routine being executed.
    pub labels: &'a Labels,
    /// Index of the routine entry being executed.
    pub cursor: &'a mut usize,
}

impl Context<'_> {
    /// Whether execution may continue.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Latest player position estimate.
    #[must_use]
    pub fn player_pos(&self) -> Position {
        self.state.player_pos()
    }

    pub(crate) fn sleep_millis(&self, millis: u64) {
        self.clock.sleep(Duration::from_millis(millis));
    }
}

/// Unit of bot behaviour with validated parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Path-following movement to a target.
    Move(Move),
    /// Fine positional correction.
    Adjust(Adjust),
    /// Single teleport in a direction.
    Teleport(Teleport),
    /// Down-jump and free fall.
    Fall(Fall),
    /// Timed walk.
    Walk(Walk),
    /// Jump to a routine label.
    Goto(Goto),
    /// Pure delay.
    Wait(Wait),
    /// Cooldown-gated buffs.
    Buff(Buff),
    /// Shikigami Haunting attack.
    Shikigami(Shikigami),
    /// Tengu Strike.
    Tengu,
    /// Ghost Yaksha Boss placement.
    Yaksha(Yaksha),
    /// Kishin Shoukan.
    Kishin,
    /// Nine-Tailed Fury.
    NineTails,
    /// Exorcist's Charm.
    Exorcist,
    /// Spirit's Domain.
    Domain,
    /// Great Oni Lord's Legion.
    Legion,
}

impl Command {
    /// Builds a command from its routine name and raw arguments.
    ///
    /// All validation happens here, before any key is touched.
    pub fn parse(name: &str, args: &[Argument]) -> Result<Self, CommandError> {
        let command = match name.trim().to_ascii_lowercase().as_str() {
            "move" => Self::Move(Move::parse(args)?),
            "adjust" => Self::Adjust(Adjust::parse(args)?),
            "teleport" => Self::Teleport(Teleport::parse(args)?),
            "fall" => Self::Fall(Fall::parse(args)?),
            "walk" => Self::Walk(Walk::parse(args)?),
            "goto" => Self::Goto(Goto::parse(args)?),
            "wait" => Self::Wait(Wait::parse(args)?),
            "buff" => Self::Buff(Buff::parse(args)?),
            "shikigami" => Self::Shikigami(Shikigami::parse(args)?),
            "yaksha" => Self::Yaksha(Yaksha::parse(args)?),
            "tengu" => skills::no_arguments("Tengu", args).map(|()| Self::Tengu)?,
            "kishin" => skills::no_arguments("Kishin", args).map(|()| Self::Kishin)?,
            "ninetails" => skills::no_arguments("NineTails", args).map(|()| Self::NineTails)?,
            "exorcist" => skills::no_arguments("Exorcist", args).map(|()| Self::Exorcist)?,
            "domain" => skills::no_arguments("Domain", args).map(|()| Self::Domain)?,
            "legion" => skills::no_arguments("Legion", args).map(|()| Self::Legion)?,
            _ => return Err(CommandError::UnknownCommand(name.trim().to_owned())),
        };
        Ok(command)
    }

    /// Name of the command as written in routines.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move(_) => "Move",
            Self::Adjust(_) => "Adjust",
            Self::Teleport(_) => "Teleport",
            Self::Fall(_) => "Fall",
            Self::Walk(_) => "Walk",
            Self::Goto(_) => "Goto",
            Self::Wait(_) => "Wait",
            Self::Buff(_) => "Buff",
            Self::Shikigami(_) => "Shikigami",
            Self::Tengu => "Tengu",
            Self::Yaksha(_) => "Yaksha",
            Self::Kishin => "Kishin",
            Self::NineTails => "NineTails",
            Self::Exorcist => "Exorcist",
            Self::Domain => "Domain",
            Self::Legion => "Legion",
        }
    }

    /// Runs the command to completion or until the enabled flag drops.
    pub fn execute(&mut self, ctx: &mut Context<'_>) {
        if !ctx.enabled() {
            return;
        }
        match self {
            Self::Move(command) => command.execute(ctx),
            Self::Adjust(command) => command.execute(ctx),
            Self::Teleport(command) => command.execute(ctx),
            Self::Fall(command) => command.execute(ctx),
            Self::Walk(command) => command.execute(ctx),
            Self::Goto(command) => command.execute(ctx),
            Self::Wait(command) => command.execute(ctx),
            Self::Buff(command) => command.execute(ctx),
            Self::Shikigami(command) => command.execute(ctx),
            Self::Tengu => skills::tengu(ctx),
            Self::Yaksha(command) => command.execute(ctx),
            Self::Kishin => skills::kishin(ctx),
            Self::NineTails => skills::nine_tails(ctx),
            Self::Exorcist => skills::exorcist(ctx),
            Self::Domain => skills::domain(ctx),
            Self::Legion => skills::legion(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<Argument> {
        tokens.iter().map(|token| Argument::parse(token)).collect()
    }

    #[test]
    fn parse_dispatches_on_case_insensitive_names() {
        let command = Command::parse("teleport", &args(&["left", "jump=true"])).expect("valid");
        assert_eq!(command.name(), "Teleport");

        let command = Command::parse("NineTails", &[]).expect("valid");
        assert_eq!(command, Command::NineTails);
    }

    #[test]
    fn parse_rejects_invalid_arguments_before_execution() {
        assert_eq!(
            Command::parse("Dash", &[]),
            Err(CommandError::UnknownCommand("Dash".to_owned()))
        );
        assert!(matches!(
            Command::parse("Teleport", &args(&["sideways"])),
            Err(CommandError::InvalidDirection { .. })
        ));
        assert!(matches!(
            Command::parse("Move", &args(&["0.5", "abc"])),
            Err(CommandError::InvalidNumber { param: "y", .. })
        ));
        assert!(matches!(
            Command::parse("Move", &args(&["0.5", "0.5", "false", "0"])),
            Err(CommandError::NonPositiveSteps { .. })
        ));
        assert!(matches!(
            Command::parse("Tengu", &args(&["1"])),
            Err(CommandError::TooManyArguments { expected: 0, .. })
        ));
    }
}
