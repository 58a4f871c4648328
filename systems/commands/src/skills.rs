//! Class skills and buffs.
//!
//! Skills are fire-and-forget key sequences; none of them read the player
//! position except [`Yaksha`], which faces the map centre when no direction
//! is given.

use std::time::Duration;

use maple_bot_core::{Direction, PressTiming};
use tracing::debug;

use crate::{
    args::{Argument, Bound, CommandError},
    keys::{
        HeldKey, BUFFS, DOMAIN, EXORCIST, HAKU, KISHIN, LEGION, NINE_TAILS, SHIKIGAMI, TENGU,
        YAKSHA,
    },
    Context,
};

/// Cooldown of the primary buff.
const HAKU_COOLDOWN: Duration = Duration::from_secs(490);

pub(crate) fn no_arguments(command: &'static str, args: &[Argument]) -> Result<(), CommandError> {
    let _ = Bound::new(command, &[], args)?;
    Ok(())
}

fn millis(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Fires the primary and secondary buffs whenever their cooldowns allow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buff {
    haku_fired: Option<Duration>,
    buffs_fired: Option<Duration>,
}

impl Buff {
    /// Creates a buff command that has never fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        no_arguments("Buff", args)?;
        Ok(Self::new())
    }

    pub(crate) fn execute(&mut self, ctx: &mut Context<'_>) {
        let now = ctx.clock.now();
        if is_ready(self.haku_fired, now, HAKU_COOLDOWN) {
            debug!("casting primary buff");
            ctx.keys.press(HAKU, 2, PressTiming::DEFAULT);
            self.haku_fired = Some(now);
        }
        if is_ready(self.buffs_fired, now, ctx.tuning.buff_cooldown) {
            debug!("casting secondary buffs");
            for key in BUFFS {
                ctx.keys
                    .press(key, 3, PressTiming::DEFAULT.with_up(millis(300)));
            }
            self.buffs_fired = Some(now);
        }
    }
}

fn is_ready(last: Option<Duration>, now: Duration, cooldown: Duration) -> bool {
    last.map_or(true, |fired| now.saturating_sub(fired) > cooldown)
}

/// Shikigami Haunting: repeated attacks while facing a direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shikigami {
    direction: Direction,
    attacks: u32,
    repetitions: u32,
}

impl Shikigami {
    /// Creates the attack; only left and right are accepted.
    pub fn new(direction: Direction, attacks: u32, repetitions: u32) -> Result<Self, CommandError> {
        Ok(Self {
            direction: crate::args::ensure_horizontal("Shikigami", direction)?,
            attacks,
            repetitions,
        })
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new(
            "Shikigami",
            &["direction", "num_attacks", "repetitions"],
            args,
        )?;
        Ok(Self {
            direction: bound.horizontal("direction")?,
            attacks: bound.count_or("num_attacks", 2)?,
            repetitions: bound.count_or("repetitions", 1)?,
        })
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) {
        ctx.sleep_millis(50);
        {
            let _held = HeldKey::hold(ctx.keys, self.direction.key());
            ctx.sleep_millis(50);
            for _ in 0..self.repetitions {
                if !ctx.enabled() {
                    break;
                }
                ctx.keys.press(
                    SHIKIGAMI,
                    self.attacks,
                    PressTiming::DEFAULT.with_up(millis(50)),
                );
            }
        }
        ctx.sleep_millis(150);
    }
}

/// Ghost Yaksha Boss, placed facing `direction` or the map centre.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Yaksha {
    direction: Option<Direction>,
}

impl Yaksha {
    /// Creates the placement; only left, right or `None` are accepted.
    pub fn new(direction: Option<Direction>) -> Result<Self, CommandError> {
        let direction = direction
            .map(|direction| crate::args::ensure_horizontal("Yaksha", direction))
            .transpose()?;
        Ok(Self { direction })
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Yaksha", &["direction"], args)?;
        Ok(Self {
            direction: bound.optional_horizontal("direction")?,
        })
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) {
        let facing = self.direction.unwrap_or_else(|| {
            if ctx.player_pos().x() > 0.5 {
                Direction::Left
            } else {
                Direction::Right
            }
        });
        ctx.keys.press(
            facing.key(),
            1,
            PressTiming::new(millis(100), millis(50)),
        );
        ctx.keys.press(YAKSHA, 3, PressTiming::DEFAULT);
    }
}

pub(crate) fn tengu(ctx: &mut Context<'_>) {
    ctx.keys.press(TENGU, 1, PressTiming::DEFAULT);
}

pub(crate) fn kishin(ctx: &mut Context<'_>) {
    ctx.keys
        .press(KISHIN, 4, PressTiming::new(millis(100), millis(150)));
}

pub(crate) fn nine_tails(ctx: &mut Context<'_>) {
    ctx.keys.press(NINE_TAILS, 3, PressTiming::DEFAULT);
}

pub(crate) fn exorcist(ctx: &mut Context<'_>) {
    ctx.keys
        .press(EXORCIST, 1, PressTiming::DEFAULT.with_down(millis(150)));
}

pub(crate) fn domain(ctx: &mut Context<'_>) {
    ctx.keys.press(DOMAIN, 3, PressTiming::DEFAULT);
}

pub(crate) fn legion(ctx: &mut Context<'_>) {
    ctx.keys
        .press(LEGION, 2, PressTiming::DEFAULT.with_down(millis(100)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldowns_are_exclusive() {
        let cooldown = Duration::from_secs(180);
        assert!(is_ready(None, Duration::ZERO, cooldown));
        assert!(!is_ready(Some(Duration::ZERO), cooldown, cooldown));
        assert!(is_ready(
            Some(Duration::ZERO),
            cooldown + Duration::from_millis(1),
            cooldown
        ));
    }

    #[test]
    fn skills_without_parameters_reject_arguments() {
        assert!(no_arguments("Tengu", &[]).is_ok());
        assert!(matches!(
            no_arguments("Tengu", &[Argument::positional("left")]),
            Err(CommandError::TooManyArguments { expected: 0, .. })
        ));
    }

    #[test]
    fn yaksha_only_faces_sideways() {
        assert!(Yaksha::new(Some(Direction::Down)).is_err());
        assert!(Yaksha::new(None).is_ok());
    }
}
