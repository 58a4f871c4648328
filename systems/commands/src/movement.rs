//! Feedback-controlled movement commands.

use std::{f64::consts::SQRT_2, time::Duration};

use maple_bot_core::{Direction, Position, PressTiming};
use rand::Rng;
use tracing::debug;

use crate::{
    args::{ensure_horizontal, Argument, Bound, CommandError},
    keys::{HeldKey, JUMP, TELEPORT},
    Context,
};

/// Chance that a horizontal correction jumps before teleporting.
const HORIZONTAL_JUMP_PROBABILITY: f64 = 0.1;
/// Interval between position samples while a key is held.
const HOLD_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);
/// Upper bound on position samples during a single held correction.
const MAX_HOLD_SAMPLES: u32 = 100;
/// Upper bound on jump taps during a fall.
const MAX_FALL_ATTEMPTS: u32 = 6;

/// Reports whether an axis offset is large enough to correct.
///
/// The threshold splits the tolerance evenly across both axes, so the
/// comparison is strict: an offset exactly at the threshold is left alone.
fn exceeds_axis_threshold(offset: f64, tolerance: f64) -> bool {
    offset.abs() > tolerance / SQRT_2
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn other(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Alternates axis corrections until `converged` holds, the budget runs out,
/// or the enabled flag drops.
///
/// Two consecutive passes without a correction mean both axes sit inside
/// the threshold, which ends the loop even if the distance check disagrees
/// by rounding.
fn correct_axes(
    ctx: &mut Context<'_>,
    counter: &mut u32,
    converged: impl Fn(Position) -> bool,
    mut correct: impl FnMut(&mut Context<'_>, Axis, Position) -> bool,
) {
    let mut axis = Axis::Horizontal;
    let mut idle_passes = 0;
    while ctx.enabled() && *counter > 0 {
        let position = ctx.player_pos();
        if converged(position) {
            break;
        }

        if correct(ctx, axis, position) {
            *counter -= 1;
            idle_passes = 0;
        } else {
            idle_passes += 1;
            if idle_passes >= 2 {
                break;
            }
        }
        axis = axis.other();
    }
}

/// Moves to a target along the layout's shortest path using teleports.
#[derive(Clone, Debug, PartialEq)]
pub struct Move {
    target: Position,
    adjust: bool,
    max_steps: u32,
    counter: u32,
}

impl Move {
    /// Step budget used when none is given.
    pub const DEFAULT_MAX_STEPS: u32 = 15;

    /// Creates a move towards `target`, optionally finishing with an [`Adjust`].
    pub fn new(target: Position, adjust: bool, max_steps: u32) -> Result<Self, CommandError> {
        Ok(Self {
            target,
            adjust,
            max_steps: positive_steps("Move", max_steps)?,
            counter: 0,
        })
    }

    pub(crate) const fn toward(target: Position, adjust: bool) -> Self {
        Self {
            target,
            adjust,
            max_steps: Self::DEFAULT_MAX_STEPS,
            counter: 0,
        }
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Move", &["x", "y", "adjust", "max_steps"], args)?;
        Ok(Self {
            target: Position::new(bound.float("x")?, bound.float("y")?),
            adjust: bound.boolean_or("adjust", false)?,
            max_steps: bound.steps_or("max_steps", Self::DEFAULT_MAX_STEPS)?,
            counter: 0,
        })
    }

    /// Final destination.
    #[must_use]
    pub const fn target(&self) -> Position {
        self.target
    }

    /// Step budget left over from the last execution.
    #[must_use]
    pub const fn remaining_steps(&self) -> u32 {
        self.counter
    }

    pub(crate) fn execute(&mut self, ctx: &mut Context<'_>) {
        self.counter = self.max_steps;
        let start = ctx.player_pos();
        let path = ctx.layout.shortest_path(start, self.target);
        debug!(%start, target = %self.target, hops = path.len(), "planned path");

        for waypoint in path {
            if !ctx.enabled() {
                return;
            }
            self.step_toward(ctx, waypoint);
        }

        if self.adjust && ctx.enabled() {
            Adjust::toward(self.target).execute(ctx);
        }
    }

    fn step_toward(&mut self, ctx: &mut Context<'_>, waypoint: Position) {
        let tolerance = ctx.tuning.move_tolerance;
        let target = self.target;
        correct_axes(
            ctx,
            &mut self.counter,
            |position| {
                position.distance(waypoint) <= tolerance || position.distance(target) <= tolerance
            },
            |ctx, axis, position| match axis {
                Axis::Horizontal => {
                    let dx = position.dx_to(waypoint);
                    if !exceeds_axis_threshold(dx, tolerance) {
                        return false;
                    }
                    let jump = ctx.rng.gen_bool(HORIZONTAL_JUMP_PROBABILITY);
                    let direction = Direction::horizontal_toward(dx);
                    debug!(%direction, dx, jump, "horizontal correction");
                    Teleport::new(direction, jump).execute(ctx);
                    true
                }
                Axis::Vertical => {
                    let dy = position.dy_to(waypoint);
                    if !exceeds_axis_threshold(dy, tolerance) {
                        return false;
                    }
                    let jump = dy.abs() > tolerance;
                    let direction = Direction::vertical_toward(dy);
                    debug!(%direction, dy, jump, "vertical correction");
                    Teleport::new(direction, jump).execute(ctx);
                    true
                }
            },
        );
    }
}

/// Fine-tunes the player position with small movements.
#[derive(Clone, Debug, PartialEq)]
pub struct Adjust {
    target: Position,
    max_steps: u32,
    counter: u32,
}

impl Adjust {
    /// Step budget used when none is given.
    pub const DEFAULT_MAX_STEPS: u32 = 5;

    /// Creates an adjustment towards `target`.
    pub fn new(target: Position, max_steps: u32) -> Result<Self, CommandError> {
        Ok(Self {
            target,
            max_steps: positive_steps("Adjust", max_steps)?,
            counter: 0,
        })
    }

    pub(crate) fn toward(target: Position) -> Self {
        Self {
            target,
            max_steps: Self::DEFAULT_MAX_STEPS,
            counter: 0,
        }
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Adjust", &["x", "y", "max_steps"], args)?;
        Ok(Self {
            target: Position::new(bound.float("x")?, bound.float("y")?),
            max_steps: bound.steps_or("max_steps", Self::DEFAULT_MAX_STEPS)?,
            counter: 0,
        })
    }

    /// Step budget left over from the last execution.
    #[must_use]
    pub const fn remaining_steps(&self) -> u32 {
        self.counter
    }

    pub(crate) fn execute(&mut self, ctx: &mut Context<'_>) {
        self.counter = self.max_steps;
        let tolerance = ctx.tuning.adjust_tolerance;
        let target = self.target;
        correct_axes(
            ctx,
            &mut self.counter,
            |position| position.distance(target) <= tolerance,
            |ctx, axis, position| match axis {
                Axis::Horizontal => {
                    let dx = position.dx_to(target);
                    if !exceeds_axis_threshold(dx, tolerance) {
                        return false;
                    }
                    hold_until_within(ctx, Direction::horizontal_toward(dx), target, tolerance);
                    true
                }
                Axis::Vertical => {
                    let dy = position.dy_to(target);
                    if !exceeds_axis_threshold(dy, tolerance) {
                        return false;
                    }
                    if dy < 0.0 {
                        Teleport::new(Direction::Up, false).execute(ctx);
                    } else {
                        drop_down(ctx);
                    }
                    true
                }
            },
        );
        debug!(target = %self.target, remaining = self.counter, "adjustment finished");
    }
}

/// Holds a horizontal arrow while the offset stays beyond the threshold.
fn hold_until_within(ctx: &Context<'_>, direction: Direction, target: Position, tolerance: f64) {
    let _held = HeldKey::hold(ctx.keys, direction.key());
    for _ in 0..MAX_HOLD_SAMPLES {
        if !ctx.enabled() {
            return;
        }
        let dx = ctx.player_pos().dx_to(target);
        let beyond = match direction {
            Direction::Left => -dx,
            _ => dx,
        };
        if !exceeds_axis_threshold(beyond.max(0.0), tolerance) {
            return;
        }
        ctx.clock.sleep(HOLD_SAMPLE_INTERVAL);
    }
}

/// Small drop through a platform: hold down and tap jump.
fn drop_down(ctx: &Context<'_>) {
    {
        let _held = HeldKey::hold(ctx.keys, Direction::Down.key());
        ctx.sleep_millis(50);
        ctx.keys
            .press(JUMP, 3, PressTiming::DEFAULT.with_down(Duration::from_millis(100)));
    }
    ctx.sleep_millis(50);
}

/// Teleports once in a direction, optionally jumping first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Teleport {
    direction: Direction,
    jump: bool,
}

impl Teleport {
    /// Creates a teleport.
    #[must_use]
    pub const fn new(direction: Direction, jump: bool) -> Self {
        Self { direction, jump }
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Teleport", &["direction", "jump"], args)?;
        Ok(Self {
            direction: bound.direction("direction")?,
            jump: bound.boolean_or("jump", false)?,
        })
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) {
        let presses = if self.direction.is_vertical() { 2 } else { 3 };
        let keys = ctx.keys;
        ctx.sleep_millis(50);

        // Up is held only after the jump; every other arrow is held first.
        let mut held = None;
        if self.direction != Direction::Up {
            held = Some(HeldKey::hold(keys, self.direction.key()));
            ctx.sleep_millis(50);
        }
        if self.jump {
            if self.direction == Direction::Down {
                keys.press(JUMP, 3, PressTiming::DEFAULT.with_down(Duration::from_millis(100)));
            } else {
                keys.press(JUMP, 1, PressTiming::DEFAULT);
            }
        }
        if held.is_none() {
            held = Some(HeldKey::hold(keys, self.direction.key()));
            ctx.sleep_millis(50);
        }
        keys.press(TELEPORT, presses, PressTiming::DEFAULT);
        drop(held);

        if ctx.tuning.record_layout {
            let position = ctx.player_pos();
            ctx.layout.add(position);
        }
    }
}

/// Down-jumps and free-falls until the player has dropped far enough.
#[derive(Clone, Debug, PartialEq)]
pub struct Fall {
    distance: Option<f64>,
}

impl Fall {
    /// Creates a fall; `None` falls half the move tolerance.
    pub fn new(distance: Option<f64>) -> Result<Self, CommandError> {
        if let Some(value) = distance {
            if !value.is_finite() || value < 0.0 {
                return Err(CommandError::InvalidNumber {
                    command: "Fall",
                    param: "distance",
                    value: value.to_string(),
                });
            }
        }
        Ok(Self { distance })
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Fall", &["distance"], args)?;
        Self::new(bound.optional_float("distance")?)
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) {
        let distance = self
            .distance
            .unwrap_or(ctx.tuning.move_tolerance / 2.0);
        let start = ctx.player_pos();
        {
            let _held = HeldKey::hold(ctx.keys, Direction::Down.key());
            ctx.sleep_millis(50);
            for _ in 0..MAX_FALL_ATTEMPTS {
                if !ctx.enabled() || start.distance(ctx.player_pos()) >= distance {
                    break;
                }
                ctx.keys
                    .press(JUMP, 1, PressTiming::DEFAULT.with_down(Duration::from_millis(100)));
            }
        }
        ctx.sleep_millis(100);
    }
}

/// Walks in a horizontal direction for a fixed time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Walk {
    direction: Direction,
    duration: Duration,
}

impl Walk {
    /// Creates a walk; only left and right are accepted.
    pub fn new(direction: Direction, duration: Duration) -> Result<Self, CommandError> {
        Ok(Self {
            direction: ensure_horizontal("Walk", direction)?,
            duration,
        })
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Walk", &["direction", "duration"], args)?;
        Ok(Self {
            direction: bound.horizontal("direction")?,
            duration: bound.duration("duration")?,
        })
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) {
        {
            let _held = HeldKey::hold(ctx.keys, self.direction.key());
            ctx.clock.sleep(self.duration);
        }
        ctx.sleep_millis(50);
    }
}

fn positive_steps(command: &'static str, max_steps: u32) -> Result<u32, CommandError> {
    if max_steps == 0 {
        return Err(CommandError::NonPositiveSteps {
            command,
            param: "max_steps",
            value: max_steps.to_string(),
        });
    }
    Ok(max_steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_threshold_is_strict() {
        let tolerance = 0.1;
        let threshold = tolerance / SQRT_2;
        assert!(!exceeds_axis_threshold(threshold, tolerance));
        assert!(!exceeds_axis_threshold(-threshold, tolerance));
        assert!(exceeds_axis_threshold(threshold + 1e-9, tolerance));
        assert!(exceeds_axis_threshold(-threshold - 1e-9, tolerance));
    }

    #[test]
    fn zero_step_budgets_are_rejected() {
        assert!(Move::new(Position::new(0.5, 0.5), false, 0).is_err());
        assert!(Adjust::new(Position::new(0.5, 0.5), 0).is_err());
        assert!(Move::new(Position::new(0.5, 0.5), false, 1).is_ok());
    }

    #[test]
    fn walk_rejects_vertical_directions() {
        assert!(Walk::new(Direction::Up, Duration::from_secs(1)).is_err());
        assert!(Walk::new(Direction::Left, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn fall_rejects_negative_distances() {
        assert!(Fall::new(Some(-0.1)).is_err());
        assert!(Fall::new(None).is_ok());
    }
}
