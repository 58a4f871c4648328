//! Routine model and its line-oriented text format.
//!
//! ```text
//! # comment
//! @, label=start
//! *, x=0.30, y=0.55, adjust=true
//!     Shikigami, left, num_attacks=3
//! Buff
//! Goto, start
//! ```
//!
//! Lines indented by whitespace attach commands to the preceding point.

use std::collections::HashMap;

use maple_bot_core::Position;
use thiserror::Error;

use crate::{
    args::{Argument, Bound, CommandError},
    Command, Context, Move,
};

/// Failures raised while parsing routine text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RoutineError {
    /// A command, label or point failed validation.
    #[error("line {line}: {source}")]
    Command {
        /// One-based line number.
        line: usize,
        /// Underlying validation failure.
        #[source]
        source: CommandError,
    },
    /// An indented command does not follow a point.
    #[error("line {line}: indented command does not belong to a point")]
    OrphanCommand {
        /// One-based line number.
        line: usize,
    },
    /// The line could not be split into an entry.
    #[error("line {line}: {reason}")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// Human readable description.
        reason: &'static str,
    },
}

/// Waypoint with commands executed on arrival.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    location: Position,
    adjust: bool,
    commands: Vec<Command>,
}

impl Point {
    /// Creates a point with no attached commands.
    #[must_use]
    pub const fn new(location: Position, adjust: bool) -> Self {
        Self {
            location,
            adjust,
            commands: Vec::new(),
        }
    }

    /// Appends a command executed after arriving.
    #[must_use]
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Where the point sits on the minimap.
    #[must_use]
    pub const fn location(&self) -> Position {
        self.location
    }

    /// Whether arrival is refined with an adjustment.
    #[must_use]
    pub const fn adjust(&self) -> bool {
        self.adjust
    }

    /// Commands executed after arriving.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn execute(&mut self, ctx: &mut Context<'_>) {
        Move::toward(self.location, self.adjust).execute(ctx);
        for command in &mut self.commands {
            if !ctx.enabled() {
                return;
            }
            command.execute(ctx);
        }
    }
}

/// One step of a routine.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// Jump target for `Goto`; does nothing when executed.
    Label(String),
    /// Waypoint with attached commands.
    Point(Point),
    /// Standalone command.
    Command(Command),
}

impl Entry {
    /// Executes the entry.
    pub fn execute(&mut self, ctx: &mut Context<'_>) {
        match self {
            Self::Label(_) => {}
            Self::Point(point) => point.execute(ctx),
            Self::Command(command) => command.execute(ctx),
        }
    }

    /// Whether executing the entry never sends input.
    pub(crate) const fn is_passive(&self) -> bool {
        matches!(self, Self::Label(_) | Self::Command(Command::Goto(_)))
    }
}

/// Label name to routine index lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels {
    indices: HashMap<String, usize>,
}

impl Labels {
    fn collect(entries: &[Entry]) -> Self {
        let mut indices = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            if let Entry::Label(name) = entry {
                let _ = indices.entry(name.clone()).or_insert(index);
            }
        }
        Self { indices }
    }

    /// Index of the first entry carrying `label`.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.indices.get(label).copied()
    }
}

/// Ordered plan executed by the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Routine {
    entries: Vec<Entry>,
    labels: Labels,
}

impl Routine {
    /// Builds a routine from entries.
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        let labels = Labels::collect(&entries);
        Self { entries, labels }
    }

    /// Parses routine text.
    pub fn parse(text: &str) -> Result<Self, RoutineError> {
        let mut entries = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default();
            if content.trim().is_empty() {
                continue;
            }
            let indented = content.starts_with(char::is_whitespace);
            let mut tokens = content.split(',').map(str::trim);
            let kind = tokens.next().unwrap_or_default();
            if kind.is_empty() {
                return Err(RoutineError::Malformed {
                    line,
                    reason: "missing entry kind before the first comma",
                });
            }
            let args: Vec<Argument> = tokens
                .map(|token| {
                    if token.is_empty() {
                        Err(RoutineError::Malformed {
                            line,
                            reason: "empty argument",
                        })
                    } else {
                        Ok(Argument::parse(token))
                    }
                })
                .collect::<Result<_, _>>()?;
            let wrap = |source| RoutineError::Command { line, source };

            match kind {
                "@" => entries.push(Entry::Label(parse_label(&args).map_err(wrap)?)),
                "*" => entries.push(Entry::Point(parse_point(&args).map_err(wrap)?)),
                name => {
                    let command = Command::parse(name, &args).map_err(wrap)?;
                    if !indented {
                        entries.push(Entry::Command(command));
                        continue;
                    }
                    match entries.last_mut() {
                        Some(Entry::Point(point)) => point.commands.push(command),
                        _ => return Err(RoutineError::OrphanCommand { line }),
                    }
                }
            }
        }
        Ok(Self::new(entries))
    }

    /// Entries in execution order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the routine has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label lookup table.
    #[must_use]
    pub const fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Locations of every point, in routine order.
    #[must_use]
    pub fn waypoints(&self) -> Vec<Position> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Point(point) => Some(point.location),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn split_mut(&mut self) -> (&mut [Entry], &Labels) {
        (&mut self.entries, &self.labels)
    }
}

fn parse_label(args: &[Argument]) -> Result<String, CommandError> {
    let bound = Bound::new("Label", &["label"], args)?;
    Ok(bound.required("label")?.to_owned())
}

fn parse_point(args: &[Argument]) -> Result<Point, CommandError> {
    let bound = Bound::new("Point", &["x", "y", "adjust"], args)?;
    Ok(Point::new(
        Position::new(bound.float("x")?, bound.float("y")?),
        bound.boolean_or("adjust", false)?,
    ))
}
