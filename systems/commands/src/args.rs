//! Argument binding and validation for routine commands.

use std::time::Duration;

use maple_bot_core::Direction;
use thiserror::Error;

/// Validation failures raised while constructing a command.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// No command with the provided name exists.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    /// A direction token was not one of the four arrows.
    #[error("{command}: '{value}' is not a valid direction")]
    InvalidDirection {
        /// Command being constructed.
        command: &'static str,
        /// Offending token.
        value: String,
    },
    /// A vertical arrow was given where only left or right is accepted.
    #[error("{command}: '{value}' is not a horizontal direction")]
    NotHorizontal {
        /// Command being constructed.
        command: &'static str,
        /// Offending token.
        value: String,
    },
    /// A numeric parameter could not be parsed or was out of range.
    #[error("{command}: {param} is not a valid number: '{value}'")]
    InvalidNumber {
        /// Command being constructed.
        command: &'static str,
        /// Parameter name.
        param: &'static str,
        /// Offending token.
        value: String,
    },
    /// A boolean parameter could not be parsed.
    #[error("{command}: {param} must be true or false, got '{value}'")]
    InvalidBoolean {
        /// Command being constructed.
        command: &'static str,
        /// Parameter name.
        param: &'static str,
        /// Offending token.
        value: String,
    },
    /// A step budget was zero, negative or not an integer.
    #[error("{command}: {param} must be a positive integer, got '{value}'")]
    NonPositiveSteps {
        /// Command being constructed.
        command: &'static str,
        /// Parameter name.
        param: &'static str,
        /// Offending token.
        value: String,
    },
    /// A required parameter was not supplied.
    #[error("{command}: missing required argument '{param}'")]
    MissingArgument {
        /// Command being constructed.
        command: &'static str,
        /// Parameter name.
        param: &'static str,
    },
    /// A keyword argument does not name a parameter of the command.
    #[error("{command}: unknown argument '{name}'")]
    UnknownArgument {
        /// Command being constructed.
        command: &'static str,
        /// Offending keyword.
        name: String,
    },
    /// The same parameter was supplied twice.
    #[error("{command}: argument '{param}' given more than once")]
    DuplicateArgument {
        /// Command being constructed.
        command: &'static str,
        /// Parameter name.
        param: &'static str,
    },
    /// More positional arguments than parameters.
    #[error("{command}: expected at most {expected} arguments")]
    TooManyArguments {
        /// Command being constructed.
        command: &'static str,
        /// Number of parameters the command accepts.
        expected: usize,
    },
}

/// Raw argument as written in a routine: `value` or `name=value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    /// Keyword, when the argument was written as `name=value`.
    pub name: Option<String>,
    /// Unparsed value.
    pub value: String,
}

impl Argument {
    /// Splits a single routine token into an argument.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.split_once('=') {
            Some((name, value)) => Self {
                name: Some(name.trim().to_owned()),
                value: value.trim().to_owned(),
            },
            None => Self {
                name: None,
                value: token.trim().to_owned(),
            },
        }
    }

    /// Positional argument.
    #[must_use]
    pub fn positional(value: impl Into<String>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    /// Keyword argument.
    #[must_use]
    pub fn keyword(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// Arguments matched against a command's parameter list.
#[derive(Debug)]
pub(crate) struct Bound<'a> {
    command: &'static str,
    slots: Vec<(&'static str, Option<&'a str>)>,
}

impl<'a> Bound<'a> {
    /// Assigns positional arguments in order and keyword arguments by name.
    pub(crate) fn new(
        command: &'static str,
        params: &[&'static str],
        args: &'a [Argument],
    ) -> Result<Self, CommandError> {
        let mut slots: Vec<(&'static str, Option<&'a str>)> =
            params.iter().map(|param| (*param, None)).collect();
        let mut next_positional = 0;

        for arg in args {
            let index = match &arg.name {
                Some(name) => slots
                    .iter()
                    .position(|(param, _)| param.eq_ignore_ascii_case(name))
                    .ok_or_else(|| CommandError::UnknownArgument {
                        command,
                        name: name.clone(),
                    })?,
                None => {
                    let index = next_positional;
                    next_positional += 1;
                    if index >= slots.len() {
                        return Err(CommandError::TooManyArguments {
                            command,
                            expected: slots.len(),
                        });
                    }
                    index
                }
            };

            let (param, slot) = &mut slots[index];
            if slot.is_some() {
                return Err(CommandError::DuplicateArgument {
                    command,
                    param: *param,
                });
            }
            *slot = Some(arg.value.as_str());
        }

        Ok(Self { command, slots })
    }

    fn raw(&self, param: &'static str) -> Option<&'a str> {
        self.slots
            .iter()
            .find(|(name, _)| *name == param)
            .and_then(|(_, value)| *value)
    }

    pub(crate) fn required(&self, param: &'static str) -> Result<&'a str, CommandError> {
        self.raw(param).ok_or(CommandError::MissingArgument {
            command: self.command,
            param,
        })
    }

    pub(crate) fn float(&self, param: &'static str) -> Result<f64, CommandError> {
        parse_float(self.command, param, self.required(param)?)
    }

    pub(crate) fn optional_float(&self, param: &'static str) -> Result<Option<f64>, CommandError> {
        self.raw(param)
            .map(|value| parse_float(self.command, param, value))
            .transpose()
    }

    pub(crate) fn duration(&self, param: &'static str) -> Result<Duration, CommandError> {
        let value = self.required(param)?;
        parse_float(self.command, param, value).and_then(|seconds| {
            Duration::try_from_secs_f64(seconds).map_err(|_| CommandError::InvalidNumber {
                command: self.command,
                param,
                value: value.to_owned(),
            })
        })
    }

    pub(crate) fn boolean_or(&self, param: &'static str, default: bool) -> Result<bool, CommandError> {
        let Some(value) = self.raw(param) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(CommandError::InvalidBoolean {
                command: self.command,
                param,
                value: value.to_owned(),
            }),
        }
    }

    pub(crate) fn steps_or(&self, param: &'static str, default: u32) -> Result<u32, CommandError> {
        let Some(value) = self.raw(param) else {
            return Ok(default);
        };
        match value.parse::<i64>() {
            Ok(steps) if steps >= 1 => u32::try_from(steps).map_err(|_| CommandError::InvalidNumber {
                command: self.command,
                param,
                value: value.to_owned(),
            }),
            _ => Err(CommandError::NonPositiveSteps {
                command: self.command,
                param,
                value: value.to_owned(),
            }),
        }
    }

    pub(crate) fn count_or(&self, param: &'static str, default: u32) -> Result<u32, CommandError> {
        let Some(value) = self.raw(param) else {
            return Ok(default);
        };
        value.parse::<u32>().map_err(|_| CommandError::InvalidNumber {
            command: self.command,
            param,
            value: value.to_owned(),
        })
    }

    pub(crate) fn direction(&self, param: &'static str) -> Result<Direction, CommandError> {
        let value = self.required(param)?;
        value
            .parse::<Direction>()
            .map_err(|_| CommandError::InvalidDirection {
                command: self.command,
                value: value.to_owned(),
            })
    }

    pub(crate) fn horizontal(&self, param: &'static str) -> Result<Direction, CommandError> {
        let direction = self.direction(param)?;
        ensure_horizontal(self.command, direction)
    }

    pub(crate) fn optional_horizontal(
        &self,
        param: &'static str,
    ) -> Result<Option<Direction>, CommandError> {
        if self.raw(param).is_none() {
            return Ok(None);
        }
        self.horizontal(param).map(Some)
    }
}

/// Rejects vertical arrows for commands that only move sideways.
pub(crate) fn ensure_horizontal(
    command: &'static str,
    direction: Direction,
) -> Result<Direction, CommandError> {
    if direction.is_vertical() {
        return Err(CommandError::NotHorizontal {
            command,
            value: direction.token().to_owned(),
        });
    }
    Ok(direction)
}

fn parse_float(command: &'static str, param: &'static str, value: &str) -> Result<f64, CommandError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber {
            command,
            param,
            value: value.to_owned(),
        })
}
