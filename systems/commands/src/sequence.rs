//! Control-flow commands.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    args::{Argument, Bound, CommandError},
    Context,
};

/// Moves the routine cursor to a label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Goto {
    label: String,
}

impl Goto {
    /// Creates a jump to `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Goto", &["label"], args)?;
        Ok(Self::new(bound.required("label")?))
    }

    /// Label this command jumps to.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) {
        match ctx.labels.index_of(&self.label) {
            Some(index) => {
                debug!(label = %self.label, index, "jumping to label");
                *ctx.cursor = index;
            }
            None => warn!(label = %self.label, "label does not exist"),
        }
    }
}

/// Does nothing for a while.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wait {
    duration: Duration,
}

impl Wait {
    /// Creates a delay.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub(crate) fn parse(args: &[Argument]) -> Result<Self, CommandError> {
        let bound = Bound::new("Wait", &["duration"], args)?;
        Ok(Self::new(bound.duration("duration")?))
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) {
        ctx.clock.sleep(self.duration);
    }
}
