//! Sequential routine executor.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use maple_bot_core::{Clock, KeyInput, Layout};
use maple_bot_world::{CursorHandle, SharedState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{Context, Routine, Tuning};

const IDLE_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration accepted by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Config {
    /// Tolerances and cooldowns passed to every command.
    pub tuning: Tuning,
    /// Seed for jump decisions; drawn from entropy when absent.
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Creates a new configuration.
    #[must_use]
    pub const fn new(tuning: Tuning, rng_seed: Option<u64>) -> Self {
        Self { tuning, rng_seed }
    }
}

/// Executes routine entries one at a time and owns the routine cursor.
pub struct Engine {
    tuning: Tuning,
    routine: Routine,
    layout: Box<dyn Layout>,
    keys: Arc<dyn KeyInput>,
    clock: Arc<dyn Clock>,
    state: SharedState,
    cursor_handle: CursorHandle,
    cursor: usize,
    rng: ChaCha8Rng,
    /// Consecutive entries executed without touching the keyboard.
    passive_streak: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tuning", &self.tuning)
            .field("entries", &self.routine.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine positioned at the first entry.
    #[must_use]
    pub fn new(
        config: Config,
        routine: Routine,
        layout: Box<dyn Layout>,
        keys: Arc<dyn KeyInput>,
        clock: Arc<dyn Clock>,
        state: SharedState,
        cursor_handle: CursorHandle,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        cursor_handle.publish(0);
        Self {
            tuning: config.tuning,
            routine,
            layout,
            keys,
            clock,
            state,
            cursor_handle,
            cursor: 0,
            rng,
            passive_streak: 0,
        }
    }

    /// Index of the next entry to execute.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Routine being executed.
    #[must_use]
    pub const fn routine(&self) -> &Routine {
        &self.routine
    }

    /// Executes the entry under the cursor, then advances the cursor.
    ///
    /// Returns `false` without doing anything when execution is disabled or
    /// the routine is empty.
    pub fn step(&mut self) -> bool {
        if !self.state.is_enabled() || self.routine.is_empty() {
            return false;
        }

        let index = self.cursor;
        let mut cursor = index;
        let (entries, labels) = self.routine.split_mut();
        let len = entries.len();
        let Some(entry) = entries.get_mut(index) else {
            self.cursor = 0;
            self.cursor_handle.publish(0);
            return false;
        };

        debug!(index, ?entry, "executing entry");
        if entry.is_passive() {
            self.passive_streak += 1;
        } else {
            self.passive_streak = 0;
        }
        let mut ctx = Context {
            keys: self.keys.as_ref(),
            clock: self.clock.as_ref(),
            state: &self.state,
            layout: self.layout.as_mut(),
            tuning: &self.tuning,
            rng: &mut self.rng,
            labels,
            cursor: &mut cursor,
        };
        entry.execute(&mut ctx);

        self.cursor = (cursor + 1) % len;
        if self.cursor == 0 {
            info!(entries = len, "routine wrapped around");
        }
        self.cursor_handle.publish(self.cursor);
        true
    }

    /// Runs until `shutdown` is raised.
    ///
    /// Idles while disabled, and after every full pass through the routine
    /// that sent no input, so label and `Goto` loops do not spin.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!(entries = self.routine.len(), "engine started");
        while !shutdown.load(Ordering::Acquire) {
            let stepped = self.step();
            if !stepped || self.passive_streak >= self.routine.len() {
                self.passive_streak = 0;
                self.clock.sleep(IDLE_INTERVAL);
            }
        }
        info!(cursor = self.cursor, "engine stopped");
    }
}
