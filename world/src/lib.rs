#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared runtime state for the maple bot.
//!
//! The state is a single process-wide instance read by every thread. Each
//! mutable field has exactly one writer, and that writer is the only holder
//! of the handle exposing the setter:
//!
//! * [`ProducerHandle`] publishes the player position and captured images.
//! * [`HazardHandle`] publishes rune and stage fright flags and halts the
//!   engine during alerts.
//! * [`CursorHandle`] publishes the routine cursor.
//! * [`EnabledSwitch`] is the hotkey listener's toggle.
//!
//! Readers receive snapshots and must tolerate values that are one update
//! interval stale.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, PoisonError, RwLock,
};

use maple_bot_core::{Image, Position};

mod layout;
#[cfg(feature = "simulation")]
pub mod simulation;

pub use layout::WaypointGraph;

/// Latest frame and minimap published by the capture producer.
#[derive(Clone, Debug)]
pub struct Capture {
    /// Full game frame.
    pub frame: Arc<Image>,
    /// Minimap region of the frame.
    pub minimap: Arc<Image>,
}

/// Rune bookkeeping published by the monitor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RuneStatus {
    /// Whether a rune is waiting to be solved.
    pub active: bool,
    /// Normalised minimap position of the rune.
    pub position: Option<Position>,
    /// Routine waypoint closest to the rune.
    pub closest_waypoint: Option<Position>,
}

#[derive(Debug)]
struct Inner {
    enabled: AtomicBool,
    listener_enabled: AtomicBool,
    player_pos: RwLock<Position>,
    capture: RwLock<Option<Capture>>,
    rune: RwLock<RuneStatus>,
    rune_clear_requested: AtomicBool,
    stage_fright: AtomicBool,
    seq_index: AtomicUsize,
}

/// Read access to the shared runtime state.
#[derive(Clone, Debug)]
pub struct SharedState {
    inner: Arc<Inner>,
}

/// Writer handles issued once per state instance.
#[derive(Debug)]
pub struct Handles {
    /// Position and capture writer.
    pub producer: ProducerHandle,
    /// Hazard flag writer.
    pub hazards: HazardHandle,
    /// Routine cursor writer.
    pub cursor: CursorHandle,
    /// Hotkey toggle.
    pub switch: EnabledSwitch,
}

impl SharedState {
    /// Creates a disabled state together with its writer handles.
    #[must_use]
    pub fn create() -> (Self, Handles) {
        let inner = Arc::new(Inner {
            enabled: AtomicBool::new(false),
            listener_enabled: AtomicBool::new(true),
            player_pos: RwLock::new(Position::default()),
            capture: RwLock::new(None),
            rune: RwLock::new(RuneStatus::default()),
            rune_clear_requested: AtomicBool::new(false),
            stage_fright: AtomicBool::new(false),
            seq_index: AtomicUsize::new(0),
        });
        let handles = Handles {
            producer: ProducerHandle {
                inner: Arc::clone(&inner),
            },
            hazards: HazardHandle {
                inner: Arc::clone(&inner),
            },
            cursor: CursorHandle {
                inner: Arc::clone(&inner),
            },
            switch: EnabledSwitch {
                inner: Arc::clone(&inner),
            },
        };
        (Self { inner }, handles)
    }

    /// Whether the engine is allowed to act.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Whether the hotkey listener accepts toggles.
    #[must_use]
    pub fn listener_enabled(&self) -> bool {
        self.inner.listener_enabled.load(Ordering::Acquire)
    }

    /// Latest estimated player position.
    #[must_use]
    pub fn player_pos(&self) -> Position {
        *self
            .inner
            .player_pos
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest captured frame and minimap, if any were published.
    #[must_use]
    pub fn capture(&self) -> Option<Capture> {
        self.inner
            .capture
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current rune bookkeeping.
    #[must_use]
    pub fn rune(&self) -> RuneStatus {
        *self
            .inner
            .rune
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether other players are present on the map.
    #[must_use]
    pub fn stage_fright(&self) -> bool {
        self.inner.stage_fright.load(Ordering::Acquire)
    }

    /// Index of the routine entry the engine is executing.
    #[must_use]
    pub fn seq_index(&self) -> usize {
        self.inner.seq_index.load(Ordering::Acquire)
    }

    /// Asks the monitor to clear the active rune on its next poll.
    pub fn request_rune_clear(&self) {
        self.inner.rune_clear_requested.store(true, Ordering::Release);
    }
}

/// Exclusive writer for the player position and captured images.
#[derive(Debug)]
pub struct ProducerHandle {
    inner: Arc<Inner>,
}

impl ProducerHandle {
    /// Publishes a new position estimate.
    pub fn set_player_pos(&self, position: Position) {
        *self
            .inner
            .player_pos
            .write()
            .unwrap_or_else(PoisonError::into_inner) = position;
    }

    /// Publishes a freshly captured frame and minimap.
    pub fn publish_capture(&self, frame: Image, minimap: Image) {
        *self
            .inner
            .capture
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Capture {
            frame: Arc::new(frame),
            minimap: Arc::new(minimap),
        });
    }
}

/// Exclusive writer for the monitor's hazard flags.
#[derive(Debug)]
pub struct HazardHandle {
    inner: Arc<Inner>,
}

impl HazardHandle {
    /// Marks a rune as active at `position`, closest to `closest_waypoint`.
    pub fn publish_rune(&self, position: Position, closest_waypoint: Position) {
        *self.inner.rune.write().unwrap_or_else(PoisonError::into_inner) = RuneStatus {
            active: true,
            position: Some(position),
            closest_waypoint: Some(closest_waypoint),
        };
    }

    /// Marks the rune as inactive.
    pub fn clear_rune(&self) {
        self.inner
            .rune
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active = false;
    }

    /// Consumes a pending rune clear request.
    #[must_use]
    pub fn take_rune_clear_request(&self) -> bool {
        self.inner.rune_clear_requested.swap(false, Ordering::AcqRel)
    }

    /// Publishes whether other players are present.
    pub fn set_stage_fright(&self, present: bool) {
        self.inner.stage_fright.store(present, Ordering::Release);
    }

    /// Disables the engine and the hotkey listener.
    pub fn halt(&self) {
        self.inner.enabled.store(false, Ordering::Release);
        self.inner.listener_enabled.store(false, Ordering::Release);
    }

    /// Re-enables the hotkey listener after an alert was acknowledged.
    pub fn resume_listener(&self) {
        self.inner.listener_enabled.store(true, Ordering::Release);
    }
}

/// Exclusive writer for the routine cursor.
#[derive(Debug)]
pub struct CursorHandle {
    inner: Arc<Inner>,
}

impl CursorHandle {
    /// Publishes the index of the routine entry being executed.
    pub fn publish(&self, index: usize) {
        self.inner.seq_index.store(index, Ordering::Release);
    }
}

/// Toggle driven by the operator's start/stop hotkey.
///
/// Not `Clone`: the hotkey listener is its only owner.
#[derive(Debug)]
pub struct EnabledSwitch {
    inner: Arc<Inner>,
}

impl EnabledSwitch {
    /// Enables the engine.
    pub fn enable(&self) {
        self.inner.enabled.store(true, Ordering::Release);
    }

    /// Disables the engine.
    pub fn disable(&self) {
        self.inner.enabled.store(false, Ordering::Release);
    }

    /// Flips the enabled flag if the listener is accepting input.
    ///
    /// Returns the new value, or `None` while the listener is suspended.
    pub fn toggle(&self) -> Option<bool> {
        if !self.inner.listener_enabled.load(Ordering::Acquire) {
            return None;
        }
        let previous = self.inner.enabled.fetch_xor(true, Ordering::AcqRel);
        Some(!previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_starts_disabled_with_listener_active() {
        let (state, _handles) = SharedState::create();
        assert!(!state.is_enabled());
        assert!(state.listener_enabled());
        assert_eq!(state.player_pos(), Position::default());
        assert!(state.capture().is_none());
    }

    #[test]
    fn halt_suspends_listener_toggles() {
        let (state, handles) = SharedState::create();
        handles.switch.enable();
        handles.hazards.halt();

        assert!(!state.is_enabled());
        assert_eq!(handles.switch.toggle(), None);

        handles.hazards.resume_listener();
        assert_eq!(handles.switch.toggle(), Some(true));
        assert!(state.is_enabled());
    }

    #[test]
    fn rune_clear_request_is_consumed_once() {
        let (state, handles) = SharedState::create();
        state.request_rune_clear();
        assert!(handles.hazards.take_rune_clear_request());
        assert!(!handles.hazards.take_rune_clear_request());
    }

    #[test]
    fn clearing_rune_keeps_last_known_location() {
        let (state, handles) = SharedState::create();
        handles
            .hazards
            .publish_rune(Position::new(0.4, 0.6), Position::new(0.5, 0.5));
        handles.hazards.clear_rune();

        let rune = state.rune();
        assert!(!rune.active);
        assert_eq!(rune.position, Some(Position::new(0.4, 0.6)));
    }

    #[test]
    fn readers_survive_a_poisoned_position_lock() {
        let (state, _handles) = SharedState::create();
        let inner = Arc::clone(&state.inner);
        let result = std::thread::spawn(move || {
            let mut position = inner.player_pos.write().unwrap();
            *position = Position::new(0.3, 0.7);
            panic!("writer died mid-update");
        })
        .join();

        assert!(result.is_err());
        assert!(state.inner.player_pos.is_poisoned());
        assert_eq!(state.player_pos(), Position::new(0.3, 0.7));
    }
}
