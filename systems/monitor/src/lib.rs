#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Environment monitor: watches captured frames for hazards and notable
//! events while the engine runs.
//!
//! Hazards (a black screen, an unsolved rune) raise a blocking alert that
//! halts the engine and the hotkey listener until the operator acknowledges
//! it. Everything else is a non-blocking ping.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use maple_bot_core::{
    AlertPlayer, Clock, Hotkey, Image, Key, KeyInput, Matcher, Position, PressTiming, Track,
};
use maple_bot_world::{HazardHandle, SharedState};
use tracing::{debug, info, warn};

mod detect;

pub use detect::{OTHER_RANGES, RUNE_RANGES};

/// Interval between hotkey polls while an alert plays.
const ACK_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause after an alert before the hotkey listener accepts input again.
const ALERT_COOLDOWN: Duration = Duration::from_secs(2);

/// Monitor tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Delay between polls.
    pub poll_interval: Duration,
    /// Share of near-black pixels above which the frame counts as black.
    pub black_fraction: f64,
    /// Time a rune may stay unsolved before it becomes a hazard.
    pub rune_alert_delay: Duration,
    /// Volume of alerts and of the dialog and rune chimes.
    pub alert_volume: f32,
    /// Volume of player pings.
    pub ping_volume: f32,
    /// Match threshold for the dialog prompt.
    pub dialog_threshold: f32,
    /// Match threshold for player markers.
    pub player_threshold: f32,
    /// Match threshold for the rune marker.
    pub rune_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            black_fraction: 0.9,
            rune_alert_delay: Duration::from_secs(270),
            alert_volume: 0.75,
            ping_volume: 0.5,
            dialog_threshold: 0.8,
            player_threshold: 0.5,
            rune_threshold: 0.9,
        }
    }
}

/// Tracks a count and reports only increases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountDebounce {
    previous: usize,
}

impl CountDebounce {
    /// Records `count`, returning whether it rose above the previous one.
    pub fn observe(&mut self, count: usize) -> bool {
        let increased = count > self.previous;
        self.previous = count;
        increased
    }
}

/// Collaborators the monitor drives.
pub struct Services {
    /// Key backend used to dismiss dialogs.
    pub keys: Arc<dyn KeyInput>,
    /// Time source for polling and rune ageing.
    pub clock: Arc<dyn Clock>,
    /// Template matcher.
    pub matcher: Arc<dyn Matcher>,
    /// Audio output.
    pub player: Arc<dyn AlertPlayer>,
    /// Acknowledgement hotkey.
    pub hotkey: Arc<dyn Hotkey>,
}

/// Polls the shared capture for hazards and publishes its findings.
pub struct Monitor {
    config: Config,
    state: SharedState,
    hazards: HazardHandle,
    services: Services,
    waypoints: Vec<Position>,
    others: CountDebounce,
    guild: CountDebounce,
    rune_since: Duration,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("waypoints", &self.waypoints.len())
            .field("others", &self.others)
            .field("guild", &self.guild)
            .field("rune_since", &self.rune_since)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor for a routine with the given point locations.
    #[must_use]
    pub fn new(
        config: Config,
        state: SharedState,
        hazards: HazardHandle,
        waypoints: Vec<Position>,
        services: Services,
    ) -> Self {
        let rune_since = services.clock.now();
        Self {
            config,
            state,
            hazards,
            services,
            waypoints,
            others: CountDebounce::default(),
            guild: CountDebounce::default(),
            rune_since,
        }
    }

    /// Polls until `shutdown` is raised.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!("monitor started");
        while !shutdown.load(Ordering::Acquire) {
            self.poll(shutdown);
            self.services.clock.sleep(self.config.poll_interval);
        }
        info!("monitor stopped");
    }

    /// Runs every check once against the latest capture.
    ///
    /// Does nothing while the engine is disabled or before the first capture
    /// has been published.
    pub fn poll(&mut self, shutdown: &AtomicBool) {
        if self.hazards.take_rune_clear_request() {
            info!("rune resolved");
            self.hazards.clear_rune();
        }
        if !self.state.is_enabled() {
            return;
        }
        let Some(capture) = self.state.capture() else {
            return;
        };
        let matcher = Arc::clone(&self.services.matcher);

        if detect::is_black_frame(&capture.frame, self.config.black_fraction) {
            warn!("black screen detected");
            self.alert(Track::Siren, shutdown);
            return;
        }

        if detect::has_dialog(matcher.as_ref(), &capture.frame, self.config.dialog_threshold) {
            info!("dismissing dialog");
            self.services.keys.press(Key::Escape, 1, PressTiming::DEFAULT);
            self.services.clock.sleep(Duration::from_millis(100));
            self.ping(Track::Ding, self.config.alert_volume);
        }

        let counts = detect::count_players(
            matcher.as_ref(),
            &capture.minimap,
            self.config.player_threshold,
        );
        debug!(others = counts.others, guild = counts.guild, "player markers");
        self.hazards.set_stage_fright(counts.any());
        if self.others.observe(counts.others) {
            info!(count = counts.others, "another player entered the map");
            self.ping(Track::Ding, self.config.ping_volume);
        }
        if self.guild.observe(counts.guild) {
            info!(count = counts.guild, "a guild member entered the map");
            self.ping(Track::Ding, self.config.ping_volume);
        }

        self.check_rune(matcher.as_ref(), &capture.minimap, shutdown);
    }

    fn check_rune(&mut self, matcher: &dyn Matcher, minimap: &Image, shutdown: &AtomicBool) {
        let now = self.services.clock.now();
        if !self.state.rune().active {
            self.rune_since = now;
            let found = detect::find_rune(matcher, minimap, self.config.rune_threshold);
            let Some(position) = found else {
                return;
            };
            let Some(closest) = detect::closest(&self.waypoints, position) else {
                return;
            };
            info!(%position, %closest, "rune appeared");
            self.hazards.publish_rune(position, closest);
            self.ping(Track::RuneAppeared, self.config.alert_volume);
        } else if now.saturating_sub(self.rune_since) > self.config.rune_alert_delay {
            warn!(
                unsolved_secs = self.config.rune_alert_delay.as_secs(),
                "rune left unsolved"
            );
            self.hazards.clear_rune();
            self.alert(Track::Siren, shutdown);
        }
    }

    /// Halts everything and plays `track` until the operator acknowledges it.
    fn alert(&mut self, track: Track, shutdown: &AtomicBool) {
        self.hazards.halt();
        self.services.player.play(track, self.config.alert_volume, true);
        while !self.services.hotkey.is_pressed() {
            if shutdown.load(Ordering::Acquire) {
                break;
            }
            self.services.clock.sleep(ACK_POLL_INTERVAL);
        }
        self.services.player.stop();
        if !shutdown.load(Ordering::Acquire) {
            self.services.clock.sleep(ALERT_COOLDOWN);
        }
        info!("alert acknowledged");
        self.hazards.resume_listener();
    }

    fn ping(&self, track: Track, volume: f32) {
        self.services.player.play(track, volume, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_reports_only_increases() {
        let mut debounce = CountDebounce::default();
        let pings = [0, 1, 1, 2, 1, 0]
            .into_iter()
            .filter(|count| debounce.observe(*count))
            .count();
        assert_eq!(pings, 2);
    }

    #[test]
    fn debounce_fires_again_after_a_drop() {
        let mut debounce = CountDebounce::default();
        assert!(debounce.observe(2));
        assert!(!debounce.observe(1));
        assert!(debounce.observe(2));
    }
}
