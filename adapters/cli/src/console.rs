//! Terminal stand-ins for audio output and the acknowledgement hotkey.

use maple_bot_core::{AlertPlayer, Hotkey, Track};
use tracing::{info, warn};

/// Writes audio cues to the log instead of playing them.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LogPlayer;

impl AlertPlayer for LogPlayer {
    fn play(&self, track: Track, volume: f32, looping: bool) {
        if looping {
            warn!(track = track.file_stem(), volume, "alert");
        } else {
            info!(track = track.file_stem(), volume, "ping");
        }
    }

    fn stop(&self) {
        info!("alert stopped");
    }
}

/// Acknowledges every alert as soon as it is raised.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AutoAcknowledge;

impl Hotkey for AutoAcknowledge {
    fn is_pressed(&self) -> bool {
        true
    }
}
