//! TOML configuration for the command-line adapter.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use maple_bot_core::Position;
use maple_bot_system_commands::{self as commands, Tuning};
use maple_bot_system_monitor as monitor;
use maple_bot_world::simulation::SimulationConfig;
use serde::Deserialize;

/// Complete configuration file; every field falls back to its default.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) debug: bool,
    pub(crate) engine: EngineSection,
    pub(crate) monitor: MonitorSection,
    pub(crate) simulation: SimulationSection,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EngineSection {
    pub(crate) move_tolerance: f64,
    pub(crate) adjust_tolerance: f64,
    pub(crate) buff_cooldown_secs: u64,
    pub(crate) record_layout: bool,
    pub(crate) rng_seed: Option<u64>,
    pub(crate) link_distance: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        let tuning = Tuning::default();
        Self {
            move_tolerance: tuning.move_tolerance,
            adjust_tolerance: tuning.adjust_tolerance,
            buff_cooldown_secs: tuning.buff_cooldown.as_secs(),
            record_layout: tuning.record_layout,
            rng_seed: None,
            link_distance: 0.15,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MonitorSection {
    pub(crate) poll_interval_ms: u64,
    pub(crate) black_fraction: f64,
    pub(crate) rune_alert_delay_secs: u64,
    pub(crate) alert_volume: f32,
    pub(crate) ping_volume: f32,
    pub(crate) dialog_threshold: f32,
    pub(crate) player_threshold: f32,
    pub(crate) rune_threshold: f32,
}

impl Default for MonitorSection {
    fn default() -> Self {
        let config = monitor::Config::default();
        Self {
            poll_interval_ms: duration_millis(config.poll_interval),
            black_fraction: config.black_fraction,
            rune_alert_delay_secs: config.rune_alert_delay.as_secs(),
            alert_volume: config.alert_volume,
            ping_volume: config.ping_volume,
            dialog_threshold: config.dialog_threshold,
            player_threshold: config.player_threshold,
            rune_threshold: config.rune_threshold,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationSection {
    pub(crate) start_x: f64,
    pub(crate) start_y: f64,
    pub(crate) teleport_distance: f64,
    pub(crate) drop_distance: f64,
    pub(crate) walk_speed: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let config = SimulationConfig::default();
        Self {
            start_x: 0.5,
            start_y: 0.5,
            teleport_distance: config.teleport_distance,
            drop_distance: config.drop_distance,
            walk_speed: config.walk_speed,
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl FileConfig {
    /// Reads and validates the configuration at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config at {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        for (name, value) in [
            ("engine.move_tolerance", engine.move_tolerance),
            ("engine.adjust_tolerance", engine.adjust_tolerance),
            ("engine.link_distance", engine.link_distance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                bail!("{name} must be a positive number, got {value}");
            }
        }
        if !(0.0..=1.0).contains(&self.monitor.black_fraction) {
            bail!(
                "monitor.black_fraction must lie in [0, 1], got {}",
                self.monitor.black_fraction
            );
        }
        if self.monitor.poll_interval_ms == 0 {
            bail!("monitor.poll_interval_ms must be positive");
        }
        Ok(())
    }

    pub(crate) fn tuning(&self) -> Tuning {
        Tuning {
            move_tolerance: self.engine.move_tolerance,
            adjust_tolerance: self.engine.adjust_tolerance,
            buff_cooldown: Duration::from_secs(self.engine.buff_cooldown_secs),
            record_layout: self.engine.record_layout,
        }
    }

    /// Engine configuration; `seed` overrides the configured seed.
    pub(crate) fn engine(&self, seed: Option<u64>) -> commands::Config {
        commands::Config::new(self.tuning(), seed.or(self.engine.rng_seed))
    }

    pub(crate) fn monitor(&self) -> monitor::Config {
        let section = &self.monitor;
        monitor::Config {
            poll_interval: Duration::from_millis(section.poll_interval_ms),
            black_fraction: section.black_fraction,
            rune_alert_delay: Duration::from_secs(section.rune_alert_delay_secs),
            alert_volume: section.alert_volume,
            ping_volume: section.ping_volume,
            dialog_threshold: section.dialog_threshold,
            player_threshold: section.player_threshold,
            rune_threshold: section.rune_threshold,
        }
    }

    /// Real-time simulation settings for the dry run.
    pub(crate) fn simulation(&self) -> (SimulationConfig, Position) {
        let section = &self.simulation;
        let config = SimulationConfig {
            teleport_distance: section.teleport_distance,
            drop_distance: section.drop_distance,
            walk_speed: section.walk_speed,
            realtime: true,
            ..SimulationConfig::default()
        };
        (config, Position::new(section.start_x, section.start_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = FileConfig::parse("").expect("defaults are valid");
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.tuning(), Tuning::default());
        assert_eq!(config.monitor(), monitor::Config::default());
        assert_eq!(config.engine(None).rng_seed, None);
    }

    #[test]
    fn sections_override_defaults() {
        let config = FileConfig::parse(
            r#"
            debug = true

            [engine]
            move_tolerance = 0.05
            rng_seed = 9

            [monitor]
            rune_alert_delay_secs = 120
            "#,
        )
        .expect("valid config");

        assert!(config.debug);
        assert_eq!(config.tuning().move_tolerance, 0.05);
        assert_eq!(config.tuning().adjust_tolerance, 0.01);
        assert_eq!(config.engine(None).rng_seed, Some(9));
        assert_eq!(config.engine(Some(1)).rng_seed, Some(1));
        assert_eq!(config.monitor().rune_alert_delay, Duration::from_secs(120));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(FileConfig::parse("[engine]\nmove_tolerance = 0.0\n").is_err());
        assert!(FileConfig::parse("[monitor]\nblack_fraction = 1.5\n").is_err());
        assert!(FileConfig::parse("[engine]\nspeed = 3\n").is_err());
    }

    #[test]
    fn shipped_demo_config_is_accepted() {
        let config = FileConfig::parse(include_str!("../../../demos/maple-bot.toml"))
            .expect("demo config is valid");

        assert_eq!(config.engine(None).rng_seed, Some(7));
    }

    #[test]
    fn simulation_runs_in_real_time() {
        let (simulation, start) = FileConfig::default().simulation();
        assert!(simulation.realtime);
        assert_eq!(start, Position::new(0.5, 0.5));
    }
}
