//! Game configuration (tick rate, corridor, probe, scoring). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use procgen::CorridorConfig;

use crate::probe::ProbeConfig;
use crate::scoring::ScoringConfig;

/// Persistent game settings. Loaded from `config.ron` in the current directory unless a path is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed simulation rate in ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    /// Corridor generation tunables.
    #[serde(default)]
    pub corridor: CorridorConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_tick_rate() -> f32 {
    60.0
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate(),
            corridor: CorridorConfig::default(),
            probe: ProbeConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load config from `path` (or `config.ron`). If the file is missing or invalid, returns default config.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
        match std::fs::read_to_string(&path) {
            Ok(data) => match Self::parse(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            },
            Err(_) => log::info!("No config at {:?}, using defaults", path),
        }
        Self::default()
    }

    pub fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Save current config to `path` (or `config.ron`). Logs on error.
    pub fn save(&self, path: Option<&Path>) {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialise config: {}", e),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = GameConfig::parse("()").unwrap();
        assert_eq!(config.tick_rate_hz, 60.0);
        assert_eq!(config.corridor, CorridorConfig::default());
    }

    #[test]
    fn partial_corridor_section_keeps_other_defaults() {
        let config = GameConfig::parse(
            "(tick_rate_hz: 30.0, corridor: (window_ceiling: 12, placement: (obstacles_per_segment: 2)))",
        )
        .unwrap();
        assert_eq!(config.tick_rate_hz, 30.0);
        assert_eq!(config.corridor.window_ceiling, 12);
        assert_eq!(config.corridor.window_retain, 5);
        assert_eq!(config.corridor.placement.obstacles_per_segment, 2);
        assert_eq!(config.corridor.placement.lights_per_segment, 4);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("pipe-probe-config-{}.ron", std::process::id()));
        let mut config = GameConfig::default();
        config.corridor.lookahead_margin = 150.0;
        config.save(Some(&path));

        let loaded = GameConfig::load(Some(&path));
        assert_eq!(loaded.corridor.lookahead_margin, 150.0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loaded = GameConfig::load(Some(Path::new("/nonexistent/pipe-probe.ron")));
        assert_eq!(loaded.tick_rate_hz, 60.0);
    }
}
