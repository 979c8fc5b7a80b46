//! Engine configuration.
//!
//! Provides the host parameters: tick rate, time limit, logging, file
//! locations and the skirmish layout. Configuration can be loaded from and
//! saved to a TOML file.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::timing::DEFAULT_TICK_RATE;

/// Configuration file name.
pub const CONFIG_FILE: &str = "tactics.toml";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "tactics=info";

/// Errors reading the engine configuration.
#[derive(Debug, Error)]
pub enum EngineConfigError {
    /// IO error reading the file
    #[error("IO error: {0}")]
    Read(#[from] io::Error),

    /// TOML parse error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which archetype an enemy placement uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchetypeKind {
    /// `[enemy]` melee archetype
    Melee,
    /// `[ranged]` archetype
    Ranged,
    /// `[boss]` archetype
    Boss,
}

/// One enemy in the skirmish layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyPlacement {
    /// Archetype to spawn
    pub archetype: ArchetypeKind,
    /// Spawn position
    pub position: Vec2,
}

impl EnemyPlacement {
    /// Creates a placement.
    #[must_use]
    pub const fn new(archetype: ArchetypeKind, position: Vec2) -> Self {
        Self {
            archetype,
            position,
        }
    }
}

/// Skirmish layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Player spawn position
    pub player_position: Vec2,
    /// Enemies to spawn, in order
    pub enemies: Vec<EnemyPlacement>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            player_position: Vec2::ZERO,
            enemies: vec![
                EnemyPlacement::new(ArchetypeKind::Melee, Vec2::new(700.0, 0.0)),
                EnemyPlacement::new(ArchetypeKind::Melee, Vec2::new(-650.0, 250.0)),
                EnemyPlacement::new(ArchetypeKind::Ranged, Vec2::new(0.0, -900.0)),
                EnemyPlacement::new(ArchetypeKind::Boss, Vec2::new(1400.0, 1400.0)),
            ],
        }
    }
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Simulation ===
    /// Fixed steps per simulated second
    pub tick_rate: u32,
    /// Simulated seconds before the skirmish is called off
    pub max_seconds: f32,

    // === Logging ===
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Emit logs as JSON lines
    pub log_json: bool,

    // === Files ===
    /// Archetype file (defaults are used when unset or missing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetype_path: Option<PathBuf>,
    /// JSON-lines combat event log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_log_path: Option<PathBuf>,

    // === Layout ===
    /// Skirmish layout
    pub scenario: ScenarioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_seconds: 120.0,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
            archetype_path: None,
            event_log_path: None,
            scenario: ScenarioConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reads configuration from `path`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist. The result is validated.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Option<Self>, EngineConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.validate();
        Ok(Some(config))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(1, 1000);
        if !self.max_seconds.is_finite() || self.max_seconds < 0.0 {
            self.max_seconds = 0.0;
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = DEFAULT_LOG_FILTER.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.log_filter, "tactics=info");
        assert!(config.archetype_path.is_none());
        assert_eq!(config.scenario.enemies.len(), 4);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig {
            tick_rate: 0,
            max_seconds: f32::NAN,
            log_filter: "  ".to_string(),
            ..EngineConfig::default()
        };

        config.validate();

        assert_eq!(config.tick_rate, 1);
        assert_eq!(config.max_seconds, 0.0);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("temp dir");
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = EngineConfig::default();
        config.tick_rate = 30;
        config.event_log_path = Some(PathBuf::from("events.jsonl"));
        config.scenario.enemies.truncate(1);

        config.save_to(&config_path).expect("save");
        let loaded = EngineConfig::read_from(&config_path)
            .expect("read")
            .expect("present");

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().expect("temp dir");
        let result = EngineConfig::read_from(temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
max_seconds = 10.0

[scenario]
player_position = [100.0, 0.0]
enemies = [{ archetype = "boss", position = [400.0, 0.0] }]
"#,
        )
        .expect("write");

        let config = EngineConfig::read_from(&path).expect("read").expect("present");
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.max_seconds, 10.0);
        assert_eq!(config.scenario.player_position, Vec2::new(100.0, 0.0));
        assert_eq!(
            config.scenario.enemies,
            vec![EnemyPlacement::new(ArchetypeKind::Boss, Vec2::new(400.0, 0.0))]
        );
    }

    #[test]
    fn test_bad_file_is_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "tick_rate = \"fast\"").expect("write");
        assert!(matches!(
            EngineConfig::read_from(&path),
            Err(EngineConfigError::Parse(_))
        ));
    }
}
