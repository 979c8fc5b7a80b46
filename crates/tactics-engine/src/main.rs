//! # Tactics
//!
//! Runs a headless skirmish: a scripted player against the enemies laid out
//! in `tactics.toml`.
//!
//! Usage: `tactics [config-path]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use tactics_engine::config::{EngineConfig, CONFIG_FILE};
use tactics_engine::{ArchetypeLoader, Skirmish, SkirmishOutcome};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let loaded = EngineConfig::read_from(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => EngineConfig::default(),
    };

    init_tracing(&config)?;

    info!("Project Tactics starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(Some(_)) => info!("Loaded config from {}", config_path.display()),
        Ok(None) => info!("Config file not found, using defaults"),
        Err(e) => warn!("Failed to load config file {}: {e}", config_path.display()),
    }

    let archetypes = ArchetypeLoader::new()
        .load_or_base(config.archetype_path.as_deref())
        .context("loading archetypes")?;

    let mut skirmish = Skirmish::new(&config, &archetypes);
    if let Some(path) = &config.event_log_path {
        skirmish = skirmish
            .with_event_log(path)
            .with_context(|| format!("opening event log {}", path.display()))?;
    }

    let report = skirmish.run();
    match report.outcome {
        SkirmishOutcome::Victory => info!("Victory"),
        SkirmishOutcome::Defeat => info!("Defeat"),
        SkirmishOutcome::TimeUp => info!("Time up"),
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("Project Tactics shutdown complete");
    Ok(())
}

/// Installs the subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &EngineConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("invalid log filter {:?}", config.log_filter))?,
    };

    let (plain, json) = if config.log_json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();
    Ok(())
}
