//! Tactics Engine - headless host for the Tactics combat simulation.
//!
//! This crate wires the gameplay crate into a runnable skirmish:
//! - Engine configuration (`tactics.toml`)
//! - Archetype loading from TOML
//! - Fixed-step timing
//! - Scripted skirmish runner and combat event log

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod archetype_loader;
pub mod config;
pub mod skirmish;
pub mod timing;

#[cfg(test)]
mod e2e_tests;

pub use archetype_loader::{ArchetypeLoadError, ArchetypeLoader};
pub use config::{ArchetypeKind, EnemyPlacement, EngineConfig, ScenarioConfig};
pub use skirmish::{Skirmish, SkirmishOutcome, SkirmishReport};
pub use timing::FixedStep;
