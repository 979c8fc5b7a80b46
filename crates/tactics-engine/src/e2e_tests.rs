//! End-to-end integration tests for Project Tactics.
//!
//! These tests run whole skirmishes through the engine: config, archetype
//! files, the fixed-step loop and the event log working together.

#![cfg(test)]

use std::fs;

use glam::Vec2;
use tactics_gameplay::Archetypes;
use tempfile::TempDir;

use crate::archetype_loader::ArchetypeLoader;
use crate::config::{ArchetypeKind, EnemyPlacement, EngineConfig, ScenarioConfig};
use crate::skirmish::{Skirmish, SkirmishOutcome};

fn duel(archetype: ArchetypeKind, at: Vec2, max_seconds: f32) -> EngineConfig {
    EngineConfig {
        max_seconds,
        scenario: ScenarioConfig {
            player_position: Vec2::ZERO,
            enemies: vec![EnemyPlacement::new(archetype, at)],
        },
        ..EngineConfig::default()
    }
}

fn read_log(path: &std::path::Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("read log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

fn count_events(log: &[serde_json::Value], kind: &str) -> usize {
    log.iter().filter(|line| line["event"].get(kind).is_some()).count()
}

/// Player against a single melee enemy
mod e2e_melee_duel {
    use super::*;

    #[test]
    fn e2e_player_beats_melee_enemy() {
        let config = duel(ArchetypeKind::Melee, Vec2::new(400.0, 0.0), 30.0);
        let report = Skirmish::new(&config, &Archetypes::default()).run();

        assert_eq!(report.outcome, SkirmishOutcome::Victory);
        assert!(report.player_alive);
        assert_eq!(report.kills, 1);
        assert_eq!(report.score, 100);
        assert_eq!(report.exp, 25);
    }

    #[test]
    fn e2e_harmless_player_is_defeated() {
        let mut archetypes = Archetypes::default();
        archetypes.player.max_health = 15.0;
        archetypes.player.base_damage = 0.0;

        let config = duel(ArchetypeKind::Melee, Vec2::new(120.0, 0.0), 30.0);
        let report = Skirmish::new(&config, &archetypes).run();

        assert_eq!(report.outcome, SkirmishOutcome::Defeat);
        assert!(!report.player_alive);
        assert_eq!(report.kills, 0);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn e2e_same_setup_same_report() {
        let config = duel(ArchetypeKind::Melee, Vec2::new(400.0, 0.0), 30.0);
        let first = Skirmish::new(&config, &Archetypes::default()).run();
        let second = Skirmish::new(&config, &Archetypes::default()).run();
        assert_eq!(first, second);
    }
}

/// Ranged enemies with and without a projectile
mod e2e_ranged {
    use super::*;

    fn stationary_tank() -> Archetypes {
        let mut archetypes = Archetypes::default();
        archetypes.player.max_health = 1000.0;
        archetypes.player.base_damage = 0.0;
        archetypes.player.move_speed = 0.0;
        archetypes
    }

    #[test]
    fn e2e_instant_fallback_damages_player() {
        let config = duel(ArchetypeKind::Ranged, Vec2::new(500.0, 0.0), 3.0);
        let mut skirmish = Skirmish::new(&config, &stationary_tank());
        let report = skirmish.run();

        assert_eq!(report.outcome, SkirmishOutcome::TimeUp);
        let player = skirmish
            .arena()
            .combatant(skirmish.player())
            .expect("player");
        assert!(player.stats.health() < 1000.0);
        assert_eq!(skirmish.arena().projectile_count(), 0);
    }

    #[test]
    fn e2e_projectile_from_archetype_file() {
        let dir = TempDir::new().expect("temp dir");
        let archetype_path = dir.path().join("archetypes.toml");
        let log_path = dir.path().join("logs").join("events.jsonl");
        fs::write(
            &archetype_path,
            r#"
[player]
max_health = 1000.0
base_damage = 0.0
move_speed = 0.0

[ranged.projectile]
name = "arrow"
radius = 15.0
lifetime = 3.0
"#,
        )
        .expect("write archetypes");

        let archetypes = ArchetypeLoader::new()
            .load_file(&archetype_path)
            .expect("load archetypes");
        let config = duel(ArchetypeKind::Ranged, Vec2::new(500.0, 0.0), 3.0);
        let mut skirmish = Skirmish::new(&config, &archetypes)
            .with_event_log(&log_path)
            .expect("event log");
        skirmish.run();

        let log = read_log(&log_path);
        assert!(count_events(&log, "ProjectileSpawned") >= 1);
        assert!(count_events(&log, "HitLanded") >= 1);
        let player = skirmish
            .arena()
            .combatant(skirmish.player())
            .expect("player");
        assert!(player.stats.health() < 1000.0);
    }
}

/// Event log contents
mod e2e_event_log {
    use super::*;

    #[test]
    fn e2e_log_records_whole_fight() {
        let dir = TempDir::new().expect("temp dir");
        let log_path = dir.path().join("events.jsonl");

        let config = duel(ArchetypeKind::Melee, Vec2::new(400.0, 0.0), 30.0);
        let report = Skirmish::new(&config, &Archetypes::default())
            .with_event_log(&log_path)
            .expect("event log")
            .run();
        assert_eq!(report.outcome, SkirmishOutcome::Victory);

        let log = read_log(&log_path);
        assert!(!log.is_empty());
        assert_eq!(count_events(&log, "TargetAcquired"), 1);
        assert!(count_events(&log, "AttackPerformed") >= 5);
        assert_eq!(count_events(&log, "Died"), 1);

        let ticks: Vec<u64> = log
            .iter()
            .map(|line| line["tick"].as_u64().expect("tick"))
            .collect();
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
        assert!(ticks.iter().all(|t| *t <= report.ticks));
    }
}

/// Config file driving the whole run
mod e2e_config {
    use super::*;

    #[test]
    fn e2e_config_file_layout() {
        let dir = TempDir::new().expect("temp dir");
        let config_path = dir.path().join("tactics.toml");
        fs::write(
            &config_path,
            r#"
max_seconds = 30.0

[scenario]
player_position = [0.0, 0.0]
enemies = [
    { archetype = "melee", position = [300.0, 0.0] },
    { archetype = "melee", position = [-300.0, 0.0] },
]
"#,
        )
        .expect("write config");

        let config = EngineConfig::read_from(&config_path)
            .expect("read")
            .expect("present");
        let mut archetypes = Archetypes::default();
        archetypes.enemy.max_health = 20.0;
        archetypes.enemy.base_damage = 1.0;

        let report = Skirmish::new(&config, &archetypes).run();
        assert_eq!(report.outcome, SkirmishOutcome::Victory);
        assert_eq!(report.kills, 2);
        assert_eq!(report.score, 200);
        assert_eq!(report.exp, 50);
    }
}
