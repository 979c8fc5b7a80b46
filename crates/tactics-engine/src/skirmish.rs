//! Headless skirmish runner.
//!
//! This module provides:
//! - Building an [`Arena`] from the engine scenario and archetypes
//! - A scripted player that closes in on the nearest enemy and swings at it
//! - The fixed-step loop: player input, arena tick, body integration
//! - Event draining into the log and an optional JSON-lines file
//! - A [`SkirmishReport`] once someone wins or time runs out

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use glam::Vec2;
use serde::Serialize;
use tactics_common::{planar_direction, EntityId};
use tactics_gameplay::{
    Aim, Arena, Archetypes, CombatEvent, CombatWorld, Locomotion, MeleeOutcome,
};
use tracing::{debug, info, trace, warn};

use crate::config::{ArchetypeKind, EngineConfig};
use crate::timing::FixedStep;

/// Fraction of reach the scripted player closes to before stopping.
const APPROACH_FRACTION: f32 = 0.75;

/// How a skirmish ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkirmishOutcome {
    /// Every enemy died
    Victory,
    /// The player died
    Defeat,
    /// Time limit reached with both sides standing
    TimeUp,
}

/// Summary of a finished skirmish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkirmishReport {
    /// How it ended
    pub outcome: SkirmishOutcome,
    /// Fixed steps simulated
    pub ticks: u64,
    /// Simulated seconds
    pub elapsed: f64,
    /// Enemies killed by the player
    pub kills: u32,
    /// Score earned
    pub score: u32,
    /// Experience earned
    pub exp: u32,
    /// Player still alive at the end
    pub player_alive: bool,
}

/// One line of the event log.
#[derive(Serialize)]
struct EventRecord<'a> {
    tick: u64,
    time: f64,
    event: &'a CombatEvent,
}

/// JSON-lines sink for combat events.
#[derive(Debug)]
struct EventLog {
    writer: BufWriter<File>,
}

impl EventLog {
    fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }

    fn write(&mut self, record: &EventRecord<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")
    }
}

/// Running totals credited to the player.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    kills: u32,
    score: u32,
    exp: u32,
}

/// A scripted player against the configured enemies.
#[derive(Debug)]
pub struct Skirmish {
    arena: Arena,
    player: EntityId,
    step: FixedStep,
    max_seconds: f32,
    tally: Tally,
    event_log: Option<EventLog>,
    outcome: Option<SkirmishOutcome>,
}

impl Skirmish {
    /// Builds the arena and spawns the scenario.
    #[must_use]
    pub fn new(config: &EngineConfig, archetypes: &Archetypes) -> Self {
        let mut arena = Arena::new(archetypes.arena.clone());
        let player = arena.spawn_player(&archetypes.player, config.scenario.player_position);

        for placement in &config.scenario.enemies {
            let id = match placement.archetype {
                ArchetypeKind::Melee => arena.spawn_enemy(&archetypes.enemy, placement.position),
                ArchetypeKind::Ranged => {
                    arena.spawn_ranged_enemy(&archetypes.ranged, placement.position)
                },
                ArchetypeKind::Boss => arena.spawn_boss(&archetypes.boss, placement.position),
            };
            debug!(%id, archetype = ?placement.archetype, position = ?placement.position, "enemy placed");
        }

        info!(
            player = %player,
            enemies = config.scenario.enemies.len(),
            tick_rate = config.tick_rate,
            "Skirmish ready"
        );

        Self {
            arena,
            player,
            step: FixedStep::new(config.tick_rate),
            max_seconds: config.max_seconds,
            tally: Tally::default(),
            event_log: None,
            outcome: None,
        }
    }

    /// Writes every combat event to `path` as JSON lines.
    pub fn with_event_log(mut self, path: &Path) -> io::Result<Self> {
        self.event_log = Some(EventLog::create(path)?);
        info!("Logging combat events to {}", path.display());
        Ok(self)
    }

    /// The arena being simulated.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The scripted player.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Set once the skirmish is over.
    #[must_use]
    pub fn outcome(&self) -> Option<SkirmishOutcome> {
        self.outcome
    }

    /// Feeds a frame delta and runs the fixed steps it covers.
    ///
    /// Returns the number of steps run.
    pub fn frame(&mut self, dt: f32) -> u32 {
        let steps = self.step.accumulate(dt);
        let mut ran = 0;
        for _ in 0..steps {
            if self.outcome.is_some() {
                break;
            }
            self.fixed_update(self.step.fixed_dt());
            ran += 1;
        }
        ran
    }

    /// Runs until the skirmish ends.
    pub fn run(&mut self) -> SkirmishReport {
        let dt = self.step.fixed_dt();
        while self.outcome.is_none() {
            self.frame(dt);
        }
        self.flush_log();
        let report = self.report();
        info!(
            outcome = ?report.outcome,
            ticks = report.ticks,
            elapsed = report.elapsed,
            kills = report.kills,
            score = report.score,
            exp = report.exp,
            "Skirmish finished"
        );
        report
    }

    /// Summary of the skirmish so far.
    #[must_use]
    pub fn report(&self) -> SkirmishReport {
        SkirmishReport {
            outcome: self.outcome.unwrap_or(SkirmishOutcome::TimeUp),
            ticks: self.arena.tick_count(),
            elapsed: self.arena.now(),
            kills: self.tally.kills,
            score: self.tally.score,
            exp: self.tally.exp,
            player_alive: self.player_alive(),
        }
    }

    fn player_alive(&self) -> bool {
        self.arena
            .combatant(self.player)
            .is_some_and(|c| c.stats.is_alive())
    }

    fn fixed_update(&mut self, dt: f32) {
        self.drive_player(dt);
        self.arena.tick(dt);
        self.arena.integrate_bodies(dt);
        self.drain_events();
        self.outcome = self.check_finished();
    }

    /// Walks toward the nearest live enemy and swings once in reach.
    fn drive_player(&mut self, dt: f32) {
        let Some(me) = self.arena.live_position(self.player) else {
            return;
        };
        let Some((target, target_pos)) = self.nearest_enemy(me) else {
            return;
        };
        let Some(reach) = self.arena.stats(self.player).map(|s| s.attack_range) else {
            return;
        };

        let distance = me.distance(target_pos);
        let turn_rate = self.arena.tunables().turn_rate;
        if let (Some(dir), Some(body)) = (planar_direction(me, target_pos), self.arena.body_mut(self.player)) {
            if distance > reach * APPROACH_FRACTION {
                body.add_movement_input(dir);
            } else {
                body.face_smoothed(dir, dt, turn_rate);
            }
        }

        if distance <= reach {
            match self.arena.player_attack(self.player, Aim::Pointer(target_pos)) {
                Ok(MeleeOutcome::Committed { hits, .. }) => {
                    trace!(%target, hits = hits.len(), "player swing");
                },
                Ok(MeleeOutcome::Blocked(reason)) => {
                    trace!(?reason, "player swing blocked");
                },
                Err(e) => warn!("Player attack failed: {e}"),
            }
        }
    }

    fn nearest_enemy(&self, from: Vec2) -> Option<(EntityId, Vec2)> {
        self.arena
            .ids()
            .into_iter()
            .filter(|id| self.arena.combatant(*id).is_some_and(|c| !c.is_player()))
            .filter_map(|id| self.arena.live_position(id).map(|p| (id, p)))
            .min_by(|a, b| {
                a.1.distance_squared(from)
                    .total_cmp(&b.1.distance_squared(from))
                    .then(a.0.cmp(&b.0))
            })
    }

    fn drain_events(&mut self) {
        let tick = self.arena.tick_count();
        let time = self.arena.now();

        for event in self.arena.drain_events() {
            trace!(?event, "combat event");
            if let CombatEvent::Died {
                entity,
                killer,
                reward,
                ..
            } = &event
            {
                if *entity == self.player {
                    info!(killer = ?killer, "Player died");
                } else if *killer == Some(self.player) {
                    self.tally.kills += 1;
                    self.tally.score = self.tally.score.saturating_add(reward.score);
                    self.tally.exp = self.tally.exp.saturating_add(reward.exp);
                }
            }

            if let Some(log) = self.event_log.as_mut() {
                if let Err(e) = log.write(&EventRecord {
                    tick,
                    time,
                    event: &event,
                }) {
                    warn!("Disabling event log after write failure: {e}");
                    self.event_log = None;
                }
            }
        }
    }

    fn check_finished(&self) -> Option<SkirmishOutcome> {
        if !self.player_alive() {
            Some(SkirmishOutcome::Defeat)
        } else if self.arena.living_enemies() == 0 {
            Some(SkirmishOutcome::Victory)
        } else if self.arena.now() >= f64::from(self.max_seconds) {
            Some(SkirmishOutcome::TimeUp)
        } else {
            None
        }
    }

    fn flush_log(&mut self) {
        if let Some(log) = self.event_log.as_mut() {
            if let Err(e) = log.writer.flush() {
                warn!("Failed to flush event log: {e}");
            }
        }
    }
}
