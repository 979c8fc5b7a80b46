//! Boss phase controller.
//!
//! This module provides:
//! - HP-driven phase selection as a pure function
//! - A one-way enrage edge on first entry into the final phase
//! - The special area attack and its cooldown

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tactics_common::{planar_direction, EntityId};
use tracing::{info, warn};

use crate::body::Locomotion;
use crate::events::{AttackKind, CombatEvent};
use crate::melee_combat::commit_attack;
use crate::world::CombatWorld;

// ============================================================================
// Phases
// ============================================================================

/// Boss difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum BossPhase {
    /// Full strength opening
    #[default]
    One,
    /// Special attack unlocked
    Two,
    /// Final phase, triggers enrage
    Three,
}

impl BossPhase {
    /// Phase for a health fraction. Thresholds are inclusive upper bounds.
    #[must_use]
    pub fn from_health_percent(hp_pct: f32, thresholds: PhaseThresholds) -> Self {
        if hp_pct <= thresholds.phase3 {
            Self::Three
        } else if hp_pct <= thresholds.phase2 {
            Self::Two
        } else {
            Self::One
        }
    }

    /// Phase number, 1 to 3.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// HP fractions at which the boss enters phases two and three.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    /// Phase two at or below this fraction
    pub phase2: f32,
    /// Phase three at or below this fraction
    pub phase3: f32,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            phase2: 0.6,
            phase3: 0.3,
        }
    }
}

/// Enrage state. The only edge is `Composed -> Enraged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Temper {
    /// Not yet enraged
    #[default]
    Composed,
    /// Enraged for the rest of the fight
    Enraged,
}

impl Temper {
    /// Temper after observing `phase`.
    #[must_use]
    pub const fn after_phase(self, phase: BossPhase) -> Self {
        match (self, phase) {
            (Self::Composed, BossPhase::Three) | (Self::Enraged, _) => Self::Enraged,
            (Self::Composed, _) => Self::Composed,
        }
    }
}

/// A phase change observed by [`BossController::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Previous phase
    pub from: BossPhase,
    /// New phase
    pub to: BossPhase,
    /// True on the single transition that enraged the boss
    pub enraged_now: bool,
}

// ============================================================================
// Controller
// ============================================================================

/// Boss tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Phase thresholds
    pub thresholds: PhaseThresholds,
    /// Movement speed multiplier applied on enrage
    pub enrage_speed_multiplier: f32,
    /// Base damage multiplier applied on enrage
    pub enrage_damage_multiplier: f32,
    /// Seconds between special attacks
    pub special_attack_cooldown: f32,
    /// Special damage as a multiple of base damage
    pub special_damage_multiplier: f32,
    /// Special radius as a multiple of attack range
    pub special_range_multiplier: f32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            thresholds: PhaseThresholds::default(),
            enrage_speed_multiplier: 1.5,
            enrage_damage_multiplier: 1.3,
            special_attack_cooldown: 5.0,
            special_damage_multiplier: 2.0,
            special_range_multiplier: 1.5,
        }
    }
}

/// Outcome of a special attack.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialStrike {
    /// Damage per victim, before clamping to their HP
    pub damage: f32,
    /// Radius the strike covered
    pub radius: f32,
    /// Entities that lost HP, with the amount each lost
    pub victims: Vec<(EntityId, f32)>,
}

/// Phase state machine layered on a boss enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossController {
    /// Tunables
    pub tuning: BossTuning,
    phase: BossPhase,
    temper: Temper,
    special_timer: f32,
}

impl BossController {
    /// Creates a controller in phase one with the special attack ready.
    #[must_use]
    pub fn new(tuning: BossTuning) -> Self {
        Self {
            tuning,
            phase: BossPhase::One,
            temper: Temper::Composed,
            special_timer: 0.0,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    /// Current temper.
    #[must_use]
    pub fn temper(&self) -> Temper {
        self.temper
    }

    /// Whether the boss has enraged.
    #[must_use]
    pub fn is_enraged(&self) -> bool {
        self.temper == Temper::Enraged
    }

    /// Seconds until the special attack is available.
    #[must_use]
    pub fn special_timer(&self) -> f32 {
        self.special_timer
    }

    /// Counts down the special attack timer.
    pub fn tick(&mut self, dt: f32) {
        self.special_timer = (self.special_timer - dt).max(0.0);
    }

    /// Re-derives the phase from `hp_pct`.
    ///
    /// Returns the transition if the phase changed. `enraged_now` is true at
    /// most once over the controller's lifetime.
    pub fn update(&mut self, hp_pct: f32) -> Option<PhaseTransition> {
        let next = BossPhase::from_health_percent(hp_pct, self.tuning.thresholds);
        if next == self.phase {
            return None;
        }
        let from = self.phase;
        self.phase = next;
        let temper = self.temper.after_phase(next);
        let enraged_now = temper != self.temper;
        self.temper = temper;
        Some(PhaseTransition {
            from,
            to: next,
            enraged_now,
        })
    }

    /// Whether a special attack would replace the next normal attack.
    #[must_use]
    pub fn special_ready(&self) -> bool {
        self.special_timer <= 0.0 && self.phase >= BossPhase::Two
    }

    /// Performs the special attack around `boss`, facing `target`.
    ///
    /// Damages the tracked `target` if it is alive within the special radius.
    /// Other entities in the area, fellow enemies included, are untouched.
    /// Resets the special timer and the shared attack cooldown. The caller
    /// is responsible for the cooldown and readiness checks.
    pub fn perform_special<W: CombatWorld + ?Sized>(
        &mut self,
        world: &mut W,
        boss: EntityId,
        target: EntityId,
    ) -> Option<SpecialStrike> {
        let stats = world.stats(boss)?.clone();
        let (origin, forward) = world.body(boss).map(|b| (b.position, b.forward()))?;
        let facing = world
            .body(target)
            .and_then(|t| planar_direction(origin, t.position))
            .unwrap_or(forward);

        commit_attack(world, boss, facing, AttackKind::Special);
        self.special_timer = self.tuning.special_attack_cooldown;

        let damage = stats.base_damage * self.tuning.special_damage_multiplier;
        let radius = stats.attack_range * self.tuning.special_range_multiplier;
        world.publish(CombatEvent::SpecialAttack {
            boss,
            phase: self.phase,
            location: origin,
        });
        warn!(%boss, phase = self.phase.number(), "boss performs special attack");

        let view: &W = world;
        let in_reach: Vec<EntityId> = view
            .overlap_circle(origin, radius, boss)
            .into_iter()
            .filter(|&id| id == target && within(view, id, origin, radius))
            .collect();
        let mut victims = Vec::with_capacity(in_reach.len());
        for id in in_reach {
            let dealt = world.apply_damage(id, damage, Some(boss));
            if dealt > 0.0 {
                info!(%boss, victim = %id, dealt, "special attack hit");
                victims.push((id, dealt));
            }
        }
        Some(SpecialStrike {
            damage,
            radius,
            victims,
        })
    }
}

fn within<W: CombatWorld + ?Sized>(world: &W, id: EntityId, origin: Vec2, radius: f32) -> bool {
    world.live_position(id).is_some_and(|p| p.distance(origin) <= radius)
}
