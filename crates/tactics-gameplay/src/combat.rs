//! Combat entity core.
//!
//! This module provides:
//! - Hit points with a one-way death transition
//! - The armor-mitigated damage formula
//! - Attack cooldown gating
//! - Reward payload carried by a combatant's death

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tactics_common::{EntityId, TacticsError};
use thiserror::Error;

/// Combat system error types.
///
/// Only setup paths (spawning, explicit target assignment) return these.
/// Per-tick combat never fails: it degrades silently.
#[derive(Debug, Clone, Error)]
pub enum CombatError {
    /// Entity not found
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),
    /// Entity has no AI brain to receive a target
    #[error("entity {0} is not an enemy")]
    NotAnEnemy(EntityId),
    /// Entity is not player-controlled
    #[error("entity {0} is not a player")]
    NotAPlayer(EntityId),
    /// An entity cannot target itself
    #[error("entity {0} cannot target itself")]
    SelfTarget(EntityId),
}

impl From<CombatError> for TacticsError {
    fn from(err: CombatError) -> Self {
        match err {
            CombatError::EntityNotFound(id) => Self::EntityNotFound(id),
            other => Self::invalid_config("target", other.to_string()),
        }
    }
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;

// ============================================================================
// Damage formula
// ============================================================================

/// Mitigates `base` by `armor` using `round(base * 100 / (100 + armor))`.
///
/// Negative armor is treated as zero, so the result never exceeds
/// `round(base)`.
#[must_use]
pub fn mitigated_damage(base: f32, armor: f32) -> f32 {
    let armor = if armor.is_finite() { armor.max(0.0) } else { 0.0 };
    (base * 100.0 / (100.0 + armor)).round()
}

/// Sanitizes an incoming damage or heal amount.
fn non_negative(amount: f32) -> f32 {
    if amount.is_nan() {
        0.0
    } else {
        amount.max(0.0)
    }
}

// ============================================================================
// Combat stats
// ============================================================================

/// Alive/dead sub-state. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifeState {
    /// Can act and be damaged
    #[default]
    Alive,
    /// Terminal; every combat operation is a no-op
    Dead,
}

/// Outcome of a single damage application.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageApplied {
    /// HP actually removed
    pub amount: f32,
    /// True only on the call that caused death
    pub killed: bool,
}

impl DamageApplied {
    /// Nothing happened.
    pub const NONE: Self = Self {
        amount: 0.0,
        killed: false,
    };
}

/// Score and experience granted when an entity dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reward {
    /// Score points
    pub score: u32,
    /// Experience points
    pub exp: u32,
}

impl Reward {
    /// Creates a reward.
    #[must_use]
    pub const fn new(score: u32, exp: u32) -> Self {
        Self { score, exp }
    }
}

/// Hit points, damage output and attack gating for one combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Maximum health
    pub max_health: f32,
    /// Current health, always within `0..=max_health`
    health: f32,
    /// Damage before mitigation
    pub base_damage: f32,
    /// Armor value (no armor model yet, always 0 for built-in archetypes)
    pub armor: f32,
    /// Reach of the attack
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Time until next attack allowed
    cooldown_timer: f32,
    /// Facing committed by the most recent attack
    pub last_attack_direction: Vec2,
    life: LifeState,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            health: 100.0,
            base_damage: 20.0,
            armor: 0.0,
            attack_range: 200.0,
            attack_cooldown: 0.5,
            cooldown_timer: 0.0,
            last_attack_direction: Vec2::X,
            life: LifeState::Alive,
        }
    }
}

impl CombatStats {
    /// Creates new combat stats with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets max health and fills current health to it.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.max_health = health.max(0.0);
        self.health = self.max_health;
        self.life = if self.health > 0.0 {
            LifeState::Alive
        } else {
            LifeState::Dead
        };
        self
    }

    /// Sets base damage.
    #[must_use]
    pub fn with_base_damage(mut self, damage: f32) -> Self {
        self.base_damage = damage;
        self
    }

    /// Sets the armor value.
    #[must_use]
    pub fn with_armor(mut self, armor: f32) -> Self {
        self.armor = armor;
        self
    }

    /// Sets attack range.
    #[must_use]
    pub fn with_attack_range(mut self, range: f32) -> Self {
        self.attack_range = range;
        self
    }

    /// Sets attack cooldown.
    #[must_use]
    pub fn with_attack_cooldown(mut self, cooldown: f32) -> Self {
        self.attack_cooldown = cooldown.max(0.0);
        self
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Current life state.
    #[must_use]
    pub fn life(&self) -> LifeState {
        self.life
    }

    /// Returns whether this entity is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.life == LifeState::Dead
    }

    /// Returns whether this entity is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Returns health as a fraction (0.0 to 1.0).
    #[must_use]
    pub fn health_percent(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Removes up to `amount` HP.
    ///
    /// No-op on a dead entity. `killed` is reported exactly once.
    pub fn take_damage(&mut self, amount: f32) -> DamageApplied {
        if self.is_dead() {
            return DamageApplied::NONE;
        }
        let actual = non_negative(amount).min(self.health);
        self.health -= actual;
        let killed = self.health <= 0.0;
        if killed {
            self.health = 0.0;
            self.life = LifeState::Dead;
        }
        DamageApplied {
            amount: actual,
            killed,
        }
    }

    /// Heals the entity, capped at max health. Returns HP restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + non_negative(amount)).min(self.max_health);
        self.health - before
    }

    /// Damage this entity deals to a target with `target_armor`.
    #[must_use]
    pub fn calculate_damage(&self, target_armor: f32) -> f32 {
        mitigated_damage(self.base_damage, target_armor)
    }

    /// Checks if attack is off cooldown.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    /// Seconds until the next attack is allowed.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_timer
    }

    /// Starts the attack cooldown.
    pub fn start_cooldown(&mut self) {
        self.cooldown_timer = self.attack_cooldown;
    }

    /// Advances the cooldown timer, clamped at zero.
    pub fn tick(&mut self, dt: f32) {
        self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_combat_stats_default() {
        let stats = CombatStats::new();
        assert_eq!(stats.health(), 100.0);
        assert_eq!(stats.max_health, 100.0);
        assert!(stats.is_alive());
        assert!(stats.can_attack());
    }

    #[test]
    fn test_take_damage_clamps_at_zero() {
        let mut stats = CombatStats::new().with_health(30.0);
        let applied = stats.take_damage(50.0);
        assert_eq!(applied.amount, 30.0);
        assert!(applied.killed);
        assert_eq!(stats.health(), 0.0);
        assert!(stats.is_dead());
    }

    #[test]
    fn test_death_reported_once() {
        let mut stats = CombatStats::new().with_health(10.0);
        assert!(stats.take_damage(10.0).killed);
        let again = stats.take_damage(10.0);
        assert_eq!(again, DamageApplied::NONE);
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let mut stats = CombatStats::new();
        let applied = stats.take_damage(-25.0);
        assert_eq!(applied.amount, 0.0);
        assert_eq!(stats.health(), 100.0);
        assert_eq!(stats.take_damage(f32::NAN).amount, 0.0);
    }

    #[test]
    fn test_heal_caps_and_skips_dead() {
        let mut stats = CombatStats::new();
        stats.take_damage(40.0);
        assert_eq!(stats.heal(100.0), 40.0);
        assert_eq!(stats.health(), 100.0);

        stats.take_damage(100.0);
        assert_eq!(stats.heal(50.0), 0.0);
        assert!(stats.is_dead());
    }

    #[test]
    fn test_calculate_damage() {
        let stats = CombatStats::new().with_base_damage(25.0);
        assert_eq!(stats.calculate_damage(0.0), 25.0);
        assert_eq!(stats.calculate_damage(100.0), 13.0);
        assert_eq!(stats.calculate_damage(-50.0), 25.0);
    }

    #[test]
    fn test_combat_stats_tick() {
        let mut stats = CombatStats::new().with_attack_cooldown(1.0);
        stats.start_cooldown();
        assert!(!stats.can_attack());

        stats.tick(0.5);
        assert!(!stats.can_attack());

        stats.tick(0.75);
        assert!(stats.can_attack());
        assert_eq!(stats.cooldown_remaining(), 0.0);
    }

    #[test]
    fn test_health_percent() {
        let mut stats = CombatStats::new().with_health(500.0);
        stats.take_damage(350.0);
        assert!((stats.health_percent() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_zero_health_spawns_dead() {
        let stats = CombatStats::new().with_health(0.0);
        assert!(stats.is_dead());
    }

    proptest! {
        #[test]
        fn prop_damage_decreases_with_armor(base in 0.0f32..1000.0, a in 0.0f32..500.0, b in 0.0f32..500.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(mitigated_damage(base, hi) <= mitigated_damage(base, lo));
            prop_assert_eq!(mitigated_damage(base, 0.0), base.round());
        }

        #[test]
        fn prop_health_stays_in_bounds(ops in proptest::collection::vec((any::<bool>(), -50.0f32..300.0), 0..40)) {
            let mut stats = CombatStats::new().with_health(120.0);
            for (is_damage, amount) in ops {
                if is_damage {
                    stats.take_damage(amount);
                } else {
                    stats.heal(amount);
                }
                prop_assert!(stats.health() >= 0.0);
                prop_assert!(stats.health() <= stats.max_health);
                prop_assert_eq!(stats.is_dead(), stats.health() <= 0.0);
            }
        }
    }
}
