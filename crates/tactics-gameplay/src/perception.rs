//! Enemy perception and pursuit AI.
//!
//! This module provides:
//! - The explicit Patrol/Chase/Attack/Dead state and its pure derivation
//! - Target sensing through id lookups
//! - The per-tick brain that drives locomotion and attack strategies
//! - Boss phase handling layered on the same brain

use serde::{Deserialize, Serialize};
use tactics_common::{planar_direction, EntityId};
use tracing::{debug, info, trace, warn};

use crate::body::Locomotion;
use crate::boss::{BossController, PhaseTransition};
use crate::events::CombatEvent;
use crate::melee_combat::{Aim, MeleeAttackResolver};
use crate::ranged_combat::RangedAttackStrategy;
use crate::world::CombatWorld;

// ============================================================================
// State derivation
// ============================================================================

/// AI state, re-derived every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiState {
    /// No target in range; idle at patrol speed
    #[default]
    Patrol,
    /// Closing distance to the target
    Chase,
    /// Within reach; attack every tick
    Attack,
    /// Terminal
    Dead,
}

/// What an enemy knows about its tracked target this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSense {
    /// No target, or the target left the world
    Missing,
    /// Target exists but is dead
    Dead,
    /// Target is alive at this distance
    Alive {
        /// Center-to-center distance
        distance: f32,
    },
}

/// Derives the AI state. Level-triggered with no hysteresis band.
#[must_use]
pub fn resolve_state(self_alive: bool, sense: TargetSense, detection_range: f32, attack_range: f32) -> AiState {
    if !self_alive {
        return AiState::Dead;
    }
    match sense {
        TargetSense::Missing | TargetSense::Dead => AiState::Patrol,
        TargetSense::Alive { distance } if distance > detection_range => AiState::Patrol,
        TargetSense::Alive { distance } if distance > attack_range => AiState::Chase,
        TargetSense::Alive { .. } => AiState::Attack,
    }
}

/// Looks up `target` through the world.
pub fn sense_target<W: CombatWorld + ?Sized>(world: &W, me: EntityId, target: Option<EntityId>) -> TargetSense {
    let Some(target) = target else {
        return TargetSense::Missing;
    };
    let (Some(stats), Some(body), Some(own)) = (world.stats(target), world.body(target), world.body(me)) else {
        return TargetSense::Missing;
    };
    if stats.is_dead() {
        return TargetSense::Dead;
    }
    TargetSense::Alive {
        distance: own.position.distance(body.position),
    }
}

// ============================================================================
// Brain
// ============================================================================

/// Perception and movement tunables for one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    /// Distance at which the target is noticed
    pub detection_range: f32,
    /// Replaces the stats attack range for AI decisions when set
    pub attack_range_override: Option<f32>,
    /// Speed while chasing
    pub chase_speed: f32,
    /// Speed while patrolling
    pub patrol_speed: f32,
    /// Multiplier on both speeds (raised by enrage)
    pub speed_scale: f32,
    /// Score granted on death
    pub score_value: u32,
    /// Experience granted on death
    pub exp_value: u32,
}

impl Default for EnemyProfile {
    fn default() -> Self {
        Self {
            detection_range: 1000.0,
            attack_range_override: None,
            chase_speed: 400.0,
            patrol_speed: 200.0,
            speed_scale: 1.0,
            score_value: 100,
            exp_value: 25,
        }
    }
}

/// How an enemy attacks once in reach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttackStrategy {
    /// Close-range strike
    Melee(MeleeAttackResolver),
    /// Projectile or instant shot
    Ranged(RangedAttackStrategy),
}

/// Per-enemy AI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyBrain {
    /// Tunables
    pub profile: EnemyProfile,
    /// Tracked opponent, resolved by id every tick
    pub target: Option<EntityId>,
    /// Attack used in the Attack state
    pub strategy: AttackStrategy,
    /// Boss layer, if this enemy is a boss
    pub boss: Option<BossController>,
    last_state: AiState,
}

impl EnemyBrain {
    /// Creates a brain with no target.
    #[must_use]
    pub fn new(profile: EnemyProfile, strategy: AttackStrategy) -> Self {
        Self {
            profile,
            target: None,
            strategy,
            boss: None,
            last_state: AiState::Patrol,
        }
    }

    /// Adds the boss layer.
    #[must_use]
    pub fn with_boss(mut self, boss: BossController) -> Self {
        self.boss = Some(boss);
        self
    }

    /// Sets the tracked target.
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// State chosen on the most recent tick.
    #[must_use]
    pub fn state(&self) -> AiState {
        self.last_state
    }

    /// Attack range used for AI decisions.
    #[must_use]
    pub fn attack_range(&self, stats_range: f32) -> f32 {
        self.profile.attack_range_override.unwrap_or(stats_range)
    }

    /// Re-evaluates boss phase from current HP. No-op for non-bosses or the dead.
    ///
    /// Enrage multiplies base damage, the speed scale and the current
    /// movement speed, exactly once.
    pub fn update_phase<W: CombatWorld + ?Sized>(&mut self, world: &mut W, me: EntityId) -> Option<PhaseTransition> {
        let boss = self.boss.as_mut()?;
        let hp_pct = world.stats(me).filter(|s| s.is_alive())?.health_percent();
        let transition = boss.update(hp_pct)?;

        info!(boss = %me, from = transition.from.number(), to = transition.to.number(), "boss phase changed");
        world.publish(CombatEvent::PhaseChanged {
            boss: me,
            from: transition.from,
            to: transition.to,
        });

        if transition.enraged_now {
            let speed_mult = boss.tuning.enrage_speed_multiplier;
            let damage_mult = boss.tuning.enrage_damage_multiplier;
            self.profile.speed_scale *= speed_mult;
            if let Some(stats) = world.stats_mut(me) {
                stats.base_damage *= damage_mult;
            }
            if let Some(body) = world.body_mut(me) {
                let speed = body.desired_speed * speed_mult;
                body.set_desired_speed(speed);
            }
            warn!(boss = %me, "boss enraged");
            world.publish(CombatEvent::Enraged { boss: me });
        }
        Some(transition)
    }

    /// Runs one AI tick for `me`. Returns the state acted on.
    pub fn think<W: CombatWorld + ?Sized>(&mut self, world: &mut W, me: EntityId, dt: f32) -> AiState {
        let Some(stats) = world.stats(me) else {
            return AiState::Dead;
        };
        let alive = stats.is_alive();
        let attack_range = self.attack_range(stats.attack_range);
        let sense = sense_target(world, me, self.target);
        let state = resolve_state(alive, sense, self.profile.detection_range, attack_range);

        if state != self.last_state {
            debug!(enemy = %me, from = ?self.last_state, to = ?state, "ai state changed");
            self.last_state = state;
        }

        let turn_rate = world.tunables().turn_rate;
        let toward = self.target.and_then(|t| {
            let own = world.body(me)?.position;
            planar_direction(own, world.body(t)?.position)
        });

        match state {
            AiState::Dead => {},
            AiState::Patrol => {
                let speed = self.profile.patrol_speed * self.profile.speed_scale;
                if let Some(body) = world.body_mut(me) {
                    body.set_desired_speed(speed);
                }
            },
            AiState::Chase => {
                let speed = self.profile.chase_speed * self.profile.speed_scale;
                if let Some(body) = world.body_mut(me) {
                    body.set_desired_speed(speed);
                    if let Some(dir) = toward {
                        body.face_smoothed(dir, dt, turn_rate);
                        body.add_movement_input(dir);
                    }
                }
            },
            AiState::Attack => {
                if let Some(body) = world.body_mut(me) {
                    body.stop_movement();
                    if let Some(dir) = toward {
                        body.face_smoothed(dir, dt, turn_rate);
                    }
                }
                if let Some(target) = self.target {
                    self.attack(world, me, target, attack_range);
                }
            },
        }
        state
    }

    fn attack<W: CombatWorld + ?Sized>(&mut self, world: &mut W, me: EntityId, target: EntityId, range: f32) {
        let ready = world.stats(me).is_some_and(|s| s.can_attack());
        if !ready {
            return;
        }
        if let Some(boss) = self.boss.as_mut().filter(|b| b.special_ready()) {
            if boss.perform_special(world, me, target).is_some() {
                return;
            }
        }
        match &self.strategy {
            AttackStrategy::Melee(resolver) => {
                let outcome = resolver.resolve(world, me, Aim::Target(target), range);
                trace!(enemy = %me, ?outcome, "melee strategy");
            },
            AttackStrategy::Ranged(strategy) => {
                let outcome = strategy.resolve(world, me, target, range);
                trace!(enemy = %me, ?outcome, "ranged strategy");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::config::{EnemyConfig, PlayerConfig};
    use glam::Vec2;

    #[test]
    fn test_resolve_state_precedence() {
        let alive = TargetSense::Alive { distance: 100.0 };
        assert_eq!(resolve_state(false, alive, 1000.0, 150.0), AiState::Dead);
        assert_eq!(resolve_state(true, TargetSense::Missing, 1000.0, 150.0), AiState::Patrol);
        assert_eq!(resolve_state(true, TargetSense::Dead, 1000.0, 150.0), AiState::Patrol);
        assert_eq!(resolve_state(true, alive, 1000.0, 150.0), AiState::Attack);
    }

    #[test]
    fn test_chase_not_attack_at_500() {
        let sense = TargetSense::Alive { distance: 500.0 };
        assert_eq!(resolve_state(true, sense, 1000.0, 150.0), AiState::Chase);
    }

    #[test]
    fn test_boundaries_have_no_hysteresis() {
        let at = |d| resolve_state(true, TargetSense::Alive { distance: d }, 1000.0, 150.0);
        assert_eq!(at(150.0), AiState::Attack);
        assert_eq!(at(150.01), AiState::Chase);
        assert_eq!(at(150.0), AiState::Attack);
        assert_eq!(at(1000.0), AiState::Chase);
        assert_eq!(at(1000.01), AiState::Patrol);
    }

    #[test]
    fn test_attack_range_override() {
        let mut brain = EnemyBrain::new(EnemyProfile::default(), AttackStrategy::Melee(MeleeAttackResolver::range_check()));
        assert_eq!(brain.attack_range(200.0), 200.0);
        brain.profile.attack_range_override = Some(150.0);
        assert_eq!(brain.attack_range(200.0), 150.0);
    }

    #[test]
    fn test_sense_target_through_world() {
        let mut arena = Arena::default();
        let player = arena.spawn_player(&PlayerConfig::default(), Vec2::new(300.0, 400.0));
        let enemy = arena.spawn_enemy(&EnemyConfig::default(), Vec2::ZERO);

        assert_eq!(sense_target(&arena, enemy, None), TargetSense::Missing);
        assert_eq!(
            sense_target(&arena, enemy, Some(EntityId::from_raw(u64::MAX))),
            TargetSense::Missing
        );
        let TargetSense::Alive { distance } = sense_target(&arena, enemy, Some(player)) else {
            panic!("player should be sensed");
        };
        assert!((distance - 500.0).abs() < 1e-3);

        arena.apply_damage(player, 1000.0, None);
        assert_eq!(sense_target(&arena, enemy, Some(player)), TargetSense::Dead);
    }
}
