//! Ranged attack logic.
//!
//! This module provides:
//! - Projectile prototypes and spawn requests
//! - Projectiles in flight with lifetime expiry
//! - The ranged attack strategy with its instant-damage fallback

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tactics_common::{local_to_world, planar_direction, EntityId};
use tracing::{debug, trace};

use crate::body::Locomotion;
use crate::events::AttackKind;
use crate::melee_combat::{check_ready, commit_attack, BlockReason};
use crate::world::CombatWorld;

// ============================================================================
// Projectiles
// ============================================================================

/// Template for projectiles a ranged attacker fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectilePrototype {
    /// Display name
    pub name: String,
    /// Collision radius
    pub radius: f32,
    /// Seconds before the projectile expires
    pub lifetime: f32,
}

impl Default for ProjectilePrototype {
    fn default() -> Self {
        Self {
            name: "bolt".to_string(),
            radius: 15.0,
            lifetime: 3.0,
        }
    }
}

/// Request to put a projectile into the world.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSpawn {
    /// Shooter
    pub owner: EntityId,
    /// Template
    pub prototype: ProjectilePrototype,
    /// Spawn position
    pub location: Vec2,
    /// Initial velocity
    pub velocity: Vec2,
    /// Damage dealt on impact, before target armor
    pub damage: f32,
}

/// Entity factory able to spawn projectiles.
pub trait ProjectileFactory {
    /// Spawns a projectile. Returns its id, or `None` if it could not be placed.
    fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> Option<EntityId>;
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Projectile entity id
    pub id: EntityId,
    /// Shooter
    pub owner: EntityId,
    /// Current position
    pub position: Vec2,
    /// Velocity
    pub velocity: Vec2,
    /// Damage on hit
    pub damage: f32,
    /// Collision radius
    pub radius: f32,
    /// Time to live
    pub ttl: f32,
    /// Whether projectile is still active
    pub active: bool,
}

impl Projectile {
    /// Creates a projectile from a spawn request.
    #[must_use]
    pub fn new(id: EntityId, spawn: &ProjectileSpawn) -> Self {
        Self {
            id,
            owner: spawn.owner,
            position: spawn.location,
            velocity: spawn.velocity,
            damage: spawn.damage,
            radius: spawn.prototype.radius,
            ttl: spawn.prototype.lifetime,
            active: true,
        }
    }

    /// Moves the projectile and ages it. Returns the segment travelled.
    pub fn update(&mut self, dt: f32) -> (Vec2, Vec2) {
        let start = self.position;
        if !self.active {
            return (start, start);
        }
        self.position += self.velocity * dt;
        self.ttl -= dt;
        (start, self.position)
    }

    /// Still flying and not expired.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active && self.ttl > 0.0
    }

    /// Deactivate on hit.
    pub fn on_hit(&mut self) {
        self.active = false;
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Result of a ranged attack attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangedOutcome {
    /// Nothing changed.
    Blocked(BlockReason),
    /// A projectile was requested. `None` if the factory refused it.
    Fired {
        /// Spawned projectile
        projectile: Option<EntityId>,
    },
    /// Instant fallback damage landed.
    Struck {
        /// HP actually removed
        damage: f32,
    },
    /// Instant fallback, target outside range.
    Missed,
}

impl RangedOutcome {
    /// Whether the attack went through (cooldown consumed).
    #[must_use]
    pub fn is_committed(&self) -> bool {
        !matches!(self, Self::Blocked(_))
    }
}

/// Attack resolution for entities that shoot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedAttackStrategy {
    /// Projectile to fire; `None` degrades to instant damage
    pub projectile: Option<ProjectilePrototype>,
    /// Launch speed
    pub projectile_speed: f32,
    /// Spawn offset in the shooter's frame (+X forward, +Y left)
    pub spawn_offset: Vec2,
}

impl Default for RangedAttackStrategy {
    fn default() -> Self {
        Self {
            projectile: None,
            projectile_speed: 1000.0,
            spawn_offset: Vec2::new(50.0, 0.0),
        }
    }
}

impl RangedAttackStrategy {
    /// Sets the projectile prototype.
    #[must_use]
    pub fn with_projectile(mut self, prototype: ProjectilePrototype) -> Self {
        self.projectile = Some(prototype);
        self
    }

    /// Attempts a shot at `target`.
    ///
    /// Exactly one of the projectile or the instant path runs per committed
    /// attack.
    pub fn resolve<W: CombatWorld + ?Sized>(
        &self,
        world: &mut W,
        attacker: EntityId,
        target: EntityId,
        range: f32,
    ) -> RangedOutcome {
        if let Err(reason) = check_ready(world, attacker, Some(target)) {
            trace!(%attacker, ?reason, "ranged attack blocked");
            return RangedOutcome::Blocked(reason);
        }
        let Some((origin, forward)) = world.body(attacker).map(|b| (b.position, b.forward())) else {
            return RangedOutcome::Blocked(BlockReason::AttackerMissing);
        };
        let Some(target_pos) = world.body(target).map(|b| b.position) else {
            return RangedOutcome::Blocked(BlockReason::TargetMissing);
        };
        let Some(attacker_stats) = world.stats(attacker).cloned() else {
            return RangedOutcome::Blocked(BlockReason::AttackerMissing);
        };

        let direction = planar_direction(origin, target_pos).unwrap_or(forward);
        commit_attack(world, attacker, direction, AttackKind::Ranged);

        if let Some(prototype) = &self.projectile {
            let spawn = ProjectileSpawn {
                owner: attacker,
                prototype: prototype.clone(),
                location: origin + local_to_world(self.spawn_offset, direction),
                velocity: direction * self.projectile_speed,
                damage: attacker_stats.base_damage,
            };
            let projectile = world.spawn_projectile(spawn);
            debug!(%attacker, ?projectile, "projectile fired");
            return RangedOutcome::Fired { projectile };
        }

        if origin.distance(target_pos) > range {
            trace!(%attacker, %target, "instant shot out of range");
            return RangedOutcome::Missed;
        }
        let armor = world.stats(target).map_or(0.0, |s| s.armor);
        let damage = world.apply_damage(target, attacker_stats.calculate_damage(armor), Some(attacker));
        debug!(%attacker, %target, damage, "instant shot landed");
        RangedOutcome::Struck { damage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::config::{PlayerConfig, RangedConfig};

    fn setup(distance: f32, with_projectile: bool) -> (Arena, EntityId, EntityId) {
        let mut arena = Arena::default();
        let player = arena.spawn_player(&PlayerConfig::default(), Vec2::new(distance, 0.0));
        let mut config = RangedConfig::default();
        config.projectile = with_projectile.then(ProjectilePrototype::default);
        let shooter = arena.spawn_ranged_enemy(&config, Vec2::ZERO);
        (arena, player, shooter)
    }

    #[test]
    fn test_instant_fallback_damages_once() {
        let (mut arena, player, shooter) = setup(400.0, false);
        let strategy = arena.ranged_strategy(shooter).cloned().unwrap_or_default();

        let outcome = strategy.resolve(&mut arena, shooter, player, 600.0);
        assert_eq!(outcome, RangedOutcome::Struck { damage: 15.0 });
        assert_eq!(arena.stats(player).map(|s| s.health()), Some(85.0));
        assert_eq!(arena.stats(shooter).map(|s| s.cooldown_remaining()), Some(2.0));

        let again = strategy.resolve(&mut arena, shooter, player, 600.0);
        assert_eq!(again, RangedOutcome::Blocked(BlockReason::OnCooldown));
        assert_eq!(arena.stats(player).map(|s| s.health()), Some(85.0));
    }

    #[test]
    fn test_instant_fallback_out_of_range_misses() {
        let (mut arena, player, shooter) = setup(700.0, false);
        let outcome = RangedAttackStrategy::default().resolve(&mut arena, shooter, player, 600.0);
        assert_eq!(outcome, RangedOutcome::Missed);
        assert_eq!(arena.stats(player).map(|s| s.health()), Some(100.0));
    }

    #[test]
    fn test_projectile_spawns_at_offset_and_does_not_damage_immediately() {
        let (mut arena, player, shooter) = setup(400.0, true);
        let strategy = RangedAttackStrategy::default().with_projectile(ProjectilePrototype::default());

        let RangedOutcome::Fired { projectile: Some(id) } = strategy.resolve(&mut arena, shooter, player, 600.0) else {
            panic!("expected a projectile");
        };
        let projectile = arena.projectile(id).cloned();
        assert!(projectile.as_ref().is_some_and(|p| p.position.distance(Vec2::new(50.0, 0.0)) < 1e-3));
        assert!(projectile.is_some_and(|p| (p.velocity.x - 1000.0).abs() < 1e-3));
        assert_eq!(arena.stats(player).map(|s| s.health()), Some(100.0));
    }

    #[test]
    fn test_projectile_lifetime_expiry() {
        let spawn = ProjectileSpawn {
            owner: EntityId::from_raw(1),
            prototype: ProjectilePrototype {
                lifetime: 0.5,
                ..ProjectilePrototype::default()
            },
            location: Vec2::ZERO,
            velocity: Vec2::new(100.0, 0.0),
            damage: 10.0,
        };
        let mut projectile = Projectile::new(EntityId::from_raw(2), &spawn);
        let (start, end) = projectile.update(0.25);
        assert_eq!(start, Vec2::ZERO);
        assert!((end.x - 25.0).abs() < 1e-4);
        assert!(projectile.is_active());
        projectile.update(0.25);
        assert!(!projectile.is_active());
    }
}
