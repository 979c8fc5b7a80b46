//! Melee attack resolution.
//!
//! This module provides:
//! - Cooldown gating and target validation
//! - Instant facing with a deferred orientation restore
//! - Swept-sphere or single-target range hit detection
//! - Per-hit damage through the world's damage funnel

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tactics_common::{normalize_direction, planar_direction, EntityId};
use tracing::{debug, trace};

use crate::body::Locomotion;
use crate::events::{AttackKind, CombatEvent};
use crate::scheduler::DeferredTask;
use crate::world::CombatWorld;

/// Pointer offsets shorter than this (squared) fall back to the forward vector.
pub const POINTER_DEADZONE_SQ: f32 = 0.1;

/// How a melee swing finds what it hits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HitDetection {
    /// Sweep a sphere along the attack direction for the full range.
    Sweep {
        /// Radius of the swept probe
        probe_radius: f32,
    },
    /// Only the known target, if within range.
    RangeCheck,
}

impl Default for HitDetection {
    fn default() -> Self {
        Self::Sweep { probe_radius: 50.0 }
    }
}

/// Where an attack is directed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aim {
    /// At a tracked entity
    Target(EntityId),
    /// At a world point (player cursor)
    Pointer(Vec2),
    /// Straight ahead
    Forward,
}

/// Why an attack did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Attacker is not in the world
    AttackerMissing,
    /// Attacker is dead
    AttackerDead,
    /// Attack still cooling down
    OnCooldown,
    /// Aimed target is not in the world
    TargetMissing,
    /// Aimed target is dead
    TargetDead,
}

/// A target struck by a swing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeHit {
    /// Target entity
    pub target: EntityId,
    /// HP actually removed
    pub damage: f32,
}

/// Result of a melee attack attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum MeleeOutcome {
    /// Nothing changed.
    Blocked(BlockReason),
    /// Cooldown consumed; `hits` may be empty.
    Committed {
        /// Facing the swing was made in
        direction: Vec2,
        /// Targets damaged
        hits: Vec<MeleeHit>,
    },
}

impl MeleeOutcome {
    /// Total HP removed by this attack.
    #[must_use]
    pub fn total_damage(&self) -> f32 {
        match self {
            Self::Blocked(_) => 0.0,
            Self::Committed { hits, .. } => hits.iter().map(|h| h.damage).sum(),
        }
    }

    /// Whether the attack went through.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Checks that `attacker` is alive and ready, and that `target` (if any) is alive.
pub(crate) fn check_ready<W: CombatWorld + ?Sized>(
    world: &W,
    attacker: EntityId,
    target: Option<EntityId>,
) -> Result<(), BlockReason> {
    let stats = world.stats(attacker).ok_or(BlockReason::AttackerMissing)?;
    if stats.is_dead() {
        return Err(BlockReason::AttackerDead);
    }
    if let Some(target) = target {
        let target_stats = world.stats(target).ok_or(BlockReason::TargetMissing)?;
        if target_stats.is_dead() {
            return Err(BlockReason::TargetDead);
        }
    }
    if !stats.can_attack() {
        return Err(BlockReason::OnCooldown);
    }
    Ok(())
}

/// Commits an attack: snap facing, record it, start the cooldown, emit cues.
///
/// Returns the attacker's position.
pub(crate) fn commit_attack<W: CombatWorld + ?Sized>(
    world: &mut W,
    attacker: EntityId,
    direction: Vec2,
    kind: AttackKind,
) -> Vec2 {
    let restore_delay = world.tunables().orient_restore_delay;
    let trail_duration = world.tunables().attack_trail_duration;

    let mut location = Vec2::ZERO;
    let mut orient = false;
    if let Some(body) = world.body_mut(attacker) {
        orient = body.suspend_orientation();
        body.face_instant(direction);
        location = body.position;
    }
    if let Some(stats) = world.stats_mut(attacker) {
        stats.last_attack_direction = direction;
        stats.start_cooldown();
    }

    world.publish(CombatEvent::AttackPerformed {
        attacker,
        kind,
        location,
        direction,
        variant: fastrand::u8(1..=3),
    });
    world.schedule(attacker, restore_delay, DeferredTask::RestoreOrientation { orient });
    world.schedule(attacker, trail_duration, DeferredTask::EndAttackTrail);
    location
}

/// Direction for `aim` from the attacker's body.
fn aim_direction<W: CombatWorld + ?Sized>(world: &W, attacker: EntityId, aim: Aim) -> Vec2 {
    let Some(body) = world.body(attacker) else {
        return Vec2::X;
    };
    let forward = body.forward();
    match aim {
        Aim::Target(target) => world
            .body(target)
            .and_then(|t| planar_direction(body.position, t.position))
            .unwrap_or(forward),
        Aim::Pointer(point) => {
            let offset = point - body.position;
            if offset.length_squared() < POINTER_DEADZONE_SQ {
                forward
            } else {
                normalize_direction(offset).unwrap_or(forward)
            }
        },
        Aim::Forward => forward,
    }
}

/// Resolves melee attacks for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeleeAttackResolver {
    /// Hit detection mode
    pub hit_detection: HitDetection,
}

impl MeleeAttackResolver {
    /// Creates a resolver with the given hit detection.
    #[must_use]
    pub const fn new(hit_detection: HitDetection) -> Self {
        Self { hit_detection }
    }

    /// Swept-sphere resolver with the given probe radius.
    #[must_use]
    pub const fn sweep(probe_radius: f32) -> Self {
        Self::new(HitDetection::Sweep { probe_radius })
    }

    /// Single-target range check resolver.
    #[must_use]
    pub const fn range_check() -> Self {
        Self::new(HitDetection::RangeCheck)
    }

    /// Attempts an attack by `attacker` reaching `range`.
    ///
    /// A blocked attack changes nothing. A committed attack always consumes
    /// the cooldown, even when nothing is hit.
    pub fn resolve<W: CombatWorld + ?Sized>(
        &self,
        world: &mut W,
        attacker: EntityId,
        aim: Aim,
        range: f32,
    ) -> MeleeOutcome {
        let aimed_target = match aim {
            Aim::Target(target) => Some(target),
            Aim::Pointer(_) | Aim::Forward => None,
        };
        if let Err(reason) = check_ready(world, attacker, aimed_target) {
            trace!(%attacker, ?reason, "melee attack blocked");
            return MeleeOutcome::Blocked(reason);
        }

        let direction = aim_direction(world, attacker, aim);
        let origin = commit_attack(world, attacker, direction, AttackKind::Melee);

        let candidates: Vec<EntityId> = match self.hit_detection {
            HitDetection::Sweep { probe_radius } => world
                .sweep_sphere(origin, origin + direction * range, probe_radius, attacker)
                .into_iter()
                .map(|hit| hit.entity)
                .collect(),
            HitDetection::RangeCheck => aimed_target
                .filter(|&target| {
                    world
                        .body(target)
                        .is_some_and(|t| t.position.distance(origin) <= range)
                })
                .into_iter()
                .collect(),
        };

        let Some(attacker_stats) = world.stats(attacker).cloned() else {
            return MeleeOutcome::Committed {
                direction,
                hits: Vec::new(),
            };
        };

        let mut hits = Vec::with_capacity(candidates.len());
        for target in candidates {
            let Some(armor) = world.stats(target).filter(|s| s.is_alive()).map(|s| s.armor) else {
                continue;
            };
            let damage = world.apply_damage(target, attacker_stats.calculate_damage(armor), Some(attacker));
            hits.push(MeleeHit { target, damage });
        }

        debug!(%attacker, hits = hits.len(), "melee attack resolved");
        MeleeOutcome::Committed { direction, hits }
    }
}
