//! Arena: the entity table and simulation tick.
//!
//! This module provides:
//! - Spawning players and the enemy archetypes
//! - The single damage funnel and the one-shot death transition
//! - Deferred task dispatch with owner liveness checks
//! - Delayed target resolution for enemies
//! - Projectile flight and impact
//! - The ordered per-tick update

use ahash::AHashMap;
use glam::Vec2;
use std::fmt;
use tactics_common::{EntityId, TaskId};
use tracing::{debug, info, trace};

use crate::body::{Body, Locomotion};
use crate::boss::BossController;
use crate::collision::{overlap_bodies, sweep_bodies, SpatialQuery, SweepHit};
use crate::combat::{mitigated_damage, CombatError, CombatResult, CombatStats, Reward};
use crate::config::{ArenaConfig, BossConfig, EnemyConfig, PlayerConfig, RangedConfig};
use crate::events::{CombatEvent, EventBus};
use crate::melee_combat::{Aim, MeleeAttackResolver, MeleeOutcome};
use crate::perception::{AiState, AttackStrategy, EnemyBrain, EnemyProfile};
use crate::ranged_combat::{Projectile, ProjectileFactory, ProjectileSpawn, RangedAttackStrategy};
use crate::scheduler::{DeferredTask, DueTask, Scheduler};
use crate::world::CombatWorld;

// ============================================================================
// Combatants
// ============================================================================

/// Who controls a combatant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatantKind {
    /// Player-controlled, attacks through [`Arena::player_attack`]
    Player {
        /// Melee resolver for the player's swings
        melee: MeleeAttackResolver,
    },
    /// AI-controlled, has an [`EnemyBrain`]
    Enemy,
}

/// One entity in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    /// Entity id
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Controller
    pub kind: CombatantKind,
    /// Combat stats
    pub stats: CombatStats,
    /// Locomotion body
    pub body: Body,
    /// Granted to whoever kills it
    pub reward: Reward,
    /// Removal delay after death; `None` keeps the corpse
    pub corpse_lifespan: Option<f32>,
}

impl Combatant {
    /// Whether this is a player.
    #[must_use]
    pub fn is_player(&self) -> bool {
        matches!(self.kind, CombatantKind::Player { .. })
    }
}

// ============================================================================
// Target resolution
// ============================================================================

/// A candidate offered to a [`TargetResolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contender {
    /// Entity id
    pub id: EntityId,
    /// Position
    pub position: Vec2,
    /// Still alive
    pub alive: bool,
    /// Player-controlled
    pub is_player: bool,
}

/// Supplies the opponent an enemy tracks.
pub trait TargetResolver: fmt::Debug + Send {
    /// Picks a target for `seeker` at `position`, or `None` if nothing fits yet.
    fn resolve(&self, seeker: EntityId, position: Vec2, roster: &[Contender]) -> Option<EntityId>;
}

/// Targets the nearest live player.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestPlayer;

impl TargetResolver for NearestPlayer {
    fn resolve(&self, seeker: EntityId, position: Vec2, roster: &[Contender]) -> Option<EntityId> {
        roster
            .iter()
            .filter(|c| c.is_player && c.alive && c.id != seeker)
            .min_by(|a, b| {
                a.position
                    .distance_squared(position)
                    .total_cmp(&b.position.distance_squared(position))
                    .then(a.id.cmp(&b.id))
            })
            .map(|c| c.id)
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Owns every combatant and runs the simulation tick.
#[derive(Debug)]
pub struct Arena {
    config: ArenaConfig,
    combatants: AHashMap<EntityId, Combatant>,
    brains: AHashMap<EntityId, EnemyBrain>,
    projectiles: AHashMap<EntityId, Projectile>,
    scheduler: Scheduler,
    events: EventBus,
    resolver: Box<dyn TargetResolver>,
    tick_count: u64,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            events: EventBus::new(config.event_capacity),
            config,
            combatants: AHashMap::new(),
            brains: AHashMap::new(),
            projectiles: AHashMap::new(),
            scheduler: Scheduler::new(),
            resolver: Box::new(NearestPlayer),
            tick_count: 0,
        }
    }

    /// Replaces the target resolver.
    #[must_use]
    pub fn with_target_resolver(mut self, resolver: Box<dyn TargetResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Arena tunables.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Number of ticks run.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    /// Spawns a player.
    pub fn spawn_player(&mut self, config: &PlayerConfig, position: Vec2) -> EntityId {
        let id = EntityId::new();
        let stats = CombatStats::new()
            .with_health(config.max_health)
            .with_base_damage(config.base_damage)
            .with_armor(config.armor)
            .with_attack_range(config.attack_range)
            .with_attack_cooldown(config.attack_cooldown);
        let mut body = Body::new(position).with_radius(config.radius);
        body.set_desired_speed(config.move_speed);

        self.combatants.insert(
            id,
            Combatant {
                id,
                name: config.name.clone(),
                kind: CombatantKind::Player {
                    melee: MeleeAttackResolver::new(config.hit_detection),
                },
                stats,
                body,
                reward: Reward::default(),
                corpse_lifespan: None,
            },
        );
        debug!(%id, name = %config.name, "player spawned");
        id
    }

    /// Spawns a melee enemy.
    pub fn spawn_enemy(&mut self, config: &EnemyConfig, position: Vec2) -> EntityId {
        let strategy = AttackStrategy::Melee(MeleeAttackResolver::new(config.hit_detection));
        self.spawn_enemy_with(config, strategy, None, position)
    }

    /// Spawns a ranged enemy.
    pub fn spawn_ranged_enemy(&mut self, config: &RangedConfig, position: Vec2) -> EntityId {
        let strategy = AttackStrategy::Ranged(RangedAttackStrategy {
            projectile: config.projectile.clone(),
            projectile_speed: config.projectile_speed,
            spawn_offset: config.spawn_offset,
        });
        self.spawn_enemy_with(&config.base, strategy, None, position)
    }

    /// Spawns a boss.
    pub fn spawn_boss(&mut self, config: &BossConfig, position: Vec2) -> EntityId {
        let strategy = AttackStrategy::Melee(MeleeAttackResolver::new(config.base.hit_detection));
        let boss = BossController::new(config.tuning);
        self.spawn_enemy_with(&config.base, strategy, Some(boss), position)
    }

    fn spawn_enemy_with(
        &mut self,
        config: &EnemyConfig,
        strategy: AttackStrategy,
        boss: Option<BossController>,
        position: Vec2,
    ) -> EntityId {
        let id = EntityId::new();
        let stats = CombatStats::new()
            .with_health(config.max_health)
            .with_base_damage(config.base_damage)
            .with_armor(config.armor)
            .with_attack_range(config.attack_range)
            .with_attack_cooldown(config.attack_interval);
        let mut body = Body::new(position)
            .with_radius(config.radius)
            .with_orient_to_movement(false);
        body.set_desired_speed(config.patrol_speed);

        let profile = EnemyProfile {
            detection_range: config.detection_range,
            attack_range_override: None,
            chase_speed: config.chase_speed,
            patrol_speed: config.patrol_speed,
            speed_scale: 1.0,
            score_value: config.score_value,
            exp_value: config.exp_value,
        };
        let mut brain = EnemyBrain::new(profile, strategy);
        if let Some(boss) = boss {
            brain = brain.with_boss(boss);
        }

        self.combatants.insert(
            id,
            Combatant {
                id,
                name: config.name.clone(),
                kind: CombatantKind::Enemy,
                stats,
                body,
                reward: Reward::new(config.score_value, config.exp_value),
                corpse_lifespan: config.corpse_lifespan,
            },
        );
        self.brains.insert(id, brain);
        self.scheduler
            .schedule(id, self.config.target_resolve_delay, DeferredTask::ResolveTarget);
        debug!(%id, name = %config.name, "enemy spawned");
        id
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Looks up a combatant.
    #[must_use]
    pub fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Every combatant id in spawn order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.combatants.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of combatants (alive or dead) in the world.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Whether the arena has no combatants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Live enemies remaining.
    #[must_use]
    pub fn living_enemies(&self) -> usize {
        self.combatants
            .values()
            .filter(|c| !c.is_player() && c.stats.is_alive())
            .count()
    }

    /// An enemy's brain.
    #[must_use]
    pub fn brain(&self, id: EntityId) -> Option<&EnemyBrain> {
        self.brains.get(&id)
    }

    /// An enemy's boss controller.
    #[must_use]
    pub fn boss(&self, id: EntityId) -> Option<&BossController> {
        self.brains.get(&id)?.boss.as_ref()
    }

    /// An enemy's ranged strategy.
    #[must_use]
    pub fn ranged_strategy(&self, id: EntityId) -> Option<&RangedAttackStrategy> {
        match &self.brains.get(&id)?.strategy {
            AttackStrategy::Ranged(strategy) => Some(strategy),
            AttackStrategy::Melee(_) => None,
        }
    }

    /// AI state an enemy acted on last tick.
    #[must_use]
    pub fn ai_state(&self, id: EntityId) -> Option<AiState> {
        self.brains.get(&id).map(EnemyBrain::state)
    }

    /// A projectile in flight.
    #[must_use]
    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    /// Deferred tasks still waiting.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Takes every pending presentation event.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    /// Event bus for external subscribers.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Points an enemy at `target`, replacing any resolved target.
    pub fn assign_target(&mut self, seeker: EntityId, target: EntityId) -> CombatResult<()> {
        if seeker == target {
            return Err(CombatError::SelfTarget(seeker));
        }
        if !self.combatants.contains_key(&target) {
            return Err(CombatError::EntityNotFound(target));
        }
        if !self.combatants.contains_key(&seeker) {
            return Err(CombatError::EntityNotFound(seeker));
        }
        let brain = self
            .brains
            .get_mut(&seeker)
            .ok_or(CombatError::NotAnEnemy(seeker))?;
        brain.target = Some(target);
        self.events.publish(CombatEvent::TargetAcquired { seeker, target });
        Ok(())
    }

    /// Player swing toward `aim`.
    pub fn player_attack(&mut self, player: EntityId, aim: Aim) -> CombatResult<MeleeOutcome> {
        let combatant = self
            .combatants
            .get(&player)
            .ok_or(CombatError::EntityNotFound(player))?;
        let CombatantKind::Player { melee } = combatant.kind else {
            return Err(CombatError::NotAPlayer(player));
        };
        let range = combatant.stats.attack_range;
        Ok(melee.resolve(self, player, aim, range))
    }

    /// Restores HP. Returns HP restored; zero for the dead or missing.
    pub fn heal(&mut self, target: EntityId, amount: f32) -> f32 {
        let Some(combatant) = self.combatants.get_mut(&target) else {
            return 0.0;
        };
        let healed = combatant.stats.heal(amount);
        if healed > 0.0 {
            self.events.publish(CombatEvent::Healed {
                entity: target,
                amount: healed,
            });
        }
        healed
    }

    /// Removes an entity and cancels its pending tasks.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if self.combatants.remove(&id).is_none() {
            return false;
        }
        self.brains.remove(&id);
        let cancelled = self.scheduler.cancel_owner(id);
        trace!(%id, cancelled, "entity removed");
        self.events.publish(CombatEvent::Despawned { entity: id });
        true
    }

    /// Moves every body by its pending input.
    pub fn integrate_bodies(&mut self, dt: f32) {
        for combatant in self.combatants.values_mut() {
            combatant.body.integrate(dt);
        }
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advances the simulation by `dt` seconds.
    ///
    /// Order: deferred tasks, cooldowns, boss phases, AI, projectiles.
    pub fn tick(&mut self, dt: f32) {
        self.tick_count += 1;

        for due in self.scheduler.advance(dt) {
            self.run_task(due);
        }

        for combatant in self.combatants.values_mut() {
            combatant.stats.tick(dt);
        }
        for brain in self.brains.values_mut() {
            if let Some(boss) = brain.boss.as_mut() {
                boss.tick(dt);
            }
        }

        let mut enemies: Vec<EntityId> = self.brains.keys().copied().collect();
        enemies.sort();

        for &id in &enemies {
            if let Some(mut brain) = self.brains.remove(&id) {
                brain.update_phase(self, id);
                self.brains.insert(id, brain);
            }
        }
        for &id in &enemies {
            if let Some(mut brain) = self.brains.remove(&id) {
                brain.think(self, id, dt);
                if self.combatants.contains_key(&id) {
                    self.brains.insert(id, brain);
                }
            }
        }

        self.update_projectiles(dt);
    }

    fn run_task(&mut self, due: DueTask) {
        let owner = due.owner;
        let Some(combatant) = self.combatants.get_mut(&owner) else {
            trace!(%owner, task = ?due.task, "owner gone, task skipped");
            return;
        };
        match due.task {
            DeferredTask::RestoreOrientation { orient } => {
                if combatant.stats.is_alive() {
                    combatant.body.restore_orientation(orient);
                }
            },
            DeferredTask::EndAttackTrail => {
                self.events.publish(CombatEvent::TrailEnded { entity: owner });
            },
            DeferredTask::RemoveCorpse => {
                if combatant.stats.is_dead() {
                    self.remove(owner);
                }
            },
            DeferredTask::ResolveTarget => {
                if combatant.stats.is_alive() {
                    self.resolve_target(owner);
                }
            },
        }
    }

    fn resolve_target(&mut self, seeker: EntityId) {
        if self.brains.get(&seeker).map_or(true, |b| b.target.is_some()) {
            return;
        }
        let Some(position) = self.combatants.get(&seeker).map(|c| c.body.position) else {
            return;
        };
        let mut roster: Vec<Contender> = self
            .combatants
            .values()
            .map(|c| Contender {
                id: c.id,
                position: c.body.position,
                alive: c.stats.is_alive(),
                is_player: c.is_player(),
            })
            .collect();
        roster.sort_by_key(|c| c.id);

        match self.resolver.resolve(seeker, position, &roster) {
            Some(target) => {
                if let Some(brain) = self.brains.get_mut(&seeker) {
                    brain.target = Some(target);
                }
                info!(%seeker, %target, "target acquired");
                self.events.publish(CombatEvent::TargetAcquired { seeker, target });
            },
            None => {
                trace!(%seeker, "no target yet, retrying");
                self.scheduler
                    .schedule(seeker, self.config.target_resolve_delay, DeferredTask::ResolveTarget);
            },
        }
    }

    fn on_death(&mut self, id: EntityId, killer: Option<EntityId>) {
        let Some(combatant) = self.combatants.get_mut(&id) else {
            return;
        };
        combatant.body.disable();
        let location = combatant.body.position;
        let reward = combatant.reward;
        let lifespan = combatant.corpse_lifespan;
        info!(%id, name = %combatant.name, score = reward.score, exp = reward.exp, "combatant died");

        self.events.publish(CombatEvent::Died {
            entity: id,
            killer,
            location,
            reward,
        });
        if let Some(lifespan) = lifespan {
            self.scheduler.schedule(id, lifespan, DeferredTask::RemoveCorpse);
        }
    }

    fn update_projectiles(&mut self, dt: f32) {
        let mut ids: Vec<EntityId> = self.projectiles.keys().copied().collect();
        ids.sort();

        for id in ids {
            let Some(mut projectile) = self.projectiles.remove(&id) else {
                continue;
            };
            let (start, end) = projectile.update(dt);
            let hit = self
                .sweep_sphere(start, end, projectile.radius, projectile.owner)
                .into_iter()
                .find(|h| self.combatants.get(&h.entity).is_some_and(|c| c.stats.is_alive()));

            if let Some(hit) = hit {
                let armor = self.combatants.get(&hit.entity).map_or(0.0, |c| c.stats.armor);
                let dealt = self.apply_damage(hit.entity, mitigated_damage(projectile.damage, armor), Some(projectile.owner));
                debug!(projectile = %id, target = %hit.entity, dealt, "projectile impact");
                projectile.on_hit();
            }

            if projectile.is_active() {
                self.projectiles.insert(id, projectile);
            } else {
                self.events.publish(CombatEvent::Despawned { entity: id });
            }
        }
    }
}

// ============================================================================
// World interface
// ============================================================================

impl SpatialQuery for Arena {
    fn sweep_sphere(&self, start: Vec2, end: Vec2, radius: f32, ignore: EntityId) -> Vec<SweepHit> {
        sweep_bodies(
            self.combatants.iter().map(|(id, c)| (*id, &c.body)),
            start,
            end,
            radius,
            ignore,
        )
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, ignore: EntityId) -> Vec<EntityId> {
        overlap_bodies(
            self.combatants.iter().map(|(id, c)| (*id, &c.body)),
            center,
            radius,
            ignore,
        )
    }
}

impl ProjectileFactory for Arena {
    fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> Option<EntityId> {
        let id = EntityId::new();
        let projectile = Projectile::new(id, &spawn);
        self.events.publish(CombatEvent::ProjectileSpawned {
            owner: spawn.owner,
            projectile: id,
            location: spawn.location,
            velocity: spawn.velocity,
        });
        self.projectiles.insert(id, projectile);
        Some(id)
    }
}

impl CombatWorld for Arena {
    fn stats(&self, id: EntityId) -> Option<&CombatStats> {
        self.combatants.get(&id).map(|c| &c.stats)
    }

    fn stats_mut(&mut self, id: EntityId) -> Option<&mut CombatStats> {
        self.combatants.get_mut(&id).map(|c| &mut c.stats)
    }

    fn body(&self, id: EntityId) -> Option<&Body> {
        self.combatants.get(&id).map(|c| &c.body)
    }

    fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.combatants.get_mut(&id).map(|c| &mut c.body)
    }

    fn apply_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> f32 {
        let Some(combatant) = self.combatants.get_mut(&target) else {
            trace!(%target, "damage to missing entity ignored");
            return 0.0;
        };
        let applied = combatant.stats.take_damage(amount);
        if applied.amount > 0.0 {
            debug!(%target, damage = applied.amount, health = combatant.stats.health(), "damage applied");
            self.events.publish(CombatEvent::HitLanded {
                attacker: source,
                target,
                damage: applied.amount,
                location: combatant.body.position,
            });
        }
        if applied.killed {
            self.on_death(target, source);
        }
        applied.amount
    }

    fn publish(&self, event: CombatEvent) {
        self.events.publish(event);
    }

    fn schedule(&mut self, owner: EntityId, delay: f32, task: DeferredTask) -> TaskId {
        self.scheduler.schedule(owner, delay, task)
    }

    fn tunables(&self) -> &ArenaConfig {
        &self.config
    }
}
