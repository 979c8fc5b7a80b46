//! The world seen by attack resolvers and AI.
//!
//! Resolvers and brains are written against [`CombatWorld`] so they only
//! touch other entities through lookups by id and the damage funnel.

use glam::Vec2;
use tactics_common::{EntityId, TaskId};

use crate::body::Body;
use crate::collision::SpatialQuery;
use crate::combat::CombatStats;
use crate::config::ArenaConfig;
use crate::events::CombatEvent;
use crate::ranged_combat::ProjectileFactory;
use crate::scheduler::DeferredTask;

/// Entity lookup, damage funnel and side-effect sinks.
pub trait CombatWorld: SpatialQuery + ProjectileFactory {
    /// Gets an entity's combat stats.
    fn stats(&self, id: EntityId) -> Option<&CombatStats>;
    /// Gets mutable combat stats.
    fn stats_mut(&mut self, id: EntityId) -> Option<&mut CombatStats>;
    /// Gets an entity's body.
    fn body(&self, id: EntityId) -> Option<&Body>;
    /// Gets a mutable body.
    fn body_mut(&mut self, id: EntityId) -> Option<&mut Body>;

    /// Removes up to `amount` HP from `target`. Returns HP actually removed.
    ///
    /// This is the only path through which HP decreases.
    fn apply_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> f32;

    /// Publishes a presentation event.
    fn publish(&self, event: CombatEvent);

    /// Schedules deferred work owned by `owner`.
    fn schedule(&mut self, owner: EntityId, delay: f32, task: DeferredTask) -> TaskId;

    /// Shared tunables.
    fn tunables(&self) -> &ArenaConfig;

    /// Position of a live entity.
    fn live_position(&self, id: EntityId) -> Option<Vec2> {
        let stats = self.stats(id)?;
        if stats.is_dead() {
            return None;
        }
        self.body(id).map(|b| b.position)
    }
}
