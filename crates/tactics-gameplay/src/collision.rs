//! Spatial queries for hit detection.
//!
//! This module provides:
//! - Swept-sphere queries against combatant bodies
//! - Circle overlap queries for area attacks
//! - A mock implementation for testing

use glam::Vec2;
use tactics_common::{distance_to_segment, segment_param, EntityId};

use crate::body::Body;

/// One entity touched by a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Entity that was hit
    pub entity: EntityId,
    /// Entity position at query time
    pub location: Vec2,
    /// Fraction along the sweep where the hit is closest (0 = start)
    pub time: f32,
}

/// Trait for spatial queries (allows mocking in tests).
pub trait SpatialQuery {
    /// Sweeps a sphere of `radius` from `start` to `end`.
    ///
    /// Returns every collision-enabled body overlapping the swept volume,
    /// except `ignore`, ordered by distance along the sweep.
    fn sweep_sphere(&self, start: Vec2, end: Vec2, radius: f32, ignore: EntityId) -> Vec<SweepHit>;

    /// Returns every collision-enabled body overlapping a circle, except `ignore`.
    fn overlap_circle(&self, center: Vec2, radius: f32, ignore: EntityId) -> Vec<EntityId>;
}

/// Runs a swept-sphere query over `(id, body)` pairs.
pub fn sweep_bodies<'a, I>(bodies: I, start: Vec2, end: Vec2, radius: f32, ignore: EntityId) -> Vec<SweepHit>
where
    I: IntoIterator<Item = (EntityId, &'a Body)>,
{
    let mut hits: Vec<SweepHit> = bodies
        .into_iter()
        .filter(|(id, body)| *id != ignore && body.collision_enabled)
        .filter(|(_, body)| distance_to_segment(body.position, start, end) <= body.radius + radius)
        .map(|(entity, body)| SweepHit {
            entity,
            location: body.position,
            time: segment_param(body.position, start, end),
        })
        .collect();
    hits.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.entity.cmp(&b.entity)));
    hits
}

/// Runs a circle overlap query over `(id, body)` pairs.
pub fn overlap_bodies<'a, I>(bodies: I, center: Vec2, radius: f32, ignore: EntityId) -> Vec<EntityId>
where
    I: IntoIterator<Item = (EntityId, &'a Body)>,
{
    let mut ids: Vec<EntityId> = bodies
        .into_iter()
        .filter(|(id, body)| *id != ignore && body.collision_enabled)
        .filter(|(_, body)| body.position.distance(center) <= body.radius + radius)
        .map(|(id, _)| id)
        .collect();
    ids.sort();
    ids
}

/// Mock spatial index for testing.
#[derive(Debug, Default)]
pub struct MockSpatial {
    bodies: Vec<(EntityId, Body)>,
}

impl MockSpatial {
    /// Creates an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body.
    pub fn insert(&mut self, id: EntityId, body: Body) {
        self.bodies.push((id, body));
    }
}

impl SpatialQuery for MockSpatial {
    fn sweep_sphere(&self, start: Vec2, end: Vec2, radius: f32, ignore: EntityId) -> Vec<SweepHit> {
        sweep_bodies(self.bodies.iter().map(|(id, b)| (*id, b)), start, end, radius, ignore)
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, ignore: EntityId) -> Vec<EntityId> {
        overlap_bodies(self.bodies.iter().map(|(id, b)| (*id, b)), center, radius, ignore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> EntityId {
        EntityId::from_raw(raw)
    }

    fn spatial() -> MockSpatial {
        let mut spatial = MockSpatial::new();
        spatial.insert(id(1), Body::new(Vec2::ZERO).with_radius(40.0));
        spatial.insert(id(2), Body::new(Vec2::new(150.0, 30.0)).with_radius(40.0));
        spatial.insert(id(3), Body::new(Vec2::new(100.0, -20.0)).with_radius(40.0));
        spatial.insert(id(4), Body::new(Vec2::new(0.0, 400.0)).with_radius(40.0));
        spatial
    }

    #[test]
    fn test_sweep_excludes_self_and_orders_hits() {
        let hits = spatial().sweep_sphere(Vec2::ZERO, Vec2::new(200.0, 0.0), 50.0, id(1));
        let ids: Vec<_> = hits.iter().map(|h| h.entity).collect();
        assert_eq!(ids, vec![id(3), id(2)]);
    }

    #[test]
    fn test_sweep_skips_disabled_collision() {
        let mut spatial = spatial();
        spatial.bodies[2].1.collision_enabled = false;
        let hits = spatial.sweep_sphere(Vec2::ZERO, Vec2::new(200.0, 0.0), 50.0, id(1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, id(2));
    }

    #[test]
    fn test_overlap_circle_touching_edge() {
        let ids = spatial().overlap_circle(Vec2::new(0.0, 300.0), 60.0, EntityId::NULL);
        assert_eq!(ids, vec![id(4)]);
    }
}
