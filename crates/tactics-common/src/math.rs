//! Planar math helpers.
//!
//! The simulation runs on the ground plane. Positions and directions are
//! `glam::Vec2`, yaw is in radians measured from +X toward +Y.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Squared length below which a direction is treated as degenerate.
pub const DEGENERATE_LENGTH_SQ: f32 = 1.0e-8;

/// Unit vector from `from` toward `to`, or `None` when the points coincide.
#[must_use]
pub fn planar_direction(from: Vec2, to: Vec2) -> Option<Vec2> {
    normalize_direction(to - from)
}

/// Normalizes `v`, or `None` when it is too short to carry a direction.
#[must_use]
pub fn normalize_direction(v: Vec2) -> Option<Vec2> {
    if v.length_squared() <= DEGENERATE_LENGTH_SQ {
        None
    } else {
        Some(v.normalize())
    }
}

/// Yaw (radians) of a direction vector.
#[must_use]
pub fn yaw_of(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}

/// Unit forward vector for a yaw.
#[must_use]
pub fn direction_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(yaw.cos(), yaw.sin())
}

/// Wraps an angle into `(-PI, PI]`.
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Moves `current` toward `target` along the shortest arc.
///
/// Covers `dt * speed` of the remaining arc each call, clamped to `[0, 1]`,
/// so the rotation eases in rather than snapping. A non-positive `speed`
/// snaps straight to `target`.
#[must_use]
pub fn interp_yaw(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return normalize_angle(target);
    }
    let delta = normalize_angle(target - current);
    if delta.abs() < 1.0e-6 {
        return normalize_angle(target);
    }
    let alpha = (dt * speed).clamp(0.0, 1.0);
    normalize_angle(current + delta * alpha)
}

/// Parameter `t` in `[0, 1]` of the point on segment `a..b` closest to `p`.
#[must_use]
pub fn segment_param(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= DEGENERATE_LENGTH_SQ {
        return 0.0;
    }
    ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
}

/// Distance from `p` to the segment `a..b`.
#[must_use]
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let t = segment_param(p, a, b);
    p.distance(a + (b - a) * t)
}

/// Rotates a local-frame offset (+X forward, +Y left) into world space.
#[must_use]
pub fn local_to_world(offset: Vec2, forward: Vec2) -> Vec2 {
    forward * offset.x + forward.perp() * offset.y
}
