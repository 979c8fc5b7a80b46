//! Locomotion body.
//!
//! Combat and AI code only decide speed and direction. How those values turn
//! into motion belongs to whoever integrates the body (the engine host).

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tactics_common::{direction_from_yaw, interp_yaw, normalize_direction, yaw_of};

/// Movement primitives exposed to combat and AI logic.
pub trait Locomotion {
    /// Sets the speed the body should move at.
    fn set_desired_speed(&mut self, speed: f32);
    /// Requests movement along `direction` this tick.
    fn add_movement_input(&mut self, direction: Vec2);
    /// Clears pending movement input.
    fn stop_movement(&mut self);
    /// Snaps facing to `direction`.
    fn face_instant(&mut self, direction: Vec2);
    /// Rotates toward `direction` at `rate` (interpolation speed per second).
    fn face_smoothed(&mut self, direction: Vec2, dt: f32, rate: f32);
    /// Unit vector the body is facing.
    fn forward(&self) -> Vec2;
}

/// Kinematic body of a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World position
    pub position: Vec2,
    /// Facing in radians
    pub yaw: f32,
    /// Speed requested by the controller
    pub desired_speed: f32,
    /// Movement requested this tick (not normalized)
    pub move_input: Vec2,
    /// Turn toward the movement direction while moving
    pub orient_to_movement: bool,
    /// Movement accepted
    pub movement_enabled: bool,
    /// Participates in collision queries
    pub collision_enabled: bool,
    /// Collision radius
    pub radius: f32,
    /// Orient-to-movement setting saved while an attack snap holds the facing
    #[serde(default)]
    pub suspended_orient: Option<bool>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            yaw: 0.0,
            desired_speed: 0.0,
            move_input: Vec2::ZERO,
            orient_to_movement: true,
            movement_enabled: true,
            collision_enabled: true,
            radius: 42.0,
            suspended_orient: None,
        }
    }
}

impl Body {
    /// Creates a body at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Sets the collision radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    /// Sets the initial facing.
    #[must_use]
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    /// Sets whether integration turns the body toward its movement.
    #[must_use]
    pub fn with_orient_to_movement(mut self, orient: bool) -> Self {
        self.orient_to_movement = orient;
        self
    }

    /// Holds the current facing against movement. Returns the setting to
    /// restore later; overlapping suspensions all restore the first saved value.
    pub fn suspend_orientation(&mut self) -> bool {
        let saved = *self.suspended_orient.get_or_insert(self.orient_to_movement);
        self.orient_to_movement = false;
        saved
    }

    /// Ends an attack snap, putting back `orient`.
    pub fn restore_orientation(&mut self, orient: bool) {
        self.orient_to_movement = orient;
        self.suspended_orient = None;
    }

    /// Turns off movement and collision. Used by the death transition.
    pub fn disable(&mut self) {
        self.movement_enabled = false;
        self.collision_enabled = false;
        self.move_input = Vec2::ZERO;
        self.desired_speed = 0.0;
    }

    /// Applies pending movement input and clears it.
    ///
    /// Returns the displacement.
    pub fn integrate(&mut self, dt: f32) -> Vec2 {
        let input = std::mem::take(&mut self.move_input);
        if !self.movement_enabled {
            return Vec2::ZERO;
        }
        let Some(dir) = normalize_direction(input) else {
            return Vec2::ZERO;
        };
        let delta = dir * self.desired_speed * dt;
        self.position += delta;
        if self.orient_to_movement {
            self.yaw = yaw_of(dir);
        }
        delta
    }
}

impl Locomotion for Body {
    fn set_desired_speed(&mut self, speed: f32) {
        self.desired_speed = speed.max(0.0);
    }

    fn add_movement_input(&mut self, direction: Vec2) {
        if self.movement_enabled {
            self.move_input += direction;
        }
    }

    fn stop_movement(&mut self) {
        self.move_input = Vec2::ZERO;
    }

    fn face_instant(&mut self, direction: Vec2) {
        if let Some(dir) = normalize_direction(direction) {
            self.yaw = yaw_of(dir);
        }
    }

    fn face_smoothed(&mut self, direction: Vec2, dt: f32, rate: f32) {
        if let Some(dir) = normalize_direction(direction) {
            self.yaw = interp_yaw(self.yaw, yaw_of(dir), dt, rate);
        }
    }

    fn forward(&self) -> Vec2 {
        direction_from_yaw(self.yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_suspensions_restore_first_value() {
        let mut body = Body::new(Vec2::ZERO);
        assert!(body.suspend_orientation());
        assert!(body.suspend_orientation());
        assert!(!body.orient_to_movement);

        body.restore_orientation(true);
        assert!(body.orient_to_movement);
        assert_eq!(body.suspended_orient, None);
    }

    #[test]
    fn test_suspension_keeps_disabled_orientation() {
        let mut body = Body::new(Vec2::ZERO).with_orient_to_movement(false);
        assert!(!body.suspend_orientation());
        body.restore_orientation(false);
        assert!(!body.orient_to_movement);
    }

    #[test]
    fn test_integrate_without_orientation_keeps_yaw() {
        let mut body = Body::new(Vec2::ZERO).with_orient_to_movement(false);
        body.set_desired_speed(100.0);
        body.add_movement_input(Vec2::Y);
        body.integrate(0.1);
        assert_eq!(body.yaw, 0.0);
        assert!((body.position.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_integrate_moves_at_desired_speed() {
        let mut body = Body::new(Vec2::ZERO);
        body.set_desired_speed(400.0);
        body.add_movement_input(Vec2::new(3.0, 0.0));
        let moved = body.integrate(0.5);
        assert!((moved.x - 200.0).abs() < 1e-4);
        assert_eq!(body.move_input, Vec2::ZERO);
    }

    #[test]
    fn test_disabled_body_does_not_move() {
        let mut body = Body::new(Vec2::ONE);
        body.set_desired_speed(100.0);
        body.disable();
        body.add_movement_input(Vec2::X);
        assert_eq!(body.integrate(1.0), Vec2::ZERO);
        assert!(!body.collision_enabled);
    }

    #[test]
    fn test_face_instant_ignores_zero_direction() {
        let mut body = Body::new(Vec2::ZERO).with_yaw(1.0);
        body.face_instant(Vec2::ZERO);
        assert_eq!(body.yaw, 1.0);
        body.face_instant(Vec2::new(-1.0, 0.0));
        assert!(body.forward().distance(Vec2::new(-1.0, 0.0)) < 1e-5);
    }

    #[test]
    fn test_face_smoothed_does_not_snap() {
        let mut body = Body::new(Vec2::ZERO);
        body.face_smoothed(Vec2::Y, 1.0 / 60.0, 10.0);
        assert!(body.yaw > 0.0);
        assert!(body.yaw < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_orient_to_movement_can_be_suspended() {
        let mut body = Body::new(Vec2::ZERO);
        body.orient_to_movement = false;
        body.set_desired_speed(10.0);
        body.add_movement_input(Vec2::Y);
        body.integrate(1.0);
        assert_eq!(body.yaw, 0.0);
    }
}
