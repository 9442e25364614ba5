//! Rigid bodies
//!
//! A body is one of three closed kinds, stored as an enum so every call site
//! matches exhaustively:
//!
//! - [`StaticBody`] - infinite mass, never moves, never sleeps
//! - [`DynamicBody`] - fully simulated, pushed by gravity, forces and impulses
//! - [`KinematicBody`] - moved only by its owner; pushes dynamic bodies but is
//!   never pushed back
//!
//! Integration is semi-implicit Euler: velocity first, then position from
//! the new velocity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::shape::{Aabb, Shape};
use super::types::Vec2;

/// Stable handle to a body inside a world.
///
/// Ids are handed out in increasing order and never reused, so a stale id
/// simply stops resolving once its body is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u32);

impl BodyId {
    /// Placeholder carried by bodies that have not been added to a world.
    pub const UNASSIGNED: BodyId = BodyId(u32::MAX);

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Surface properties used when two bodies touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Bounciness (0.0 = no bounce, 1.0 = fully elastic)
    pub restitution: f32,
    /// Coulomb friction coefficient (>= 0)
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.3, // slight bounce, like stone
            friction: 0.5,
        }
    }
}

impl Material {
    pub fn new(restitution: f32, friction: f32) -> Self {
        Self {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
        }
    }
}

/// Immovable body (floors, walls).
#[derive(Debug, Clone, PartialEq)]
pub struct StaticBody {
    pub shape: Shape,
    pub position: Vec2,
    pub rotation: f32,
    pub material: Material,
}

/// Fully simulated body.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicBody {
    pub shape: Shape,
    pub position: Vec2,
    /// Rotation angle (radians, counter-clockwise)
    pub rotation: f32,
    /// Linear velocity (units/second)
    pub velocity: Vec2,
    /// Accumulated linear acceleration, cleared after each integration
    pub acceleration: Vec2,
    /// Angular velocity (radians/second)
    pub angular_velocity: f32,
    /// Accumulated angular acceleration, cleared after each integration
    pub angular_acceleration: f32,
    /// Mass (> 0)
    pub mass: f32,
    /// Moment of inertia about the centre
    pub inertia: f32,
    pub material: Material,
    pub is_sleeping: bool,
    /// Seconds spent continuously below the sleep velocity threshold
    pub sleep_time: f32,
}

impl DynamicBody {
    /// Semi-implicit Euler step. Sleeping bodies do not move.
    pub fn update(&mut self, dt: f32) {
        if self.is_sleeping {
            self.acceleration = Vec2::ZERO;
            self.angular_acceleration = 0.0;
            return;
        }
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.acceleration = Vec2::ZERO;

        self.angular_velocity += self.angular_acceleration * dt;
        self.rotation += self.angular_velocity * dt;
        self.angular_acceleration = 0.0;
    }

    pub fn wake_up(&mut self) {
        self.is_sleeping = false;
        self.sleep_time = 0.0;
    }

    /// Wake only if asleep, leaving the timer of an awake body alone.
    pub fn wake_if_sleeping(&mut self) {
        if self.is_sleeping {
            self.wake_up();
        }
    }

    /// Add a uniform acceleration such as gravity. Sleeping bodies ignore it
    /// and stay asleep.
    pub fn accelerate(&mut self, acceleration: Vec2) {
        if !self.is_sleeping {
            self.acceleration += acceleration;
        }
    }

    pub fn put_to_sleep(&mut self) {
        self.is_sleeping = true;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.acceleration = Vec2::ZERO;
        self.angular_acceleration = 0.0;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Advance the sleep timer by `dt`. Returns `true` when the body fell
    /// asleep during this call.
    pub fn update_sleep(&mut self, dt: f32, velocity_threshold: f32, time_threshold: f32) -> bool {
        if self.is_sleeping {
            return false;
        }
        if self.speed() < velocity_threshold {
            self.sleep_time += dt;
            if self.sleep_time >= time_threshold {
                self.put_to_sleep();
                return true;
            }
        } else {
            self.sleep_time = 0.0;
        }
        false
    }

    pub fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }

    pub fn inverse_inertia(&self) -> f32 {
        if self.inertia > 0.0 { 1.0 / self.inertia } else { 0.0 }
    }
}

/// Body moved directly by its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBody {
    pub shape: Shape,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub material: Material,
}

/// The three body kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyKind {
    Static(StaticBody),
    Dynamic(DynamicBody),
    Kinematic(KinematicBody),
}

/// A rigid body: identity plus its kind-specific state.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    id: BodyId,
    pub kind: BodyKind,
}

impl Body {
    /// Create a static body.
    pub fn new_static(shape: Shape, position: Vec2) -> Self {
        Self {
            id: BodyId::UNASSIGNED,
            kind: BodyKind::Static(StaticBody {
                shape,
                position,
                rotation: 0.0,
                material: Material::default(),
            }),
        }
    }

    /// Create a dynamic body. Inertia is derived from the shape.
    ///
    /// `mass` must be positive; [`crate::world::PhysicsWorld::add_body`]
    /// rejects bodies that break this.
    pub fn new_dynamic(shape: Shape, position: Vec2, mass: f32) -> Self {
        Self {
            id: BodyId::UNASSIGNED,
            kind: BodyKind::Dynamic(DynamicBody {
                shape,
                position,
                rotation: 0.0,
                velocity: Vec2::ZERO,
                acceleration: Vec2::ZERO,
                angular_velocity: 0.0,
                angular_acceleration: 0.0,
                mass,
                inertia: shape.moment_of_inertia(mass),
                material: Material::default(),
                is_sleeping: false,
                sleep_time: 0.0,
            }),
        }
    }

    /// Create a kinematic body.
    pub fn new_kinematic(shape: Shape, position: Vec2) -> Self {
        Self {
            id: BodyId::UNASSIGNED,
            kind: BodyKind::Kinematic(KinematicBody {
                shape,
                position,
                rotation: 0.0,
                velocity: Vec2::ZERO,
                angular_velocity: 0.0,
                material: Material::default(),
            }),
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.set_rotation(rotation);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.set_velocity(velocity);
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.set_angular_velocity(angular_velocity);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        *self.material_mut() = material;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.material_mut().restitution = restitution.clamp(0.0, 1.0);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.material_mut().friction = friction.max(0.0);
        self
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: BodyId) {
        self.id = id;
    }

    // === Kind queries ===

    pub fn is_static(&self) -> bool {
        matches!(self.kind, BodyKind::Static(_))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, BodyKind::Dynamic(_))
    }

    pub fn is_kinematic(&self) -> bool {
        matches!(self.kind, BodyKind::Kinematic(_))
    }

    /// Dynamic and not sleeping.
    pub fn is_awake_dynamic(&self) -> bool {
        matches!(&self.kind, BodyKind::Dynamic(d) if !d.is_sleeping)
    }

    pub fn is_sleeping(&self) -> bool {
        match &self.kind {
            BodyKind::Dynamic(d) => d.is_sleeping,
            BodyKind::Static(_) | BodyKind::Kinematic(_) => false,
        }
    }

    pub fn as_dynamic(&self) -> Option<&DynamicBody> {
        match &self.kind {
            BodyKind::Dynamic(d) => Some(d),
            BodyKind::Static(_) | BodyKind::Kinematic(_) => None,
        }
    }

    pub fn as_dynamic_mut(&mut self) -> Option<&mut DynamicBody> {
        match &mut self.kind {
            BodyKind::Dynamic(d) => Some(d),
            BodyKind::Static(_) | BodyKind::Kinematic(_) => None,
        }
    }

    // === Accessors ===

    pub fn shape(&self) -> Shape {
        match &self.kind {
            BodyKind::Static(s) => s.shape,
            BodyKind::Dynamic(d) => d.shape,
            BodyKind::Kinematic(k) => k.shape,
        }
    }

    pub fn position(&self) -> Vec2 {
        match &self.kind {
            BodyKind::Static(s) => s.position,
            BodyKind::Dynamic(d) => d.position,
            BodyKind::Kinematic(k) => k.position,
        }
    }

    pub fn rotation(&self) -> f32 {
        match &self.kind {
            BodyKind::Static(s) => s.rotation,
            BodyKind::Dynamic(d) => d.rotation,
            BodyKind::Kinematic(k) => k.rotation,
        }
    }

    /// Linear velocity; always zero for static bodies.
    pub fn velocity(&self) -> Vec2 {
        match &self.kind {
            BodyKind::Static(_) => Vec2::ZERO,
            BodyKind::Dynamic(d) => d.velocity,
            BodyKind::Kinematic(k) => k.velocity,
        }
    }

    pub fn angular_velocity(&self) -> f32 {
        match &self.kind {
            BodyKind::Static(_) => 0.0,
            BodyKind::Dynamic(d) => d.angular_velocity,
            BodyKind::Kinematic(k) => k.angular_velocity,
        }
    }

    pub fn material(&self) -> Material {
        match &self.kind {
            BodyKind::Static(s) => s.material,
            BodyKind::Dynamic(d) => d.material,
            BodyKind::Kinematic(k) => k.material,
        }
    }

    fn material_mut(&mut self) -> &mut Material {
        match &mut self.kind {
            BodyKind::Static(s) => &mut s.material,
            BodyKind::Dynamic(d) => &mut d.material,
            BodyKind::Kinematic(k) => &mut k.material,
        }
    }

    /// Mass; infinite for static and kinematic bodies.
    pub fn mass(&self) -> f32 {
        match &self.kind {
            BodyKind::Dynamic(d) => d.mass,
            BodyKind::Static(_) | BodyKind::Kinematic(_) => f32::INFINITY,
        }
    }

    /// `1 / mass` for dynamic bodies, `0` for static and kinematic.
    pub fn inverse_mass(&self) -> f32 {
        match &self.kind {
            BodyKind::Dynamic(d) => d.inverse_mass(),
            BodyKind::Static(_) | BodyKind::Kinematic(_) => 0.0,
        }
    }

    pub fn inverse_inertia(&self) -> f32 {
        match &self.kind {
            BodyKind::Dynamic(d) => d.inverse_inertia(),
            BodyKind::Static(_) | BodyKind::Kinematic(_) => 0.0,
        }
    }

    pub fn aabb(&self) -> Aabb {
        self.shape().aabb(self.position(), self.rotation())
    }

    /// World-space rectangle corners, `None` for circles.
    pub fn vertices(&self) -> Option<[Vec2; 4]> {
        self.shape().vertices(self.position(), self.rotation())
    }

    // === Mutation ===

    /// Teleport the body. Wakes a sleeping dynamic body.
    pub fn set_position(&mut self, position: Vec2) {
        match &mut self.kind {
            BodyKind::Static(s) => s.position = position,
            BodyKind::Dynamic(d) => {
                d.position = position;
                d.wake_up();
            }
            BodyKind::Kinematic(k) => k.position = position,
        }
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        match &mut self.kind {
            BodyKind::Static(s) => s.rotation = rotation,
            BodyKind::Dynamic(d) => d.rotation = rotation,
            BodyKind::Kinematic(k) => k.rotation = rotation,
        }
    }

    /// Set linear velocity. No-op on static bodies.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        match &mut self.kind {
            BodyKind::Static(_) => {}
            BodyKind::Dynamic(d) => {
                d.velocity = velocity;
                if velocity != Vec2::ZERO {
                    d.wake_up();
                }
            }
            BodyKind::Kinematic(k) => k.velocity = velocity,
        }
    }

    /// Set angular velocity. No-op on static bodies.
    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        match &mut self.kind {
            BodyKind::Static(_) => {}
            BodyKind::Dynamic(d) => {
                d.angular_velocity = angular_velocity;
                if angular_velocity != 0.0 {
                    d.wake_up();
                }
            }
            BodyKind::Kinematic(k) => k.angular_velocity = angular_velocity,
        }
    }

    /// Accumulate a force for the next integration. Dynamic only; wakes the
    /// body if it was sleeping. An awake body keeps its sleep timer.
    pub fn apply_force(&mut self, force: Vec2) {
        match &mut self.kind {
            BodyKind::Dynamic(d) => {
                d.wake_if_sleeping();
                d.acceleration += force * d.inverse_mass();
            }
            BodyKind::Static(_) | BodyKind::Kinematic(_) => {}
        }
    }

    /// Accumulate a torque for the next integration. Dynamic only.
    pub fn apply_torque(&mut self, torque: f32) {
        match &mut self.kind {
            BodyKind::Dynamic(d) => {
                d.wake_if_sleeping();
                d.angular_acceleration += torque * d.inverse_inertia();
            }
            BodyKind::Static(_) | BodyKind::Kinematic(_) => {}
        }
    }

    /// Instant velocity change at the centre of mass. Dynamic only.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        match &mut self.kind {
            BodyKind::Dynamic(d) => {
                d.wake_if_sleeping();
                d.velocity += impulse * d.inverse_mass();
            }
            BodyKind::Static(_) | BodyKind::Kinematic(_) => {}
        }
    }

    /// Integrate one step. Only awake dynamic bodies move; static and
    /// kinematic bodies are left untouched.
    pub fn update(&mut self, dt: f32) {
        match &mut self.kind {
            BodyKind::Dynamic(d) => d.update(dt),
            BodyKind::Static(_) | BodyKind::Kinematic(_) => {}
        }
    }

    /// Move a kinematic body along its own velocity. The world never calls
    /// this; kinematic motion is driven by the owner.
    pub fn integrate_kinematic(&mut self, dt: f32) {
        match &mut self.kind {
            BodyKind::Kinematic(k) => {
                k.position += k.velocity * dt;
                k.rotation += k.angular_velocity * dt;
            }
            BodyKind::Static(_) | BodyKind::Dynamic(_) => {}
        }
    }

    pub fn wake_up(&mut self) {
        if let Some(d) = self.as_dynamic_mut() {
            d.wake_up();
        }
    }

    pub fn put_to_sleep(&mut self) {
        if let Some(d) = self.as_dynamic_mut() {
            d.put_to_sleep();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ball() -> Body {
        Body::new_dynamic(Shape::circle(1.0), Vec2::ZERO, 2.0)
    }

    #[test]
    fn test_semi_implicit_euler() {
        let mut body = ball();
        body.apply_force(Vec2::new(4.0, 0.0)); // a = 2
        body.update(0.5);
        // velocity first, then position from the new velocity
        assert_abs_diff_eq!(body.velocity().x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(body.position().x, 0.5, epsilon = 1e-6);
        // acceleration cleared after the step
        body.update(0.5);
        assert_abs_diff_eq!(body.velocity().x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(body.position().x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_static_body_ignores_forces() {
        let mut body = Body::new_static(Shape::rectangle(10.0, 1.0), Vec2::new(3.0, 4.0));
        body.apply_force(Vec2::new(100.0, 100.0));
        body.apply_impulse(Vec2::new(100.0, 100.0));
        body.set_velocity(Vec2::new(5.0, 5.0));
        body.update(1.0);
        assert_eq!(body.position(), Vec2::new(3.0, 4.0));
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(body.inverse_mass(), 0.0);
    }

    #[test]
    fn test_kinematic_body_not_integrated_by_update() {
        let mut body = Body::new_kinematic(Shape::rectangle(4.0, 1.0), Vec2::ZERO)
            .with_velocity(Vec2::new(2.0, 0.0));
        body.apply_force(Vec2::new(0.0, 50.0));
        body.update(1.0);
        assert_eq!(body.position(), Vec2::ZERO);
        assert_eq!(body.velocity(), Vec2::new(2.0, 0.0));

        body.integrate_kinematic(0.5);
        assert_eq!(body.position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_sleep_zeroes_velocity_and_wake_clears_flag() {
        let mut body = ball().with_velocity(Vec2::new(0.5, 0.0)).with_angular_velocity(1.0);
        body.put_to_sleep();
        assert!(body.is_sleeping());
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(body.angular_velocity(), 0.0);

        body.update(1.0);
        assert_eq!(body.position(), Vec2::ZERO);

        body.wake_up();
        assert!(!body.is_sleeping());
        assert_eq!(body.as_dynamic().unwrap().sleep_time, 0.0);
    }

    #[test]
    fn test_apply_force_wakes_sleeping_body() {
        let mut body = ball();
        body.put_to_sleep();
        body.apply_force(Vec2::new(0.0, 1.0));
        assert!(!body.is_sleeping());
    }

    #[test]
    fn test_forces_keep_sleep_timer_of_awake_body() {
        let mut body = ball();
        body.as_dynamic_mut().unwrap().sleep_time = 0.3;
        body.apply_force(Vec2::new(0.0, 1.0));
        body.apply_torque(1.0);
        body.apply_impulse(Vec2::new(0.1, 0.0));
        assert_abs_diff_eq!(body.as_dynamic().unwrap().sleep_time, 0.3);
    }

    #[test]
    fn test_gravity_does_not_wake_or_move_sleeper() {
        let mut body = ball();
        body.put_to_sleep();
        let d = body.as_dynamic_mut().unwrap();
        d.accelerate(Vec2::new(0.0, 981.0));
        assert!(d.is_sleeping);
        assert_eq!(d.acceleration, Vec2::ZERO);

        d.wake_up();
        d.accelerate(Vec2::new(0.0, 981.0));
        d.update(0.5);
        assert_abs_diff_eq!(d.velocity.y, 490.5, epsilon = 1e-3);
    }

    #[test]
    fn test_sleep_timer_resets_on_fast_motion() {
        let mut body = ball().with_velocity(Vec2::new(1.0, 0.0));
        let d = body.as_dynamic_mut().unwrap();
        assert!(!d.update_sleep(0.3, 5.0, 0.5));
        assert_abs_diff_eq!(d.sleep_time, 0.3, epsilon = 1e-6);

        d.velocity = Vec2::new(10.0, 0.0);
        assert!(!d.update_sleep(0.3, 5.0, 0.5));
        assert_eq!(d.sleep_time, 0.0);

        d.velocity = Vec2::new(1.0, 0.0);
        assert!(!d.update_sleep(0.3, 5.0, 0.5));
        assert!(d.update_sleep(0.3, 5.0, 0.5));
        assert!(d.is_sleeping);
    }

    #[test]
    fn test_material_builders_clamp() {
        let body = ball().with_restitution(1.7).with_friction(-1.0);
        assert_eq!(body.material().restitution, 1.0);
        assert_eq!(body.material().friction, 0.0);
    }

    #[test]
    fn test_body_id_display() {
        assert_eq!(format!("{}", BodyId::new(7)), "#7");
        assert_eq!(ball().id(), BodyId::UNASSIGNED);
    }
}
