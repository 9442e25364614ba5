//! Collision response - impulses, friction and positional correction
//!
//! Consumes contact manifolds and mutates body velocities and positions.
//! Only awake dynamic bodies are ever changed: static bodies, kinematic
//! bodies and sleeping bodies act as infinite mass. Kinematic bodies still
//! contribute their velocity, so a moving platform carries what stands on it.
//!
//! Impulse along the normal:
//!
//! ```text
//! j = -(1 + e) * (v_rel · n) / (1/m1 + 1/m2)
//! ```
//!
//! Friction is clamped to the Coulomb cone `|jt| <= μ * j`. Pair
//! coefficients (`e`, `μ`) are the geometric mean of the two materials.

use super::body::Body;
use super::narrow_phase::ContactManifold;
use super::types::{EPSILON, Vec2, mix_coefficients};

/// Tunables for the response pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseParams {
    /// Closing speeds below this bounce with zero restitution
    pub restitution_clamp_threshold: f32,
    /// Fraction of the penetration removed per correction pass
    pub correction_factor: f32,
    /// Penetration tolerated without correction
    pub penetration_slop: f32,
}

impl Default for ResponseParams {
    fn default() -> Self {
        Self {
            restitution_clamp_threshold: 40.0,
            correction_factor: 0.8,
            penetration_slop: 0.0,
        }
    }
}

/// Impulse magnitudes applied for one contact.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactImpulse {
    /// Normal impulse (>= 0)
    pub normal: f32,
    /// Signed friction impulse along the contact tangent
    pub tangent: f32,
}

/// Inverse mass as seen by the solver: zero for anything that may not move
/// this step.
#[inline]
pub fn solver_inverse_mass(body: &Body) -> f32 {
    if body.is_awake_dynamic() { body.inverse_mass() } else { 0.0 }
}

#[inline]
fn push_velocity(body: &mut Body, delta: Vec2) {
    if let Some(d) = body.as_dynamic_mut() {
        if !d.is_sleeping {
            d.velocity += delta;
        }
    }
}

#[inline]
fn push_position(body: &mut Body, delta: Vec2) {
    if let Some(d) = body.as_dynamic_mut() {
        if !d.is_sleeping {
            d.position += delta;
        }
    }
}

/// Apply the normal impulse and friction for one contact.
///
/// Returns `None` when nothing was applied: neither body can move, or the
/// bodies are already separating along the normal.
pub fn resolve_collision(
    body1: &mut Body,
    body2: &mut Body,
    manifold: &ContactManifold,
    params: &ResponseParams,
) -> Option<ContactImpulse> {
    let inv_mass1 = solver_inverse_mass(body1);
    let inv_mass2 = solver_inverse_mass(body2);
    let inv_mass_sum = inv_mass1 + inv_mass2;
    if inv_mass_sum <= 0.0 {
        return None;
    }

    let normal = manifold.normal;
    let relative = body2.velocity() - body1.velocity();
    let vel_along_normal = relative.dot(normal);
    if vel_along_normal > 0.0 {
        return None;
    }

    let mat1 = body1.material();
    let mat2 = body2.material();

    let restitution = if -vel_along_normal < params.restitution_clamp_threshold {
        0.0
    } else {
        mix_coefficients(mat1.restitution, mat2.restitution)
    };

    let j = -(1.0 + restitution) * vel_along_normal / inv_mass_sum;
    let impulse = normal * j;
    push_velocity(body1, -impulse * inv_mass1);
    push_velocity(body2, impulse * inv_mass2);

    let tangent_impulse = apply_friction(body1, body2, normal, j, inv_mass1, inv_mass2);

    Some(ContactImpulse {
        normal: j,
        tangent: tangent_impulse,
    })
}

/// Coulomb friction along the tangential relative velocity. Returns the
/// signed impulse applied along the tangent direction.
fn apply_friction(
    body1: &mut Body,
    body2: &mut Body,
    normal: Vec2,
    normal_impulse: f32,
    inv_mass1: f32,
    inv_mass2: f32,
) -> f32 {
    let inv_mass_sum = inv_mass1 + inv_mass2;
    let relative = body2.velocity() - body1.velocity();
    let tangential = relative - normal * relative.dot(normal);
    let speed = tangential.length();
    if speed <= EPSILON || inv_mass_sum <= 0.0 {
        return 0.0;
    }
    let tangent = tangential / speed;

    let mu = mix_coefficients(body1.material().friction, body2.material().friction);
    let max_friction = mu * normal_impulse;
    let jt = (-relative.dot(tangent) / inv_mass_sum).clamp(-max_friction, max_friction);

    let impulse = tangent * jt;
    push_velocity(body1, -impulse * inv_mass1);
    push_velocity(body2, impulse * inv_mass2);
    jt
}

/// Push overlapping bodies apart along the normal, split by inverse mass.
///
/// Only positions change; no velocity is derived from the correction.
pub fn correct_positions(body1: &mut Body, body2: &mut Body, manifold: &ContactManifold, params: &ResponseParams) {
    let inv_mass1 = solver_inverse_mass(body1);
    let inv_mass2 = solver_inverse_mass(body2);
    let inv_mass_sum = inv_mass1 + inv_mass2;
    if inv_mass_sum <= 0.0 {
        return;
    }

    let depth = (manifold.penetration - params.penetration_slop).max(0.0);
    if depth <= 0.0 {
        return;
    }

    let correction = manifold.normal * (depth / inv_mass_sum * params.correction_factor);
    push_position(body1, -correction * inv_mass1);
    push_position(body2, correction * inv_mass2);
}
