//! World Stepper - fixed-timestep simulation loop
//!
//! [`PhysicsWorld`] owns every body and advances them in fixed sub-steps of
//! `physics_time_step`, independent of the render frame rate:
//!
//! ```text
//! update(frame_dt)
//!   accumulated += min(frame_dt, max_delta_time)
//!   while accumulated >= step:
//!     gravity + integrate     (velocity_iterations passes of step / n)
//!     broad phase             -> candidate pairs
//!     narrow phase + response -> velocities (once)
//!     positional correction   (position_iterations passes)
//!     sleep bookkeeping
//! ```
//!
//! Bodies are integrated in storage order and pairs are resolved in the
//! order the broad phase emits them, so identical inputs always produce
//! identical results.

use glam::Vec2;
use tracing::{debug, info, trace, warn};

use super::config::PhysicsConfig;
use super::storage::{BodyStorage, pair_mut};
use crate::physics::body::{Body, BodyId};
use crate::physics::broad_phase::{BroadPhase, BroadPhaseMode, CollisionPair, create_broad_phase};
use crate::physics::error::{PhysicsError, PhysicsResult};
use crate::physics::narrow_phase::{ContactManifold, collide};
use crate::physics::response::{ResponseParams, correct_positions, resolve_collision};
use crate::physics::shape::{Aabb, Shape};
use crate::render::debug_draw::{DebugRenderer, ShapeInstance, draw_bodies};

/// Counters from the most recent `update` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Fixed sub-steps run
    pub substeps: u32,
    /// Candidate pairs handed to the narrow phase (summed over sub-steps)
    pub candidate_pairs: usize,
    /// Pairs that actually overlapped
    pub contacts: usize,
    /// Contacts that received a normal impulse
    pub impulses: usize,
    /// Sleeping bodies woken by contacts
    pub woken: usize,
    /// Bodies that fell asleep
    pub fell_asleep: usize,
    /// Bodies asleep after the last sub-step
    pub sleeping: usize,
}

/// 2D rigid-body world.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: BodyStorage,
    broad_phase: Box<dyn BroadPhase>,
    /// Mode and cell size `broad_phase` was built with
    broad_phase_setup: (BroadPhaseMode, f32),
    pairs: Vec<CollisionPair>,
    contacts: Vec<ContactManifold>,
    accumulated_time: f32,
    step_count: u64,
    stats: StepStats,
}

impl PhysicsWorld {
    /// Create an empty world. Fails if `config` does not validate.
    pub fn new(config: PhysicsConfig) -> PhysicsResult<Self> {
        config.validate()?;
        info!(
            step = config.physics_time_step,
            broad_phase = ?config.broad_phase,
            cell_size = config.cell_size,
            "physics world created"
        );
        Ok(Self {
            broad_phase: create_broad_phase(config.broad_phase, config.cell_size),
            broad_phase_setup: (config.broad_phase, config.cell_size),
            config,
            bodies: BodyStorage::new(),
            pairs: Vec::new(),
            contacts: Vec::new(),
            accumulated_time: 0.0,
            step_count: 0,
            stats: StepStats::default(),
        })
    }

    // === Configuration ===

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Mutable config. Broad-phase changes take effect on the next step.
    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    /// Replace the whole config after validating it.
    pub fn set_config(&mut self, config: PhysicsConfig) -> PhysicsResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    // === Bodies ===

    /// Add a body and return its id.
    ///
    /// Dynamic bodies need a finite positive mass; every body needs a finite
    /// pose and non-negative shape dimensions.
    pub fn add_body(&mut self, body: Body) -> PhysicsResult<BodyId> {
        validate_body(&body)?;
        let id = self.bodies.insert(body)?;
        debug!(%id, count = self.bodies.len(), "body added");
        Ok(id)
    }

    pub fn get_body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn get_body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains(id)
    }

    /// Remove a body. Sleeping bodies whose bounds touched it are woken so
    /// nothing is left floating on a support that no longer exists.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let removed = self.bodies.remove(id)?;
        let area = removed.aabb().expanded(self.config.cell_size * 0.05);
        for body in self.bodies.iter_mut() {
            if body.is_sleeping() && body.aabb().overlaps(&area) {
                body.wake_up();
            }
        }
        debug!(%id, count = self.bodies.len(), "body removed");
        Some(removed)
    }

    /// Remove every body and reset the time accumulator.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.broad_phase.clear();
        self.pairs.clear();
        self.contacts.clear();
        self.accumulated_time = 0.0;
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Bodies in storage order.
    pub fn bodies(&self) -> &[Body] {
        self.bodies.as_slice()
    }

    /// Bounds of every body, merged. `None` for an empty world.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bodies.iter().map(Body::aabb).reduce(|acc, b| acc.merged(&b))
    }

    pub fn sleeping_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_sleeping()).count()
    }

    pub fn position(&self, id: BodyId) -> Option<Vec2> {
        self.get_body(id).map(Body::position)
    }

    pub fn rotation(&self, id: BodyId) -> Option<f32> {
        self.get_body(id).map(Body::rotation)
    }

    pub fn shape(&self, id: BodyId) -> Option<Shape> {
        self.get_body(id).map(Body::shape)
    }

    pub fn is_sleeping(&self, id: BodyId) -> Option<bool> {
        self.get_body(id).map(Body::is_sleeping)
    }

    /// Accumulate a force on a dynamic body. Returns `false` for unknown ids.
    pub fn apply_force(&mut self, id: BodyId, force: Vec2) -> bool {
        self.get_body_mut(id).map(|b| b.apply_force(force)).is_some()
    }

    /// Apply an instant impulse to a dynamic body.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) -> bool {
        self.get_body_mut(id).map(|b| b.apply_impulse(impulse)).is_some()
    }

    pub fn wake_up(&mut self, id: BodyId) -> bool {
        self.get_body_mut(id).map(Body::wake_up).is_some()
    }

    /// Ids of bodies whose bounds intersect the box `position ± radius`.
    pub fn query_radius(&mut self, position: Vec2, radius: f32) -> PhysicsResult<Vec<BodyId>> {
        self.sync_broad_phase();
        self.broad_phase.rebuild(self.bodies.as_slice())?;
        let mut indices = Vec::new();
        self.broad_phase.query(position, radius, &mut indices)?;
        let bodies = self.bodies.as_slice();
        Ok(indices.into_iter().filter_map(|i| bodies.get(i).map(Body::id)).collect())
    }

    // === Stepping ===

    /// Advance the simulation by a frame of `delta_time` seconds.
    ///
    /// Runs as many fixed sub-steps as the accumulator allows and returns
    /// how many ran (possibly zero). Non-positive or non-finite deltas are
    /// ignored.
    pub fn update(&mut self, delta_time: f32) -> PhysicsResult<u32> {
        self.stats = StepStats::default();
        if !(delta_time > 0.0 && delta_time.is_finite()) {
            return Ok(0);
        }

        let frame_dt = if delta_time > self.config.max_delta_time {
            warn!(
                delta_time,
                max = self.config.max_delta_time,
                "frame delta clamped"
            );
            self.config.max_delta_time
        } else {
            delta_time
        };
        self.accumulated_time += frame_dt;

        let step = self.config.physics_time_step;
        let mut substeps = 0;
        while self.accumulated_time >= step {
            self.step(step)?;
            self.accumulated_time -= step;
            self.step_count += 1;
            substeps += 1;
        }
        self.stats.substeps = substeps;
        self.stats.sleeping = self.sleeping_count();

        trace!(
            substeps,
            pairs = self.stats.candidate_pairs,
            contacts = self.stats.contacts,
            step_count = self.step_count,
            "physics update"
        );
        Ok(substeps)
    }

    /// Total fixed sub-steps run since creation.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Counters from the last `update`.
    pub fn stats(&self) -> StepStats {
        self.stats
    }

    /// Fraction of a sub-step left in the accumulator, for render
    /// interpolation between the last two states.
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulated_time / self.config.physics_time_step
    }

    /// Contacts found during the last sub-step.
    pub fn contacts(&self) -> &[ContactManifold] {
        &self.contacts
    }

    fn sync_broad_phase(&mut self) {
        let wanted = (self.config.broad_phase, self.config.cell_size);
        if wanted != self.broad_phase_setup {
            debug!(mode = ?wanted.0, cell_size = wanted.1, "broad phase rebuilt");
            self.broad_phase = create_broad_phase(wanted.0, wanted.1);
            self.broad_phase_setup = wanted;
        }
    }

    /// One fixed sub-step of length `dt`.
    fn step(&mut self, dt: f32) -> PhysicsResult<()> {
        self.sync_broad_phase();
        let params = self.config.response_params();

        self.integrate(dt);

        if !self.config.allow_sleeping {
            self.bodies.iter_mut().for_each(Body::wake_up);
        }

        // Broad phase
        self.pairs.clear();
        self.broad_phase.rebuild(self.bodies.as_slice())?;
        self.broad_phase.find_collision_pairs(&mut self.pairs)?;
        let bodies = self.bodies.as_slice();
        self.pairs.retain(|pair| pair_needs_solving(&bodies[pair.a], &bodies[pair.b]));
        self.stats.candidate_pairs += self.pairs.len();

        // Narrow phase + velocity response
        let wake_speed = self.config.sleep_velocity_threshold;
        let gravity_step = self.config.gravity * dt;
        self.contacts.clear();
        let bodies = self.bodies.as_mut_slice();
        for pair in &self.pairs {
            let Some((a, b)) = pair_mut(bodies, pair.a, pair.b) else {
                continue;
            };
            let Some(manifold) = collide(a, b) else {
                continue;
            };
            if wake_on_contact(a, b, &manifold, wake_speed, gravity_step) {
                self.stats.woken += 1;
            }
            if resolve_collision(a, b, &manifold, &params).is_some() {
                self.stats.impulses += 1;
            }
            self.contacts.try_reserve(1)?;
            self.contacts.push(manifold);
        }
        self.stats.contacts += self.contacts.len();

        // Positional correction
        for _ in 0..self.config.position_iterations {
            correct_pairs(bodies, &self.pairs, &params);
        }

        if self.config.allow_sleeping {
            self.update_sleep(dt);
        }
        Ok(())
    }

    /// Gravity plus semi-implicit Euler, split into `velocity_iterations`
    /// equal slices. Gravity is re-applied each slice because integration
    /// clears the accumulated acceleration.
    fn integrate(&mut self, dt: f32) {
        let passes = self.config.velocity_iterations.max(1);
        let slice = dt / passes as f32;
        let gravity = self.config.gravity;

        for _ in 0..passes {
            for body in self.bodies.iter_mut() {
                if let Some(d) = body.as_dynamic_mut() {
                    d.accelerate(gravity);
                }
                body.update(slice);
            }
        }
    }

    fn update_sleep(&mut self, dt: f32) {
        let velocity_threshold = self.config.sleep_velocity_threshold;
        let time_threshold = self.config.sleep_time_threshold;
        for body in self.bodies.iter_mut() {
            let id = body.id();
            if let Some(d) = body.as_dynamic_mut() {
                if d.update_sleep(dt, velocity_threshold, time_threshold) {
                    debug!(%id, "body fell asleep");
                    self.stats.fell_asleep += 1;
                }
            }
        }
    }

    // === Debug draw ===

    /// Feed bodies and last-step contacts to `renderer` per the config's
    /// debug-draw flags.
    pub fn debug_draw<R: DebugRenderer + ?Sized>(&self, renderer: &mut R) {
        draw_bodies(
            self.bodies.as_slice(),
            &self.contacts,
            &self.config.debug_draw,
            renderer,
        );
    }

    /// Replace `out` with one GPU instance per body, in storage order.
    pub fn write_instances(&self, out: &mut Vec<ShapeInstance>) -> PhysicsResult<()> {
        out.clear();
        out.try_reserve(self.bodies.len())?;
        let tint = self.config.debug_draw.sleeping_tint;
        out.extend(self.bodies.iter().map(|b| ShapeInstance::from_body(b, tint)));
        Ok(())
    }
}

/// A body that can start motion this step: awake dynamic or kinematic.
fn is_active(body: &Body) -> bool {
    body.is_awake_dynamic() || body.is_kinematic()
}

/// Skip pairs nothing can move in: both inert, or no dynamic body at all.
fn pair_needs_solving(a: &Body, b: &Body) -> bool {
    (is_active(a) || is_active(b)) && (a.is_dynamic() || b.is_dynamic())
}

/// Wake a sleeping body disturbed by an active partner. Returns `true` if a
/// body was woken.
///
/// A moving kinematic body always wakes it. An awake dynamic body wakes it
/// when closing faster than `wake_speed` plus the speed gravity adds along
/// the normal in one step, so a body merely resting on a sleeper does not.
fn wake_on_contact(
    a: &mut Body,
    b: &mut Body,
    manifold: &ContactManifold,
    wake_speed: f32,
    gravity_step: Vec2,
) -> bool {
    let closing = -(b.velocity() - a.velocity()).dot(manifold.normal);
    let (sleeper, other) = if a.is_sleeping() && is_active(b) {
        (a, b)
    } else if b.is_sleeping() && is_active(a) {
        (b, a)
    } else {
        return false;
    };

    let disturbed = if other.is_kinematic() {
        other.velocity() != Vec2::ZERO || other.angular_velocity() != 0.0
    } else {
        closing > wake_speed + gravity_step.dot(manifold.normal).abs()
    };
    if disturbed {
        sleeper.wake_up();
    }
    disturbed
}

/// One positional correction pass over `pairs`, re-testing each pair at
/// its current positions.
fn correct_pairs(bodies: &mut [Body], pairs: &[CollisionPair], params: &ResponseParams) {
    for pair in pairs {
        let Some((a, b)) = pair_mut(bodies, pair.a, pair.b) else {
            continue;
        };
        if let Some(manifold) = collide(a, b) {
            correct_positions(a, b, &manifold, params);
        }
    }
}

fn validate_body(body: &Body) -> PhysicsResult<()> {
    let invalid = |msg: String| Err(PhysicsError::InvalidBody(msg));

    if !body.position().is_finite() || !body.rotation().is_finite() {
        return invalid(format!(
            "non-finite pose: position {}, rotation {}",
            body.position(),
            body.rotation()
        ));
    }
    let extents_ok = match body.shape() {
        Shape::Circle { radius } => radius >= 0.0 && radius.is_finite(),
        Shape::Rectangle { width, height } => {
            width >= 0.0 && height >= 0.0 && width.is_finite() && height.is_finite()
        }
    };
    if !extents_ok {
        return invalid(format!("bad shape dimensions: {:?}", body.shape()));
    }
    if let Some(d) = body.as_dynamic() {
        if !(d.mass > 0.0 && d.mass.is_finite()) {
            return invalid(format!("dynamic body mass must be positive, got {}", d.mass));
        }
    }
    Ok(())
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.bodies.len())
            .field("step_count", &self.step_count)
            .field("accumulated_time", &self.accumulated_time)
            .finish()
    }
}
