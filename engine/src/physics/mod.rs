//! Physics module
//!
//! Rigid-body model and the collision pipeline, built from scratch without
//! an external physics library.
//!
//! # Unit System
//!
//! **1 unit = 1 pixel**, y pointing down
//!
//! - Distances in pixels
//! - Velocities in px/s
//! - Accelerations in px/s² (default gravity is `(0, 981)`)
//! - Angles in radians
//!
//! # Submodules
//!
//! - [`types`] - Vec2 re-export and small math helpers
//! - [`shape`] - Circle / rectangle geometry and AABBs
//! - [`body`] - Static, dynamic and kinematic bodies
//! - [`broad_phase`] - Spatial hash and brute-force candidate pair search
//! - [`narrow_phase`] - SAT contact generation
//! - [`response`] - Impulse resolution, friction, positional correction
//! - [`error`] - `PhysicsError` and `PhysicsResult`

pub mod body;
pub mod broad_phase;
pub mod error;
pub mod narrow_phase;
pub mod response;
pub mod shape;
pub mod types;

// Re-export commonly used types at the physics module level
pub use body::{Body, BodyId, BodyKind, DynamicBody, KinematicBody, Material, StaticBody};
pub use broad_phase::{
    BroadPhase, BroadPhaseMode, CollisionPair, SimpleBroadPhase, SpatialHash, create_broad_phase,
};
pub use error::{PhysicsError, PhysicsResult};
pub use narrow_phase::{Contact, ContactManifold, collide, collide_shapes};
pub use response::{ContactImpulse, ResponseParams, correct_positions, resolve_collision};
pub use shape::{Aabb, Shape};
pub use types::Vec2;
