//! impulse2d engine library
//!
//! A small 2D rigid-body physics core: circles and rectangles, a spatial
//! hash broad phase, SAT narrow phase, impulse response with friction and a
//! fixed-timestep world stepper with sleeping.
//!
//! # Modules
//!
//! - [`physics`] - Bodies, shapes and the collision pipeline
//! - [`world`] - `PhysicsWorld`, its config and body storage
//! - [`render`] - Debug-draw export (`ShapeInstance`, `DebugRenderer`)
//!
//! # Example
//!
//! ```no_run
//! use impulse2d_engine::physics::{Body, Shape, Vec2};
//! use impulse2d_engine::world::{PhysicsConfig, PhysicsWorld};
//!
//! # fn main() -> impulse2d_engine::physics::PhysicsResult<()> {
//! let mut world = PhysicsWorld::new(PhysicsConfig::default())?;
//!
//! // Ground and a falling box
//! world.add_body(Body::new_static(Shape::rectangle(800.0, 40.0), Vec2::new(400.0, 580.0)))?;
//! let crate_id = world.add_body(Body::new_dynamic(
//!     Shape::rectangle(40.0, 40.0),
//!     Vec2::new(400.0, 100.0),
//!     1.0,
//! ))?;
//!
//! // Frame loop: any frame delta, fixed internal steps
//! for _ in 0..120 {
//!     world.update(1.0 / 60.0)?;
//! }
//! println!("crate at {:?}", world.position(crate_id));
//! # Ok(())
//! # }
//! ```

pub mod physics;
pub mod render;
pub mod world;

// Re-export the main entry points at crate level for convenience
pub use physics::{Body, BodyId, PhysicsError, PhysicsResult, Shape};
pub use world::{PhysicsConfig, PhysicsWorld, StepStats};
