//! World Module
//!
//! The simulation container: configuration, body storage and the
//! fixed-timestep stepper that drives the physics pipeline.

pub mod config;
pub mod stepper;
pub mod storage;

pub use config::PhysicsConfig;
pub use stepper::{PhysicsWorld, StepStats};
pub use storage::BodyStorage;
