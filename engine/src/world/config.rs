//! Physics World Configuration
//!
//! Centralized tunables for the world stepper. Serializable so scenes can
//! ship their own `physics.json`; every field has a default, so a partial
//! file only overrides what it names.
//!
//! ## Units
//! Distances are in pixels with +Y pointing down the screen, time in
//! seconds. Default gravity is roughly Earth gravity at 100 px per meter.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::physics::broad_phase::BroadPhaseMode;
use crate::physics::error::{PhysicsError, PhysicsResult};
use crate::physics::response::ResponseParams;
use crate::render::debug_draw::DebugDrawFlags;

/// Configuration for a [`crate::world::PhysicsWorld`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration (px/s²)
    pub gravity: Vec2,
    /// Fixed sub-step length (seconds)
    pub physics_time_step: f32,
    /// Largest frame delta accepted by `update`; longer frames are clamped
    pub max_delta_time: f32,
    /// Integration passes per sub-step (each covers `dt / velocity_iterations`)
    pub velocity_iterations: u32,
    /// Positional correction passes per sub-step
    pub position_iterations: u32,
    /// Closing speed below which contacts do not bounce (px/s)
    pub restitution_clamp_threshold: f32,
    /// Fraction of penetration removed per correction pass
    pub correction_factor: f32,
    /// Penetration left uncorrected (px)
    pub penetration_slop: f32,
    /// Let resting dynamic bodies fall asleep
    pub allow_sleeping: bool,
    /// Speed below which a body counts as resting (px/s)
    pub sleep_velocity_threshold: f32,
    /// Seconds a body must rest before it sleeps
    pub sleep_time_threshold: f32,
    /// Spatial hash cell size (px)
    pub cell_size: f32,
    /// Broad phase strategy
    pub broad_phase: BroadPhaseMode,
    /// Toggles read by external debug renderers
    pub debug_draw: DebugDrawFlags,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 981.0),
            physics_time_step: 1.0 / 60.0,
            max_delta_time: 0.25,
            velocity_iterations: 8,
            position_iterations: 3,
            restitution_clamp_threshold: 40.0,
            correction_factor: 0.8,
            penetration_slop: 0.0,
            allow_sleeping: true,
            sleep_velocity_threshold: 5.0,
            sleep_time_threshold: 0.5,
            cell_size: 64.0,
            broad_phase: BroadPhaseMode::SpatialHash,
            debug_draw: DebugDrawFlags::default(),
        }
    }
}

impl PhysicsConfig {
    /// Config with no gravity (top-down scenes, tests).
    pub fn zero_gravity() -> Self {
        Self {
            gravity: Vec2::ZERO,
            ..Self::default()
        }
    }

    /// Config running `steps_per_second` fixed sub-steps.
    pub fn with_step_rate(steps_per_second: f32) -> Self {
        Self {
            physics_time_step: 1.0 / steps_per_second,
            ..Self::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> PhysicsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> PhysicsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.display(), "loaded physics config");
        Ok(config)
    }

    pub fn to_json_string(&self) -> PhysicsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Response tunables derived from this config.
    pub fn response_params(&self) -> ResponseParams {
        ResponseParams {
            restitution_clamp_threshold: self.restitution_clamp_threshold,
            correction_factor: self.correction_factor,
            penetration_slop: self.penetration_slop,
        }
    }

    /// Reject values the stepper cannot run with.
    pub fn validate(&self) -> PhysicsResult<()> {
        fn invalid(msg: String) -> PhysicsResult<()> {
            Err(PhysicsError::InvalidConfig(msg))
        }

        if !(self.physics_time_step > 0.0 && self.physics_time_step.is_finite()) {
            return invalid(format!(
                "physics_time_step must be positive, got {}",
                self.physics_time_step
            ));
        }
        if !(self.max_delta_time >= self.physics_time_step) {
            return invalid(format!(
                "max_delta_time ({}) must be >= physics_time_step ({})",
                self.max_delta_time, self.physics_time_step
            ));
        }
        if self.velocity_iterations == 0 {
            return invalid("velocity_iterations must be at least 1".into());
        }
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return invalid(format!("cell_size must be positive, got {}", self.cell_size));
        }
        if !self.gravity.is_finite() {
            return invalid(format!("gravity must be finite, got {}", self.gravity));
        }
        for (name, value) in [
            ("restitution_clamp_threshold", self.restitution_clamp_threshold),
            ("correction_factor", self.correction_factor),
            ("penetration_slop", self.penetration_slop),
            ("sleep_velocity_threshold", self.sleep_velocity_threshold),
            ("sleep_time_threshold", self.sleep_time_threshold),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return invalid(format!("{name} must be a finite value >= 0, got {value}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
        assert!(PhysicsConfig::zero_gravity().validate().is_ok());
        assert!(PhysicsConfig::with_step_rate(120.0).validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PhysicsConfig::from_json_str(
            r#"{ "gravity": [0.0, 500.0], "position_iterations": 6, "broad_phase": "BruteForce" }"#,
        )
        .unwrap();
        assert_eq!(config.gravity, Vec2::new(0.0, 500.0));
        assert_eq!(config.position_iterations, 6);
        assert_eq!(config.broad_phase, BroadPhaseMode::BruteForce);
        assert_eq!(config.velocity_iterations, PhysicsConfig::default().velocity_iterations);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PhysicsConfig::default();
        config.allow_sleeping = false;
        config.debug_draw.contacts = true;
        let json = config.to_json_string().unwrap();
        assert_eq!(PhysicsConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_step = PhysicsConfig {
            physics_time_step: 0.0,
            ..PhysicsConfig::default()
        };
        assert!(matches!(bad_step.validate(), Err(PhysicsError::InvalidConfig(_))));

        let bad_iters = PhysicsConfig {
            velocity_iterations: 0,
            ..PhysicsConfig::default()
        };
        assert!(bad_iters.validate().is_err());

        let bad_cell = PhysicsConfig {
            cell_size: -4.0,
            ..PhysicsConfig::default()
        };
        assert!(bad_cell.validate().is_err());

        let bad_threshold = PhysicsConfig {
            sleep_time_threshold: f32::NAN,
            ..PhysicsConfig::default()
        };
        assert!(bad_threshold.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_error() {
        let err = PhysicsConfig::from_json_str("{ gravity: ").unwrap_err();
        assert!(matches!(err, PhysicsError::Json(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PhysicsConfig::from_json_file("/definitely/not/here/physics.json").unwrap_err();
        assert!(matches!(err, PhysicsError::Io(_)));
    }
}
