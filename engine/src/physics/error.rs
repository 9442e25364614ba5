//! Error types for the physics core.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors surfaced by the physics world and its configuration.
///
/// Geometry never fails; the only per-frame failure is running out of
/// memory while growing the broad-phase buckets or pair lists.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// A growable container could not reserve memory.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// A configuration value is out of range.
    #[error("invalid physics config: {0}")]
    InvalidConfig(String),

    /// A body was rejected when added to the world.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Config JSON could not be parsed or written.
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for physics operations.
pub type PhysicsResult<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PhysicsError::InvalidConfig("physics_time_step must be > 0".into());
        assert_eq!(
            format!("{err}"),
            "invalid physics config: physics_time_step must be > 0"
        );

        let err = PhysicsError::InvalidBody("mass -1".into());
        assert!(format!("{err}").contains("mass -1"));
    }

    #[test]
    fn test_allocation_error_from_try_reserve() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        let err: PhysicsError = err.into();
        assert!(matches!(err, PhysicsError::Allocation(_)));
    }
}
