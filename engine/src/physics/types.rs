//! Physics type re-exports from glam
//!
//! This module provides the core mathematical types used throughout
//! the physics system, re-exported from the glam library, plus the few
//! 2D helpers glam leaves to the caller.

pub use glam::Vec2;

/// Lengths below this are treated as zero when normalizing.
pub const EPSILON: f32 = 1e-6;

/// Rotate `v` counter-clockwise by `angle` radians.
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    if angle == 0.0 {
        return v;
    }
    Vec2::from_angle(angle).rotate(v)
}

/// Normalize `v`, falling back to `fallback` when `v` is (nearly) zero.
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len > EPSILON { v / len } else { fallback }
}

/// Geometric mean of two material coefficients.
#[inline]
pub fn mix_coefficients(a: f32, b: f32) -> f32 {
    (a * b).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rotate_quarter_turn() {
        let r = rotate(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert_abs_diff_eq!(r.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_or_zero_vector() {
        assert_eq!(normalize_or(Vec2::ZERO, Vec2::Y), Vec2::Y);
        assert_eq!(normalize_or(Vec2::new(3.0, 0.0), Vec2::Y), Vec2::X);
    }

    #[test]
    fn test_mix_coefficients() {
        assert_abs_diff_eq!(mix_coefficients(0.25, 1.0), 0.5, epsilon = 1e-6);
        assert_eq!(mix_coefficients(0.0, 0.8), 0.0);
    }
}
