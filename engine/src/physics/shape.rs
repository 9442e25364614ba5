//! Collision shapes and axis-aligned bounds
//!
//! Two convex shapes are supported: circles and rectangles. Both are
//! described in body-local space centred on the body position; a
//! rectangle's rotation comes from the owning body.

use serde::{Deserialize, Serialize};

use super::types::{Vec2, rotate};

/// Collision shape of a body. Immutable once the body is created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Disc of the given radius.
    Circle { radius: f32 },
    /// Box of the given full width and height (before rotation).
    Rectangle { width: f32, height: f32 },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Shape::Rectangle { width, height }
    }

    /// Area of the shape in square world units.
    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rectangle { width, height } => width * height,
        }
    }

    /// Moment of inertia about the centre for a body of `mass`.
    ///
    /// Disc: `½·m·r²`. Rectangle: `m·(w² + h²) / 12`.
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        match *self {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Rectangle { width, height } => mass * (width * width + height * height) / 12.0,
        }
    }

    /// Unrotated half extents (radius for both axes on a circle).
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rectangle { width, height } => Vec2::new(width * 0.5, height * 0.5),
        }
    }

    /// World-space bounds of this shape at the given pose.
    ///
    /// Rotated rectangles use the half-diagonal on both axes, which always
    /// contains the shape whatever the angle.
    pub fn aabb(&self, position: Vec2, rotation: f32) -> Aabb {
        let half = match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rectangle { width, height } => {
                if rotation == 0.0 {
                    Vec2::new(width * 0.5, height * 0.5)
                } else {
                    let half_diagonal = 0.5 * (width * width + height * height).sqrt();
                    Vec2::splat(half_diagonal)
                }
            }
        };
        Aabb::new(position - half, position + half)
    }

    /// World-space corners of a rectangle, counter-clockwise starting at
    /// the local (-w/2, -h/2) corner. Circles have no corners.
    pub fn vertices(&self, position: Vec2, rotation: f32) -> Option<[Vec2; 4]> {
        match *self {
            Shape::Circle { .. } => None,
            Shape::Rectangle { width, height } => {
                let hw = width * 0.5;
                let hh = height * 0.5;
                let local = [
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ];
                Some(local.map(|corner| position + rotate(corner, rotation)))
            }
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box centred on `center` extending `half` in each direction.
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self::new(center - half, center + half)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// True when the boxes share any area or touch on an edge.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Smallest box containing both.
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Box grown by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_circle_aabb() {
        let aabb = Shape::circle(3.0).aabb(Vec2::new(1.0, 2.0), 1.3);
        assert_eq!(aabb.min, Vec2::new(-2.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(4.0, 5.0));
    }

    #[test]
    fn test_rotated_square_aabb_uses_half_diagonal() {
        let aabb = Shape::rectangle(10.0, 10.0).aabb(Vec2::new(5.0, 0.0), FRAC_PI_4);
        assert_abs_diff_eq!(aabb.min.x, -2.07, epsilon = 0.01);
        assert_abs_diff_eq!(aabb.min.y, -7.07, epsilon = 0.01);
        assert_abs_diff_eq!(aabb.max.x, 12.07, epsilon = 0.01);
        assert_abs_diff_eq!(aabb.max.y, 7.07, epsilon = 0.01);
    }

    #[test]
    fn test_unrotated_rect_aabb_is_exact() {
        let aabb = Shape::rectangle(4.0, 2.0).aabb(Vec2::ZERO, 0.0);
        assert_eq!(aabb.min, Vec2::new(-2.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(2.0, 1.0));
    }

    #[test]
    fn test_inertia() {
        assert_abs_diff_eq!(Shape::circle(2.0).moment_of_inertia(3.0), 6.0, epsilon = 1e-6);
        assert_abs_diff_eq!(
            Shape::rectangle(6.0, 6.0).moment_of_inertia(2.0),
            12.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_rect_vertices_rotated() {
        let verts = Shape::rectangle(2.0, 2.0)
            .vertices(Vec2::ZERO, FRAC_PI_4)
            .unwrap();
        let sqrt2 = 2.0_f32.sqrt();
        assert_abs_diff_eq!(verts[0].x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(verts[0].y, -sqrt2, epsilon = 1e-5);
        assert!(Shape::circle(1.0).vertices(Vec2::ZERO, 0.0).is_none());
    }

    #[test]
    fn test_aabb_overlap_and_merge() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(2.0));
        let b = Aabb::new(Vec2::splat(1.0), Vec2::splat(3.0));
        let c = Aabb::new(Vec2::splat(5.0), Vec2::splat(6.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        let m = a.merged(&c);
        assert_eq!(m.min, Vec2::ZERO);
        assert_eq!(m.max, Vec2::splat(6.0));
        assert!(m.contains_point(Vec2::new(4.0, 4.0)));
        assert_eq!(a.expanded(1.0).min, Vec2::splat(-1.0));
    }
}
