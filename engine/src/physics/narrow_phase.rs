//! Narrow phase - exact shape-pair tests
//!
//! Each candidate pair from the broad phase is tested exactly and, when the
//! shapes overlap, reduced to a single [`ContactManifold`]: one contact
//! point, a unit normal pointing from body1 towards body2, and the
//! penetration depth along that normal.
//!
//! # Pair dispatch
//!
//! | body1 \ body2 | Circle          | Rectangle                |
//! |---------------|-----------------|--------------------------|
//! | Circle        | closed form     | SAT                      |
//! | Rectangle     | SAT, flipped    | AABB fast path or SAT    |
//!
//! # Separating Axis Theorem
//!
//! Two convex shapes are disjoint iff some axis separates their
//! projections. A rectangle only contributes two unique axes (its edge
//! normals); a circle against a rectangle adds the axis from the circle
//! centre to the closest point on the rectangle boundary. The axis with the
//! smallest overlap is the minimum translation direction.

use super::body::{Body, BodyId};
use super::shape::Shape;
use super::types::{EPSILON, Vec2, normalize_or};

/// Contact geometry for one overlapping pair, without body identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Approximate world-space contact point
    pub point: Vec2,
    /// Unit normal from the first shape towards the second
    pub normal: Vec2,
    /// Overlap depth along `normal` (>= 0)
    pub penetration: f32,
}

impl Contact {
    /// Same contact seen from the other shape.
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Contact between two bodies of a world. Rebuilt every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactManifold {
    pub point: Vec2,
    /// Unit normal pointing from `body1` towards `body2`
    pub normal: Vec2,
    pub penetration: f32,
    pub body1: BodyId,
    pub body2: BodyId,
}

impl ContactManifold {
    pub fn from_contact(contact: Contact, body1: BodyId, body2: BodyId) -> Self {
        Self {
            point: contact.point,
            normal: contact.normal,
            penetration: contact.penetration,
            body1,
            body2,
        }
    }
}

/// Test two bodies. `None` when they do not overlap.
pub fn collide(body1: &Body, body2: &Body) -> Option<ContactManifold> {
    collide_shapes(
        &body1.shape(),
        body1.position(),
        body1.rotation(),
        &body2.shape(),
        body2.position(),
        body2.rotation(),
    )
    .map(|contact| ContactManifold::from_contact(contact, body1.id(), body2.id()))
}

/// Test two posed shapes. The returned normal points from `a` to `b`.
pub fn collide_shapes(
    shape_a: &Shape,
    pos_a: Vec2,
    rot_a: f32,
    shape_b: &Shape,
    pos_b: Vec2,
    rot_b: f32,
) -> Option<Contact> {
    match (*shape_a, *shape_b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(pos_a, ra, pos_b, rb)
        }
        (Shape::Circle { radius }, Shape::Rectangle { width, height }) => {
            circle_rect(pos_a, radius, pos_b, rot_b, width, height)
        }
        (Shape::Rectangle { width, height }, Shape::Circle { radius }) => {
            circle_rect(pos_b, radius, pos_a, rot_a, width, height).map(Contact::flipped)
        }
        (
            Shape::Rectangle { width: wa, height: ha },
            Shape::Rectangle { width: wb, height: hb },
        ) => rect_rect(pos_a, rot_a, Vec2::new(wa, ha), pos_b, rot_b, Vec2::new(wb, hb)),
    }
}

/// Circle against circle, closed form.
///
/// Touching circles (`distance == r1 + r2`) do not collide. Coincident
/// centres have no defined direction; `+X` is used.
pub fn circle_circle(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> Option<Contact> {
    let delta = c2 - c1;
    let radii = r1 + r2;
    let dist_sq = delta.length_squared();
    if dist_sq >= radii * radii {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > EPSILON { delta / dist } else { Vec2::X };
    Some(Contact {
        point: c1 + normal * r1,
        normal,
        penetration: radii - dist,
    })
}

/// Rectangle against rectangle. `size` is full width/height.
pub fn rect_rect(
    pos_a: Vec2,
    rot_a: f32,
    size_a: Vec2,
    pos_b: Vec2,
    rot_b: f32,
    size_b: Vec2,
) -> Option<Contact> {
    if rot_a == 0.0 && rot_b == 0.0 {
        rect_rect_axis_aligned(pos_a, size_a * 0.5, pos_b, size_b * 0.5)
    } else {
        rect_rect_sat(pos_a, rot_a, size_a, pos_b, rot_b, size_b)
    }
}

/// Fast path for two unrotated rectangles.
///
/// Separates along the axis with the smaller overlap; equal overlaps pick x.
/// The contact point is the centre of the overlap rectangle.
pub fn rect_rect_axis_aligned(pos_a: Vec2, half_a: Vec2, pos_b: Vec2, half_b: Vec2) -> Option<Contact> {
    let min_a = pos_a - half_a;
    let max_a = pos_a + half_a;
    let min_b = pos_b - half_b;
    let max_b = pos_b + half_b;

    let overlap_min = min_a.max(min_b);
    let overlap_max = max_a.min(max_b);
    let overlap = overlap_max - overlap_min;
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return None;
    }

    let delta = pos_b - pos_a;
    let (normal, penetration) = if overlap.x <= overlap.y {
        (Vec2::new(if delta.x < 0.0 { -1.0 } else { 1.0 }, 0.0), overlap.x)
    } else {
        (Vec2::new(0.0, if delta.y < 0.0 { -1.0 } else { 1.0 }), overlap.y)
    };

    Some(Contact {
        point: (overlap_min + overlap_max) * 0.5,
        normal,
        penetration,
    })
}

/// Edge normals of a rectangle rotated by `rotation`. The other two edges
/// are parallel, so two axes cover all four.
#[inline]
pub fn rect_axes(rotation: f32) -> [Vec2; 2] {
    let x_axis = Vec2::from_angle(rotation);
    [x_axis, x_axis.perp()]
}

/// Corners of a rectangle with full `size`, counter-clockwise.
pub fn rect_vertices(pos: Vec2, rotation: f32, size: Vec2) -> [Vec2; 4] {
    let [ax, ay] = rect_axes(rotation);
    let hx = ax * (size.x * 0.5);
    let hy = ay * (size.y * 0.5);
    [pos - hx - hy, pos + hx - hy, pos + hx + hy, pos - hx + hy]
}

/// Project polygon vertices onto `axis`, returning `(min, max)`.
pub fn project_polygon(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        let d = v.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

/// Project a disc onto a unit `axis`: `[c·axis - r, c·axis + r]`.
pub fn project_circle(center: Vec2, radius: f32, axis: Vec2) -> (f32, f32) {
    let c = center.dot(axis);
    (c - radius, c + radius)
}

/// Length of the shared part of two projection intervals. Non-positive
/// means the axis separates the shapes.
#[inline]
fn interval_overlap(a: (f32, f32), b: (f32, f32)) -> f32 {
    a.1.min(b.1) - a.0.max(b.0)
}

/// Closest point to `p` on segment `a..b` (`t` clamped to `[0, 1]`).
/// A degenerate segment returns `a`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let edge = b - a;
    let len_sq = edge.length_squared();
    if len_sq <= EPSILON * EPSILON {
        return a;
    }
    let t = ((p - a).dot(edge) / len_sq).clamp(0.0, 1.0);
    a + edge * t
}

/// Closest point to `p` on the boundary of a convex polygon.
pub fn closest_point_on_boundary(p: Vec2, vertices: &[Vec2]) -> Vec2 {
    let mut best = vertices.first().copied().unwrap_or(p);
    let mut best_dist = f32::INFINITY;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let candidate = closest_point_on_segment(p, a, b);
        let dist = candidate.distance_squared(p);
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }
    best
}

/// Running minimum-overlap axis for a SAT test.
struct SatAxis {
    normal: Vec2,
    overlap: f32,
}

impl SatAxis {
    fn new() -> Self {
        Self {
            normal: Vec2::X,
            overlap: f32::INFINITY,
        }
    }

    /// Returns `false` when `axis` separates the shapes.
    fn test(&mut self, axis: Vec2, proj_a: (f32, f32), proj_b: (f32, f32)) -> bool {
        let overlap = interval_overlap(proj_a, proj_b);
        if overlap <= 0.0 {
            return false;
        }
        if overlap < self.overlap {
            self.overlap = overlap;
            self.normal = axis;
        }
        true
    }

    /// Orient the best axis from `from` towards `to`.
    fn oriented(&self, from: Vec2, to: Vec2) -> Vec2 {
        if self.normal.dot(to - from) < 0.0 { -self.normal } else { self.normal }
    }
}

/// Rotated rectangle against rectangle via SAT on the four edge normals.
/// The contact point is the midpoint between the centres.
pub fn rect_rect_sat(
    pos_a: Vec2,
    rot_a: f32,
    size_a: Vec2,
    pos_b: Vec2,
    rot_b: f32,
    size_b: Vec2,
) -> Option<Contact> {
    let verts_a = rect_vertices(pos_a, rot_a, size_a);
    let verts_b = rect_vertices(pos_b, rot_b, size_b);
    let [a0, a1] = rect_axes(rot_a);
    let [b0, b1] = rect_axes(rot_b);

    let mut best = SatAxis::new();
    for axis in [a0, a1, b0, b1] {
        let proj_a = project_polygon(&verts_a, axis);
        let proj_b = project_polygon(&verts_b, axis);
        if !best.test(axis, proj_a, proj_b) {
            return None;
        }
    }

    Some(Contact {
        point: (pos_a + pos_b) * 0.5,
        normal: best.oriented(pos_a, pos_b),
        penetration: best.overlap,
    })
}

/// Circle against a (possibly rotated) rectangle via SAT. The normal points
/// from the circle towards the rectangle; the contact point is the closest
/// point on the rectangle boundary.
pub fn circle_rect(
    center: Vec2,
    radius: f32,
    rect_pos: Vec2,
    rect_rot: f32,
    width: f32,
    height: f32,
) -> Option<Contact> {
    let verts = rect_vertices(rect_pos, rect_rot, Vec2::new(width, height));
    let closest = closest_point_on_boundary(center, &verts);
    let [r0, r1] = rect_axes(rect_rot);

    let mut best = SatAxis::new();
    for axis in [r0, r1] {
        if !best.test(axis, project_circle(center, radius, axis), project_polygon(&verts, axis)) {
            return None;
        }
    }

    // Centre sitting on the boundary gives no direction; the edge normals
    // alone still decide the test.
    let to_closest = normalize_or(closest - center, Vec2::ZERO);
    if to_closest != Vec2::ZERO
        && !best.test(
            to_closest,
            project_circle(center, radius, to_closest),
            project_polygon(&verts, to_closest),
        )
    {
        return None;
    }

    Some(Contact {
        point: closest,
        normal: best.oriented(center, rect_pos),
        penetration: best.overlap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_circles_overlapping() {
        let c = circle_circle(Vec2::ZERO, 5.0, Vec2::new(7.0, 0.0), 3.0).unwrap();
        assert_abs_diff_eq!(c.penetration, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.normal.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.normal.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.point.x, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_circles_separated_and_touching() {
        assert!(circle_circle(Vec2::ZERO, 5.0, Vec2::new(9.0, 0.0), 3.0).is_none());
        assert!(circle_circle(Vec2::ZERO, 5.0, Vec2::new(8.0, 0.0), 3.0).is_none());
    }

    #[test]
    fn test_coincident_circles_use_fallback_normal() {
        let c = circle_circle(Vec2::ONE, 2.0, Vec2::ONE, 1.0).unwrap();
        assert_eq!(c.normal, Vec2::X);
        assert_abs_diff_eq!(c.penetration, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_aabb_fast_path_picks_smaller_overlap() {
        // overlap x = 1, overlap y = 4
        let c = rect_rect_axis_aligned(
            Vec2::ZERO,
            Vec2::new(2.0, 2.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(2.0, 2.0),
        )
        .unwrap();
        assert_eq!(c.normal, Vec2::X);
        assert_abs_diff_eq!(c.penetration, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.point.x, 1.5, epsilon = 1e-6);
        assert_abs_diff_eq!(c.point.y, 0.0, epsilon = 1e-6);

        // body2 below body1 -> normal points -Y
        let c = rect_rect_axis_aligned(
            Vec2::ZERO,
            Vec2::new(5.0, 1.0),
            Vec2::new(0.0, -1.5),
            Vec2::new(5.0, 1.0),
        )
        .unwrap();
        assert_eq!(c.normal, Vec2::NEG_Y);
        assert_abs_diff_eq!(c.penetration, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_aabb_fast_path_tie_prefers_x() {
        let c = rect_rect_axis_aligned(
            Vec2::ZERO,
            Vec2::splat(1.0),
            Vec2::new(1.0, 1.0),
            Vec2::splat(1.0),
        )
        .unwrap();
        assert_eq!(c.normal, Vec2::X);
        assert_abs_diff_eq!(c.penetration, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_aabb_fast_path_separated() {
        assert!(
            rect_rect_axis_aligned(Vec2::ZERO, Vec2::ONE, Vec2::new(2.0, 0.0), Vec2::ONE).is_none()
        );
    }

    #[test]
    fn test_rotated_rects_overlap() {
        // Diamond (45°) whose tip pokes into an axis-aligned box from the left
        let size = Vec2::splat(2.0);
        let c = rect_rect_sat(Vec2::ZERO, FRAC_PI_4, size, Vec2::new(2.2, 0.0), 0.0, size).unwrap();
        // tip reaches sqrt(2) ≈ 1.414, box starts at 1.2
        assert_abs_diff_eq!(c.penetration, 2.0_f32.sqrt() - 1.2, epsilon = 1e-4);
        assert_abs_diff_eq!(c.normal.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.point.x, 1.1, epsilon = 1e-5);
    }

    #[test]
    fn test_rotated_rects_separated_on_own_axis() {
        // AABBs overlap but the diamond's edge axis separates them
        let size = Vec2::splat(2.0);
        assert!(rect_rect_sat(Vec2::ZERO, FRAC_PI_4, size, Vec2::new(2.1, 2.1), 0.0, size).is_none());
    }

    #[test]
    fn test_circle_vs_rect_face() {
        let c = circle_rect(Vec2::new(0.0, 2.5), 1.0, Vec2::ZERO, 0.0, 4.0, 4.0).unwrap();
        // circle above, rect below -> normal from circle to rect is -Y
        assert_abs_diff_eq!(c.normal.y, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.penetration, 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(c.point.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_circle_near_corner_separated_by_vertex_axis() {
        // Inside the corner's AABB region but outside the rounded corner
        let center = Vec2::new(2.8, 2.8);
        assert!(circle_rect(center, 1.0, Vec2::ZERO, 0.0, 4.0, 4.0).is_none());
    }

    #[test]
    fn test_rect_circle_flips_normal() {
        let rect = Shape::rectangle(4.0, 4.0);
        let circle = Shape::circle(1.0);
        let c = collide_shapes(&rect, Vec2::ZERO, 0.0, &circle, Vec2::new(2.5, 0.0), 0.0).unwrap();
        assert_abs_diff_eq!(c.normal.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.penetration, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_closest_point_degenerate_segment() {
        let p = closest_point_on_segment(Vec2::new(5.0, 5.0), Vec2::ONE, Vec2::ONE);
        assert_eq!(p, Vec2::ONE);
    }

    #[test]
    fn test_projections() {
        assert_eq!(project_circle(Vec2::new(3.0, 0.0), 1.0, Vec2::X), (2.0, 4.0));
        let verts = rect_vertices(Vec2::ZERO, 0.0, Vec2::new(4.0, 2.0));
        assert_eq!(project_polygon(&verts, Vec2::Y), (-1.0, 1.0));
    }

    #[test]
    fn test_collide_bodies_keeps_ids_and_direction() {
        let mut a = Body::new_dynamic(Shape::circle(5.0), Vec2::ZERO, 1.0);
        let mut b = Body::new_dynamic(Shape::circle(3.0), Vec2::new(7.0, 0.0), 1.0);
        a.assign_id(BodyId::new(1));
        b.assign_id(BodyId::new(2));
        let m = collide(&a, &b).unwrap();
        assert_eq!(m.body1, BodyId::new(1));
        assert_eq!(m.body2, BodyId::new(2));
        assert!(m.normal.x > 0.0);

        let m = collide(&b, &a).unwrap();
        assert!(m.normal.x < 0.0);
    }
}
