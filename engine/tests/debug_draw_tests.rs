//! Debug Draw Tests - Instance Layout and Renderer Callbacks
//!
//! `ShapeInstance` is uploaded to GPU buffers as raw bytes, so its layout is
//! pinned here alongside the flag handling of `PhysicsWorld::debug_draw`.

use impulse2d_engine::physics::{Aabb, Body, ContactManifold, Shape, Vec2};
use impulse2d_engine::render::debug_draw::{DYNAMIC_COLOR, KINEMATIC_COLOR, STATIC_COLOR};
use impulse2d_engine::render::{BodyKindTag, DebugRenderer, ShapeInstance, ShapeKind};
use impulse2d_engine::world::{PhysicsConfig, PhysicsWorld};

// ============================================================================
// ShapeInstance layout (must stay 32 bytes for the instance buffer)
// ============================================================================

#[test]
fn test_shape_instance_size_exact_32_bytes() {
    assert_eq!(
        std::mem::size_of::<ShapeInstance>(),
        32,
        "ShapeInstance must be 32 bytes:\n\
         - offset 0:  position (vec2<f32>) = 8 bytes\n\
         - offset 8:  half_extents (vec2<f32>) = 8 bytes\n\
         - offset 16: rotation (f32) = 4 bytes\n\
         - offset 20: shape_kind (u32) = 4 bytes\n\
         - offset 24: body_kind (u32) = 4 bytes\n\
         - offset 28: color_packed (u32) = 4 bytes"
    );
    assert_eq!(std::mem::align_of::<ShapeInstance>(), 4);
}

#[test]
fn test_instances_cast_to_bytes() {
    let mut world = PhysicsWorld::new(PhysicsConfig::default()).unwrap();
    world
        .add_body(Body::new_static(Shape::rectangle(100.0, 10.0), Vec2::new(50.0, 200.0)))
        .unwrap();
    world
        .add_body(Body::new_dynamic(Shape::circle(8.0), Vec2::new(50.0, 20.0), 1.0))
        .unwrap();
    world
        .add_body(Body::new_kinematic(Shape::rectangle(30.0, 6.0), Vec2::new(10.0, 100.0)))
        .unwrap();

    let mut instances = Vec::new();
    world.write_instances(&mut instances).unwrap();
    assert_eq!(instances.len(), 3);

    let bytes: &[u8] = bytemuck::cast_slice(&instances);
    assert_eq!(bytes.len(), 3 * 32);

    // Read back the circle straight from the byte view
    let circle: &ShapeInstance = bytemuck::from_bytes(&bytes[32..64]);
    assert_eq!(circle.position, [50.0, 20.0]);
    assert_eq!(circle.half_extents, [8.0, 8.0]);
    assert_eq!(ShapeKind::from_u32(circle.shape_kind), ShapeKind::Circle);
    assert_eq!(BodyKindTag::from_u32(circle.body_kind), BodyKindTag::Dynamic);

    let colors: Vec<u32> = instances.iter().map(|i| i.color_packed).collect();
    assert_eq!(colors, vec![STATIC_COLOR, DYNAMIC_COLOR, KINEMATIC_COLOR]);

    // Reusing the buffer replaces its contents
    world.clear();
    world.write_instances(&mut instances).unwrap();
    assert!(instances.is_empty());
}

// ============================================================================
// DebugRenderer callbacks
// ============================================================================

#[derive(Default)]
struct LineCollector {
    shapes: Vec<ShapeInstance>,
    boxes: Vec<Aabb>,
    contacts: Vec<ContactManifold>,
}

impl DebugRenderer for LineCollector {
    fn draw_shape(&mut self, instance: &ShapeInstance) {
        self.shapes.push(*instance);
    }

    fn draw_aabb(&mut self, aabb: &Aabb) {
        self.boxes.push(*aabb);
    }

    fn draw_contact(&mut self, contact: &ContactManifold) {
        self.contacts.push(*contact);
    }
}

/// Shapes only: renderers that implement just `draw_shape` still work.
struct ShapeCounter(usize);

impl DebugRenderer for ShapeCounter {
    fn draw_shape(&mut self, _instance: &ShapeInstance) {
        self.0 += 1;
    }
}

fn overlapping_pair() -> PhysicsWorld {
    let mut world = PhysicsWorld::new(PhysicsConfig::zero_gravity()).unwrap();
    world
        .add_body(Body::new_static(Shape::rectangle(40.0, 40.0), Vec2::ZERO))
        .unwrap();
    world
        .add_body(
            Body::new_dynamic(Shape::circle(10.0), Vec2::new(-32.0, 0.0), 1.0)
                .with_velocity(Vec2::new(300.0, 0.0)),
        )
        .unwrap();
    world
}

#[test]
fn test_all_layers_enabled() {
    let mut world = overlapping_pair();
    {
        let flags = &mut world.config_mut().debug_draw;
        flags.aabbs = true;
        flags.contacts = true;
    }
    world.update(1.0 / 60.0).unwrap();
    assert_eq!(world.contacts().len(), 1);

    let mut collector = LineCollector::default();
    world.debug_draw(&mut collector);

    assert_eq!(collector.shapes.len(), 2);
    assert_eq!(collector.boxes.len(), 2);
    assert_eq!(collector.contacts.len(), 1);
    assert!(collector.contacts[0].normal.x.abs() > 0.99);
}

#[test]
fn test_default_flags_draw_shapes_only() {
    let mut world = overlapping_pair();
    world.update(1.0 / 60.0).unwrap();

    let mut collector = LineCollector::default();
    world.debug_draw(&mut collector);
    assert_eq!(collector.shapes.len(), 2);
    assert!(collector.boxes.is_empty());
    assert!(collector.contacts.is_empty());

    let mut counter = ShapeCounter(0);
    world.debug_draw(&mut counter);
    assert_eq!(counter.0, 2);
}
