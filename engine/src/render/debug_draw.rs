//! Debug Draw Export - shape instances and contacts for an external renderer
//!
//! The physics core never draws. It hands bodies and contacts to a
//! [`DebugRenderer`] implemented by whoever owns the window, or packs them
//! into [`ShapeInstance`]s that can be copied straight into a GPU instance
//! buffer with `bytemuck::cast_slice`.
//!
//! ShapeInstance layout (32 bytes, matches a WGSL struct of the same shape):
//!   offset 0:  position (vec2<f32>)     = 8 bytes
//!   offset 8:  half_extents (vec2<f32>) = 8 bytes
//!   offset 16: rotation (f32)           = 4 bytes
//!   offset 20: shape_kind (u32)         = 4 bytes
//!   offset 24: body_kind (u32)          = 4 bytes
//!   offset 28: color_packed (u32)       = 4 bytes

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

use crate::physics::body::{Body, BodyKind};
use crate::physics::narrow_phase::ContactManifold;
use crate::physics::shape::{Aabb, Shape};

/// Which debug layers a renderer should draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugDrawFlags {
    /// Body outlines
    pub shapes: bool,
    /// Broad-phase bounds
    pub aabbs: bool,
    /// Contact points and normals from the last step
    pub contacts: bool,
    /// Dim sleeping bodies
    pub sleeping_tint: bool,
}

impl Default for DebugDrawFlags {
    fn default() -> Self {
        Self {
            shapes: true,
            aabbs: false,
            contacts: false,
            sleeping_tint: true,
        }
    }
}

/// Shape discriminant stored in [`ShapeInstance::shape_kind`].
#[repr(u32)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ShapeKind {
    #[default]
    Circle = 0,
    Rectangle = 1,
}

impl ShapeKind {
    #[inline]
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => ShapeKind::Rectangle,
            _ => ShapeKind::Circle,
        }
    }

    #[inline]
    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

/// Body kind discriminant stored in [`ShapeInstance::body_kind`].
#[repr(u32)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BodyKindTag {
    #[default]
    Static = 0,
    Dynamic = 1,
    Kinematic = 2,
}

impl BodyKindTag {
    #[inline]
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => BodyKindTag::Dynamic,
            2 => BodyKindTag::Kinematic,
            _ => BodyKindTag::Static,
        }
    }

    #[inline]
    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

/// Pack RGB components into a u32 (0xRRGGBB).
#[inline]
pub const fn pack_color(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Outline colors per body kind.
pub const STATIC_COLOR: u32 = pack_color(0x8C, 0x8C, 0x8C);
pub const DYNAMIC_COLOR: u32 = pack_color(0x4F, 0xC3, 0xF7);
pub const KINEMATIC_COLOR: u32 = pack_color(0xFF, 0xB7, 0x4D);
pub const SLEEPING_COLOR: u32 = pack_color(0x37, 0x47, 0x4F);

/// One body, ready for an instanced draw call.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeInstance {
    /// World position of the body centre
    pub position: [f32; 2],
    /// Half width/height; radius twice for circles
    pub half_extents: [f32; 2],
    /// Rotation (radians)
    pub rotation: f32,
    /// [`ShapeKind`] as u32
    pub shape_kind: u32,
    /// [`BodyKindTag`] as u32
    pub body_kind: u32,
    /// Outline color (0xRRGGBB)
    pub color_packed: u32,
}

const_assert_eq!(std::mem::size_of::<ShapeInstance>(), 32);

impl ShapeInstance {
    /// Snapshot `body`. With `sleeping_tint`, sleeping bodies use
    /// [`SLEEPING_COLOR`].
    pub fn from_body(body: &Body, sleeping_tint: bool) -> Self {
        let shape = body.shape();
        let shape_kind = match shape {
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
        };
        let (body_kind, color) = match &body.kind {
            BodyKind::Static(_) => (BodyKindTag::Static, STATIC_COLOR),
            BodyKind::Dynamic(d) if d.is_sleeping && sleeping_tint => {
                (BodyKindTag::Dynamic, SLEEPING_COLOR)
            }
            BodyKind::Dynamic(_) => (BodyKindTag::Dynamic, DYNAMIC_COLOR),
            BodyKind::Kinematic(_) => (BodyKindTag::Kinematic, KINEMATIC_COLOR),
        };
        Self {
            position: body.position().to_array(),
            half_extents: shape.half_extents().to_array(),
            rotation: body.rotation(),
            shape_kind: shape_kind.to_u32(),
            body_kind: body_kind.to_u32(),
            color_packed: color,
        }
    }
}

/// Receiver for debug geometry. Only `draw_shape` is required.
pub trait DebugRenderer {
    fn draw_shape(&mut self, instance: &ShapeInstance);

    fn draw_aabb(&mut self, _aabb: &Aabb) {}

    fn draw_contact(&mut self, _contact: &ContactManifold) {}
}

/// Feed bodies and contacts to `renderer`, honouring `flags`.
pub fn draw_bodies<R: DebugRenderer + ?Sized>(
    bodies: &[Body],
    contacts: &[ContactManifold],
    flags: &DebugDrawFlags,
    renderer: &mut R,
) {
    if flags.shapes {
        for body in bodies {
            renderer.draw_shape(&ShapeInstance::from_body(body, flags.sleeping_tint));
        }
    }
    if flags.aabbs {
        for body in bodies {
            renderer.draw_aabb(&body.aabb());
        }
    }
    if flags.contacts {
        for contact in contacts {
            renderer.draw_contact(contact);
        }
    }
}
