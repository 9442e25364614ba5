//! Render Module
//!
//! Renderer-agnostic debug geometry. The engine never talks to a GPU; it
//! hands out `#[repr(C)]` instances and draw calls for the host to consume.

pub mod debug_draw;

pub use debug_draw::{
    BodyKindTag, DebugDrawFlags, DebugRenderer, ShapeInstance, ShapeKind, draw_bodies, pack_color,
};
