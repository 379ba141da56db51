//! Static orbit trails drawn as faint line loops.

use std::sync::Arc;

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::color::hex_to_linear;
use crate::geometry::circle_points;
use crate::material::{Blending, Drawable, Geometry, Material, MaterialKind};

pub const TRAIL_SEGMENTS: u32 = 256;
pub const TRAIL_COLOR: u32 = 0x1b4b99;
pub const TRAIL_OPACITY: f32 = 0.22;

pub fn spawn_orbit_trail(
    arena: &mut SceneArena,
    parent: EntityId,
    name: &str,
    radius: f32,
) -> EntityId {
    let material = Material::opaque(MaterialKind::Line {
        color: hex_to_linear(TRAIL_COLOR),
        opacity: TRAIL_OPACITY,
    })
    .with_blending(Blending::Normal)
    .without_depth_write();

    arena.spawn(
        format!("{name}-trail"),
        EntityKind::Line,
        Some(parent),
        Transform::default(),
        Some(Drawable::new(
            Geometry::LineLoop(Arc::new(circle_points(radius, TRAIL_SEGMENTS))),
            material,
        )),
    )
}
