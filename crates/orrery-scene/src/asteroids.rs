//! Asteroid belt: one instanced icosahedron scattered through an annulus.

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::geometry::{InstancedMesh, icosahedron};
use crate::material::{Drawable, Geometry, Material, MaterialKind, SurfaceMaterial, TextureRef};

pub const ASTEROID_COUNT: usize = 2400;
pub const ASTEROID_RADIUS: f32 = 1.2;
pub const BELT_INNER: f32 = 180.0;
pub const BELT_OUTER: f32 = 260.0;
/// Total vertical spread; instances lie within half of it above and below the plane.
pub const BELT_THICKNESS: f32 = 26.0;

/// Instance transforms for `count` asteroids.
pub fn scatter_asteroids(rng: &mut impl Rng, count: usize) -> Vec<Mat4> {
    (0..count)
        .map(|_| {
            let radius = rng.random_range(BELT_INNER..BELT_OUTER);
            let angle = rng.random::<f32>() * TAU;
            let height = BELT_THICKNESS * (0.5 - rng.random::<f32>());
            let rotation = Quat::from_euler(
                EulerRot::XYZ,
                rng.random::<f32>() * PI,
                rng.random::<f32>() * PI,
                rng.random::<f32>() * PI,
            );
            let scale = rng.random_range(0.5..2.1);
            Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                rotation,
                Vec3::new(angle.cos() * radius, height, angle.sin() * radius),
            )
        })
        .collect()
}

pub fn spawn_asteroid_belt(
    arena: &mut SceneArena,
    rng: &mut impl Rng,
    map: Option<TextureRef>,
    visible: bool,
) -> EntityId {
    let instanced = InstancedMesh {
        mesh: icosahedron(ASTEROID_RADIUS),
        instances: scatter_asteroids(rng, ASTEROID_COUNT),
    };
    let material = Material::opaque(MaterialKind::Surface(SurfaceMaterial {
        map,
        roughness: 0.95,
        metalness: 0.12,
        ..Default::default()
    }));
    let id = arena.spawn(
        "asteroid-belt",
        EntityKind::Mesh,
        None,
        Transform::default(),
        Some(Drawable::new(Geometry::Instanced(Arc::new(instanced)), material).with_shadows()),
    );
    arena.set_visible(id, visible);
    id
}
