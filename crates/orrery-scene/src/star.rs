//! The central star: emissive sphere, additive rim glow and the scene's point light.

use std::sync::Arc;

use glam::Vec3;

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::color::hex_to_linear;
use crate::environment::PointLight;
use crate::geometry::uv_sphere;
use crate::material::{
    Blending, Drawable, Geometry, GlowMaterial, Material, MaterialKind, Side, SurfaceMaterial,
    TextureRef,
};

pub const STAR_SEGMENTS: u32 = 128;
pub const GLOW_SCALE: f32 = 1.6;

/// Ids of the parts of the star.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarHandle {
    pub group: EntityId,
    pub mesh: EntityId,
    pub glow: EntityId,
    pub light: EntityId,
}

pub fn glow_material() -> GlowMaterial {
    GlowMaterial {
        c: 0.4,
        p: 2.6,
        color: hex_to_linear(0xffd480),
        view_vector: Vec3::Z,
    }
}

/// Glow strength for a normal and view vector, both unit length.
pub fn glow_intensity(glow: &GlowMaterial, normal: Vec3, view: Vec3) -> f32 {
    (glow.c - normal.dot(view)).max(0.0).powf(glow.p)
}

pub fn spawn_star(arena: &mut SceneArena, radius: f32, surface: Option<TextureRef>) -> StarHandle {
    let group = arena.spawn("star", EntityKind::Group, None, Transform::default(), None);

    let material = Material::opaque(MaterialKind::Surface(SurfaceMaterial {
        map: surface,
        emissive: hex_to_linear(0xffb347),
        emissive_intensity: 2.6,
        roughness: 0.25,
        metalness: 0.0,
        ..Default::default()
    }));
    let mesh = arena.spawn(
        "star-surface",
        EntityKind::Mesh,
        Some(group),
        Transform::default(),
        Some(Drawable::new(
            Geometry::Mesh(Arc::new(uv_sphere(radius, STAR_SEGMENTS, STAR_SEGMENTS))),
            material,
        )),
    );

    let glow_mesh = uv_sphere(radius * GLOW_SCALE, STAR_SEGMENTS, STAR_SEGMENTS);
    let glow = arena.spawn(
        "star-glow",
        EntityKind::Mesh,
        Some(group),
        Transform::default(),
        Some(Drawable::new(
            Geometry::Mesh(Arc::new(glow_mesh)),
            Material::opaque(MaterialKind::Glow(glow_material()))
                .with_side(Side::Back)
                .with_blending(Blending::Additive)
                .without_depth_write(),
        )),
    );

    let light = arena.spawn("star-light", EntityKind::Light, Some(group), Transform::default(), None);

    StarHandle {
        group,
        mesh,
        glow,
        light,
    }
}

/// The light attached to [`StarHandle::light`].
pub fn star_light() -> PointLight {
    PointLight::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_parts_share_a_group() {
        let mut arena = SceneArena::new();
        let star = spawn_star(&mut arena, 32.0, None);
        for id in [star.mesh, star.glow, star.light] {
            assert_eq!(arena.get(id).unwrap().parent, Some(star.group));
        }
        let glow = arena.get(star.glow).and_then(|e| e.drawable.as_ref()).unwrap();
        match &glow.geometry {
            Geometry::Mesh(mesh) => assert!((mesh.bounding_radius - 51.2).abs() < 1e-4),
            other => panic!("glow geometry {other:?}"),
        }
        assert_eq!(glow.material.blending, Blending::Additive);
        assert_eq!(glow.material.side, Side::Back);
    }

    #[test]
    fn test_glow_is_brightest_at_the_rim() {
        let glow = glow_material();
        let view = Vec3::Z;
        let facing = glow_intensity(&glow, Vec3::Z, view);
        let rim = glow_intensity(&glow, Vec3::X, view);
        let back = glow_intensity(&glow, Vec3::NEG_Z, view);
        assert_eq!(facing, 0.0);
        assert!(rim > 0.0 && back > rim);
    }

    #[test]
    fn test_star_light_values() {
        let light = star_light();
        assert_eq!(light.intensity, 3.8);
        assert_eq!(light.decay, 0.0);
        assert_eq!(light.shadow_map_size, 4096);
    }
}
