//! Procedural nebula shell.
//!
//! The fragment work happens in `fs_nebula` of the scene shader; the functions here mirror it on
//! the CPU so the shading can be reasoned about and tested without a GPU.

use std::sync::Arc;

use glam::{Vec3, Vec4};

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::color::hex_to_linear;
use crate::geometry::uv_sphere;
use crate::material::{Blending, Drawable, Geometry, Material, MaterialKind, NebulaMaterial, Side};

pub const NEBULA_RADIUS: f32 = 2200.0;
pub const NEBULA_SEGMENTS: u32 = 128;

const FBM_OCTAVES: usize = 6;
const DISTANCE_FALLOFF: f32 = 0.00045;
const NOISE_SCALE: f32 = 0.002;
const DRIFT: Vec3 = Vec3::new(0.05, 0.03, 0.04);

pub fn nebula_material(intensity: f32, center: Vec3) -> NebulaMaterial {
    NebulaMaterial {
        time: 0.0,
        intensity,
        color_a: hex_to_linear(0x4175ff),
        color_b: hex_to_linear(0xb736ff),
        center,
    }
}

pub fn spawn_nebula(arena: &mut SceneArena, intensity: f32, center: Vec3, visible: bool) -> EntityId {
    let material = Material::opaque(MaterialKind::Nebula(nebula_material(intensity, center)))
        .with_side(Side::Back)
        .with_blending(Blending::Additive)
        .without_depth_write();
    let id = arena.spawn(
        "nebula",
        EntityKind::Mesh,
        None,
        Transform::default(),
        Some(Drawable::new(
            Geometry::Mesh(Arc::new(uv_sphere(NEBULA_RADIUS, NEBULA_SEGMENTS, NEBULA_SEGMENTS))),
            material,
        )),
    );
    arena.set_visible(id, visible);
    id
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Pseudo-random value in `[0, 1)` for a lattice point.
pub fn hash(p: Vec3) -> f32 {
    let q = Vec3::new(
        p.dot(Vec3::new(127.1, 311.7, 74.7)),
        p.dot(Vec3::new(269.5, 183.3, 246.1)),
        p.dot(Vec3::new(113.5, 271.9, 124.6)),
    );
    fract(q.dot(Vec3::new(1.0, 57.0, 113.0)).sin() * 43758.547)
}

/// Trilinear value noise with smoothstep fade.
pub fn noise(x: Vec3) -> f32 {
    let i = x.floor();
    let f = x - i;
    let f = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let h = |dx: f32, dy: f32, dz: f32| hash(i + Vec3::new(dx, dy, dz));
    mix(
        mix(mix(h(0.0, 0.0, 0.0), h(1.0, 0.0, 0.0), f.x), mix(h(0.0, 1.0, 0.0), h(1.0, 1.0, 0.0), f.x), f.y),
        mix(mix(h(0.0, 0.0, 1.0), h(1.0, 0.0, 1.0), f.x), mix(h(0.0, 1.0, 1.0), h(1.0, 1.0, 1.0), f.x), f.y),
        f.z,
    )
}

/// Six octaves of [`noise`], amplitude 0.55 halving per octave.
pub fn fbm(x: Vec3) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.55;
    let mut frequency = 1.0;
    for _ in 0..FBM_OCTAVES {
        value += amplitude * noise(x * frequency);
        frequency *= 2.0;
        amplitude *= 0.5;
    }
    value
}

/// Straight-alpha RGBA the nebula shader writes at `world_position`.
pub fn shade(material: &NebulaMaterial, world_position: Vec3) -> Vec4 {
    let d = (world_position - material.center).length() * DISTANCE_FALLOFF;
    let turbulence = fbm(world_position * NOISE_SCALE + DRIFT * material.time);
    let burst = (1.0 - d).max(0.0).powi(2);
    let energy = turbulence * material.intensity * burst;
    let alpha = smoothstep(0.1, 0.8, turbulence) * material.intensity * burst * 0.9;
    let color = material.color_a.lerp(material.color_b, turbulence) * energy * 1.2;
    color.extend(alpha)
}
