//! Uniform blocks shared with `scene.wgsl`, filled from the scene each frame.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use orrery_scene::{Drawable, EntityId, Geometry, MaterialKind, SceneArena, SceneComposer};

/// Spheres the star light is tested against.
pub const MAX_SHADOW_CASTERS: usize = 8;

pub const FLAG_MAP: u32 = 1;
pub const FLAG_NORMAL_MAP: u32 = 1 << 1;
pub const FLAG_ROUGHNESS_MAP: u32 = 1 << 2;
pub const FLAG_RECEIVE_SHADOW: u32 = 1 << 3;
pub const FLAG_FOG: u32 = 1 << 4;
pub const FLAG_TONE_MAPPED: u32 = 1 << 5;

/// Per-frame camera, light, fog and shadow data. Bound at group 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// `w`: tone-mapping exposure.
    pub camera_position: [f32; 4],
    /// `w`: light intensity.
    pub light_position: [f32; 4],
    /// `w`: distance decay exponent.
    pub light_color: [f32; 4],
    /// Ambient color times intensity. `w`: 1 when an environment map is bound.
    pub ambient: [f32; 4],
    /// Mean environment radiance. `w`: 1 when the light casts shadows.
    pub environment_ambient: [f32; 4],
    /// Fog color. `w`: exp2 density.
    pub fog: [f32; 4],
    /// Render target width and height, caster count, unused.
    pub viewport: [f32; 4],
    /// Center and radius of each caster.
    pub casters: [[f32; 4]; MAX_SHADOW_CASTERS],
}

/// A sphere that occludes the star light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCaster {
    pub entity: EntityId,
    pub center: Vec3,
    pub radius: f32,
}

/// Visible shadow-casting meshes, in id order, at most [`MAX_SHADOW_CASTERS`].
pub fn collect_shadow_casters(arena: &SceneArena) -> Vec<ShadowCaster> {
    arena
        .iter()
        .filter_map(|(id, entity)| {
            let drawable = entity.drawable.as_ref().filter(|d| d.cast_shadow)?;
            let Geometry::Mesh(mesh) = &drawable.geometry else {
                return None;
            };
            if !arena.is_visible(id) {
                return None;
            }
            let world = arena.world_matrix(id);
            let (scale, _, center) = world.to_scale_rotation_translation();
            Some(ShadowCaster {
                entity: id,
                center,
                radius: mesh.bounding_radius * scale.max_element(),
            })
        })
        .take(MAX_SHADOW_CASTERS)
        .collect()
}

impl FrameUniform {
    pub fn new(scene: &SceneComposer, casters: &[ShadowCaster]) -> Self {
        let camera = scene.camera();
        let light = scene.star_light();
        let lighting = scene.lighting();
        let viewport = scene.viewport();
        let light_position = scene.arena().world_position(scene.star().light);
        let ambient = lighting.ambient_color * lighting.ambient_intensity;
        let environment_ambient = lighting
            .environment
            .as_ref()
            .map_or(Vec3::ZERO, |env| env.ambient);

        let mut caster_data = [[0.0; 4]; MAX_SHADOW_CASTERS];
        for (slot, caster) in caster_data.iter_mut().zip(casters) {
            *slot = caster.center.extend(caster.radius).to_array();
        }

        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            camera_position: camera.position.extend(lighting.exposure).to_array(),
            light_position: light_position.extend(light.intensity).to_array(),
            light_color: light.color.extend(light.decay).to_array(),
            ambient: ambient
                .extend(if lighting.environment.is_some() { 1.0 } else { 0.0 })
                .to_array(),
            environment_ambient: environment_ambient
                .extend(if light.cast_shadow { 1.0 } else { 0.0 })
                .to_array(),
            fog: lighting.fog_color.extend(lighting.fog_density).to_array(),
            viewport: [
                viewport.width as f32,
                viewport.height as f32,
                casters.len().min(MAX_SHADOW_CASTERS) as f32,
                0.0,
            ],
            casters: caster_data,
        }
    }
}

/// Per-entity transform and material parameters. Bound at group 1.
///
/// The `effect_*` slots carry the parameters of the non-surface materials:
/// glow `(c, p)` and view vector, nebula `(time, intensity)`, center and
/// second color, and the point size multiplier.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model's upper 3x3, padded to 4x4.
    pub normal_matrix: [[f32; 4]; 4],
    /// Base color. `w`: opacity.
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// Roughness, metalness, unused, unused.
    pub surface: [f32; 4],
    pub effect_a: [f32; 4],
    pub effect_b: [f32; 4],
    pub effect_c: [f32; 4],
    /// Flag bits, 1-based shadow caster slot of this entity (0 for none), unused, unused.
    pub flags: [u32; 4],
}

impl ObjectUniform {
    pub fn new(world: Mat4, drawable: &Drawable, caster_slot: Option<usize>) -> Self {
        let normal_matrix = Mat4::from_mat3(Mat3::from_mat4(world).inverse().transpose());
        let material = &drawable.material;
        let mut uniform = Self {
            model: world.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color: [1.0; 4],
            emissive: [0.0; 4],
            surface: [1.0, 0.0, 0.0, 0.0],
            effect_a: [0.0; 4],
            effect_b: [0.0; 4],
            effect_c: [0.0; 4],
            flags: [0, caster_slot.map_or(0, |slot| slot as u32 + 1), 0, 0],
        };
        let mut flags = 0;
        if material.tone_mapped {
            flags |= FLAG_TONE_MAPPED;
        }

        match &material.kind {
            MaterialKind::Surface(surface) => {
                uniform.color = surface.color.extend(surface.opacity).to_array();
                uniform.emissive = (surface.emissive * surface.emissive_intensity)
                    .extend(0.0)
                    .to_array();
                uniform.surface = [surface.roughness, surface.metalness, 0.0, 0.0];
                flags |= texture_flag(surface.map.is_some(), FLAG_MAP)
                    | texture_flag(surface.normal_map.is_some(), FLAG_NORMAL_MAP)
                    | texture_flag(surface.roughness_map.is_some(), FLAG_ROUGHNESS_MAP);
                if drawable.receive_shadow {
                    flags |= FLAG_RECEIVE_SHADOW;
                }
                if material.tone_mapped {
                    flags |= FLAG_FOG;
                }
            }
            MaterialKind::Basic { map, color } => {
                uniform.color = color.extend(1.0).to_array();
                flags |= texture_flag(map.is_some(), FLAG_MAP);
                if material.tone_mapped {
                    flags |= FLAG_FOG;
                }
            }
            MaterialKind::Glow(glow) => {
                uniform.color = glow.color.extend(1.0).to_array();
                uniform.effect_a = [glow.c, glow.p, 0.0, 0.0];
                uniform.effect_b = glow.view_vector.extend(0.0).to_array();
            }
            MaterialKind::Nebula(nebula) => {
                uniform.color = nebula.color_a.extend(1.0).to_array();
                uniform.effect_a = [nebula.time, nebula.intensity, 0.0, 0.0];
                uniform.effect_b = nebula.center.extend(0.0).to_array();
                uniform.effect_c = nebula.color_b.extend(0.0).to_array();
            }
            MaterialKind::Line { color, opacity } => {
                uniform.color = color.extend(*opacity).to_array();
                if material.tone_mapped {
                    flags |= FLAG_FOG;
                }
            }
            MaterialKind::Points { size_multiplier } => {
                uniform.effect_a = [*size_multiplier, 0.0, 0.0, 0.0];
            }
        }

        uniform.flags[0] = flags;
        uniform
    }
}

fn texture_flag(present: bool, flag: u32) -> u32 {
    if present { flag } else { 0 }
}
