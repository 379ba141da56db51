//! Starfield backdrop: a large inward-facing sphere, textured either with the
//! loaded sky panorama or a procedurally baked one.

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use glam::Vec3;
use orrery_assets::{
    ColorSpace, LoadedTexture, TextureMapping, TexturePixels, WrapMode,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::geometry::uv_sphere;
use crate::material::{Drawable, Geometry, Material, MaterialKind, Side, TextureRef};

pub const STARFIELD_RADIUS: f32 = 4000.0;
pub const STARFIELD_SEGMENTS: u32 = 64;

const BAKE_WIDTH: u32 = 2048;
const BAKE_HEIGHT: u32 = 1024;
const BAKE_STAR_COUNT: u32 = 12_000;

/// A single star of the procedural catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct StarPoint {
    /// Unit direction on the sky sphere.
    pub direction: Vec3,
    /// In `[0, 1]`; most stars are dim.
    pub brightness: f32,
    /// sRGB color from the star's temperature.
    pub color: [f32; 3],
}

/// Deterministic star catalogue for a seed.
pub fn generate_stars(seed: u64, count: u32) -> Vec<StarPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let theta = rng.random::<f32>() * TAU;
            let phi = (1.0 - 2.0 * rng.random::<f32>()).acos();
            let direction = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());

            let brightness = rng.random::<f32>().powf(4.0);
            let color = blackbody_to_rgb(2000.0 + brightness * 28_000.0);
            StarPoint {
                direction,
                brightness,
                color,
            }
        })
        .collect()
}

/// Approximate sRGB color of a blackbody at `temperature_k`.
pub fn blackbody_to_rgb(temperature_k: f32) -> [f32; 3] {
    let t = temperature_k / 100.0;
    let r = if t <= 66.0 {
        1.0
    } else {
        (329.698_73 * (t - 60.0).powf(-0.133_204_76) / 255.0).clamp(0.0, 1.0)
    };
    let g = if t <= 66.0 {
        (99.470_8 * t.ln() - 161.119_57).clamp(0.0, 255.0) / 255.0
    } else {
        (288.122_17 * (t - 60.0).powf(-0.075_514_85) / 255.0).clamp(0.0, 1.0)
    };
    let b = if t >= 66.0 {
        1.0
    } else if t <= 19.0 {
        0.0
    } else {
        (138.517_73 * (t - 10.0).ln() - 305.044_8).clamp(0.0, 255.0) / 255.0
    };
    [r, g, b]
}

/// Texture coordinates of `direction` on a sphere built by [`uv_sphere`].
pub fn direction_to_uv(direction: Vec3) -> (f32, f32) {
    let d = direction.normalize_or_zero();
    let phi = d.y.clamp(-1.0, 1.0).acos();
    let theta = d.z.atan2(-d.x).rem_euclid(TAU);
    (theta / TAU, phi / PI)
}

/// Splat a star catalogue into an equirectangular sRGB texture.
pub fn bake_equirectangular(stars: &[StarPoint], width: u32, height: u32) -> LoadedTexture {
    let mut pixels = vec![[0.0_f32; 3]; (width * height) as usize];

    for star in stars {
        let (u, v) = direction_to_uv(star.direction);
        let px = ((u * width as f32) as u32).min(width - 1);
        let py = ((v * height as f32) as u32).min(height - 1);

        let b = star.brightness * 8.0 + 0.4;
        add(&mut pixels[(py * width + px) as usize], star.color, b);

        if star.brightness > 0.3 {
            let glow = star.brightness * 0.6;
            // Horizontal neighbours wrap around the seam.
            let left = (px + width - 1) % width;
            let right = (px + 1) % width;
            add(&mut pixels[(py * width + left) as usize], star.color, glow);
            add(&mut pixels[(py * width + right) as usize], star.color, glow);
            if py > 0 {
                add(&mut pixels[((py - 1) * width + px) as usize], star.color, glow);
            }
            if py + 1 < height {
                add(&mut pixels[((py + 1) * width + px) as usize], star.color, glow);
            }
        }
    }

    let mut bytes = Vec::with_capacity(pixels.len() * 4);
    for p in &pixels {
        bytes.extend(p.iter().map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8));
        bytes.push(255);
    }

    LoadedTexture {
        pixels: TexturePixels::Rgba8(bytes),
        width,
        height,
        color_space: ColorSpace::Srgb,
        wrap_s: WrapMode::Repeat,
        wrap_t: WrapMode::ClampToEdge,
        anisotropy: 16,
        generate_mipmaps: true,
        flip_y: false,
        mapping: TextureMapping::Uv,
        source: "procedural://starfield".to_string(),
    }
}

fn add(pixel: &mut [f32; 3], color: [f32; 3], amount: f32) {
    for (p, c) in pixel.iter_mut().zip(color) {
        *p = (*p + c * amount).min(1.0);
    }
}

/// Spawn the backdrop sphere. Without a texture a sky is baked from `seed`.
pub fn spawn_starfield(arena: &mut SceneArena, texture: Option<TextureRef>, seed: u64) -> EntityId {
    let map = texture.unwrap_or_else(|| {
        log::info!("starfield texture unavailable, baking a procedural sky");
        let stars = generate_stars(seed, BAKE_STAR_COUNT);
        Arc::new(bake_equirectangular(&stars, BAKE_WIDTH, BAKE_HEIGHT))
    });

    let mesh = uv_sphere(STARFIELD_RADIUS, STARFIELD_SEGMENTS, STARFIELD_SEGMENTS);
    let mut material = Material::opaque(MaterialKind::Basic {
        map: Some(map),
        color: Vec3::ONE,
    })
    .with_side(Side::Back)
    .without_depth_write();
    material.tone_mapped = false;

    arena.spawn(
        "starfield",
        EntityKind::Mesh,
        None,
        Transform::default(),
        Some(Drawable::new(Geometry::Mesh(Arc::new(mesh)), material)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_produces_same_catalogue() {
        assert_eq!(generate_stars(7, 500), generate_stars(7, 500));
        assert_ne!(generate_stars(7, 500), generate_stars(8, 500));
    }

    #[test]
    fn test_catalogue_values_are_valid() {
        for (i, star) in generate_stars(42, 2000).iter().enumerate() {
            assert!((star.direction.length() - 1.0).abs() < 1e-4, "star {i} not on the unit sphere");
            assert!((0.0..=1.0).contains(&star.brightness), "star {i} brightness {}", star.brightness);
        }
    }

    #[test]
    fn test_blackbody_hot_is_bluer_than_cool() {
        let cool = blackbody_to_rgb(3000.0);
        let hot = blackbody_to_rgb(20_000.0);
        assert!(hot[2] > cool[2]);
        assert!(cool[0] >= hot[0]);
    }

    #[test]
    fn test_direction_to_uv_matches_sphere_vertices() {
        let mesh = uv_sphere(1.0, 16, 8);
        // Skip the pole rows, whose u is offset.
        for (pos, uv) in mesh.positions.iter().zip(&mesh.uvs).skip(17).take(17 * 7) {
            let (u, v) = direction_to_uv(Vec3::from_array(*pos));
            let du = (u - uv[0]).abs();
            assert!(du < 1e-4 || (du - 1.0).abs() < 1e-4, "u {u} vs {}", uv[0]);
            assert!((v - uv[1]).abs() < 1e-4, "v {v} vs {}", uv[1]);
        }
    }

    #[test]
    fn test_bake_places_star_pixels() {
        let star = StarPoint {
            direction: Vec3::new(-1.0, 0.0, 0.0),
            brightness: 1.0,
            color: [1.0, 1.0, 1.0],
        };
        let texture = bake_equirectangular(&[star], 64, 32);
        // u = 0 and v = 0.5 for -X.
        let texel = texture.texel(0, 16);
        assert!(texel[0] > 0.99, "star texel {texel:?}");
        assert!(texture.texel(32, 16)[0] < 0.01);
    }

    #[test]
    fn test_spawn_starfield_bakes_when_texture_missing() {
        let mut arena = SceneArena::new();
        let id = spawn_starfield(&mut arena, None, 1);
        let drawable = arena.get(id).and_then(|e| e.drawable.as_ref()).unwrap();
        assert_eq!(drawable.material.side, Side::Back);
        assert!(!drawable.material.depth_write);
        assert!(!drawable.material.tone_mapped);
        match &drawable.material.kind {
            MaterialKind::Basic { map: Some(map), .. } => {
                assert_eq!(map.width, BAKE_WIDTH);
                assert_eq!(map.source, "procedural://starfield");
            }
            other => panic!("unexpected material {other:?}"),
        }
    }
}
