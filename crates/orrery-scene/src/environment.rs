//! Environment lighting: the prefiltered radiance map and scene-wide light settings.

use glam::Vec3;
use orrery_assets::{LoadedTexture, TextureMapping};

use crate::color::hex_to_linear;

pub const ENVIRONMENT_WIDTH: u32 = 128;
pub const ENVIRONMENT_HEIGHT: u32 = 64;

/// Low-resolution equirectangular radiance map derived once from an HDR panorama.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    /// Linear RGBA radiance, row-major from the top.
    pub texels: Vec<[f32; 4]>,
    /// Mean radiance, used as diffuse ambient.
    pub ambient: Vec3,
}

impl EnvironmentMap {
    /// Box-filter `source` down to [`ENVIRONMENT_WIDTH`] x [`ENVIRONMENT_HEIGHT`].
    ///
    /// Returns `None` for textures that are not equirectangular panoramas.
    pub fn from_equirectangular(source: &LoadedTexture) -> Option<Self> {
        if source.mapping != TextureMapping::EquirectangularReflection
            || source.width == 0
            || source.height == 0
        {
            return None;
        }

        let (width, height) = (ENVIRONMENT_WIDTH, ENVIRONMENT_HEIGHT);
        let mut texels = Vec::with_capacity((width * height) as usize);
        let mut sum = Vec3::ZERO;

        for y in 0..height {
            let y0 = y * source.height / height;
            let y1 = ((y + 1) * source.height / height).max(y0 + 1);
            for x in 0..width {
                let x0 = x * source.width / width;
                let x1 = ((x + 1) * source.width / width).max(x0 + 1);

                let mut acc = Vec3::ZERO;
                let mut count = 0.0;
                for sy in y0..y1 {
                    for sx in x0..x1 {
                        let t = source.texel(sx, sy);
                        acc += Vec3::new(t[0], t[1], t[2]);
                        count += 1.0;
                    }
                }
                let mean = acc / count;
                sum += mean;
                texels.push([mean.x, mean.y, mean.z, 1.0]);
            }
        }

        Some(Self {
            width,
            height,
            texels,
            ambient: sum / (width * height) as f32,
        })
    }
}

/// Star light at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    /// Distance falloff exponent. Zero keeps constant intensity at any range.
    pub decay: f32,
    pub cast_shadow: bool,
    pub shadow_bias: f32,
    pub shadow_map_size: u32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: hex_to_linear(0xfff6d4),
            intensity: 3.8,
            decay: 0.0,
            cast_shadow: true,
            shadow_bias: -0.00008,
            shadow_map_size: 4096,
        }
    }
}

/// Scene-wide fog, ambient and tone-mapping values.
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub fog_color: Vec3,
    pub fog_density: f32,
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub exposure: f32,
    pub environment: Option<EnvironmentMap>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            fog_color: hex_to_linear(0x02040b),
            fog_density: 0.00042,
            ambient_color: hex_to_linear(0x1d2440),
            ambient_intensity: 0.55,
            exposure: 1.15,
            environment: None,
        }
    }
}

/// Exponential-squared fog factor: 0 at the eye, approaching 1 with distance.
pub fn fog_factor(density: f32, distance: f32) -> f32 {
    1.0 - (-(density * density) * distance * distance).exp()
}
