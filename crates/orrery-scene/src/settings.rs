//! Runtime settings driven by the control surface.

use std::ops::RangeInclusive;

use orrery_config::SceneOptions;

pub const RESOLUTION_RANGE: RangeInclusive<f32> = 0.5..=2.0;
pub const BLOOM_STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=4.0;
pub const BLOOM_THRESHOLD_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const BLOOM_RADIUS_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const NEBULA_INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=3.0;

/// Clamp into `range`, mapping NaN to the lower bound.
pub fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

/// The single source of truth for user-adjustable values.
///
/// Owned by the scene composer; only its setters write here.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub resolution_multiplier: f32,
    pub bloom_strength: f32,
    pub bloom_threshold: f32,
    pub bloom_radius: f32,
    pub nebula_intensity: f32,
    pub nebula_visible: bool,
    pub asteroids_visible: bool,
    pub exoplanets_visible: bool,
    pub planet_trails: bool,
}

impl Settings {
    pub fn from_options(options: &SceneOptions) -> Self {
        Self {
            resolution_multiplier: clamp_to(options.resolution_multiplier, &RESOLUTION_RANGE),
            nebula_visible: options.enable_nebula,
            asteroids_visible: options.enable_asteroids,
            ..Default::default()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resolution_multiplier: 1.0,
            bloom_strength: 1.45,
            bloom_threshold: 0.68,
            bloom_radius: 0.42,
            nebula_intensity: 1.2,
            nebula_visible: true,
            asteroids_visible: true,
            exoplanets_visible: true,
            planet_trails: true,
        }
    }
}
