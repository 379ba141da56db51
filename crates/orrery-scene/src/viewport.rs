//! Drawable size bookkeeping and the post-processing state the renderer mirrors.

use crate::settings::Settings;

/// Logical window size together with the resolved pixel ratio and target size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub logical_width: f32,
    pub logical_height: f32,
    pub device_pixel_ratio: f32,
    pub pixel_ratio: f32,
    /// Render target size in physical pixels.
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// `pixel_ratio = min(dpr * multiplier, max_pixel_ratio)`; target sides are
    /// `round(logical * pixel_ratio)`, at least 1.
    pub fn compute(
        logical_width: f32,
        logical_height: f32,
        device_pixel_ratio: f32,
        multiplier: f32,
        max_pixel_ratio: f32,
    ) -> Self {
        let pixel_ratio = (device_pixel_ratio * multiplier).min(max_pixel_ratio);
        let side = |logical: f32| ((logical * pixel_ratio).round() as u32).max(1);
        Self {
            logical_width,
            logical_height,
            device_pixel_ratio,
            pixel_ratio,
            width: side(logical_width),
            height: side(logical_height),
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.logical_height > 0.0 {
            self.logical_width / self.logical_height
        } else {
            1.0
        }
    }

    /// Reciprocal of the target size, as the FXAA pass expects it.
    pub fn fxaa_texel(&self) -> [f32; 2] {
        [
            1.0 / (self.logical_width * self.pixel_ratio).max(1.0),
            1.0 / (self.logical_height * self.pixel_ratio).max(1.0),
        ]
    }
}

/// Bloom and anti-aliasing parameters. Present only when post-processing is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostSettings {
    pub bloom_strength: f32,
    pub bloom_threshold: f32,
    pub bloom_radius: f32,
    pub target_width: u32,
    pub target_height: u32,
    pub fxaa_texel: [f32; 2],
}

impl PostSettings {
    pub fn new(settings: &Settings, viewport: &Viewport) -> Self {
        Self {
            bloom_strength: settings.bloom_strength,
            bloom_threshold: settings.bloom_threshold,
            bloom_radius: settings.bloom_radius,
            target_width: viewport.width,
            target_height: viewport.height,
            fxaa_texel: viewport.fxaa_texel(),
        }
    }

    pub fn resize(&mut self, viewport: &Viewport) {
        self.target_width = viewport.width;
        self.target_height = viewport.height;
        self.fxaa_texel = viewport.fxaa_texel();
    }
}
