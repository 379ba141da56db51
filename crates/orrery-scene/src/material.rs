//! What an entity draws and how it is blended.

use std::sync::Arc;

use glam::Vec3;
use orrery_assets::LoadedTexture;

use crate::geometry::{InstancedMesh, MeshData, PointCloud};

pub type TextureRef = Arc<LoadedTexture>;

#[derive(Debug, Clone)]
pub enum Geometry {
    Mesh(Arc<MeshData>),
    Instanced(Arc<InstancedMesh>),
    /// Closed polyline; the renderer connects the last point back to the first.
    LineLoop(Arc<Vec<Vec3>>),
    Points(Arc<PointCloud>),
}

/// Which faces are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blending {
    Opaque,
    /// Standard alpha blending.
    Normal,
    Additive,
}

/// Fragment-stage variant of the lit surface shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialMode {
    Standard,
    /// Roughness map texels are inverted before scaling roughness, so a
    /// specular mask (bright oceans) becomes low roughness.
    InvertedRoughnessFromSpecular,
}

/// Physically-based lit surface.
#[derive(Debug, Clone)]
pub struct SurfaceMaterial {
    pub map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
    pub roughness_map: Option<TextureRef>,
    /// Linear base color multiplied with the map.
    pub color: Vec3,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub mode: MaterialMode,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            map: None,
            normal_map: None,
            roughness_map: None,
            color: Vec3::ONE,
            emissive: Vec3::ZERO,
            emissive_intensity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            mode: MaterialMode::Standard,
        }
    }
}

/// Rim glow: `intensity = (c - dot(n, v))^p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowMaterial {
    pub c: f32,
    pub p: f32,
    pub color: Vec3,
    /// Direction from the glow center toward the camera.
    pub view_vector: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NebulaMaterial {
    pub time: f32,
    pub intensity: f32,
    pub color_a: Vec3,
    pub color_b: Vec3,
    pub center: Vec3,
}

#[derive(Debug, Clone)]
pub enum MaterialKind {
    Surface(SurfaceMaterial),
    /// Unlit texture, used by the starfield.
    Basic {
        map: Option<TextureRef>,
        color: Vec3,
    },
    Glow(GlowMaterial),
    Nebula(NebulaMaterial),
    Line {
        color: Vec3,
        opacity: f32,
    },
    Points {
        size_multiplier: f32,
    },
}

#[derive(Debug, Clone)]
pub struct Material {
    pub kind: MaterialKind,
    pub side: Side,
    pub blending: Blending,
    pub depth_write: bool,
    /// Excluded from fog and tone mapping when false.
    pub tone_mapped: bool,
}

impl Material {
    pub fn opaque(kind: MaterialKind) -> Self {
        Self {
            kind,
            side: Side::Front,
            blending: Blending::Opaque,
            depth_write: true,
            tone_mapped: true,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_blending(mut self, blending: Blending) -> Self {
        self.blending = blending;
        self
    }

    pub fn without_depth_write(mut self) -> Self {
        self.depth_write = false;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.blending != Blending::Opaque
    }
}

#[derive(Debug, Clone)]
pub struct Drawable {
    pub geometry: Geometry,
    pub material: Material,
    /// Occludes the star light for other surfaces.
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Drawable {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_shadows(mut self) -> Self {
        self.cast_shadow = true;
        self.receive_shadow = true;
        self
    }

    pub fn surface(&self) -> Option<&SurfaceMaterial> {
        match &self.material.kind {
            MaterialKind::Surface(s) => Some(s),
            _ => None,
        }
    }

    pub fn nebula(&self) -> Option<&NebulaMaterial> {
        match &self.material.kind {
            MaterialKind::Nebula(n) => Some(n),
            _ => None,
        }
    }

    pub fn nebula_mut(&mut self) -> Option<&mut NebulaMaterial> {
        match &mut self.material.kind {
            MaterialKind::Nebula(n) => Some(n),
            _ => None,
        }
    }

    pub fn glow_mut(&mut self) -> Option<&mut GlowMaterial> {
        match &mut self.material.kind {
            MaterialKind::Glow(g) => Some(g),
            _ => None,
        }
    }
}
