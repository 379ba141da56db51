//! Planets and moons.
//!
//! Every planet hangs off a pivot under the planets group. The pivot's Y
//! rotation is the orbital angle; its X rotation tilts the orbit plane. The
//! planet mesh sits at `(distance, 0, 0)` in pivot space and spins about its
//! own Y axis. A moon repeats the same pivot/mesh pair one level down, under
//! the planet mesh.

use std::sync::Arc;

use glam::Vec3;
use orrery_assets::{AssetBundle, AssetKey};

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::geometry::{MeshData, uv_sphere};
use crate::material::{
    Blending, Drawable, Geometry, Material, MaterialKind, MaterialMode, Side, SurfaceMaterial,
    TextureRef,
};

pub const MOON_SEGMENTS: u32 = 48;
pub const CLOUD_SCALE: f32 = 1.01;
pub const CLOUD_OPACITY: f32 = 0.85;
/// Clouds spin at this fraction of their planet's rotation speed.
pub const CLOUD_SPIN_FACTOR: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct MoonConfig {
    pub radius: f32,
    pub distance: f32,
    pub orbit_speed: f32,
    pub rotation_speed: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub map: Option<TextureRef>,
}

#[derive(Debug, Clone)]
pub struct CelestialBodyConfig {
    pub name: String,
    pub radius: f32,
    pub distance: f32,
    pub rotation_speed: f32,
    pub orbit_speed: f32,
    pub tilt_degrees: f32,
    pub orbit_inclination_degrees: f32,
    pub roughness: f32,
    /// Falls back to 0.04 when unset.
    pub metalness: Option<f32>,
    pub map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
    pub specular_map: Option<TextureRef>,
    pub clouds_map: Option<TextureRef>,
    pub moon: Option<MoonConfig>,
}

impl CelestialBodyConfig {
    fn new(name: &str, radius: f32, distance: f32, rotation_speed: f32, orbit_speed: f32) -> Self {
        Self {
            name: name.to_string(),
            radius,
            distance,
            rotation_speed,
            orbit_speed,
            tilt_degrees: 0.0,
            orbit_inclination_degrees: 0.0,
            roughness: 1.0,
            metalness: None,
            map: None,
            normal_map: None,
            specular_map: None,
            clouds_map: None,
            moon: None,
        }
    }

    /// Sphere tessellation for this radius, never below 64.
    pub fn segments(&self) -> u32 {
        sphere_segments(self.radius)
    }
}

pub fn sphere_segments(radius: f32) -> u32 {
    ((radius * 8.0).floor() as u32).max(64)
}

/// Mercury, Earth (with clouds and a moon), Mars and Jupiter.
pub fn default_planets(orbit_scale: f32, bundle: &AssetBundle) -> Vec<CelestialBodyConfig> {
    let tex = |key: AssetKey| bundle.get(key).cloned();

    let mercury = CelestialBodyConfig {
        roughness: 0.9,
        metalness: Some(0.1),
        map: tex(AssetKey::MercuryMap),
        ..CelestialBodyConfig::new("Mercury", 5.0, orbit_scale * 0.7, 0.02, 0.0055)
    };

    let earth_radius = 9.0;
    let earth = CelestialBodyConfig {
        tilt_degrees: 23.5,
        roughness: 0.8,
        metalness: Some(0.08),
        map: tex(AssetKey::EarthMap),
        normal_map: tex(AssetKey::EarthNormal),
        specular_map: tex(AssetKey::EarthSpecular),
        clouds_map: tex(AssetKey::EarthClouds),
        moon: Some(MoonConfig {
            radius: earth_radius * 0.27,
            distance: earth_radius * 3.8,
            orbit_speed: 0.014,
            rotation_speed: 0.02,
            roughness: 0.9,
            metalness: 0.05,
            map: tex(AssetKey::MoonMap),
        }),
        ..CelestialBodyConfig::new("Earth", earth_radius, orbit_scale * 1.1, 0.045, 0.0032)
    };

    let mars = CelestialBodyConfig {
        roughness: 0.95,
        metalness: Some(0.05),
        map: tex(AssetKey::MarsMap),
        normal_map: tex(AssetKey::MarsNormal),
        ..CelestialBodyConfig::new("Mars", 6.2, orbit_scale * 1.55, 0.04, 0.0025)
    };

    let jupiter = CelestialBodyConfig {
        roughness: 0.6,
        metalness: Some(0.05),
        map: tex(AssetKey::JupiterMap),
        ..CelestialBodyConfig::new("Jupiter", 18.0, orbit_scale * 2.6, 0.12, 0.0016)
    };

    vec![mercury, earth, mars, jupiter]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonHandle {
    pub pivot: EntityId,
    pub mesh: EntityId,
    pub orbit_speed: f32,
    pub rotation_speed: f32,
}

/// Runtime handle of a built planet.
#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    pub name: String,
    pub pivot: EntityId,
    pub mesh: EntityId,
    pub clouds: Option<EntityId>,
    pub moon: Option<MoonHandle>,
    pub distance: f32,
    pub orbit_speed: f32,
    pub rotation_speed: f32,
}

/// Lit material for a planet, switching to the inverted-specular variant
/// when a specular map is supplied.
pub fn planet_material(config: &CelestialBodyConfig) -> SurfaceMaterial {
    let metalness = config.metalness.unwrap_or(0.04);
    match &config.specular_map {
        Some(specular) => SurfaceMaterial {
            map: config.map.clone(),
            normal_map: config.normal_map.clone(),
            roughness_map: Some(specular.clone()),
            roughness: config.roughness.min(0.95),
            metalness,
            mode: MaterialMode::InvertedRoughnessFromSpecular,
            ..Default::default()
        },
        None => SurfaceMaterial {
            map: config.map.clone(),
            normal_map: config.normal_map.clone(),
            roughness: config.roughness,
            metalness,
            ..Default::default()
        },
    }
}

/// Effective roughness of the inverted-specular variant for one specular texel.
pub fn inverted_roughness(roughness: f32, specular: f32) -> f32 {
    (roughness * (1.0 - specular)).clamp(0.04, 1.0)
}

fn sphere(mesh: MeshData) -> Geometry {
    Geometry::Mesh(Arc::new(mesh))
}

pub fn spawn_body(
    arena: &mut SceneArena,
    parent: EntityId,
    config: &CelestialBodyConfig,
) -> CelestialBody {
    let segments = config.segments();

    let pivot = arena.spawn(
        format!("{}-pivot", config.name),
        EntityKind::Pivot,
        Some(parent),
        Transform {
            rotation: Vec3::new(config.orbit_inclination_degrees.to_radians(), 0.0, 0.0),
            ..Default::default()
        },
        None,
    );

    let mesh = arena.spawn(
        config.name.clone(),
        EntityKind::Mesh,
        Some(pivot),
        Transform {
            translation: Vec3::new(config.distance, 0.0, 0.0),
            rotation: Vec3::new(0.0, 0.0, config.tilt_degrees.to_radians()),
            ..Default::default()
        },
        Some(
            Drawable::new(
                sphere(uv_sphere(config.radius, segments, segments)),
                Material::opaque(MaterialKind::Surface(planet_material(config))),
            )
            .with_shadows(),
        ),
    );

    let clouds = config.clouds_map.as_ref().map(|map| {
        let material = Material::opaque(MaterialKind::Surface(SurfaceMaterial {
            map: Some(map.clone()),
            opacity: CLOUD_OPACITY,
            ..Default::default()
        }))
        .with_side(Side::Double)
        .with_blending(Blending::Normal)
        .without_depth_write();
        arena.spawn(
            format!("{}-clouds", config.name),
            EntityKind::Mesh,
            Some(mesh),
            Transform::default(),
            Some(Drawable::new(
                sphere(uv_sphere(config.radius * CLOUD_SCALE, segments, segments)),
                material,
            )),
        )
    });

    let moon = config.moon.as_ref().map(|moon| {
        let moon_pivot = arena.spawn(
            format!("{}-moon-pivot", config.name),
            EntityKind::Pivot,
            Some(mesh),
            Transform::default(),
            None,
        );
        let material = Material::opaque(MaterialKind::Surface(SurfaceMaterial {
            map: moon.map.clone(),
            roughness: moon.roughness,
            metalness: moon.metalness,
            ..Default::default()
        }));
        let moon_mesh = arena.spawn(
            format!("{}-moon", config.name),
            EntityKind::Mesh,
            Some(moon_pivot),
            Transform::from_translation(Vec3::new(moon.distance, 0.0, 0.0)),
            Some(
                Drawable::new(sphere(uv_sphere(moon.radius, MOON_SEGMENTS, MOON_SEGMENTS)), material)
                    .with_shadows(),
            ),
        );
        MoonHandle {
            pivot: moon_pivot,
            mesh: moon_mesh,
            orbit_speed: moon.orbit_speed,
            rotation_speed: moon.rotation_speed,
        }
    });

    CelestialBody {
        name: config.name.clone(),
        pivot,
        mesh,
        clouds,
        moon,
        distance: config.distance,
        orbit_speed: config.orbit_speed,
        rotation_speed: config.rotation_speed,
    }
}
