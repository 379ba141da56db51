//! Scene graph for the orrery: the entity arena, the builders for each part
//! of the solar system, the exoplanet mapper and the per-frame update.

pub mod arena;
pub mod asteroids;
pub mod backdrop;
pub mod body;
pub mod camera;
pub mod color;
pub mod composer;
pub mod controls;
pub mod environment;
pub mod exoplanets;
pub mod geometry;
pub mod material;
pub mod nebula;
pub mod orbit;
pub mod settings;
pub mod star;
pub mod update;
pub mod viewport;

pub use arena::{Entity, EntityId, EntityKind, SceneArena, Transform};
pub use body::{CelestialBody, CelestialBodyConfig, MoonConfig, MoonHandle};
pub use camera::Camera;
pub use composer::{ReloadSummary, SceneComposer};
pub use controls::OrbitController;
pub use environment::{EnvironmentMap, Lighting, PointLight};
pub use geometry::{InstancedMesh, MeshData, PointCloud};
pub use material::{
    Blending, Drawable, Geometry, GlowMaterial, Material, MaterialKind, MaterialMode,
    NebulaMaterial, Side, SurfaceMaterial, TextureRef,
};
pub use settings::Settings;
pub use star::StarHandle;
pub use viewport::{PostSettings, Viewport};
