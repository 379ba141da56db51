//! Scene assembly and the mutation surface used by the controls.
//!
//! [`SceneComposer`] owns the arena and every piece of runtime state derived
//! from it. The build runs once, in a fixed order; afterwards the scene only
//! changes through the setters here, through [`update`](SceneComposer::update),
//! and through the exoplanet cloud swap.

use glam::Vec3;
use orrery_assets::{AssetBundle, AssetKey};
use orrery_config::SceneOptions;
use orrery_data::{DataSource, ExoplanetDataLoader, ExoplanetRecord, LoadOptions, LoadResult, ReloadTask};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::asteroids::spawn_asteroid_belt;
use crate::backdrop::spawn_starfield;
use crate::body::{CelestialBody, default_planets, spawn_body};
use crate::camera::Camera;
use crate::controls::OrbitController;
use crate::environment::{EnvironmentMap, Lighting, PointLight};
use crate::exoplanets;
use crate::nebula::spawn_nebula;
use crate::orbit::spawn_orbit_trail;
use crate::settings::{
    BLOOM_RADIUS_RANGE, BLOOM_STRENGTH_RANGE, BLOOM_THRESHOLD_RANGE, NEBULA_INTENSITY_RANGE,
    RESOLUTION_RANGE, Settings, clamp_to,
};
use crate::star::{StarHandle, spawn_star, star_light};
use crate::viewport::{PostSettings, Viewport};

/// Outcome of a finished exoplanet load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    pub source: DataSource,
    /// Records received, before the point limit.
    pub count: usize,
}

pub struct SceneComposer {
    pub(crate) arena: SceneArena,
    pub(crate) camera: Camera,
    pub(crate) controls: OrbitController,
    pub(crate) settings: Settings,
    max_pixel_ratio: f32,
    pub(crate) starfield: EntityId,
    pub(crate) star: StarHandle,
    light: PointLight,
    pub(crate) planets: Vec<CelestialBody>,
    trails_group: Option<EntityId>,
    pub(crate) nebula: Option<EntityId>,
    pub(crate) asteroids: Option<EntityId>,
    pub(crate) exoplanets: Option<EntityId>,
    lighting: Lighting,
    viewport: Viewport,
    post: Option<PostSettings>,
    rng: ChaCha8Rng,
    pub(crate) pending_reload: Option<ReloadTask>,
    reload_summary: Option<ReloadSummary>,
    pub(crate) disposed: bool,
}

impl SceneComposer {
    /// Build the full scene from loaded textures. Missing textures leave the
    /// affected materials untextured.
    pub fn build(options: &SceneOptions, settings: Settings, mut bundle: AssetBundle, seed: u64) -> Self {
        let mut arena = SceneArena::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut lighting = Lighting::default();
        if let Some(hdr) = bundle.take(AssetKey::EnvironmentHdr) {
            lighting.environment = EnvironmentMap::from_equirectangular(&hdr);
        }

        let starfield = spawn_starfield(&mut arena, bundle.get(AssetKey::Starfield).cloned(), seed);

        let star = spawn_star(
            &mut arena,
            options.star_radius,
            bundle.get(AssetKey::SunSurface).cloned(),
        );

        let planets_group = arena.spawn("planets", EntityKind::Group, None, Transform::default(), None);
        let configs = default_planets(options.orbit_scale, &bundle);
        let planets: Vec<CelestialBody> = configs
            .iter()
            .map(|config| spawn_body(&mut arena, planets_group, config))
            .collect();

        let trails_group = settings.planet_trails.then(|| {
            let group = arena.spawn("orbit-trails", EntityKind::Group, None, Transform::default(), None);
            for body in &planets {
                spawn_orbit_trail(&mut arena, group, &body.name, body.distance);
            }
            group
        });

        let star_position = arena.world_position(star.group);
        let nebula = options.enable_nebula.then(|| {
            spawn_nebula(
                &mut arena,
                settings.nebula_intensity,
                star_position,
                settings.nebula_visible,
            )
        });

        let asteroids = options.enable_asteroids.then(|| {
            spawn_asteroid_belt(
                &mut arena,
                &mut rng,
                bundle.get(AssetKey::AsteroidMap).cloned(),
                settings.asteroids_visible,
            )
        });

        let viewport = Viewport::compute(
            0.0,
            0.0,
            1.0,
            settings.resolution_multiplier,
            options.max_pixel_ratio,
        );
        let post = options
            .enable_postprocessing
            .then(|| PostSettings::new(&settings, &viewport));

        log::info!(
            "Scene built: {} entities, {} planets, nebula: {}, asteroids: {}, post-processing: {}",
            arena.len(),
            planets.len(),
            nebula.is_some(),
            asteroids.is_some(),
            post.is_some()
        );

        Self {
            arena,
            camera: Camera::default(),
            controls: OrbitController::default(),
            settings,
            max_pixel_ratio: options.max_pixel_ratio,
            starfield,
            star,
            light: star_light(),
            planets,
            trails_group,
            nebula,
            asteroids,
            exoplanets: None,
            lighting,
            viewport,
            post,
            rng,
            pending_reload: None,
            reload_summary: None,
            disposed: false,
        }
    }

    pub fn arena(&self) -> &SceneArena {
        &self.arena
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut OrbitController {
        &mut self.controls
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn star(&self) -> StarHandle {
        self.star
    }

    pub fn star_light(&self) -> &PointLight {
        &self.light
    }

    pub fn star_position(&self) -> Vec3 {
        self.arena.world_position(self.star.group)
    }

    pub fn starfield(&self) -> EntityId {
        self.starfield
    }

    pub fn planets(&self) -> &[CelestialBody] {
        &self.planets
    }

    pub fn nebula(&self) -> Option<EntityId> {
        self.nebula
    }

    pub fn asteroids(&self) -> Option<EntityId> {
        self.asteroids
    }

    pub fn exoplanet_cloud(&self) -> Option<EntityId> {
        self.exoplanets
    }

    pub fn orbit_trails(&self) -> Option<EntityId> {
        self.trails_group
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// `None` when post-processing is disabled.
    pub fn post(&self) -> Option<&PostSettings> {
        self.post.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Entities despawned since the last call, for GPU cleanup.
    pub fn take_released(&mut self) -> Vec<EntityId> {
        self.arena.drain_released()
    }

    /// Recompute the drawable size for a window of `logical_width` x `logical_height`.
    pub fn resize(&mut self, logical_width: f32, logical_height: f32, device_pixel_ratio: f32) {
        self.viewport = Viewport::compute(
            logical_width,
            logical_height,
            device_pixel_ratio,
            self.settings.resolution_multiplier,
            self.max_pixel_ratio,
        );
        self.camera.set_aspect_ratio(logical_width, logical_height);
        if let Some(post) = &mut self.post {
            post.resize(&self.viewport);
        }
    }

    pub fn set_resolution_multiplier(&mut self, value: f32) {
        self.settings.resolution_multiplier = clamp_to(value, &RESOLUTION_RANGE);
        let Viewport {
            logical_width,
            logical_height,
            device_pixel_ratio,
            ..
        } = self.viewport;
        self.resize(logical_width, logical_height, device_pixel_ratio);
    }

    pub fn set_bloom_strength(&mut self, value: f32) {
        self.settings.bloom_strength = clamp_to(value, &BLOOM_STRENGTH_RANGE);
        if let Some(post) = &mut self.post {
            post.bloom_strength = self.settings.bloom_strength;
        }
    }

    pub fn set_bloom_threshold(&mut self, value: f32) {
        self.settings.bloom_threshold = clamp_to(value, &BLOOM_THRESHOLD_RANGE);
        if let Some(post) = &mut self.post {
            post.bloom_threshold = self.settings.bloom_threshold;
        }
    }

    pub fn set_bloom_radius(&mut self, value: f32) {
        self.settings.bloom_radius = clamp_to(value, &BLOOM_RADIUS_RANGE);
        if let Some(post) = &mut self.post {
            post.bloom_radius = self.settings.bloom_radius;
        }
    }

    pub fn set_nebula_intensity(&mut self, value: f32) {
        self.settings.nebula_intensity = clamp_to(value, &NEBULA_INTENSITY_RANGE);
        let intensity = self.settings.nebula_intensity;
        if let Some(material) = self
            .nebula
            .and_then(|id| self.arena.drawable_mut(id))
            .and_then(|d| d.nebula_mut())
        {
            material.intensity = intensity;
        }
    }

    pub fn set_nebula_visibility(&mut self, visible: bool) {
        self.settings.nebula_visible = visible;
        if let Some(id) = self.nebula {
            self.arena.set_visible(id, visible);
        }
    }

    pub fn set_asteroid_visibility(&mut self, visible: bool) {
        self.settings.asteroids_visible = visible;
        if let Some(id) = self.asteroids {
            self.arena.set_visible(id, visible);
        }
    }

    pub fn set_orbit_trails_visibility(&mut self, visible: bool) {
        self.settings.planet_trails = visible;
        if let Some(id) = self.trails_group {
            self.arena.set_visible(id, visible);
        }
    }

    pub fn set_exoplanet_visibility(&mut self, visible: bool) {
        self.settings.exoplanets_visible = visible;
        if let Some(id) = self.exoplanets {
            self.arena.set_visible(id, visible);
        }
    }

    /// Replace the exoplanet cloud. `None` or an empty slice removes it.
    pub fn populate_cloud(&mut self, records: Option<&[ExoplanetRecord]>) {
        exoplanets::populate_cloud(
            &mut self.arena,
            &mut self.exoplanets,
            records,
            &mut self.rng,
            self.settings.exoplanets_visible,
        );
    }

    /// Start loading exoplanet data in the background, cancelling any load in flight.
    ///
    /// The result is applied at the start of a later [`update`](Self::update).
    pub fn begin_reload(&mut self, loader: ExoplanetDataLoader, options: LoadOptions) {
        if self.disposed {
            return;
        }
        if let Some(previous) = self.pending_reload.take() {
            previous.cancel();
        }
        match ReloadTask::spawn(loader, options) {
            Ok(task) => self.pending_reload = Some(task),
            Err(e) => log::warn!("Failed to start exoplanet reload: {e}"),
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.pending_reload.is_some()
    }

    /// Swap in a finished load. Called from the update; exposed for synchronous loads.
    pub fn apply_load_result(&mut self, result: LoadResult) {
        self.populate_cloud(Some(&result.records));
        log::debug!(
            "exoplanet cloud swapped: {} live entities in {} slots",
            self.arena.len(),
            self.arena.slot_count()
        );
        self.reload_summary = Some(ReloadSummary {
            source: result.source,
            count: result.records.len(),
        });
    }

    /// The most recent load outcome, once.
    pub fn take_reload_summary(&mut self) -> Option<ReloadSummary> {
        self.reload_summary.take()
    }

    /// Apply a finished background load, or drop a task whose worker died without one.
    pub(crate) fn poll_reload(&mut self) {
        let Some(task) = &mut self.pending_reload else {
            return;
        };
        // Sampled before the receive: a worker that exits between the two
        // checks has already sent its result.
        let finished = task.is_finished();
        if let Some(result) = task.try_take() {
            self.pending_reload = None;
            self.apply_load_result(result);
        } else if finished {
            log::warn!("Exoplanet reload ended without a result");
            self.pending_reload = None;
        }
    }

    /// Tear the scene down. Every entity is despawned and later updates do nothing.
    pub fn dispose(&mut self) {
        if let Some(task) = self.pending_reload.take() {
            task.cancel();
        }
        self.arena.clear();
        self.planets.clear();
        self.trails_group = None;
        self.nebula = None;
        self.asteroids = None;
        self.exoplanets = None;
        self.post = None;
        self.lighting.environment = None;
        self.disposed = true;
    }
}
