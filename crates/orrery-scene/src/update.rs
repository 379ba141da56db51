//! Per-frame state advancement.

use crate::body::CLOUD_SPIN_FACTOR;
use crate::composer::SceneComposer;

/// Speeds in the planet table are per 1/60 s step.
const STEPS_PER_SECOND: f32 = 60.0;
const STAR_SPIN: f32 = 0.12;
const BELT_SPIN: f32 = 0.12;
const CLOUD_DRIFT: f32 = 0.018;
const STARFIELD_DRIFT: f32 = 0.002;

impl SceneComposer {
    /// Advance the scene by `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        if self.disposed || delta <= 0.0 {
            return;
        }

        self.poll_reload();

        self.controls.update(&mut self.camera);

        let star_position = self.arena.world_position(self.star.group);
        let view = (self.camera.position - star_position).normalize_or_zero();
        if let Some(glow) = self.arena.drawable_mut(self.star.glow).and_then(|d| d.glow_mut()) {
            glow.view_vector = view;
        }

        self.arena.rotate_y(self.star.mesh, delta * STAR_SPIN);

        let step = delta * STEPS_PER_SECOND;
        for body in &self.planets {
            self.arena.rotate_y(body.pivot, body.orbit_speed * step);
            self.arena.rotate_y(body.mesh, body.rotation_speed * step);
            if let Some(clouds) = body.clouds {
                self.arena.rotate_y(clouds, body.rotation_speed * CLOUD_SPIN_FACTOR * step);
            }
            if let Some(moon) = body.moon {
                self.arena.rotate_y(moon.pivot, moon.orbit_speed * step);
                self.arena.rotate_y(moon.mesh, moon.rotation_speed * step);
            }
        }

        if let Some(material) = self
            .nebula
            .and_then(|id| self.arena.drawable_mut(id))
            .and_then(|d| d.nebula_mut())
        {
            material.time += delta;
            material.center = star_position;
        }

        if let Some(belt) = self.asteroids {
            self.arena.rotate_y(belt, delta * BELT_SPIN);
        }

        if let Some(cloud) = self.exoplanets.filter(|&id| self.arena.is_visible(id)) {
            self.arena.rotate_y(cloud, delta * CLOUD_DRIFT);
        }

        self.arena.rotate_y(self.starfield, delta * STARFIELD_DRIFT);
    }
}

#[cfg(test)]
mod tests {
    use crate::composer::tests::composer;
    use orrery_data::ExoplanetRecord;

    fn angle(scene: &crate::SceneComposer, id: crate::EntityId) -> f32 {
        scene.arena().get(id).unwrap().transform.rotation.y
    }

    #[test]
    fn test_orbit_angle_is_independent_of_tick_split() {
        let mut coarse = composer();
        let mut fine = composer();
        coarse.update(1.0);
        for _ in 0..100 {
            fine.update(0.01);
        }
        for (a, b) in coarse.planets().iter().zip(fine.planets()) {
            let expected = a.orbit_speed * 1.0 * 60.0;
            let ca = angle(&coarse, a.pivot);
            let fa = angle(&fine, b.pivot);
            assert!((ca - expected).abs() < 1e-5, "{}: {ca} vs {expected}", a.name);
            assert!((fa - expected).abs() < 1e-4, "{}: {fa} vs {expected}", a.name);
        }
    }

    #[test]
    fn test_pivot_angles_never_decrease() {
        let mut scene = composer();
        let earth = scene.planets()[1].clone();
        let moon = earth.moon.unwrap();
        let mut last = (angle(&scene, earth.pivot), angle(&scene, moon.pivot));
        for i in 0..50 {
            scene.update(0.001 * (i % 7) as f32 + 0.002);
            let now = (angle(&scene, earth.pivot), angle(&scene, moon.pivot));
            assert!(now.0 >= last.0 && now.1 >= last.1);
            last = now;
        }
    }

    #[test]
    fn test_zero_delta_changes_nothing() {
        let mut scene = composer();
        let earth = scene.planets()[1].clone();
        let camera = scene.camera().clone();
        scene.update(0.0);
        assert_eq!(angle(&scene, earth.pivot), 0.0);
        assert_eq!(scene.camera(), &camera);
    }

    #[test]
    fn test_clouds_and_moon_follow_their_speeds() {
        let mut scene = composer();
        scene.update(0.5);
        let earth = scene.planets()[1].clone();
        let clouds = angle(&scene, earth.clouds.unwrap());
        let moon = earth.moon.unwrap();
        assert!((clouds - earth.rotation_speed * 0.6 * 30.0).abs() < 1e-5);
        assert!((angle(&scene, moon.pivot) - moon.orbit_speed * 30.0).abs() < 1e-5);
        assert!((angle(&scene, moon.mesh) - moon.rotation_speed * 30.0).abs() < 1e-5);
    }

    #[test]
    fn test_nebula_time_and_glow_view_advance() {
        let mut scene = composer();
        scene.update(0.25);
        scene.update(0.25);
        let nebula = scene.nebula().unwrap();
        let material = *scene.arena().get(nebula).and_then(|e| e.drawable.as_ref()).and_then(|d| d.nebula()).unwrap();
        assert!((material.time - 0.5).abs() < 1e-6);

        let glow = scene.arena().get(scene.star().glow).and_then(|e| e.drawable.as_ref()).unwrap();
        let crate::MaterialKind::Glow(g) = &glow.material.kind else {
            panic!("glow material expected");
        };
        let expected = (scene.camera().position - scene.star_position()).normalize();
        assert!((g.view_vector - expected).length() < 1e-5);
    }

    #[test]
    fn test_hidden_cloud_does_not_spin() {
        let mut scene = composer();
        scene.populate_cloud(Some(&[ExoplanetRecord::default()]));
        let cloud = scene.exoplanet_cloud().unwrap();
        scene.update(1.0);
        assert!((angle(&scene, cloud) - 0.018).abs() < 1e-6);
        scene.set_exoplanet_visibility(false);
        scene.update(1.0);
        assert!((angle(&scene, cloud) - 0.018).abs() < 1e-6);
    }

    #[test]
    fn test_disposed_scene_ignores_updates() {
        let mut scene = composer();
        scene.dispose();
        scene.update(0.1);
        assert!(scene.arena().is_empty());
    }
}
