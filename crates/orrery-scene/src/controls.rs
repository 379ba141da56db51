//! Damped orbit camera controller.
//!
//! The camera orbits `target` on a sphere. Input accumulates angular deltas
//! that are applied a fraction at a time on every [`update`](OrbitController::update),
//! so motion eases out after the mouse is released.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::camera::Camera;

const EPS: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    pub target: Vec3,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar_angle: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// Pending azimuth change (radians).
    delta_theta: f32,
    /// Pending polar change (radians).
    delta_phi: f32,
    /// Pending distance multiplier.
    scale: f32,
    dragging: bool,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            damping_factor: 0.035,
            min_distance: 45.0,
            max_distance: 2200.0,
            max_polar_angle: PI * 0.48,
            auto_rotate: true,
            auto_rotate_speed: 0.18,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            dragging: false,
        }
    }
}

impl OrbitController {
    /// Azimuth step added per update while idle. One full turn takes
    /// `60 * 60 / auto_rotate_speed` updates.
    fn auto_rotation_angle(&self) -> f32 {
        TAU / 60.0 / 60.0 * self.auto_rotate_speed
    }

    /// Rotate by a mouse drag of `(dx, dy)` pixels in a viewport `height` pixels tall.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, height: f32) {
        let height = height.max(1.0);
        self.delta_theta -= TAU * dx / height * self.rotate_speed;
        self.delta_phi -= TAU * dy / height * self.rotate_speed;
    }

    /// Zoom by wheel `steps`; positive moves closer.
    pub fn zoom(&mut self, steps: f32) {
        let factor = 0.95_f32.powf(self.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.scale *= factor;
        } else if steps < 0.0 {
            self.scale /= factor;
        }
    }

    /// Auto-rotation pauses while a drag is in progress.
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Advance one step and write the new pose into `camera`.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        if self.auto_rotate && !self.dragging {
            self.delta_theta -= self.auto_rotation_angle();
        }

        theta += self.delta_theta * self.damping_factor;
        phi += self.delta_phi * self.damping_factor;
        phi = phi.clamp(0.0, self.max_polar_angle).clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        self.delta_theta *= 1.0 - self.damping_factor;
        self.delta_phi *= 1.0 - self.damping_factor;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_clamped() {
        let mut controls = OrbitController::default();
        let mut camera = Camera::default();
        for _ in 0..200 {
            controls.zoom(10.0);
            controls.update(&mut camera);
        }
        let d = camera.position.length();
        assert!((d - 45.0).abs() < 1e-3, "zoomed in to {d}");

        for _ in 0..400 {
            controls.zoom(-10.0);
            controls.update(&mut camera);
        }
        let d = camera.position.length();
        assert!((d - 2200.0).abs() < 1e-2, "zoomed out to {d}");
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut controls = OrbitController::default();
        let mut camera = Camera::default();
        controls.rotate_by_pixels(0.0, -5000.0, 600.0);
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        let phi = (camera.position.y / camera.position.length()).acos();
        assert!(phi <= PI * 0.48 + 1e-4, "polar angle {phi} below the horizon limit");
    }

    #[test]
    fn test_auto_rotate_advances_azimuth() {
        let mut controls = OrbitController::default();
        let mut camera = Camera::default();
        let before = camera.position;
        controls.update(&mut camera);
        assert_ne!(camera.position, before);
        assert!((camera.position.length() - before.length()).abs() < 1e-3);
    }

    #[test]
    fn test_damping_eases_out() {
        let mut controls = OrbitController {
            auto_rotate: false,
            ..Default::default()
        };
        let mut camera = Camera::default();
        controls.rotate_by_pixels(300.0, 0.0, 600.0);

        let angle = |c: &Camera| c.position.x.atan2(c.position.z);
        let mut last = angle(&camera);
        let mut steps = Vec::new();
        for _ in 0..10 {
            controls.update(&mut camera);
            let now = angle(&camera);
            steps.push((now - last).abs());
            last = now;
        }
        assert!(steps.windows(2).all(|w| w[1] < w[0]), "steps should shrink: {steps:?}");
    }

    #[test]
    fn test_camera_keeps_looking_at_target() {
        let mut controls = OrbitController::default();
        let mut camera = Camera::default();
        controls.rotate_by_pixels(120.0, 40.0, 600.0);
        controls.update(&mut camera);
        let expected = (controls.target - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-4);
    }
}
