//! Perspective camera with reverse-Z projection.

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 80.0, 220.0),
            rotation: Quat::IDENTITY,
            fov_y: 60.0_f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 10_000.0,
        };
        camera.look_at(Vec3::ZERO);
        camera
    }
}

impl Camera {
    /// Orient the camera toward `target`, keeping +Y up.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() < f32::EPSILON {
            return;
        }
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        self.rotation = Quat::from_mat4(&view.inverse());
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Near maps to depth 1, far to depth 0.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_looks_at_origin() {
        let camera = Camera::default();
        let expected = (Vec3::ZERO - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-5);
        assert!((camera.fov_y - 60.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_z_depth() {
        let camera = Camera::default();
        let vp = camera.view_projection_matrix();
        let near_point = camera.position + camera.forward() * camera.near;
        let far_point = camera.position + camera.forward() * camera.far;
        let near_ndc = vp.project_point3(near_point);
        let far_ndc = vp.project_point3(far_point);
        assert!((near_ndc.z - 1.0).abs() < 1e-3, "near depth {}", near_ndc.z);
        assert!(far_ndc.z.abs() < 1e-3, "far depth {}", far_ndc.z);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::default();
        let ndc = camera.view_projection_matrix().project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn test_set_aspect_ratio_ignores_degenerate_sizes() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1600.0, 900.0);
        assert!((camera.aspect_ratio - 1600.0 / 900.0).abs() < 1e-6);
        camera.set_aspect_ratio(0.0, 900.0);
        assert!((camera.aspect_ratio - 1600.0 / 900.0).abs() < 1e-6);
    }
}
