use glam::{Mat4, Vec2, Vec3};

use super::Ray;

/// Perspective camera looking at a target point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(position: Vec3, fov_y: f32) -> Self {
        Self { position, fov_y, ..Self::default() }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Right-handed projection with a `[0, 1]` depth range.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// World-space ray through a point in NDC (`x` right, `y` up, both in `[-1, 1]`).
    pub fn ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        let inv = self.view_proj(aspect).inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_at_target() {
        let cam = PerspectiveCamera::default();
        let ray = cam.ray(Vec2::ZERO, 1.5);
        assert!(ray.direction.abs_diff_eq(-Vec3::Z, 1e-4));
    }

    #[test]
    fn target_projects_to_ndc_origin() {
        let cam = PerspectiveCamera::new(Vec3::new(0.0, 0.0, 4.0), 30.0);
        let p = cam.view_proj(1.0).project_point3(Vec3::ZERO);
        assert!(p.truncate().abs_diff_eq(Vec2::ZERO, 1e-5));
        assert!(p.z > 0.0 && p.z < 1.0);
    }
}
