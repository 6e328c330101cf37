use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::PerspectiveCamera;

const POLAR_EPS: f32 = 1e-3;

/// Orbit camera controls around a target point.
///
/// Drag input accumulates into a pending rotation which `update` bleeds into the
/// camera by `damping_factor` per frame, so motion eases out after release.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub auto_rotate: bool,
    /// Full turns per minute.
    pub auto_rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,

    pending_theta: f32,
    pending_phi: f32,
    pending_zoom: f32,
}

impl OrbitControls {
    /// Controls orbiting the camera's current target from its current position.
    pub fn new(camera: &PerspectiveCamera) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.length().max(f32::EPSILON);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        Self {
            enable_rotate: true,
            enable_zoom: true,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            target: camera.target,
            radius,
            theta,
            phi,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_zoom: 1.0,
        }
    }

    pub fn with_zoom(mut self, enabled: bool) -> Self {
        self.enable_zoom = enabled;
        self
    }

    pub fn with_auto_rotate(mut self, speed: f32) -> Self {
        self.auto_rotate = true;
        self.auto_rotate_speed = speed;
        self
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    pub fn polar(&self) -> f32 {
        self.phi
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Rotation from a pointer drag of `delta` pixels inside a viewport `height` pixels tall.
    pub fn rotate(&mut self, delta: Vec2, height: f32) {
        if !self.enable_rotate || height <= 0.0 {
            return;
        }
        self.pending_theta -= TAU * delta.x / height * self.rotate_speed;
        self.pending_phi -= TAU * delta.y / height * self.rotate_speed;
    }

    /// Wheel zoom; positive `steps` moves closer.
    pub fn zoom(&mut self, steps: f32) {
        if !self.enable_zoom || steps == 0.0 {
            return;
        }
        let scale = 0.95f32.powf(self.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.pending_zoom *= scale;
        } else {
            self.pending_zoom /= scale;
        }
    }

    /// Applies pending input and auto-rotation to `camera`.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, dt: f32) {
        if self.auto_rotate && dt.is_finite() && dt > 0.0 {
            self.theta -= TAU / 60.0 * self.auto_rotate_speed * dt;
        }

        let f = if self.enable_damping { self.damping_factor.clamp(0.0, 1.0) } else { 1.0 };
        self.theta += self.pending_theta * f;
        self.phi = (self.phi + self.pending_phi * f).clamp(POLAR_EPS, PI - POLAR_EPS);
        self.radius = (self.radius * self.pending_zoom).clamp(self.min_distance, self.max_distance);
        self.radius = self.radius.max(f32::EPSILON);

        if self.enable_damping {
            self.pending_theta *= 1.0 - f;
            self.pending_phi *= 1.0 - f;
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        self.pending_zoom = 1.0;

        let sin_phi = self.phi.sin();
        let offset = Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        );
        camera.target = self.target;
        camera.position = self.target + offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Vec3::new(0.0, 0.0, 5.0), 40.0)
    }

    #[test]
    fn derives_spherical_from_camera() {
        let c = OrbitControls::new(&camera());
        assert!((c.distance() - 5.0).abs() < 1e-5);
        assert!(c.azimuth().abs() < 1e-6);
        assert!((c.polar() - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn update_without_input_keeps_camera_in_place() {
        let mut cam = camera();
        let mut c = OrbitControls::new(&cam);
        c.update(&mut cam, 1.0 / 60.0);
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-4));
    }

    #[test]
    fn auto_rotate_turns_at_configured_rate() {
        let mut cam = camera();
        let mut c = OrbitControls::new(&cam).with_auto_rotate(0.5);
        for _ in 0..60 {
            c.update(&mut cam, 1.0);
        }
        // 0.5 turns per minute for one minute.
        assert!((c.azimuth() + PI).abs() < 1e-3);
    }

    #[test]
    fn drag_rotation_is_damped_then_settles() {
        let mut cam = camera();
        let mut c = OrbitControls::new(&cam);
        c.rotate(Vec2::new(-100.0, 0.0), 400.0);
        c.update(&mut cam, 1.0 / 60.0);
        let first = c.azimuth();
        for _ in 0..600 {
            c.update(&mut cam, 1.0 / 60.0);
        }
        assert!(first > 0.0 && first < c.azimuth());
        assert!((c.azimuth() - TAU * 0.25).abs() < 1e-3);
    }

    #[test]
    fn disabled_zoom_ignores_wheel() {
        let mut cam = camera();
        let mut c = OrbitControls::new(&cam).with_zoom(false);
        c.zoom(5.0);
        c.update(&mut cam, 1.0 / 60.0);
        assert!((c.distance() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn polar_angle_is_clamped_away_from_poles() {
        let mut cam = camera();
        let mut c = OrbitControls::new(&cam);
        c.enable_damping = false;
        c.rotate(Vec2::new(0.0, 10_000.0), 100.0);
        c.update(&mut cam, 1.0 / 60.0);
        assert!(c.polar() >= POLAR_EPS);
    }
}
