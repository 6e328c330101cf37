use glam::{Mat4, Vec2, Vec3};

/// Half-line with a normalized direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersects a `width × height` plane lying in the local XY plane of `model`,
    /// centred on the local origin, and returns the hit's UV.
    ///
    /// UV follows the plane geometry's layout: `u` grows with local x, `v` with local y,
    /// both in `[0, 1]`. Both faces count as hits.
    pub fn hit_plane_uv(&self, model: Mat4, width: f32, height: f32) -> Option<Vec2> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let inv = model.inverse();
        if !inv.is_finite() {
            return None;
        }
        let origin = inv.transform_point3(self.origin);
        let dir = inv.transform_vector3(self.direction);

        if dir.z.abs() < 1e-8 {
            return None;
        }
        let t = -origin.z / dir.z;
        if t < 0.0 {
            return None;
        }

        let hit = origin + dir * t;
        let uv = Vec2::new(hit.x / width + 0.5, hit.y / height + 0.5);
        let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);
        inside.then_some(uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_hit_on_centre_is_half_half() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let uv = ray.hit_plane_uv(Mat4::IDENTITY, 14.0, 10.0).unwrap();
        assert!(uv.abs_diff_eq(Vec2::splat(0.5), 1e-6));
    }

    #[test]
    fn top_right_corner_maps_to_uv_one() {
        let ray = Ray::new(Vec3::new(7.0, 5.0, 5.0), -Vec3::Z);
        let uv = ray.hit_plane_uv(Mat4::IDENTITY, 14.0, 10.0).unwrap();
        assert!(uv.abs_diff_eq(Vec2::ONE, 1e-6));
    }

    #[test]
    fn miss_outside_plane_or_behind_ray() {
        let outside = Ray::new(Vec3::new(20.0, 0.0, 5.0), -Vec3::Z);
        assert!(outside.hit_plane_uv(Mat4::IDENTITY, 14.0, 10.0).is_none());
        let away = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(away.hit_plane_uv(Mat4::IDENTITY, 14.0, 10.0).is_none());
    }

    #[test]
    fn tilted_plane_is_hit_in_local_space() {
        let model = Mat4::from_rotation_x(-0.1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let uv = ray.hit_plane_uv(model, 14.0, 10.0).unwrap();
        assert!(uv.abs_diff_eq(Vec2::splat(0.5), 1e-5));
    }
}
