use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::paint::Color;

/// Non-ambient lights beyond this count are ignored by the shaders.
pub const MAX_LIGHTS: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Light {
    Ambient { color: Color, intensity: f32 },
    /// Shines from `position` toward the origin.
    Directional { color: Color, intensity: f32, position: Vec3 },
    /// Inverse-square falloff.
    Point { color: Color, intensity: f32, position: Vec3 },
    /// Shaded as a point light; the cone only matters for shadows, which are not drawn.
    Spot { color: Color, intensity: f32, position: Vec3 },
}

impl Light {
    pub fn ambient(intensity: f32) -> Self {
        Light::Ambient { color: Color::WHITE, intensity }
    }

    pub fn directional(position: Vec3, intensity: f32) -> Self {
        Light::Directional { color: Color::WHITE, intensity, position }
    }

    pub fn point(position: Vec3, intensity: f32) -> Self {
        Light::Point { color: Color::WHITE, intensity, position }
    }

    pub fn spot(position: Vec3, intensity: f32) -> Self {
        Light::Spot { color: Color::WHITE, intensity, position }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz = direction toward the light (w = 0) or position (w = 1).
    pub vector: [f32; 4],
    /// rgb = color * intensity.
    pub color: [f32; 4],
}

/// Light block shared by every lit material in a layer.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightsUniform {
    /// rgb = summed ambient color * intensity.
    pub ambient: [f32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
    /// x = active light count.
    pub count: [u32; 4],
}

impl LightsUniform {
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut u = Self::zeroed();
        let mut n = 0usize;

        for light in lights {
            let (vector, color, intensity) = match *light {
                Light::Ambient { color, intensity } => {
                    for (dst, c) in u.ambient.iter_mut().zip([color.r, color.g, color.b]) {
                        *dst += c * intensity;
                    }
                    continue;
                }
                Light::Directional { color, intensity, position } => {
                    (position.normalize_or_zero().extend(0.0), color, intensity)
                }
                Light::Point { color, intensity, position }
                | Light::Spot { color, intensity, position } => (position.extend(1.0), color, intensity),
            };

            if n == MAX_LIGHTS {
                continue;
            }
            u.lights[n] = GpuLight {
                vector: vector.to_array(),
                color: [color.r * intensity, color.g * intensity, color.b * intensity, 0.0],
            };
            n += 1;
        }

        u.count[0] = n as u32;
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_lights_sum_and_others_pack_in_order() {
        let u = LightsUniform::from_lights(&[
            Light::ambient(0.7),
            Light::directional(Vec3::new(5.0, 10.0, 5.0), 1.5),
            Light::ambient(0.3),
            Light::point(Vec3::new(10.0, 10.0, 10.0), 1.0),
        ]);
        assert!((u.ambient[0] - 1.0).abs() < 1e-6);
        assert_eq!(u.count[0], 2);
        assert_eq!(u.lights[0].vector[3], 0.0);
        assert_eq!(u.lights[1].vector, [10.0, 10.0, 10.0, 1.0]);
    }

    #[test]
    fn extra_lights_are_dropped() {
        let lights = vec![Light::point(Vec3::ONE, 1.0); 6];
        assert_eq!(LightsUniform::from_lights(&lights).count[0], MAX_LIGHTS as u32);
    }
}
