/// Linear straight-alpha RGBA color.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::linear(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::linear(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::linear(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from components that are already linear.
    #[inline]
    pub const fn linear(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from straight sRGB bytes.
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::linear(
            srgb_to_linear(r as f32 / 255.0),
            srgb_to_linear(g as f32 / 255.0),
            srgb_to_linear(b as f32 / 255.0),
            1.0,
        )
    }

    /// Creates an opaque color from a `0xRRGGBB` sRGB literal, e.g. `Color::hex(0x39ff14)`.
    #[inline]
    pub fn hex(rgb: u32) -> Self {
        Self::from_srgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Parses `#rgb` / `#rrggbb` (leading `#` optional). Returns `None` on malformed input.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        let value = u32::from_str_radix(digits, 16).ok()?;
        match digits.len() {
            6 => Some(Self::hex(value)),
            3 => {
                let expand = |n: u32| ((n & 0xf) * 0x11) as u8;
                Some(Self::from_srgb_u8(expand(value >> 8), expand(value >> 4), expand(value)))
            }
            _ => None,
        }
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Component-wise linear interpolation in linear space.
    #[inline]
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self::linear(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_extremes_are_exact() {
        assert_eq!(Color::hex(0xffffff), Color::WHITE);
        assert_eq!(Color::hex(0x000000), Color::BLACK);
    }

    #[test]
    fn parse_hex_accepts_short_and_long_forms() {
        assert_eq!(Color::parse_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse_hex("39ff14"), Some(Color::hex(0x39ff14)));
        assert_eq!(Color::parse_hex("#12345"), None);
        assert_eq!(Color::parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn mid_grey_is_decoded_to_linear() {
        let c = Color::from_srgb_u8(128, 128, 128);
        assert!((c.r - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn lerp_halfway() {
        let c = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert_eq!(c, Color::linear(0.5, 0.5, 0.5, 1.0));
    }
}
