/// Viewport size in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }
}

/// Everything needed to map page geometry onto the shared render surface for one frame.
///
/// `pixel_ratio` is the window scale factor multiplied by the adaptive render scale,
/// so it already reflects any resolution degradation applied under load.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceMetrics {
    /// Window size in logical pixels.
    pub logical: Viewport,
    /// Physical pixels per logical pixel on the render target.
    pub pixel_ratio: f32,
    /// Page scroll offset (document space, logical pixels).
    pub scroll: glam::Vec2,
}

impl SurfaceMetrics {
    pub fn new(logical: Viewport, pixel_ratio: f32, scroll: glam::Vec2) -> Self {
        Self { logical, pixel_ratio, scroll }
    }

    /// Render target size in physical pixels (never zero).
    pub fn physical_size(&self) -> (u32, u32) {
        let w = (self.logical.width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.logical.height * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }
}
