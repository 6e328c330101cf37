use glam::{Mat4, Vec4};

use super::{Rect, SurfaceMetrics};

/// Integer rectangle on the render target, in physical pixels.
///
/// Always lies inside the target it was clipped against, so it can be handed to
/// `set_viewport` / `set_scissor_rect` without further validation.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// The whole target.
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Clips a physical-pixel float rectangle to a `width × height` target.
    ///
    /// Edges are rounded outward so a fractional element still covers every pixel it
    /// touches. Returns `None` when nothing remains.
    pub fn clip(rect: Rect, width: u32, height: u32) -> Option<Self> {
        if !rect.is_finite() || rect.is_empty() {
            return None;
        }
        let min = rect.min();
        let max = rect.max();

        let x0 = min.x.floor().clamp(0.0, width as f32) as u32;
        let y0 = min.y.floor().clamp(0.0, height as f32) as u32;
        let x1 = max.x.ceil().clamp(0.0, width as f32) as u32;
        let y1 = max.y.ceil().clamp(0.0, height as f32) as u32;

        let clipped = Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0));
        if clipped.is_empty() { None } else { Some(clipped) }
    }
}

/// Where a tracked element lands on the render target this frame.
///
/// `full` is the element's complete rectangle in physical pixels and may extend past
/// the target edges; `visible` is the part actually on the target. The viewport and
/// scissor are both set to `visible`, and [`crop_matrix`](Self::crop_matrix) shifts the
/// projection so the scene keeps the framing it would have on the full rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportRect {
    pub full: Rect,
    pub visible: PixelRect,
}

impl ViewportRect {
    /// Maps an element rectangle in document space onto the render target.
    ///
    /// Returns `None` for zero-size elements and for elements scrolled completely out
    /// of view. Neither case is an error: the viewport is simply not drawn this frame.
    pub fn from_document(rect: Rect, metrics: &SurfaceMetrics) -> Option<Self> {
        if rect.is_empty() || !rect.is_finite() {
            return None;
        }
        let full = rect.translated(-metrics.scroll).scaled(metrics.pixel_ratio);
        let (w, h) = metrics.physical_size();
        let visible = PixelRect::clip(full, w, h)?;
        Some(Self { full, visible })
    }

    /// Aspect ratio of the full element, which is what the camera should see.
    #[inline]
    pub fn aspect(&self) -> f32 {
        if self.full.height() > 0.0 { self.full.width() / self.full.height() } else { 1.0 }
    }

    /// Clip-space transform mapping the visible sub-rectangle of `full` onto the
    /// whole viewport. Identity when the element is entirely visible.
    pub fn crop_matrix(&self) -> Mat4 {
        let f = self.full;
        let v = Rect::new(
            self.visible.x as f32,
            self.visible.y as f32,
            self.visible.w as f32,
            self.visible.h as f32,
        );

        // Visible edges expressed in the full rectangle's NDC (+Y up).
        let x0 = 2.0 * (v.min().x - f.min().x) / f.width() - 1.0;
        let x1 = 2.0 * (v.max().x - f.min().x) / f.width() - 1.0;
        let y_top = 1.0 - 2.0 * (v.min().y - f.min().y) / f.height();
        let y_bottom = 1.0 - 2.0 * (v.max().y - f.min().y) / f.height();

        let sx = 2.0 / (x1 - x0);
        let sy = 2.0 / (y_top - y_bottom);
        let tx = -(x1 + x0) / (x1 - x0);
        let ty = -(y_top + y_bottom) / (y_top - y_bottom);

        Mat4::from_cols(
            Vec4::new(sx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, sy, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(tx, ty, 0.0, 1.0),
        )
    }
}
