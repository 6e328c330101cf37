//! Shared GPU types and utilities used by the renderers.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::coords::{PixelRect, Rect, SurfaceMetrics};

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

/// Page-space → NDC mapping for the 2D renderers.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct PageUniform {
    /// Logical window size.
    pub viewport: [f32; 2],
    /// Document scroll offset, subtracted from every rect.
    pub scroll: [f32; 2],
}

impl PageUniform {
    pub(super) fn new(metrics: &SurfaceMetrics) -> Self {
        Self {
            viewport: [metrics.logical.width.max(1.0), metrics.logical.height.max(1.0)],
            scroll: [metrics.scroll.x, metrics.scroll.y],
        }
    }
}

/// Minimum binding size of a uniform of type `T`; `None` only for zero-sized types.
pub(super) fn uniform_size<T: Pod>() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<T>() as u64)
}

pub(super) fn uniform_entry<T: Pod>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: uniform_size::<T>(),
        },
        count: None,
    }
}

pub(super) fn uniform_buffer<T: Pod>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── pipelines ─────────────────────────────────────────────────────────────

pub(super) fn triangle_primitive(cull_mode: Option<wgpu::Face>) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

// ── scissor rect ──────────────────────────────────────────────────────────

/// Converts a document-space clip rect to a scissor rect on the target.
///
/// `clip = None` means the whole target. Returns `None` when nothing is left, in
/// which case the draw is skipped.
pub(super) fn document_clip_to_scissor(clip: Option<Rect>, metrics: &SurfaceMetrics) -> Option<PixelRect> {
    let (w, h) = metrics.physical_size();
    match clip {
        None => {
            let full = PixelRect::full(w.max(1), h.max(1));
            (!full.is_empty()).then_some(full)
        }
        Some(r) => PixelRect::clip(r.translated(-metrics.scroll).scaled(metrics.pixel_ratio), w, h),
    }
}
