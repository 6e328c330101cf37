use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::coords::{Rect, SurfaceMetrics};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    document_clip_to_scissor, premul_alpha_blend, triangle_primitive, uniform_buffer, uniform_entry,
    PageUniform, QuadVertex, QUAD_INDICES, QUAD_VERTICES,
};

/// A circle outline around a round viewport, optionally with a soft outer glow.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ring {
    /// Document-space center.
    pub center: Vec2,
    pub radius: f32,
    pub width: f32,
    pub color: Color,
    pub glow: Option<(f32, Color)>,
}

impl Ring {
    /// Outline inscribed in `rect`.
    pub fn around(rect: Rect, width: f32, color: Color) -> Self {
        Self {
            center: rect.center(),
            radius: rect.width().min(rect.height()) * 0.5,
            width,
            color,
            glow: None,
        }
    }

    pub fn with_glow(mut self, width: f32, color: Color) -> Self {
        self.glow = Some((width, color));
        self
    }
}

/// Renderer for [`Ring`]s. Edges are anti-aliased analytically in the fragment shader.
#[derive(Default)]
pub struct RingRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    page_ubo: Option<wgpu::Buffer>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl RingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        metrics: &SurfaceMetrics,
        rings: &[Ring],
    ) {
        let instances: Vec<RingInstance> = rings
            .iter()
            .filter(|r| r.radius > 0.0 && r.width > 0.0)
            .map(|r| {
                let (glow_width, glow) = r.glow.map_or((0.0, [0.0; 4]), |(w, c)| (w.max(0.0), premultiplied(c)));
                RingInstance {
                    center: r.center.to_array(),
                    dims: [r.radius, r.width.min(r.radius), glow_width, 0.0],
                    color: premultiplied(r.color),
                    glow,
                }
            })
            .collect();

        if instances.is_empty() {
            return;
        }
        let Some(scissor) = document_clip_to_scissor(None, metrics) else { return };

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx);
        self.ensure_instance_capacity(ctx, instances.len());

        let Some(page_ubo) = self.page_ubo.as_ref() else { return };
        ctx.queue.write_buffer(page_ubo, 0, bytemuck::bytes_of(&PageUniform::new(metrics)));
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&instances));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cybershift ring pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_scissor_rect(scissor.x, scissor.y, scissor.w, scissor.h);
        rpass.draw_indexed(0..6, 0, 0..instances.len() as u32);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cybershift ring shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/ring.wgsl").into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cybershift ring bgl"),
            entries: &[uniform_entry::<PageUniform>(0, wgpu::ShaderStages::VERTEX)],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cybershift ring pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cybershift ring pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), RingInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: triangle_primitive(None),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.page_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.page_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let page_ubo = uniform_buffer::<PageUniform>(ctx.device, "cybershift ring page ubo");
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cybershift ring bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: page_ubo.as_entire_binding(),
            }],
        });

        self.page_ubo = Some(page_ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cybershift ring quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cybershift ring quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(16);
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cybershift ring instance vbo"),
            size: (new_cap * std::mem::size_of::<RingInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

fn premultiplied(c: Color) -> [f32; 4] {
    [c.r * c.a, c.g * c.a, c.b * c.a, c.a]
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct RingInstance {
    center: [f32; 2],
    dims: [f32; 4],
    color: [f32; 4],
    glow: [f32; 4],
}

impl RingInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // center
        2 => Float32x4, // radius, border, glow width
        3 => Float32x4, // color
        4 => Float32x4  // glow color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RingInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_inscribed_in_rect() {
        let r = Ring::around(Rect::new(100.0, 200.0, 256.0, 256.0), 4.0, Color::WHITE);
        assert_eq!(r.center, Vec2::new(228.0, 328.0));
        assert_eq!(r.radius, 128.0);
    }

    #[test]
    fn premultiplies_alpha() {
        assert_eq!(premultiplied(Color::linear(1.0, 0.5, 0.0, 0.5)), [0.5, 0.25, 0.0, 0.5]);
    }
}
