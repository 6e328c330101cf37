use bytemuck::{Pod, Zeroable};

use crate::paint::Color;
use crate::render::RenderCtx;

use super::common::triangle_primitive;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BackdropInstance {
    color: [f32; 4],
}

impl BackdropInstance {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BackdropInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Solid layer backgrounds.
///
/// Replaces whatever is under the scissor rect, so a background also clears the
/// region a viewport occupies before its meshes are drawn.
#[derive(Default)]
pub struct BackdropRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    instance_buffer: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl BackdropRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads one color per layer; `draw(pass, i)` then paints `colors[i]`.
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>, colors: &[Color]) {
        self.ensure_pipeline(ctx);
        if colors.is_empty() {
            return;
        }
        self.ensure_instance_capacity(ctx, colors.len());
        let Some(buffer) = self.instance_buffer.as_ref() else { return };

        let instances: Vec<BackdropInstance> =
            colors.iter().map(|c| BackdropInstance { color: c.to_array() }).collect();
        ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(&instances));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, index: usize) {
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(buffer) = self.instance_buffer.as_ref() else { return };
        if index >= self.instance_capacity {
            return;
        }

        let i = index as u32;
        pass.set_pipeline(pipeline);
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..3, i..i + 1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cybershift backdrop shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/backdrop.wgsl").into()),
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cybershift backdrop pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cybershift backdrop pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[BackdropInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
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
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, needed: usize) {
        if self.instance_buffer.is_some() && self.instance_capacity >= needed {
            return;
        }
        let capacity = needed.next_power_of_two().max(4);
        self.instance_buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cybershift backdrop instances"),
            size: (capacity * std::mem::size_of::<BackdropInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = capacity;
    }
}
