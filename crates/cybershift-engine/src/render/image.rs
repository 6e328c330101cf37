use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::asset::ImageData;
use crate::coords::{Rect, SurfaceMetrics};
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    document_clip_to_scissor, premul_alpha_blend, triangle_primitive, uniform_buffer, uniform_entry,
    PageUniform, QuadVertex, QUAD_INDICES, QUAD_VERTICES,
};

/// One image placed on the page, scaled to cover `rect` and cropped to it.
#[derive(Debug, Clone, Copy)]
pub struct ImageDraw<'a> {
    /// Cache key; textures are uploaded once per key.
    pub key: &'a str,
    pub image: &'a ImageData,
    pub rect: Rect,
    pub clip: Option<Rect>,
    pub opacity: f32,
}

/// UV sub-rectangle `(offset, scale)` that makes an image cover a box of
/// `box_aspect` without distortion, cropping the excess symmetrically.
pub fn cover_uv(image_aspect: f32, box_aspect: f32) -> [f32; 4] {
    if !(image_aspect > 0.0 && box_aspect > 0.0) {
        return [0.0, 0.0, 1.0, 1.0];
    }
    if image_aspect > box_aspect {
        let sx = box_aspect / image_aspect;
        [(1.0 - sx) * 0.5, 0.0, sx, 1.0]
    } else {
        let sy = image_aspect / box_aspect;
        [0.0, (1.0 - sy) * 0.5, 1.0, sy]
    }
}

struct GpuImage {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Textured quad renderer for page images.
#[derive(Default)]
pub struct ImageRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    page_layout: Option<wgpu::BindGroupLayout>,
    image_layout: Option<wgpu::BindGroupLayout>,
    page_bind_group: Option<wgpu::BindGroup>,
    page_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    images: HashMap<String, GpuImage>,
    rejected: HashSet<String>,
}

impl ImageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        metrics: &SurfaceMetrics,
        draws: &[ImageDraw<'_>],
    ) {
        if draws.is_empty() {
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx);

        for d in draws {
            self.ensure_image(ctx, d.key, d.image);
        }

        let visible: Vec<(&ImageDraw<'_>, ImageInstance)> = draws
            .iter()
            .filter(|d| !d.rect.is_empty() && d.opacity > 0.0 && self.images.contains_key(d.key))
            .map(|d| {
                let inst = ImageInstance {
                    origin: d.rect.min().to_array(),
                    size: d.rect.size.to_array(),
                    uv_rect: cover_uv(d.image.aspect(), d.rect.width() / d.rect.height()),
                    opacity: d.opacity.min(1.0),
                    _pad: [0.0; 3],
                };
                (d, inst)
            })
            .collect();

        if visible.is_empty() {
            return;
        }

        self.ensure_instance_capacity(ctx, visible.len());

        let Some(page_ubo) = self.page_ubo.as_ref() else { return };
        ctx.queue.write_buffer(page_ubo, 0, bytemuck::bytes_of(&PageUniform::new(metrics)));
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        let raw: Vec<ImageInstance> = visible.iter().map(|(_, inst)| *inst).collect();
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&raw));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(page_bind_group) = self.page_bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cybershift image pass"),
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
        rpass.set_bind_group(0, page_bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for (i, (d, _)) in visible.iter().enumerate() {
            let Some(img) = self.images.get(d.key) else { continue };
            let clip = Some(d.clip.map_or(d.rect, |c| c.intersect(d.rect).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))));
            let Some(s) = document_clip_to_scissor(clip, metrics) else { continue };
            rpass.set_scissor_rect(s.x, s.y, s.w, s.h);
            rpass.set_bind_group(1, &img.bind_group, &[]);
            rpass.draw_indexed(0..6, 0, i as u32..i as u32 + 1);
        }
    }

    fn ensure_image(&mut self, ctx: &RenderCtx<'_>, key: &str, image: &ImageData) {
        if self.images.contains_key(key) || self.rejected.contains(key) {
            return;
        }
        let Some(layout) = self.image_layout.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };

        let max = ctx.max_texture_dimension;
        let expected = image.width as usize * image.height as usize * 4;
        if image.width == 0 || image.height == 0 || image.width > max || image.height > max || image.rgba.len() != expected {
            log::warn!("image {key} ({}x{}) can not be uploaded; skipped", image.width, image.height);
            self.rejected.insert(key.to_string());
            return;
        }

        let size = wgpu::Extent3d { width: image.width, height: image.height, depth_or_array_layers: 1 };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("cybershift image texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width * 4),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cybershift image bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::debug!("image {key} uploaded");
        self.images.insert(key.to_string(), GpuImage { _texture: texture, bind_group });
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cybershift image shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/image.wgsl").into()),
        });

        let page_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cybershift image page bgl"),
            entries: &[uniform_entry::<PageUniform>(0, wgpu::ShaderStages::VERTEX)],
        });

        let image_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cybershift image texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cybershift image pipeline layout"),
            bind_group_layouts: &[&page_layout, &image_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cybershift image pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), ImageInstance::layout()],
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
        self.page_layout = Some(page_layout);
        self.image_layout = Some(image_layout);

        // Bind groups were created against the old layouts.
        self.page_bind_group = None;
        self.page_ubo = None;
        self.images.clear();
        self.rejected.clear();
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("cybershift image sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }));
        }

        if self.page_bind_group.is_some() && self.page_ubo.is_some() {
            return;
        }
        let Some(layout) = self.page_layout.as_ref() else { return };

        let page_ubo = uniform_buffer::<PageUniform>(ctx.device, "cybershift image page ubo");
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cybershift image page bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: page_ubo.as_entire_binding(),
            }],
        });

        self.page_ubo = Some(page_ubo);
        self.page_bind_group = Some(bind_group);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cybershift image quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cybershift image quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(8);
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cybershift image instance vbo"),
            size: (new_cap * std::mem::size_of::<ImageInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ImageInstance {
    origin: [f32; 2],
    size: [f32; 2],
    uv_rect: [f32; 4],
    opacity: f32,
    _pad: [f32; 3],
}

impl ImageInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // origin
        2 => Float32x2, // size
        3 => Float32x4, // uv offset + scale
        4 => Float32    // opacity
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ImageInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_crops_wide_image_horizontally() {
        let [ox, oy, sx, sy] = cover_uv(2.0, 1.0);
        assert_eq!((ox, oy, sx, sy), (0.25, 0.0, 0.5, 1.0));
    }

    #[test]
    fn cover_crops_tall_image_vertically() {
        let [ox, oy, sx, sy] = cover_uv(0.75, 1.5);
        assert_eq!((ox, oy, sx, sy), (0.0, 0.25, 1.0, 0.5));
    }

    #[test]
    fn degenerate_aspect_uses_full_image() {
        assert_eq!(cover_uv(0.0, 1.0), [0.0, 0.0, 1.0, 1.0]);
    }
}
