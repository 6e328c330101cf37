use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::coords::ViewportRect;
use crate::render::RenderCtx;
use crate::scene::{Geometry, GeometryId, LightsUniform, Material, MaterialKind, Mesh, MeshId, SceneLayer};
use crate::viewport::LayerKey;

use super::common::{uniform_buffer, uniform_entry};
use super::material::{MaterialRegistry, MeshTopology, PipelineDesc};

/// GPU resources not touched for this many frames are released.
const EVICT_AFTER_FRAMES: u64 = 180;

/// Group 0: camera and lights of one drawn layer. Must match `Frame` in the mesh shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub lights: LightsUniform,
}

impl FrameUniform {
    /// Camera of `layer` framed for the full element rect, cropped to its visible part.
    pub(crate) fn new(layer: &SceneLayer, rect: &ViewportRect) -> Self {
        let view_proj = rect.crop_matrix() * layer.camera.view_proj(rect.aspect());
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: layer.camera.position.extend(1.0).to_array(),
            lights: LightsUniform::from_lights(layer.lights()),
        }
    }
}

/// Group 1 binding 0: per-mesh transform and material scalars.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct MeshUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// rgb = emissive color, a = intensity.
    pub emissive: [f32; 4],
    /// x = roughness, y = metalness, z = displacement scale.
    pub params: [f32; 4],
}

impl MeshUniform {
    pub(crate) fn from_mesh(mesh: &Mesh) -> Self {
        let (color, emissive, params) = match &mesh.material {
            Material::Standard(m) => (
                m.color.to_array(),
                [m.emissive.r, m.emissive.g, m.emissive.b, m.emissive_intensity],
                [m.roughness, m.metalness, m.displacement_scale, 0.0],
            ),
            Material::Wireframe(m) => (
                m.color.to_array(),
                [m.emissive.r, m.emissive.g, m.emissive.b, m.emissive_intensity],
                [0.0; 4],
            ),
            Material::Cloth(c) => (c.uniforms().color, [0.0; 4], [0.0; 4]),
        };

        Self {
            model: mesh.transform.matrix().to_cols_array_2d(),
            normal: Mat4::from_mat3(mesh.transform.normal_matrix()).to_cols_array_2d(),
            color,
            emissive,
            params,
        }
    }
}

struct GpuGeometry {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    index_count: u32,
    edge_ibo: Option<wgpu::Buffer>,
    edge_count: u32,
    last_used: u64,
}

struct ViewSlot {
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct MeshSlot {
    kind: MaterialKind,
    ubo: wgpu::Buffer,
    cloth_ubo: Option<wgpu::Buffer>,
    bind_group: wgpu::BindGroup,
    last_used: u64,
}

/// One scene layer to draw this frame and where it goes on the target.
pub struct LayerDraw<'a> {
    pub key: LayerKey,
    pub layer: &'a SceneLayer,
    pub rect: ViewportRect,
}

/// Draws scene layers mesh by mesh through the [`MaterialRegistry`].
///
/// Split into [`prepare`](Self::prepare), which uploads everything for the frame, and
/// [`draw`](Self::draw), which records into a render pass the caller owns. Geometry
/// buffers are shared by every mesh using the same `Geometry`.
#[derive(Default)]
pub struct MeshRenderer {
    registry: MaterialRegistry,
    format: Option<wgpu::TextureFormat>,
    frame_layout: Option<wgpu::BindGroupLayout>,
    views: Vec<ViewSlot>,
    geometries: HashMap<GeometryId, GpuGeometry>,
    meshes: HashMap<(LayerKey, MeshId), MeshSlot>,
    frame: u64,
    warned_kinds: HashSet<MaterialKind>,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }


    /// Uploads camera, light, mesh and cloth uniforms for `draws`, building pipelines
    /// and geometry buffers on demand.
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>, draws: &[LayerDraw<'_>]) {
        self.frame += 1;

        if self.format != Some(ctx.surface_format) {
            self.meshes.clear();
            self.format = Some(ctx.surface_format);
        }
        if self.frame_layout.is_none() {
            self.frame_layout = Some(ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("cybershift frame bgl"),
                entries: &[uniform_entry::<FrameUniform>(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                )],
            }));
        }

        let Self { registry, frame_layout, views, geometries, meshes, frame, warned_kinds, .. } = self;
        let Some(frame_layout) = frame_layout.as_ref() else { return };
        let desc = PipelineDesc { device: ctx.device, format: ctx.surface_format, frame_layout };

        while views.len() < draws.len() {
            let ubo = uniform_buffer::<FrameUniform>(ctx.device, "cybershift frame ubo");
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("cybershift frame bind group"),
                layout: frame_layout,
                entries: &[wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() }],
            });
            views.push(ViewSlot { ubo, bind_group });
        }

        for (slot, draw) in views.iter().zip(draws) {
            let u = FrameUniform::new(draw.layer, &draw.rect);
            ctx.queue.write_buffer(&slot.ubo, 0, bytemuck::bytes_of(&u));
        }

        for draw in draws {
            for (id, mesh) in draw.layer.meshes() {
                if !mesh.visible || mesh.geometry.indices().is_empty() {
                    continue;
                }
                let kind = mesh.material.kind();
                if !registry.prepare(&desc, kind) {
                    if warned_kinds.insert(kind) {
                        log::warn!("no pipeline registered for {kind:?}; meshes skipped");
                    }
                    continue;
                }
                let Some(pipeline) = registry.get(kind) else { continue };

                let geo = geometries
                    .entry(mesh.geometry.id())
                    .or_insert_with(|| upload_geometry(ctx, &mesh.geometry));
                geo.last_used = *frame;
                if pipeline.topology == MeshTopology::Lines && geo.edge_ibo.is_none() {
                    geo.edge_ibo = upload_edges(ctx, &mesh.geometry);
                }

                let key = (draw.key, id);
                if meshes.get(&key).is_some_and(|s| s.kind != kind) {
                    meshes.remove(&key);
                }
                let slot = meshes
                    .entry(key)
                    .or_insert_with(|| create_mesh_slot(ctx, kind, &pipeline.mesh_layout));
                slot.last_used = *frame;

                ctx.queue.write_buffer(&slot.ubo, 0, bytemuck::bytes_of(&MeshUniform::from_mesh(mesh)));
                if let (Some(cloth_ubo), Material::Cloth(cloth)) = (slot.cloth_ubo.as_ref(), &mesh.material) {
                    ctx.queue.write_buffer(cloth_ubo, 0, bytemuck::bytes_of(cloth.uniforms()));
                }
            }
        }

        let now = *frame;
        geometries.retain(|_, g| !is_stale(g.last_used, now));
        meshes.retain(|_, m| !is_stale(m.last_used, now));
    }

    /// Records the meshes of `draws[index]` (as passed to `prepare`) into `pass`.
    ///
    /// The caller sets viewport and scissor to the layer's visible rect.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, index: usize, draw: &LayerDraw<'_>) {
        let Some(view) = self.views.get(index) else { return };
        pass.set_bind_group(0, &view.bind_group, &[]);

        for (id, mesh) in draw.layer.meshes() {
            if !mesh.visible {
                continue;
            }
            let kind = mesh.material.kind();
            let Some(pipeline) = self.registry.get(kind) else { continue };
            let Some(slot) = self.meshes.get(&(draw.key, id)) else { continue };
            if slot.kind != kind {
                continue;
            }
            let Some(geo) = self.geometries.get(&mesh.geometry.id()) else { continue };

            pass.set_pipeline(pipeline.select(mesh.material.double_sided()));
            pass.set_bind_group(1, &slot.bind_group, &[]);
            pass.set_vertex_buffer(0, geo.vbo.slice(..));

            match pipeline.topology {
                MeshTopology::Triangles => {
                    pass.set_index_buffer(geo.ibo.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..geo.index_count, 0, 0..1);
                }
                MeshTopology::Lines => {
                    let Some(edges) = geo.edge_ibo.as_ref() else { continue };
                    pass.set_index_buffer(edges.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..geo.edge_count, 0, 0..1);
                }
            }
        }
    }
}

fn is_stale(last_used: u64, now: u64) -> bool {
    now.saturating_sub(last_used) > EVICT_AFTER_FRAMES
}

fn upload_geometry(ctx: &RenderCtx<'_>, geometry: &Geometry) -> GpuGeometry {
    let vbo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("cybershift mesh vbo"),
        contents: bytemuck::cast_slice(geometry.vertices()),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let ibo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("cybershift mesh ibo"),
        contents: bytemuck::cast_slice(geometry.indices()),
        usage: wgpu::BufferUsages::INDEX,
    });
    log::debug!(
        "geometry {:?} uploaded: {} vertices, {} indices",
        geometry.id(),
        geometry.vertices().len(),
        geometry.indices().len()
    );

    GpuGeometry {
        vbo,
        ibo,
        index_count: geometry.indices().len() as u32,
        edge_ibo: None,
        edge_count: geometry.edges().len() as u32,
        last_used: 0,
    }
}

fn upload_edges(ctx: &RenderCtx<'_>, geometry: &Geometry) -> Option<wgpu::Buffer> {
    if geometry.edges().is_empty() {
        return None;
    }
    Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("cybershift mesh edge ibo"),
        contents: bytemuck::cast_slice(geometry.edges()),
        usage: wgpu::BufferUsages::INDEX,
    }))
}

fn create_mesh_slot(ctx: &RenderCtx<'_>, kind: MaterialKind, layout: &wgpu::BindGroupLayout) -> MeshSlot {
    let ubo = uniform_buffer::<MeshUniform>(ctx.device, "cybershift mesh ubo");
    let cloth_ubo = (kind == MaterialKind::Cloth)
        .then(|| uniform_buffer::<crate::pulse::ClothUniforms>(ctx.device, "cybershift cloth ubo"));

    let mut entries = vec![wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() }];
    if let Some(cloth) = cloth_ubo.as_ref() {
        entries.push(wgpu::BindGroupEntry { binding: 1, resource: cloth.as_entire_binding() });
    }
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("cybershift mesh bind group"),
        layout,
        entries: &entries,
    });

    MeshSlot { kind, ubo, cloth_ubo, bind_group, last_used: 0 }
}
