use std::collections::{BTreeMap, HashMap};

use crate::pulse::ClothUniforms;
use crate::scene::{MaterialKind, Vertex};

use super::common::{premul_alpha_blend, triangle_primitive, uniform_entry};
use super::mesh::MeshUniform;

/// What a pipeline factory gets to build with.
pub struct PipelineDesc<'a> {
    pub device: &'a wgpu::Device,
    pub format: wgpu::TextureFormat,
    /// Group 0 layout (camera and lights), shared by every material.
    pub frame_layout: &'a wgpu::BindGroupLayout,
}

/// Which index set of a geometry a pipeline consumes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MeshTopology {
    Triangles,
    /// Unique triangle edges, drawn as a line list.
    Lines,
}

/// Pipelines and the group 1 layout for one material kind.
pub struct MaterialPipeline {
    /// Draws both faces.
    pub double_sided: wgpu::RenderPipeline,
    /// Back faces culled; `None` when the material is always double-sided.
    pub culled: Option<wgpu::RenderPipeline>,
    pub mesh_layout: wgpu::BindGroupLayout,
    pub topology: MeshTopology,
}

impl MaterialPipeline {
    pub fn select(&self, double_sided: bool) -> &wgpu::RenderPipeline {
        match (&self.culled, double_sided) {
            (Some(culled), false) => culled,
            _ => &self.double_sided,
        }
    }
}

pub type PipelineFactory = fn(&PipelineDesc<'_>) -> MaterialPipeline;

/// Maps material kinds to the functions that build their pipelines.
///
/// Pipelines are built on first use and rebuilt when the target format changes.
pub struct MaterialRegistry {
    factories: BTreeMap<MaterialKind, PipelineFactory>,
    pipelines: HashMap<MaterialKind, MaterialPipeline>,
    format: Option<wgpu::TextureFormat>,
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(MaterialKind::Standard, standard_pipeline);
        registry.register(MaterialKind::Wireframe, wireframe_pipeline);
        registry.register(MaterialKind::Cloth, cloth_pipeline);
        registry
    }
}

impl MaterialRegistry {
    /// A registry with the built-in materials.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self { factories: BTreeMap::new(), pipelines: HashMap::new(), format: None }
    }

    /// Registers or replaces the factory for `kind`. Returns the previous factory.
    pub fn register(&mut self, kind: MaterialKind, factory: PipelineFactory) -> Option<PipelineFactory> {
        self.pipelines.remove(&kind);
        self.factories.insert(kind, factory)
    }

    pub fn contains(&self, kind: MaterialKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = MaterialKind> + '_ {
        self.factories.keys().copied()
    }

    /// Builds the pipeline for `kind` if needed. `false` when no factory is registered.
    pub fn prepare(&mut self, desc: &PipelineDesc<'_>, kind: MaterialKind) -> bool {
        if self.format != Some(desc.format) {
            self.pipelines.clear();
            self.format = Some(desc.format);
        }
        if self.pipelines.contains_key(&kind) {
            return true;
        }
        let Some(factory) = self.factories.get(&kind) else {
            return false;
        };
        log::debug!("building {kind:?} pipeline for {:?}", desc.format);
        self.pipelines.insert(kind, factory(desc));
        true
    }

    pub fn get(&self, kind: MaterialKind) -> Option<&MaterialPipeline> {
        self.pipelines.get(&kind)
    }
}

// ── built-in factories ────────────────────────────────────────────────────

fn standard_pipeline(desc: &PipelineDesc<'_>) -> MaterialPipeline {
    let mesh_layout = mesh_layout(desc, "cybershift standard mesh bgl", false);
    let shader = shader(desc, "cybershift standard shader", include_str!("shaders/mesh_standard.wgsl"));
    let layout = pipeline_layout(desc, "cybershift standard pipeline layout", &mesh_layout);

    MaterialPipeline {
        double_sided: mesh_pipeline(desc, "cybershift standard pipeline", &shader, &layout, triangle_primitive(None)),
        culled: Some(mesh_pipeline(
            desc,
            "cybershift standard culled pipeline",
            &shader,
            &layout,
            triangle_primitive(Some(wgpu::Face::Back)),
        )),
        mesh_layout,
        topology: MeshTopology::Triangles,
    }
}

fn wireframe_pipeline(desc: &PipelineDesc<'_>) -> MaterialPipeline {
    let mesh_layout = mesh_layout(desc, "cybershift wireframe mesh bgl", false);
    let shader = shader(desc, "cybershift wireframe shader", include_str!("shaders/wireframe.wgsl"));
    let layout = pipeline_layout(desc, "cybershift wireframe pipeline layout", &mesh_layout);
    let primitive = wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::LineList,
        ..triangle_primitive(None)
    };

    MaterialPipeline {
        double_sided: mesh_pipeline(desc, "cybershift wireframe pipeline", &shader, &layout, primitive),
        culled: None,
        mesh_layout,
        topology: MeshTopology::Lines,
    }
}

fn cloth_pipeline(desc: &PipelineDesc<'_>) -> MaterialPipeline {
    let mesh_layout = mesh_layout(desc, "cybershift cloth mesh bgl", true);
    let shader = shader(desc, "cybershift cloth shader", include_str!("shaders/cloth.wgsl"));
    let layout = pipeline_layout(desc, "cybershift cloth pipeline layout", &mesh_layout);

    MaterialPipeline {
        double_sided: mesh_pipeline(desc, "cybershift cloth pipeline", &shader, &layout, triangle_primitive(None)),
        culled: None,
        mesh_layout,
        topology: MeshTopology::Triangles,
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

/// Group 1: the mesh uniform, plus the cloth block for the cloth material.
fn mesh_layout(desc: &PipelineDesc<'_>, label: &str, with_cloth: bool) -> wgpu::BindGroupLayout {
    let stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
    let mut entries = vec![uniform_entry::<MeshUniform>(0, stages)];
    if with_cloth {
        entries.push(uniform_entry::<ClothUniforms>(1, stages));
    }
    desc.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor { label: Some(label), entries: &entries })
}

fn shader(desc: &PipelineDesc<'_>, label: &str, source: &'static str) -> wgpu::ShaderModule {
    desc.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn pipeline_layout(desc: &PipelineDesc<'_>, label: &str, mesh_layout: &wgpu::BindGroupLayout) -> wgpu::PipelineLayout {
    desc.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[desc.frame_layout, mesh_layout],
        immediate_size: 0,
    })
}

fn mesh_pipeline(
    desc: &PipelineDesc<'_>,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    primitive: wgpu::PrimitiveState,
) -> wgpu::RenderPipeline {
    desc.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive,
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_every_kind() {
        let registry = MaterialRegistry::new();
        let kinds: Vec<_> = registry.kinds().collect();
        assert_eq!(kinds, vec![MaterialKind::Standard, MaterialKind::Wireframe, MaterialKind::Cloth]);
    }

    #[test]
    fn register_replaces_existing_factory() {
        let mut registry = MaterialRegistry::empty();
        assert!(!registry.contains(MaterialKind::Cloth));
        assert!(registry.register(MaterialKind::Cloth, cloth_pipeline).is_none());
        assert!(registry.register(MaterialKind::Cloth, standard_pipeline).is_some());
        assert!(registry.contains(MaterialKind::Cloth));
        assert!(registry.get(MaterialKind::Cloth).is_none());
    }
}
