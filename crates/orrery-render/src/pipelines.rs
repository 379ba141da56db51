//! Bind group layouts and the lazily built pipeline variants of the scene shader.

use orrery_scene::{Blending, Drawable, Geometry, MaterialKind, MaterialMode, Side};
use rustc_hash::FxHashMap;

use crate::depth::DepthBuffer;
use crate::mesh::{InstanceTransform, LineVertex, PointInstance, SceneVertex};
use crate::post::HDR_FORMAT;
use crate::uniforms::{FrameUniform, ObjectUniform};

pub const SCENE_SHADER_SOURCE: &str = include_str!("shaders/scene.wgsl");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexStage {
    Mesh,
    Instanced,
    Line,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentStage {
    Standard,
    InvertedSpecular,
    Basic,
    Glow,
    Nebula,
    Line,
    Points,
}

impl VertexStage {
    fn entry_point(self) -> &'static str {
        match self {
            Self::Mesh => "vs_mesh",
            Self::Instanced => "vs_instanced",
            Self::Line => "vs_line",
            Self::Points => "vs_points",
        }
    }

    fn buffers(self) -> Vec<wgpu::VertexBufferLayout<'static>> {
        match self {
            Self::Mesh => vec![SceneVertex::layout()],
            Self::Instanced => vec![SceneVertex::layout(), InstanceTransform::layout()],
            Self::Line => vec![LineVertex::layout()],
            Self::Points => vec![PointInstance::layout()],
        }
    }

    fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::Line => wgpu::PrimitiveTopology::LineStrip,
            _ => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

impl FragmentStage {
    fn entry_point(self) -> &'static str {
        match self {
            Self::Standard => "fs_standard",
            Self::InvertedSpecular => "fs_inverted_specular",
            Self::Basic => "fs_basic",
            Self::Glow => "fs_glow",
            Self::Nebula => "fs_nebula",
            Self::Line => "fs_line",
            Self::Points => "fs_points",
        }
    }
}

/// Everything that selects a distinct render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub vertex: VertexStage,
    pub fragment: FragmentStage,
    pub side: Side,
    pub blending: Blending,
    pub depth_write: bool,
}

impl PipelineKey {
    /// The geometry picks the vertex stage. Line and point geometry always
    /// use their own fragment stage; meshes take it from the material, with
    /// line and point materials drawn unlit.
    pub fn for_drawable(drawable: &Drawable) -> Self {
        let material = &drawable.material;
        let (vertex, fragment) = match &drawable.geometry {
            Geometry::LineLoop(_) => (VertexStage::Line, FragmentStage::Line),
            Geometry::Points(_) => (VertexStage::Points, FragmentStage::Points),
            Geometry::Mesh(_) => (VertexStage::Mesh, mesh_fragment(&material.kind)),
            Geometry::Instanced(_) => (VertexStage::Instanced, mesh_fragment(&material.kind)),
        };
        Self {
            vertex,
            fragment,
            side: material.side,
            blending: material.blending,
            depth_write: material.depth_write,
        }
    }
}

fn mesh_fragment(kind: &MaterialKind) -> FragmentStage {
    match kind {
        MaterialKind::Surface(surface) => match surface.mode {
            MaterialMode::Standard => FragmentStage::Standard,
            MaterialMode::InvertedRoughnessFromSpecular => FragmentStage::InvertedSpecular,
        },
        MaterialKind::Glow(_) => FragmentStage::Glow,
        MaterialKind::Nebula(_) => FragmentStage::Nebula,
        MaterialKind::Basic { .. } | MaterialKind::Line { .. } | MaterialKind::Points { .. } => {
            FragmentStage::Basic
        }
    }
}

/// Faces to cull for a material side. Front faces wind counter-clockwise.
pub fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

pub fn blend_state(blending: Blending) -> Option<wgpu::BlendState> {
    match blending {
        Blending::Opaque => None,
        Blending::Normal => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        }),
        Blending::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
    }
}

/// Bind group layouts of the scene shader: frame (group 0), object
/// (group 1) and material textures (group 2).
pub struct SceneLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub object: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-frame-bgl"),
            entries: &[
                uniform_entry(0, std::mem::size_of::<FrameUniform>()),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-object-bgl"),
            entries: &[uniform_entry(0, std::mem::size_of::<ObjectUniform>())],
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-material-bgl"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            frame,
            object,
            material,
        }
    }
}

fn uniform_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: std::num::NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Scene pipelines, built on first use of each [`PipelineKey`].
pub struct PipelineCache {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device, layouts: &SceneLayouts) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER_SOURCE.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.object, &layouts.material],
            immediate_size: 0,
        });
        Self {
            shader,
            layout,
            pipelines: FxHashMap::default(),
        }
    }

    pub fn ensure(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        log::debug!("building scene pipeline {key:?}");
        let pipeline = self.build(device, key);
        self.pipelines.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    fn build(&self, device: &wgpu::Device, key: PipelineKey) -> wgpu::RenderPipeline {
        let buffers = key.vertex.buffers();
        let label = format!("scene-{}-{}", key.vertex.entry_point(), key.fragment.entry_point());
        let cull_mode = match key.vertex {
            VertexStage::Line | VertexStage::Points => None,
            VertexStage::Mesh | VertexStage::Instanced => cull_mode(key.side),
        };
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some(key.vertex.entry_point()),
                buffers: &buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: key.vertex.topology(),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthBuffer::state(key.depth_write)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some(key.fragment.entry_point()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: blend_state(key.blending),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        })
    }
}
