//! GPU textures: upload of decoded scene textures, mipmap generation, the
//! environment radiance map, and 1x1 fallbacks for absent maps.
//!
//! [`TextureCache`] keys uploads by the identity of the shared
//! [`TextureRef`], so a texture used by several materials is uploaded once.
//! Entries whose materials are gone are dropped by [`TextureCache::prune`].

use std::borrow::Cow;
use std::sync::Arc;

use orrery_assets::{ColorSpace, LoadedTexture, TexturePixels, WrapMode};
use orrery_scene::{EnvironmentMap, TextureRef};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(
        "texture data size ({actual}) does not match expected ({expected}) for {width}x{height} {format:?}"
    )]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}

pub fn mip_level_count(width: u32, height: u32) -> u32 {
    (width.max(height).max(1) as f32).log2().floor() as u32 + 1
}

pub fn texture_format(color_space: ColorSpace) -> wgpu::TextureFormat {
    match color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Texel bytes ready for an RGBA8 upload.
///
/// Float texels are clamped to `[0, 1]`. Rows are reversed when the texture
/// asks for a vertical flip.
pub fn rgba8_bytes(texture: &LoadedTexture) -> Cow<'_, [u8]> {
    let bytes: Cow<'_, [u8]> = match &texture.pixels {
        TexturePixels::Rgba8(data) => Cow::Borrowed(data.as_slice()),
        TexturePixels::RgbaF32(data) => Cow::Owned(
            data.iter()
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        ),
    };
    if texture.flip_y {
        Cow::Owned(flip_rows(&bytes, texture.width as usize * 4))
    } else {
        bytes
    }
}

fn flip_rows(data: &[u8], row_len: usize) -> Vec<u8> {
    if row_len == 0 {
        return data.to_vec();
    }
    data.chunks(row_len).rev().flatten().copied().collect()
}

fn expected_byte_size(width: u32, height: u32, format: wgpu::TextureFormat) -> usize {
    let bpp = format.block_copy_size(None).unwrap_or(4) as usize;
    width as usize * height as usize * bpp
}

fn bytes_per_row(width: u32, format: wgpu::TextureFormat) -> u32 {
    width * format.block_copy_size(None).unwrap_or(4)
}

fn validate(data: &[u8], width: u32, height: u32, format: wgpu::TextureFormat) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    let expected = expected_byte_size(width, height, format);
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
            format,
        });
    }
    Ok(())
}

const BLIT_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var src_texture: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_texture, src_sampler, in.uv);
}
"#;

/// Fullscreen-blit mip generator, one pipeline per target format.
struct MipBlit {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl MipBlit {
    fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit-bind-group-layout"),
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
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit-shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER_SOURCE.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            shader,
            layout,
            bind_group_layout,
            sampler,
            pipelines: FxHashMap::default(),
        }
    }

    fn pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) -> &wgpu::RenderPipeline {
        let (shader, layout) = (&self.shader, &self.layout);
        self.pipelines.entry(format).or_insert_with(|| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("mipmap-pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        })
    }

    fn generate(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        format: wgpu::TextureFormat,
        mip_count: u32,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mipmap-encoder"),
        });
        let views: Vec<wgpu::TextureView> = (0..mip_count)
            .map(|level| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    base_mip_level: level,
                    mip_level_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        self.pipeline(device, format);
        let Some(pipeline) = self.pipelines.get(&format) else {
            return;
        };
        for level in 1..mip_count as usize {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mipmap-bind-group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&views[level - 1]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mipmap-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &views[level],
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Uploaded scene textures plus the shared fallbacks.
pub struct TextureCache {
    entries: FxHashMap<usize, (TextureRef, Arc<GpuTexture>)>,
    blit: MipBlit,
    white: Arc<GpuTexture>,
    flat_normal: Arc<GpuTexture>,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            entries: FxHashMap::default(),
            blit: MipBlit::new(device),
            white: Arc::new(solid_texture(device, queue, "fallback-white", [255, 255, 255, 255])),
            flat_normal: Arc::new(solid_texture(device, queue, "fallback-normal", [128, 128, 255, 255])),
        }
    }

    /// The GPU copy of `texture`, uploading it on first use.
    ///
    /// A texture that cannot be uploaded is logged and replaced by the white fallback.
    pub fn get_or_upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &TextureRef,
    ) -> Arc<GpuTexture> {
        let key = Arc::as_ptr(texture) as usize;
        if let Some((_, gpu)) = self.entries.get(&key) {
            return Arc::clone(gpu);
        }
        match self.upload(device, queue, texture) {
            Ok(gpu) => {
                let gpu = Arc::new(gpu);
                self.entries.insert(key, (Arc::clone(texture), Arc::clone(&gpu)));
                gpu
            }
            Err(e) => {
                log::warn!("Texture {} not uploaded: {e}", texture.source);
                Arc::clone(&self.white)
            }
        }
    }

    fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &LoadedTexture,
    ) -> Result<GpuTexture, TextureError> {
        let (width, height) = (source.width, source.height);
        let format = texture_format(source.color_space);
        let data = rgba8_bytes(source);
        validate(&data, width, height, format)?;

        let mip_levels = if source.generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&source.source),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row(width, format)),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        if mip_levels > 1 {
            self.blit.generate(device, queue, &texture, format, mip_levels);
        }

        let anisotropy = if mip_levels > 1 {
            source.anisotropy.clamp(1, 16)
        } else {
            1
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene-texture-sampler"),
            address_mode_u: address_mode(source.wrap_s),
            address_mode_v: address_mode(source.wrap_t),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            anisotropy_clamp: anisotropy,
            ..Default::default()
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::info!(
            "Uploaded texture {} ({width}x{height}, {mip_levels} mips)",
            source.source
        );
        Ok(GpuTexture {
            texture,
            view,
            sampler,
            dimensions: (width, height),
            format,
            mip_level_count: mip_levels,
        })
    }

    pub fn white(&self) -> Arc<GpuTexture> {
        Arc::clone(&self.white)
    }

    pub fn flat_normal(&self) -> Arc<GpuTexture> {
        Arc::clone(&self.flat_normal)
    }

    /// Drop uploads no material references any more. Returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (_, gpu)| Arc::strong_count(gpu) > 1);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn solid_texture(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, rgba: [u8; 4]) -> GpuTexture {
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &rgba,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        ..Default::default()
    });
    GpuTexture {
        texture,
        view,
        sampler,
        dimensions: (1, 1),
        format,
        mip_level_count: 1,
    }
}

/// Environment radiance as an unfilterable float texture, read with `textureLoad`.
///
/// Without an environment a single black texel is uploaded.
pub fn upload_environment(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    environment: Option<&EnvironmentMap>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let black = [[0.0_f32; 4]];
    let (width, height, texels) = match environment {
        Some(env) if !env.texels.is_empty() => (env.width, env.height, env.texels.as_slice()),
        _ => (1, 1, &black[..]),
    };
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("environment-radiance"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        bytemuck::cast_slice(texels),
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Create a test GPU device and queue. Returns `None` if no GPU is available.
#[cfg(test)]
pub(crate) fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}
