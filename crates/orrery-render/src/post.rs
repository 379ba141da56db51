//! Post-processing: bloom, tone mapping and FXAA.
//!
//! The scene renders into a full-resolution HDR target. With post-processing
//! enabled the chain runs high-pass extract, a five-level downsample and
//! additive upsample, then composites bloom onto the scene, applies exposure
//! and the ACES fit into an sRGB intermediate, and finishes with FXAA into
//! the surface. Disabled, a single pass tone maps HDR straight to the surface.

use bytemuck::{Pod, Zeroable};
use orrery_scene::PostSettings;
use wgpu::util::DeviceExt;

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const LDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Number of bloom blur levels, the first at half resolution.
pub const BLOOM_LEVELS: usize = 5;

const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Width of the high-pass transition above the threshold.
const HIGH_PASS_SMOOTHING: f32 = 0.01;

/// GPU uniform for the post passes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PostParams {
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub exposure: f32,
    /// FXAA texel size.
    pub texel: [f32; 2],
    /// 1 when bloom is composited.
    pub bloom_enabled: f32,
    pub _pad: f32,
}

impl PostParams {
    pub fn new(post: Option<&PostSettings>, exposure: f32) -> Self {
        match post {
            Some(post) => Self {
                threshold: post.bloom_threshold,
                strength: post.bloom_strength,
                radius: post.bloom_radius,
                exposure,
                texel: post.fxaa_texel,
                bloom_enabled: 1.0,
                _pad: 0.0,
            },
            None => Self {
                threshold: 1.0,
                strength: 0.0,
                radius: 0.0,
                exposure,
                texel: [0.0; 2],
                bloom_enabled: 0.0,
                _pad: 0.0,
            },
        }
    }
}

/// Narkowicz's fit of the ACES filmic curve, clamped to `[0, 1]`.
pub fn aces_filmic(x: f32) -> f32 {
    let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
    ((x * (a * x + b)) / (x * (c * x + d) + e)).clamp(0.0, 1.0)
}

/// Input that [`aces_filmic`] maps to `y`; `y` is clamped below 1.
pub fn inverse_aces_filmic(y: f32) -> f32 {
    let y = y.clamp(0.0, 0.999);
    let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
    let qa = a - c * y;
    let qb = b - d * y;
    (-qb + (qb * qb + 4.0 * qa * e * y).sqrt()) / (2.0 * qa)
}

pub fn luma(color: [f32; 3]) -> f32 {
    color[0] * LUMA[0] + color[1] * LUMA[1] + color[2] * LUMA[2]
}

/// Fraction of a pixel passed to the bloom chain.
pub fn high_pass(luma: f32, threshold: f32) -> f32 {
    let t = ((luma - threshold) / HIGH_PASS_SMOOTHING).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Weight of each upsampled level added onto the next larger one.
pub fn upsample_weight(radius: f32) -> f32 {
    0.6 + 0.8 * radius
}

pub fn bloom_level_sizes(width: u32, height: u32) -> Vec<(u32, u32)> {
    let mut sizes = Vec::with_capacity(BLOOM_LEVELS);
    let (mut w, mut h) = ((width / 2).max(1), (height / 2).max(1));
    for _ in 0..BLOOM_LEVELS {
        sizes.push((w, h));
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    sizes
}

const POST_SHADER_SOURCE: &str = r#"
struct PostParams {
    threshold: f32,
    strength: f32,
    radius: f32,
    exposure: f32,
    texel: vec2<f32>,
    bloom_enabled: f32,
    pad: f32,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: PostParams;
@group(1) @binding(0) var input_tex: texture_2d<f32>;
@group(1) @binding(1) var input_sampler: sampler;
@group(2) @binding(0) var bloom_tex: texture_2d<f32>;
@group(2) @binding(1) var bloom_sampler: sampler;

const LUMA: vec3<f32> = vec3<f32>(0.299, 0.587, 0.114);

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

fn aces(x: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return clamp((x * (a * x + b)) / (x * (c * x + d) + e), vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_extract(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_tex, input_sampler, in.uv).rgb;
    let weight = smoothstep(params.threshold, params.threshold + 0.01, dot(color, LUMA));
    return vec4<f32>(color * weight, 1.0);
}

@fragment
fn fs_downsample(in: VertexOutput) -> @location(0) vec4<f32> {
    let dims = vec2<f32>(textureDimensions(input_tex));
    let texel = (1.0 + params.radius) / dims;
    let a = textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x, -texel.y)).rgb;
    let b = textureSample(input_tex, input_sampler, in.uv + vec2( texel.x, -texel.y)).rgb;
    let c = textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x,  texel.y)).rgb;
    let d = textureSample(input_tex, input_sampler, in.uv + vec2( texel.x,  texel.y)).rgb;
    return vec4<f32>((a + b + c + d) * 0.25, 1.0);
}

@fragment
fn fs_upsample(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_tex, input_sampler, in.uv).rgb;
    return vec4<f32>(color * (0.6 + 0.8 * params.radius), 1.0);
}

@fragment
fn fs_composite(in: VertexOutput) -> @location(0) vec4<f32> {
    let hdr = textureSample(input_tex, input_sampler, in.uv).rgb;
    let bloom = textureSample(bloom_tex, bloom_sampler, in.uv).rgb;
    let color = (hdr + bloom * params.strength * params.bloom_enabled) * params.exposure;
    return vec4<f32>(aces(color), 1.0);
}

@fragment
fn fs_tonemap(in: VertexOutput) -> @location(0) vec4<f32> {
    let hdr = textureSample(input_tex, input_sampler, in.uv).rgb;
    return vec4<f32>(aces(hdr * params.exposure), 1.0);
}

const FXAA_REDUCE_MIN: f32 = 1.0 / 128.0;
const FXAA_REDUCE_MUL: f32 = 1.0 / 8.0;
const FXAA_SPAN_MAX: f32 = 8.0;

@fragment
fn fs_fxaa(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = params.texel;
    let rgb_nw = textureSample(input_tex, input_sampler, in.uv + vec2(-1.0, -1.0) * texel).rgb;
    let rgb_ne = textureSample(input_tex, input_sampler, in.uv + vec2( 1.0, -1.0) * texel).rgb;
    let rgb_sw = textureSample(input_tex, input_sampler, in.uv + vec2(-1.0,  1.0) * texel).rgb;
    let rgb_se = textureSample(input_tex, input_sampler, in.uv + vec2( 1.0,  1.0) * texel).rgb;
    let rgb_m = textureSample(input_tex, input_sampler, in.uv).rgb;

    let luma_nw = dot(rgb_nw, LUMA);
    let luma_ne = dot(rgb_ne, LUMA);
    let luma_sw = dot(rgb_sw, LUMA);
    let luma_se = dot(rgb_se, LUMA);
    let luma_m = dot(rgb_m, LUMA);
    let luma_min = min(luma_m, min(min(luma_nw, luma_ne), min(luma_sw, luma_se)));
    let luma_max = max(luma_m, max(max(luma_nw, luma_ne), max(luma_sw, luma_se)));

    var dir = vec2<f32>(
        -((luma_nw + luma_ne) - (luma_sw + luma_se)),
        (luma_nw + luma_sw) - (luma_ne + luma_se),
    );
    let reduce = max((luma_nw + luma_ne + luma_sw + luma_se) * 0.25 * FXAA_REDUCE_MUL, FXAA_REDUCE_MIN);
    let rcp_dir_min = 1.0 / (min(abs(dir.x), abs(dir.y)) + reduce);
    dir = clamp(dir * rcp_dir_min, vec2<f32>(-FXAA_SPAN_MAX), vec2<f32>(FXAA_SPAN_MAX)) * texel;

    let rgb_a = 0.5 * (
        textureSample(input_tex, input_sampler, in.uv + dir * (1.0 / 3.0 - 0.5)).rgb +
        textureSample(input_tex, input_sampler, in.uv + dir * (2.0 / 3.0 - 0.5)).rgb
    );
    let rgb_b = rgb_a * 0.5 + 0.25 * (
        textureSample(input_tex, input_sampler, in.uv + dir * -0.5).rgb +
        textureSample(input_tex, input_sampler, in.uv + dir * 0.5).rgb
    );
    let luma_b = dot(rgb_b, LUMA);
    let outside = luma_b < luma_min || luma_b > luma_max;
    return vec4<f32>(select(rgb_b, rgb_a, outside), 1.0);
}
"#;

/// Render targets and pipelines of the post chain.
pub struct PostChain {
    texture_bgl: wgpu::BindGroupLayout,
    extract_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    tonemap_pipeline: wgpu::RenderPipeline,
    fxaa_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    params: PostParams,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    targets: PostTargets,
}

/// Size-dependent textures, recreated on resize.
struct PostTargets {
    width: u32,
    height: u32,
    hdr: RenderTarget,
    ldr: RenderTarget,
    bloom: Vec<RenderTarget>,
}

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl PostChain {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        params: PostParams,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post-shader"),
            source: wgpu::ShaderSource::Wgsl(POST_SHADER_SOURCE.into()),
        });

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post-params-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<PostParams>() as u64
                    ),
                },
                count: None,
            }],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post-texture-bgl"),
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

        let single_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post-single-input-layout"),
            bind_group_layouts: &[&params_bgl, &texture_bgl],
            immediate_size: 0,
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post-composite-layout"),
            bind_group_layouts: &[&params_bgl, &texture_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let pipeline = |layout: &wgpu::PipelineLayout,
                        entry: &str,
                        format: wgpu::TextureFormat,
                        blend: Option<wgpu::BlendState>,
                        label: &str| {
            create_fullscreen_pipeline(device, &shader, layout, entry, format, blend, label)
        };
        let extract_pipeline = pipeline(&single_layout, "fs_extract", HDR_FORMAT, None, "post-extract");
        let downsample_pipeline =
            pipeline(&single_layout, "fs_downsample", HDR_FORMAT, None, "post-downsample");
        let upsample_pipeline =
            pipeline(&single_layout, "fs_upsample", HDR_FORMAT, Some(additive), "post-upsample");
        let composite_pipeline =
            pipeline(&composite_layout, "fs_composite", LDR_FORMAT, None, "post-composite");
        let tonemap_pipeline =
            pipeline(&single_layout, "fs_tonemap", surface_format, None, "post-tonemap");
        let fxaa_pipeline = pipeline(&single_layout, "fs_fxaa", surface_format, None, "post-fxaa");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("post-params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post-params-bg"),
            layout: &params_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let targets = PostTargets::new(device, &texture_bgl, &sampler, width, height);

        Self {
            texture_bgl,
            extract_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            composite_pipeline,
            tonemap_pipeline,
            fxaa_pipeline,
            sampler,
            params,
            params_buffer,
            params_bind_group,
            targets,
        }
    }

    /// The target the scene pass renders into.
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.targets.hdr.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.targets.width, self.targets.height)
    }

    pub fn params(&self) -> &PostParams {
        &self.params
    }

    /// Recreate the targets at the new size. No-op when unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.size() == (width.max(1), height.max(1)) {
            return;
        }
        log::debug!("post targets resized to {width}x{height}");
        self.targets = PostTargets::new(device, &self.texture_bgl, &self.sampler, width, height);
    }

    /// Upload new parameters when they differ from the current ones.
    pub fn update_params(&mut self, queue: &wgpu::Queue, params: PostParams) {
        if params == self.params {
            return;
        }
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
        self.params = params;
    }

    /// Run the chain from the HDR target into `surface_view`.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView, enabled: bool) {
        let targets = &self.targets;
        if !enabled {
            self.run_pass(encoder, &self.tonemap_pipeline, &[&targets.hdr.bind_group], surface_view, "post-tonemap");
            return;
        }

        self.run_pass(
            encoder,
            &self.extract_pipeline,
            &[&targets.hdr.bind_group],
            &targets.bloom[0].view,
            "post-extract",
        );
        for i in 1..targets.bloom.len() {
            self.run_pass(
                encoder,
                &self.downsample_pipeline,
                &[&targets.bloom[i - 1].bind_group],
                &targets.bloom[i].view,
                "post-downsample",
            );
        }
        for i in (0..targets.bloom.len() - 1).rev() {
            self.run_blend_pass(
                encoder,
                &self.upsample_pipeline,
                &targets.bloom[i + 1].bind_group,
                &targets.bloom[i].view,
            );
        }
        self.run_pass(
            encoder,
            &self.composite_pipeline,
            &[&targets.hdr.bind_group, &targets.bloom[0].bind_group],
            &targets.ldr.view,
            "post-composite",
        );
        self.run_pass(encoder, &self.fxaa_pipeline, &[&targets.ldr.bind_group], surface_view, "post-fxaa");
    }

    fn run_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        inputs: &[&wgpu::BindGroup],
        target_view: &wgpu::TextureView,
        label: &str,
    ) {
        let mut pass = begin_pass(encoder, target_view, wgpu::LoadOp::Clear(wgpu::Color::BLACK), label);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        for (group, input) in inputs.iter().enumerate() {
            pass.set_bind_group(group as u32 + 1, *input, &[]);
        }
        pass.draw(0..3, 0..1);
    }

    fn run_blend_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        input: &wgpu::BindGroup,
        target_view: &wgpu::TextureView,
    ) {
        let mut pass = begin_pass(encoder, target_view, wgpu::LoadOp::Load, "post-upsample");
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, input, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target_view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

impl PostTargets {
    fn new(
        device: &wgpu::Device,
        texture_bgl: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let bloom = bloom_level_sizes(width, height)
            .into_iter()
            .enumerate()
            .map(|(i, (w, h))| {
                log::trace!("bloom level {i}: {w}x{h}");
                RenderTarget::new(device, texture_bgl, sampler, HDR_FORMAT, w, h, "post-bloom")
            })
            .collect();
        Self {
            width,
            height,
            hdr: RenderTarget::new(device, texture_bgl, sampler, HDR_FORMAT, width, height, "post-hdr"),
            ldr: RenderTarget::new(device, texture_bgl, sampler, LDR_FORMAT, width, height, "post-ldr"),
            bloom,
        }
    }
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        texture_bgl: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: texture_bgl,
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
        Self {
            _texture: texture,
            view,
            bind_group,
        }
    }
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;

    fn settings() -> PostSettings {
        PostSettings {
            bloom_strength: 1.45,
            bloom_threshold: 0.82,
            bloom_radius: 0.62,
            target_width: 800,
            target_height: 600,
            fxaa_texel: [1.0 / 800.0, 1.0 / 600.0],
        }
    }

    #[test]
    fn test_params_uniform_size() {
        assert_eq!(std::mem::size_of::<PostParams>(), 32);
    }

    #[test]
    fn test_params_follow_settings() {
        let params = PostParams::new(Some(&settings()), 1.15);
        assert_eq!(params.strength, 1.45);
        assert_eq!(params.threshold, 0.82);
        assert_eq!(params.exposure, 1.15);
        assert_eq!(params.texel, [1.0 / 800.0, 1.0 / 600.0]);
        assert_eq!(params.bloom_enabled, 1.0);

        let disabled = PostParams::new(None, 1.15);
        assert_eq!(disabled.bloom_enabled, 0.0);
        assert_eq!(disabled.exposure, 1.15);
    }

    #[test]
    fn test_aces_is_monotonic_and_bounded() {
        assert_eq!(aces_filmic(0.0), 0.0);
        let mut previous = 0.0;
        for i in 1..100 {
            let y = aces_filmic(i as f32 * 0.1);
            assert!(y >= previous && y <= 1.0);
            previous = y;
        }
        assert!(aces_filmic(100.0) > 0.99);
    }

    #[test]
    fn test_inverse_aces_recovers_input() {
        for &y in &[0.05_f32, 0.2, 0.5, 0.8, 0.95] {
            let x = inverse_aces_filmic(y);
            assert!((aces_filmic(x) - y).abs() < 1e-4, "y={y} x={x}");
        }
        assert_eq!(inverse_aces_filmic(0.0), 0.0);
    }

    #[test]
    fn test_high_pass_cuts_below_threshold() {
        let threshold = 0.82;
        assert_eq!(high_pass(luma([0.5, 0.5, 0.5]), threshold), 0.0);
        assert_eq!(high_pass(luma([2.0, 2.0, 2.0]), threshold), 1.0);
        let edge = high_pass(threshold + 0.005, threshold);
        assert!(edge > 0.0 && edge < 1.0);
    }

    #[test]
    fn test_upsample_weight_grows_with_radius() {
        assert!((upsample_weight(0.0) - 0.6).abs() < 1e-6);
        assert!(upsample_weight(0.62) > upsample_weight(0.3));
    }

    #[test]
    fn test_bloom_levels_halve_from_half_resolution() {
        let sizes = bloom_level_sizes(1920, 1080);
        assert_eq!(sizes, vec![(960, 540), (480, 270), (240, 135), (120, 67), (60, 33)]);

        let tiny = bloom_level_sizes(3, 2);
        assert_eq!(tiny.len(), BLOOM_LEVELS);
        assert!(tiny.iter().all(|&(w, h)| w >= 1 && h >= 1));
    }

    #[test]
    fn test_chain_resizes_and_updates_params() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let params = PostParams::new(Some(&settings()), 1.15);
        let mut chain = PostChain::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb, 800, 600, params);
        assert_eq!(chain.size(), (800, 600));

        chain.resize(&device, 1024, 768);
        assert_eq!(chain.size(), (1024, 768));

        let mut stronger = params;
        stronger.strength = 2.0;
        chain.update_params(&queue, stronger);
        assert_eq!(chain.params().strength, 2.0);
    }
}
