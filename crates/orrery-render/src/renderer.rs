//! Mirrors the scene arena onto the GPU and draws it.
//!
//! [`SceneRenderer::sync`] runs once per frame after the scene update: it
//! frees resources of despawned entities, uploads new ones, and refreshes
//! every uniform. [`SceneRenderer::render`] then draws opaque entities in id
//! order followed by transparent ones back to front, and runs the post chain.

use std::sync::Arc;

use orrery_scene::{Drawable, EntityId, MaterialKind, SceneComposer, TextureRef};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::mesh::GpuGeometry;
use crate::pipelines::{PipelineCache, PipelineKey, SceneLayouts};
use crate::post::{PostChain, PostParams};
use crate::texture::{GpuTexture, TextureCache, upload_environment};
use crate::uniforms::{FrameUniform, ObjectUniform, collect_shadow_casters};

/// GPU resources of one drawable entity.
struct GpuObject {
    geometry: GpuGeometry,
    uniform_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    material_bind_group: wgpu::BindGroup,
    pipeline: PipelineKey,
}

/// Where an entity falls in the draw order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawEntry {
    pub id: EntityId,
    pub transparent: bool,
    /// Distance from the camera to the entity's origin.
    pub distance: f32,
}

/// Opaque entries in id order, then transparent entries farthest first.
pub fn draw_order(entries: &[DrawEntry]) -> Vec<EntityId> {
    let mut opaque: Vec<&DrawEntry> = entries.iter().filter(|e| !e.transparent).collect();
    let mut transparent: Vec<&DrawEntry> = entries.iter().filter(|e| e.transparent).collect();
    opaque.sort_by_key(|e| e.id);
    transparent.sort_by(|a, b| b.distance.total_cmp(&a.distance).then(a.id.cmp(&b.id)));
    opaque.into_iter().chain(transparent).map(|e| e.id).collect()
}

pub struct SceneRenderer {
    layouts: SceneLayouts,
    pipelines: PipelineCache,
    textures: TextureCache,
    depth: DepthBuffer,
    post: PostChain,
    post_enabled: bool,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    _environment: wgpu::Texture,
    objects: FxHashMap<EntityId, GpuObject>,
    draws: Vec<EntityId>,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        scene: &SceneComposer,
    ) -> Self {
        let layouts = SceneLayouts::new(device);
        let pipelines = PipelineCache::new(device, &layouts);
        let textures = TextureCache::new(device, queue);
        let viewport = scene.viewport();
        let depth = DepthBuffer::new(device, viewport.width, viewport.height);
        let post = PostChain::new(
            device,
            surface_format,
            viewport.width,
            viewport.height,
            PostParams::new(scene.post(), scene.lighting().exposure),
        );

        let frame = FrameUniform::new(scene, &[]);
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene-frame-uniform"),
            contents: bytemuck::bytes_of(&frame),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let (environment, environment_view) =
            upload_environment(device, queue, scene.lighting().environment.as_ref());
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-frame-bg"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&environment_view),
                },
            ],
        });

        Self {
            layouts,
            pipelines,
            textures,
            depth,
            post,
            post_enabled: scene.post().is_some(),
            frame_buffer,
            frame_bind_group,
            _environment: environment,
            objects: FxHashMap::default(),
            draws: Vec::new(),
        }
    }

    /// Bring GPU state up to date with the scene.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &mut SceneComposer) {
        let released = scene.take_released();
        if !released.is_empty() {
            for id in &released {
                self.objects.remove(id);
            }
            let pruned = self.textures.prune();
            log::debug!("released {} entities, {pruned} textures", released.len());
        }

        let viewport = scene.viewport();
        self.depth.resize(device, viewport.width, viewport.height);
        self.post.resize(device, viewport.width, viewport.height);
        self.post
            .update_params(queue, PostParams::new(scene.post(), scene.lighting().exposure));
        self.post_enabled = scene.post().is_some();

        let arena = scene.arena();
        let casters = collect_shadow_casters(arena);
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&FrameUniform::new(scene, &casters)));

        let camera_position = scene.camera().position;
        let mut entries = Vec::new();
        for (id, entity) in arena.iter() {
            let Some(drawable) = &entity.drawable else {
                continue;
            };
            if !self.objects.contains_key(&id) {
                let object = self.create_object(device, queue, &entity.name, drawable);
                self.objects.insert(id, object);
            }
            let Some(object) = self.objects.get(&id) else {
                continue;
            };

            let world = arena.world_matrix(id);
            let slot = casters.iter().position(|c| c.entity == id);
            let uniform = ObjectUniform::new(world, drawable, slot);
            queue.write_buffer(&object.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

            if arena.is_visible(id) {
                entries.push(DrawEntry {
                    id,
                    transparent: drawable.material.is_transparent(),
                    distance: camera_position.distance(world.w_axis.truncate()),
                });
            }
        }
        self.draws = draw_order(&entries);
    }

    fn create_object(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        drawable: &Drawable,
    ) -> GpuObject {
        let geometry = GpuGeometry::upload(device, name, &drawable.geometry);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{name}-uniform")),
            size: std::mem::size_of::<ObjectUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}-object-bg")),
            layout: &self.layouts.object,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let (map, normal_map, roughness_map) = material_textures(drawable);
        let white = self.textures.white();
        let flat_normal = self.textures.flat_normal();
        let mut upload = |texture: Option<&TextureRef>, fallback: &Arc<GpuTexture>| {
            texture.map_or_else(
                || Arc::clone(fallback),
                |t| self.textures.get_or_upload(device, queue, t),
            )
        };
        let base = upload(map, &white);
        let normal = upload(normal_map, &flat_normal);
        let roughness = upload(roughness_map, &white);
        let sampler = match (map, normal_map) {
            (Some(_), _) => &base.sampler,
            (None, Some(_)) => &normal.sampler,
            (None, None) => &roughness.sampler,
        };
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}-material-bg")),
            layout: &self.layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&base.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&roughness.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let pipeline = PipelineKey::for_drawable(drawable);
        self.pipelines.ensure(device, pipeline);
        log::trace!("uploaded {name} ({pipeline:?})");

        GpuObject {
            geometry,
            uniform_buffer,
            object_bind_group,
            material_bind_group,
            pipeline,
        }
    }

    /// Record the scene pass and the post chain, ending in `surface_view`.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.post.hdr_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(self.depth.attachment()),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for id in &self.draws {
                let Some(object) = self.objects.get(id) else {
                    continue;
                };
                let Some(pipeline) = self.pipelines.get(&object.pipeline) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &object.object_bind_group, &[]);
                pass.set_bind_group(2, &object.material_bind_group, &[]);
                object.geometry.draw(&mut pass);
            }
        }
        self.post.execute(encoder, surface_view, self.post_enabled);
    }

    /// Draw one frame to the window surface.
    pub fn render(&self, ctx: &RenderContext) -> Result<(), SurfaceError> {
        let frame = ctx.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene-frame"),
        });
        self.encode(&mut encoder, &view);
        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Entities with GPU resources.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Entities drawn by the next [`encode`](Self::encode).
    pub fn draw_list(&self) -> &[EntityId] {
        &self.draws
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

fn material_textures(
    drawable: &Drawable,
) -> (Option<&TextureRef>, Option<&TextureRef>, Option<&TextureRef>) {
    match &drawable.material.kind {
        MaterialKind::Surface(surface) => (
            surface.map.as_ref(),
            surface.normal_map.as_ref(),
            surface.roughness_map.as_ref(),
        ),
        MaterialKind::Basic { map, .. } => (map.as_ref(), None, None),
        _ => (None, None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;
    use orrery_assets::AssetBundle;
    use orrery_config::SceneOptions;
    use orrery_scene::Settings;

    fn scene() -> SceneComposer {
        let options = SceneOptions::default();
        let mut scene =
            SceneComposer::build(&options, Settings::from_options(&options), AssetBundle::new(), 3);
        scene.resize(320.0, 240.0, 1.0);
        scene
    }

    fn entry(id: u32, transparent: bool, distance: f32) -> DrawEntry {
        DrawEntry {
            id: EntityId(id),
            transparent,
            distance,
        }
    }

    #[test]
    fn test_opaque_before_transparent_back_to_front() {
        let entries = [
            entry(4, true, 10.0),
            entry(2, false, 50.0),
            entry(7, true, 300.0),
            entry(1, false, 5.0),
            entry(3, true, 120.0),
        ];
        let order: Vec<u32> = draw_order(&entries).into_iter().map(|id| id.0).collect();
        assert_eq!(order, vec![1, 2, 7, 3, 4]);
    }

    #[test]
    fn test_equal_distances_keep_id_order() {
        let entries = [entry(9, true, 1.0), entry(5, true, 1.0)];
        assert_eq!(draw_order(&entries), vec![EntityId(5), EntityId(9)]);
    }

    #[test]
    fn test_sync_uploads_every_drawable() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut scene = scene();
        let mut renderer =
            SceneRenderer::new(&device, &queue, wgpu::TextureFormat::Rgba8UnormSrgb, &scene);
        renderer.sync(&device, &queue, &mut scene);

        let drawables = scene.arena().iter().filter(|(_, e)| e.drawable.is_some()).count();
        assert_eq!(renderer.object_count(), drawables);
        assert!(!renderer.draw_list().is_empty());
        assert!(renderer.texture_count() > 0, "the baked starfield texture is uploaded");

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test-surface"),
            size: wgpu::Extent3d {
                width: 320,
                height: 240,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        renderer.encode(&mut encoder, &view);
        queue.submit(std::iter::once(encoder.finish()));
    }

    #[test]
    fn test_dispose_releases_gpu_objects() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut scene = scene();
        let mut renderer =
            SceneRenderer::new(&device, &queue, wgpu::TextureFormat::Rgba8UnormSrgb, &scene);
        renderer.sync(&device, &queue, &mut scene);
        assert!(renderer.object_count() > 0);
        let textures = renderer.texture_count();

        scene.dispose();
        renderer.sync(&device, &queue, &mut scene);
        assert_eq!(renderer.object_count(), 0);
        assert!(renderer.draw_list().is_empty());
        assert!(renderer.texture_count() < textures, "textures of despawned materials are pruned");
    }
}
