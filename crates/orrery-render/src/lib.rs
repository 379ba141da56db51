//! wgpu renderer for the orrery: surface management, GPU mirrors of the scene
//! arena, the scene shader variants and the bloom, tone mapping and FXAA chain.

pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod pipelines;
pub mod post;
pub mod renderer;
pub mod texture;
pub mod uniforms;

pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pipelines::{PipelineCache, PipelineKey, SceneLayouts};
pub use post::{PostChain, PostParams};
pub use renderer::SceneRenderer;
pub use texture::{GpuTexture, TextureCache, TextureError};
pub use uniforms::{FrameUniform, ObjectUniform};
