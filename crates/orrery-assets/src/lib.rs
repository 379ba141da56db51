//! Texture sources, quality-tier resolution, and background texture loading.
//!
//! The source table maps every logical texture to one or more quality-tiered
//! URLs. [`resolve_url`] picks a concrete URL for the preferred tier, and the
//! loader fetches and decodes it through a [`ByteSource`]. A [`BundleTask`]
//! loads the whole standard set on worker threads and hands it over only once
//! every request has completed.

pub mod bundle;
pub mod loader;
pub mod progress;
pub mod quality;
pub mod sources;

pub use bundle::{AssetBundle, AssetRequest, BundleTask, load_bundle_blocking, standard_requests};
pub use loader::{
    AssetError, ByteSource, ColorSpace, HttpByteSource, LoadedTexture, TextureMapping,
    TextureOptions, TexturePixels, WrapMode, load_hdr_texture, load_texture,
};
pub use progress::LoadProgress;
pub use quality::{AssetDescriptor, QUALITY_ORDER, resolve_url, tier_index};
pub use sources::AssetKey;
