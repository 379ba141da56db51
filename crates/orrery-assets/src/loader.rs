//! Fetching and decoding textures.
//!
//! Loads never fail at the public boundary: a missing URL, a network error or
//! an undecodable image is logged and turned into `None`, so callers can treat
//! the texture as an optional feature.

use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use orrery_config::AssetConfig;

use crate::quality::{AssetDescriptor, resolve_url};

/// Errors raised while fetching or decoding a texture.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{url} returned no data")]
    Empty { url: String },
}

/// How texel values should be interpreted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMapping {
    Uv,
    /// Equirectangular panorama used for environment lighting.
    EquirectangularReflection,
}

/// Decoded texel data, tightly packed RGBA rows.
#[derive(Debug, Clone, PartialEq)]
pub enum TexturePixels {
    Rgba8(Vec<u8>),
    RgbaF32(Vec<f32>),
}

/// Options applied to a texture once it is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureOptions {
    pub preferred_quality: String,
    pub color_space: ColorSpace,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub anisotropy: u16,
    pub generate_mipmaps: bool,
    pub flip_y: bool,
    pub mapping: TextureMapping,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            preferred_quality: "8k".to_string(),
            color_space: ColorSpace::Srgb,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            anisotropy: 16,
            generate_mipmaps: true,
            flip_y: false,
            mapping: TextureMapping::Uv,
        }
    }
}

impl TextureOptions {
    pub fn with_quality(quality: &str) -> Self {
        Self {
            preferred_quality: quality.to_string(),
            ..Default::default()
        }
    }

    pub fn linear(mut self) -> Self {
        self.color_space = ColorSpace::Linear;
        self
    }
}

/// A decoded texture plus the metadata the renderer needs to upload it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTexture {
    pub pixels: TexturePixels,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub anisotropy: u16,
    pub generate_mipmaps: bool,
    pub flip_y: bool,
    pub mapping: TextureMapping,
    /// URL the texture was loaded from.
    pub source: String,
}

impl LoadedTexture {
    pub fn is_hdr(&self) -> bool {
        matches!(self.pixels, TexturePixels::RgbaF32(_))
    }

    /// Texel at `(x, y)` as floats, normalized to `[0, 1]` for LDR data.
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let i = ((y * self.width + x) * 4) as usize;
        match &self.pixels {
            TexturePixels::Rgba8(data) => [
                data[i] as f32 / 255.0,
                data[i + 1] as f32 / 255.0,
                data[i + 2] as f32 / 255.0,
                data[i + 3] as f32 / 255.0,
            ],
            TexturePixels::RgbaF32(data) => [data[i], data[i + 1], data[i + 2], data[i + 3]],
        }
    }
}

/// Source of raw texture bytes.
pub trait ByteSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Fetches `http(s)` URLs over the network and everything else from disk.
///
/// Downloads are optionally mirrored into a cache directory so later runs can
/// skip the network.
pub struct HttpByteSource {
    agent: ureq::Agent,
    cache_dir: Option<PathBuf>,
}

impl HttpByteSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            cache_dir: None,
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Build a source from the asset section of the startup config.
    pub fn from_config(config: &AssetConfig) -> Self {
        let source = Self::new(Duration::from_secs(config.request_timeout_secs));
        if !config.cache_downloads {
            return source;
        }
        let dir = config
            .cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("orrery").join("textures")));
        match dir {
            Some(dir) => source.with_cache_dir(dir),
            None => source,
        }
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.agent.get(url).call().map_err(|e| AssetError::Http {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| AssetError::Io {
                path: PathBuf::from(url),
                source: e,
            })?;
        Ok(bytes)
    }
}

impl ByteSource for HttpByteSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if !is_remote(url) {
            return read_file(Path::new(url));
        }

        let cached = self.cache_dir.as_ref().map(|dir| dir.join(cache_file_name(url)));
        if let Some(path) = cached.as_ref().filter(|p| p.exists()) {
            match read_file(path) {
                Ok(bytes) if !bytes.is_empty() => {
                    log::debug!("Texture cache hit for {url}");
                    return Ok(bytes);
                }
                _ => log::warn!("Ignoring unreadable cache entry {}", path.display()),
            }
        }

        let bytes = self.fetch_remote(url)?;
        if let Some(path) = cached {
            let written = path
                .parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|()| std::fs::write(&path, &bytes));
            if let Err(e) = written {
                log::warn!("Could not cache {url} at {}: {e}", path.display());
            }
        }
        Ok(bytes)
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn read_file(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|e| AssetError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Stable cache file name: URL hash plus the original file name.
fn cache_file_name(url: &str) -> String {
    let mut hasher = rustc_hash::FxHasher::default();
    url.hash(&mut hasher);
    let file = url
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
        .collect::<String>();
    format!("{:016x}-{file}", hasher.finish())
}

/// Resolve, fetch and decode an LDR texture. Returns `None` on any failure.
pub fn load_texture(
    source: &dyn ByteSource,
    descriptor: &AssetDescriptor,
    options: &TextureOptions,
) -> Option<LoadedTexture> {
    let url = resolve_url(descriptor, &options.preferred_quality)?;
    match decode(source, url, options, false) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::warn!("Texture load failed for {url}: {e}");
            None
        }
    }
}

/// Resolve, fetch and decode an equirectangular HDR panorama.
///
/// The result holds float texels and is tagged for reflection mapping.
pub fn load_hdr_texture(
    source: &dyn ByteSource,
    descriptor: &AssetDescriptor,
    preferred: &str,
) -> Option<LoadedTexture> {
    let options = TextureOptions {
        preferred_quality: preferred.to_string(),
        color_space: ColorSpace::Linear,
        generate_mipmaps: false,
        mapping: TextureMapping::EquirectangularReflection,
        ..Default::default()
    };
    let url = resolve_url(descriptor, preferred)?;
    match decode(source, url, &options, true) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::warn!("HDR texture load failed for {url}: {e}");
            None
        }
    }
}

fn decode(
    source: &dyn ByteSource,
    url: &str,
    options: &TextureOptions,
    hdr: bool,
) -> Result<LoadedTexture, AssetError> {
    let bytes = source.fetch(url)?;
    if bytes.is_empty() {
        return Err(AssetError::Empty {
            url: url.to_string(),
        });
    }

    let mut image = image::load_from_memory(&bytes).map_err(|e| AssetError::Decode {
        url: url.to_string(),
        source: e,
    })?;
    if options.flip_y {
        image = image.flipv();
    }

    let (width, height) = (image.width(), image.height());
    let pixels = if hdr {
        TexturePixels::RgbaF32(image.to_rgba32f().into_raw())
    } else {
        TexturePixels::Rgba8(image.to_rgba8().into_raw())
    };

    log::info!("Loaded texture {url} ({width}x{height})");
    Ok(LoadedTexture {
        pixels,
        width,
        height,
        color_space: options.color_space,
        wrap_s: options.wrap_s,
        wrap_t: options.wrap_t,
        anisotropy: options.anisotropy,
        generate_mipmaps: options.generate_mipmaps,
        flip_y: options.flip_y,
        mapping: options.mapping,
        source: url.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory source that records which URLs were requested.
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub files: Vec<(String, Vec<u8>)>,
        pub requested: Mutex<Vec<String>>,
    }

    impl ByteSource for MemorySource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.files
                .iter()
                .find(|(u, _)| u == url)
                .map(|(_, b)| b.clone())
                .ok_or_else(|| AssetError::Io {
                    path: PathBuf::from(url),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
        }
    }

    pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_load_texture_applies_options() {
        let source = MemorySource {
            files: vec![("b.png".to_string(), png_bytes(4, 2, [10, 20, 30, 255]))],
            ..Default::default()
        };
        let descriptor = AssetDescriptor::tiered(&[("8k", "a.png"), ("4k", "b.png")]);
        let options = TextureOptions::with_quality("4k").linear();

        let texture = load_texture(&source, &descriptor, &options).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.color_space, ColorSpace::Linear);
        assert_eq!(texture.anisotropy, 16);
        assert!(texture.generate_mipmaps);
        assert_eq!(texture.source, "b.png");
        assert_eq!(texture.texel(0, 0)[0], 10.0 / 255.0);
    }

    #[test]
    fn test_unresolvable_descriptor_skips_fetch() {
        let source = MemorySource::default();
        let empty = AssetDescriptor::Tiered(Vec::new());
        assert!(load_texture(&source, &empty, &TextureOptions::default()).is_none());
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_failure_returns_none() {
        let source = MemorySource::default();
        let descriptor = AssetDescriptor::Single("missing.jpg".to_string());
        assert!(load_texture(&source, &descriptor, &TextureOptions::default()).is_none());
        assert_eq!(source.requested.lock().unwrap().as_slice(), ["missing.jpg"]);
    }

    #[test]
    fn test_decode_failure_returns_none() {
        let source = MemorySource {
            files: vec![("bad.jpg".to_string(), b"not an image".to_vec())],
            ..Default::default()
        };
        let descriptor = AssetDescriptor::Single("bad.jpg".to_string());
        assert!(load_texture(&source, &descriptor, &TextureOptions::default()).is_none());
    }

    #[test]
    fn test_hdr_loader_tags_reflection_mapping() {
        let source = MemorySource {
            files: vec![("env.png".to_string(), png_bytes(2, 1, [255, 0, 0, 255]))],
            ..Default::default()
        };
        let descriptor = AssetDescriptor::tiered(&[("4k", "env.png")]);
        let texture = load_hdr_texture(&source, &descriptor, "4k").unwrap();
        assert!(texture.is_hdr());
        assert_eq!(texture.mapping, TextureMapping::EquirectangularReflection);
        assert_eq!(texture.texel(1, 0), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_flip_y() {
        let mut img = image::RgbaImage::from_pixel(1, 2, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        let source = MemorySource {
            files: vec![("f.png".to_string(), out.into_inner())],
            ..Default::default()
        };
        let options = TextureOptions {
            flip_y: true,
            ..Default::default()
        };
        let descriptor = AssetDescriptor::Single("f.png".to_string());
        let texture = load_texture(&source, &descriptor, &options).unwrap();
        assert_eq!(texture.texel(0, 0)[0], 0.0);
        assert_eq!(texture.texel(0, 1)[0], 1.0);
    }

    #[test]
    fn test_http_source_reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.png");
        std::fs::write(&path, png_bytes(1, 1, [1, 2, 3, 4])).unwrap();

        let source = HttpByteSource::new(Duration::from_secs(1));
        let bytes = source.fetch(path.to_str().unwrap()).unwrap();
        assert!(!bytes.is_empty());
        assert!(source.fetch("does/not/exist.png").is_err());
    }

    #[test]
    fn test_cached_download_is_served_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.invalid/textures/8k_moon.jpg";
        std::fs::write(dir.path().join(cache_file_name(url)), b"cached").unwrap();

        let source = HttpByteSource::new(Duration::from_millis(10)).with_cache_dir(dir.path());
        assert_eq!(source.fetch(url).unwrap(), b"cached");
    }

    #[test]
    fn test_cache_file_name_is_stable_and_safe() {
        let a = cache_file_name("https://host/a/8k_sun.jpg?x=1");
        assert_eq!(a, cache_file_name("https://host/a/8k_sun.jpg?x=1"));
        assert_ne!(a, cache_file_name("https://host/b/8k_sun.jpg?x=1"));
        assert!(!a.contains('/') && !a.contains('?'));
    }
}
