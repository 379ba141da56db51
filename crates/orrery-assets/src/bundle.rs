//! Loading the full texture set on worker threads.
//!
//! Every request runs on its own thread and reports back over a channel. The
//! main thread polls [`BundleTask`] once per frame; the bundle is only handed
//! over after every request has completed, so the scene never sees a partial
//! set.

use std::sync::Arc;
use std::thread::JoinHandle;

use rustc_hash::FxHashMap;

use crate::loader::{ByteSource, LoadedTexture, TextureOptions, load_hdr_texture, load_texture};
use crate::progress::LoadProgress;
use crate::quality::AssetDescriptor;
use crate::sources::AssetKey;

/// One texture to load.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub key: AssetKey,
    pub descriptor: AssetDescriptor,
    pub options: TextureOptions,
    /// Decode as a float equirectangular panorama.
    pub hdr: bool,
}

impl AssetRequest {
    pub fn new(key: AssetKey, options: TextureOptions) -> Self {
        Self {
            key,
            descriptor: key.descriptor(),
            options,
            hdr: false,
        }
    }

    pub fn hdr(key: AssetKey, preferred: &str) -> Self {
        Self {
            key,
            descriptor: key.descriptor(),
            options: TextureOptions::with_quality(preferred),
            hdr: true,
        }
    }

    /// Run the request on the calling thread.
    pub fn load(&self, source: &dyn ByteSource) -> Option<LoadedTexture> {
        if self.hdr {
            load_hdr_texture(source, &self.descriptor, &self.options.preferred_quality)
        } else {
            load_texture(source, &self.descriptor, &self.options)
        }
    }
}

/// The standard texture set at the given preferred quality.
///
/// The asteroid and environment textures always prefer `4k`; normal and
/// specular maps are sampled as linear data.
pub fn standard_requests(quality: &str) -> Vec<AssetRequest> {
    let color = |key: AssetKey| AssetRequest::new(key, TextureOptions::with_quality(quality));
    let data = |key: AssetKey| AssetRequest::new(key, TextureOptions::with_quality(quality).linear());
    vec![
        color(AssetKey::Starfield),
        color(AssetKey::SunSurface),
        color(AssetKey::EarthMap),
        data(AssetKey::EarthNormal),
        data(AssetKey::EarthSpecular),
        color(AssetKey::EarthClouds),
        color(AssetKey::MercuryMap),
        color(AssetKey::MoonMap),
        color(AssetKey::MarsMap),
        data(AssetKey::MarsNormal),
        color(AssetKey::JupiterMap),
        AssetRequest::new(AssetKey::AsteroidMap, TextureOptions::with_quality("4k")),
        AssetRequest::hdr(AssetKey::EnvironmentHdr, "4k"),
    ]
}

/// Loaded textures keyed by asset. Failed loads are simply absent.
#[derive(Debug, Default, Clone)]
pub struct AssetBundle {
    textures: FxHashMap<AssetKey, Arc<LoadedTexture>>,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: AssetKey, texture: LoadedTexture) {
        self.textures.insert(key, Arc::new(texture));
    }

    pub fn get(&self, key: AssetKey) -> Option<&Arc<LoadedTexture>> {
        self.textures.get(&key)
    }

    /// Remove a texture from the bundle, e.g. after a one-shot conversion.
    pub fn take(&mut self, key: AssetKey) -> Option<Arc<LoadedTexture>> {
        self.textures.remove(&key)
    }

    pub fn contains(&self, key: AssetKey) -> bool {
        self.textures.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Background load of a set of [`AssetRequest`]s.
pub struct BundleTask {
    receiver: crossbeam_channel::Receiver<(AssetKey, Option<LoadedTexture>)>,
    progress: LoadProgress,
    bundle: Option<AssetBundle>,
    handles: Vec<JoinHandle<()>>,
}

impl BundleTask {
    /// Start one worker thread per request.
    pub fn spawn(source: Arc<dyn ByteSource>, requests: Vec<AssetRequest>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut progress = LoadProgress::new(requests.len());
        let mut handles = Vec::with_capacity(requests.len());

        for request in requests {
            let tx = tx.clone();
            let source = Arc::clone(&source);
            let key = request.key;
            let spawned = std::thread::Builder::new()
                .name(format!("asset-{}", key.name()))
                .spawn(move || {
                    let texture = request.load(source.as_ref());
                    let _ = tx.send((request.key, texture));
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    log::warn!("Could not spawn loader for {}: {e}", key.name());
                    progress.complete_one();
                }
            }
        }

        log::info!("Loading {} textures in the background", progress.total());
        Self {
            receiver: rx,
            progress,
            bundle: Some(AssetBundle::new()),
            handles,
        }
    }

    /// Collect finished loads. Returns the bundle once, when every request has completed.
    pub fn poll(&mut self) -> Option<AssetBundle> {
        loop {
            match self.receiver.try_recv() {
                Ok((key, texture)) => {
                    let ratio = self.progress.complete_one();
                    log::debug!(
                        "{} {} ({:.0}%)",
                        if texture.is_some() { "Loaded" } else { "Skipped" },
                        key.name(),
                        ratio * 100.0
                    );
                    if let (Some(texture), Some(bundle)) = (texture, self.bundle.as_mut()) {
                        bundle.insert(key, texture);
                    }
                }
                Err(crossbeam_channel::TryRecvError::Empty) => break,
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    if !self.progress.is_complete() {
                        log::warn!(
                            "Texture workers exited early ({}/{} completed)",
                            self.progress.loaded(),
                            self.progress.total()
                        );
                        while !self.progress.is_complete() {
                            self.progress.complete_one();
                        }
                    }
                    break;
                }
            }
        }

        if !self.progress.is_complete() {
            return None;
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        self.bundle.take()
    }

    /// Completion ratio in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress.ratio()
    }
}

/// Load every request on the calling thread.
pub fn load_bundle_blocking(source: &dyn ByteSource, requests: &[AssetRequest]) -> AssetBundle {
    let mut bundle = AssetBundle::new();
    let mut progress = LoadProgress::new(requests.len());
    for request in requests {
        if let Some(texture) = request.load(source) {
            bundle.insert(request.key, texture);
        }
        let ratio = progress.complete_one();
        log::debug!("{} ({:.0}%)", request.key.name(), ratio * 100.0);
    }
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ColorSpace;
    use crate::loader::tests::{MemorySource, png_bytes};
    use std::time::{Duration, Instant};

    fn request(key: AssetKey, url: &str) -> AssetRequest {
        AssetRequest {
            key,
            descriptor: AssetDescriptor::Single(url.to_string()),
            options: TextureOptions::default(),
            hdr: false,
        }
    }

    fn wait_for(task: &mut BundleTask) -> AssetBundle {
        let start = Instant::now();
        loop {
            if let Some(bundle) = task.poll() {
                return bundle;
            }
            assert!(start.elapsed() < Duration::from_secs(5), "Timed out waiting for bundle");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_standard_requests_cover_all_keys() {
        let requests = standard_requests("2k");
        assert_eq!(requests.len(), 13);
        for key in AssetKey::ALL {
            assert!(requests.iter().any(|r| r.key == key), "{} missing", key.name());
        }
    }

    #[test]
    fn test_standard_request_options() {
        let requests = standard_requests("2k");
        let find = |key: AssetKey| requests.iter().find(|r| r.key == key).unwrap();
        assert_eq!(find(AssetKey::EarthMap).options.preferred_quality, "2k");
        assert_eq!(find(AssetKey::EarthNormal).options.color_space, ColorSpace::Linear);
        assert_eq!(find(AssetKey::EarthSpecular).options.color_space, ColorSpace::Linear);
        assert_eq!(find(AssetKey::MarsNormal).options.color_space, ColorSpace::Linear);
        assert_eq!(find(AssetKey::EarthClouds).options.color_space, ColorSpace::Srgb);
        assert_eq!(find(AssetKey::AsteroidMap).options.preferred_quality, "4k");
        assert!(find(AssetKey::EnvironmentHdr).hdr);
        assert!(!find(AssetKey::Starfield).hdr);
    }

    #[test]
    fn test_task_waits_for_every_request() {
        let source = Arc::new(MemorySource {
            files: vec![
                ("sun.png".to_string(), png_bytes(2, 2, [255, 200, 0, 255])),
                ("moon.png".to_string(), png_bytes(2, 2, [90, 90, 90, 255])),
            ],
            ..Default::default()
        });
        let requests = vec![
            request(AssetKey::SunSurface, "sun.png"),
            request(AssetKey::MoonMap, "moon.png"),
            request(AssetKey::JupiterMap, "missing.png"),
        ];

        let mut task = BundleTask::spawn(source, requests);
        let bundle = wait_for(&mut task);
        assert_eq!(task.progress(), 1.0);
        assert_eq!(bundle.len(), 2);
        assert!(bundle.contains(AssetKey::SunSurface));
        assert!(bundle.contains(AssetKey::MoonMap));
        assert!(!bundle.contains(AssetKey::JupiterMap), "failed load must be absent");
        assert!(task.poll().is_none(), "bundle is handed over only once");
    }

    #[test]
    fn test_empty_request_list_is_ready_immediately() {
        let mut task = BundleTask::spawn(Arc::new(MemorySource::default()), Vec::new());
        assert_eq!(task.progress(), 1.0);
        assert!(task.poll().unwrap().is_empty());
    }

    #[test]
    fn test_blocking_load_matches() {
        let source = MemorySource {
            files: vec![("a.png".to_string(), png_bytes(1, 1, [0, 0, 0, 255]))],
            ..Default::default()
        };
        let requests = [
            request(AssetKey::MercuryMap, "a.png"),
            request(AssetKey::MarsMap, "b.png"),
        ];
        let mut bundle = load_bundle_blocking(&source, &requests);
        assert_eq!(bundle.len(), 1);
        assert!(bundle.take(AssetKey::MercuryMap).is_some());
        assert!(bundle.is_empty());
    }
}
