//! Platform directories for the viewer.
//!
//! Config, texture cache and log locations follow OS conventions (XDG on
//! Linux, Known Folders on Windows, Library on macOS).

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not determine OS configuration directory")]
    NoConfigDir,

    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

pub struct PlatformDirs {
    /// `config.ron` lives here.
    pub config_dir: PathBuf,
    /// Downloaded textures.
    pub cache_dir: PathBuf,
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "orrery";

impl PlatformDirs {
    /// Resolve platform-specific directories without creating them on disk.
    pub fn resolve() -> Result<Self, PlatformError> {
        let app_config = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?.join(APP_NAME);
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| app_config.clone())
            .join(APP_NAME);

        Ok(Self {
            config_dir: app_config.clone(),
            cache_dir,
            log_dir: app_config.join("logs"),
        })
    }

    /// Directories rooted under `root`, for a `--config` override and for tests.
    pub fn resolve_with_root(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            cache_dir: root.join("cache"),
            log_dir: root.join("logs"),
        }
    }

    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }

    /// Where downloaded textures are mirrored.
    pub fn texture_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("textures")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_gives_absolute_paths() {
        let Ok(dirs) = PlatformDirs::resolve() else {
            return;
        };
        assert!(dirs.config_dir.is_absolute(), "config_dir is not absolute");
        assert!(dirs.cache_dir.is_absolute(), "cache_dir is not absolute");
        assert!(dirs.log_dir.ends_with("logs"));
    }

    #[test]
    fn test_create_dirs_under_root() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dirs = PlatformDirs::resolve_with_root(tmp.path());
        dirs.create_dirs().expect("create_dirs failed for temp root");

        assert!(dirs.config_dir.exists(), "config_dir was not created");
        assert!(dirs.cache_dir.exists(), "cache_dir was not created");
        assert!(dirs.log_dir.exists(), "log_dir was not created");
        assert_eq!(dirs.texture_cache_dir(), tmp.path().join("cache").join("textures"));
    }
}
