//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Scene construction options read once at startup.
    pub scene: SceneOptions,
    /// Exoplanet data provider settings.
    pub data: DataConfig,
    /// Texture fetching and caching.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Startup options for scene construction.
///
/// Unlike the runtime settings these are only read while the scene is built;
/// changing them requires a restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneOptions {
    /// Preferred texture quality tier label (e.g. "8k", "4k").
    pub texture_quality: String,
    /// Initial render resolution multiplier.
    pub resolution_multiplier: f32,
    /// Upper bound on the effective pixel ratio.
    pub max_pixel_ratio: f32,
    /// Run the bloom + FXAA post-processing chain.
    pub enable_postprocessing: bool,
    /// Build the procedural nebula shell.
    pub enable_nebula: bool,
    /// Build the instanced asteroid belt.
    pub enable_asteroids: bool,
    /// Start an exoplanet data load as soon as the scene is running.
    pub real_data_auto_load: bool,
    /// Radius of the central star in scene units.
    pub star_radius: f32,
    /// Scale applied to the planet distance table.
    pub orbit_scale: f32,
    /// Seed for asteroid and exoplanet placement. `None` draws from the OS.
    pub seed: Option<u64>,
}

/// Exoplanet data provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Location of the bundled offline sample (file path or URL).
    pub fallback_data_path: String,
    /// Maximum rows requested from the archive.
    pub archive_limit: u32,
    /// Network timeout for archive requests, in seconds.
    pub request_timeout_secs: u64,
    /// Skip the archive and read only the offline sample.
    pub offline: bool,
}

/// Texture fetching configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Keep downloaded textures in an on-disk cache.
    pub cache_downloads: bool,
    /// Override for the cache directory. Defaults to the platform cache dir.
    pub cache_dir: Option<PathBuf>,
    /// Network timeout for texture downloads, in seconds.
    pub request_timeout_secs: u64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log a frame-time summary every N seconds (0 = off).
    pub frame_stats_interval_secs: u32,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            texture_quality: "8k".to_string(),
            resolution_multiplier: 1.0,
            max_pixel_ratio: 4.0,
            enable_postprocessing: true,
            enable_nebula: true,
            enable_asteroids: true,
            real_data_auto_load: false,
            star_radius: 32.0,
            orbit_scale: 48.0,
            seed: None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            fallback_data_path: "data/sample_exoplanets.json".to_string(),
            archive_limit: 500,
            request_timeout_secs: 20,
            offline: false,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            cache_downloads: true,
            cache_dir: None,
            request_timeout_secs: 60,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_stats_interval_secs: 0,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Reject values the scene cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scene = &self.scene;
        if !is_positive(scene.max_pixel_ratio) {
            return Err(ConfigError::InvalidValue {
                field: "scene.max_pixel_ratio",
                reason: format!("must be positive, got {}", scene.max_pixel_ratio),
            });
        }
        if !is_positive(scene.resolution_multiplier) {
            return Err(ConfigError::InvalidValue {
                field: "scene.resolution_multiplier",
                reason: format!("must be positive, got {}", scene.resolution_multiplier),
            });
        }
        if !is_positive(scene.star_radius) || !is_positive(scene.orbit_scale) {
            return Err(ConfigError::InvalidValue {
                field: "scene.star_radius / scene.orbit_scale",
                reason: "must be positive".to_string(),
            });
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window",
                reason: format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            });
        }
        Ok(())
    }
}

/// NaN-safe positivity check.
fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("texture_quality: \"8k\""));
        assert!(ron_str.contains("archive_limit: 500"));
    }

    #[test]
    fn test_scene_defaults() {
        let scene = SceneOptions::default();
        assert_eq!(scene.texture_quality, "8k");
        assert_eq!(scene.resolution_multiplier, 1.0);
        assert_eq!(scene.max_pixel_ratio, 4.0);
        assert!(scene.enable_postprocessing && scene.enable_nebula && scene.enable_asteroids);
        assert!(!scene.real_data_auto_load);
        assert_eq!(scene.star_radius, 32.0);
        assert_eq!(scene.orbit_scale, 48.0);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), scene: (enable_nebula: false))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.data, DataConfig::default());
        assert!(!config.scene.enable_nebula);
        assert_eq!(config.scene.texture_quality, "8k");
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.scene.texture_quality = "4k".to_string();
        config.scene.seed = Some(42);
        config.data.offline = true;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_pixel_ratio() {
        let mut config = Config::default();
        config.scene.max_pixel_ratio = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "scene.max_pixel_ratio",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_file_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "(window: (width: 0, height: 720))",
        )
        .unwrap();
        assert!(Config::load_or_create(dir.path()).is_err());
    }
}
