//! Command-line argument parsing for the orrery viewer.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orrery", about = "Interactive solar-system viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Preferred texture quality tier (16k, 12k, 10k, 8k, 6k, 4k, 2k, 1k, 512).
    #[arg(long)]
    pub quality: Option<String>,

    /// Initial render resolution multiplier.
    #[arg(long)]
    pub resolution: Option<f32>,

    /// Ceiling for the effective pixel ratio.
    #[arg(long)]
    pub max_pixel_ratio: Option<f32>,

    /// Disable bloom and FXAA.
    #[arg(long)]
    pub no_postprocessing: bool,

    /// Do not build the nebula shell.
    #[arg(long)]
    pub no_nebula: bool,

    /// Do not build the asteroid belt.
    #[arg(long)]
    pub no_asteroids: bool,

    /// Load exoplanet data as soon as the scene is ready.
    #[arg(long)]
    pub auto_load_data: bool,

    /// Path or URL of the offline exoplanet sample.
    #[arg(long)]
    pub fallback_data: Option<String>,

    /// Never contact the exoplanet archive.
    #[arg(long)]
    pub offline: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// Boolean switches only ever turn their feature off (or the data flags
    /// on); an absent switch keeps the file value.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref quality) = args.quality {
            self.scene.texture_quality = quality.clone();
        }
        if let Some(resolution) = args.resolution {
            self.scene.resolution_multiplier = resolution;
        }
        if let Some(ratio) = args.max_pixel_ratio {
            self.scene.max_pixel_ratio = ratio;
        }
        if args.no_postprocessing {
            self.scene.enable_postprocessing = false;
        }
        if args.no_nebula {
            self.scene.enable_nebula = false;
        }
        if args.no_asteroids {
            self.scene.enable_asteroids = false;
        }
        if args.auto_load_data {
            self.scene.real_data_auto_load = true;
        }
        if let Some(ref path) = args.fallback_data {
            self.data.fallback_data_path = path.clone();
        }
        if args.offline {
            self.data.offline = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            quality: Some("4k".to_string()),
            no_nebula: true,
            offline: true,
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.scene.texture_quality, "4k");
        assert!(!config.scene.enable_nebula);
        assert!(config.data.offline);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
        assert!(config.scene.enable_asteroids);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "orrery",
            "--quality",
            "2k",
            "--resolution",
            "1.5",
            "--no-postprocessing",
            "--auto-load-data",
        ]);
        assert_eq!(args.quality.as_deref(), Some("2k"));
        assert_eq!(args.resolution, Some(1.5));
        assert!(args.no_postprocessing);
        assert!(args.auto_load_data);
        assert!(!args.no_asteroids);
    }
}
