//! The binary entry point for the orrery viewer.

use clap::Parser;
use orrery_app::platform::PlatformDirs;
use orrery_config::{CliArgs, Config};
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(root) => PlatformDirs::resolve_with_root(root),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to resolve platform directories: {e}");
                std::process::exit(1);
            }
        },
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
        std::process::exit(1);
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e}");
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    if config.assets.cache_downloads && config.assets.cache_dir.is_none() {
        config.assets.cache_dir = Some(dirs.texture_cache_dir());
    }

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    let seed = config.scene.seed.unwrap_or_else(rand::random);
    info!(
        "Window: {}x{} | quality: {} | seed: {seed}",
        config.window.width, config.window.height, config.scene.texture_quality
    );
    info!("Config dir: {}", dirs.config_dir.display());

    if let Err(e) = orrery_app::window::run(config, seed) {
        error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
