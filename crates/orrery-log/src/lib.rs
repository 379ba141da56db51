//! Structured logging for the orrery viewer.
//!
//! Console output with uptime timestamps and module paths, plus a JSON log file
//! in debug builds. Library crates log through the `log` facade; the
//! subscriber installed here picks those records up alongside `tracing` spans.

use std::fs::File;
use std::path::Path;

use orrery_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "orrery.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging should be attempted
/// * `config` - optional config whose `debug.log_level` seeds the filter
///
/// `RUST_LOG` always wins over the config value.
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let directive = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build && let Some(log_file) = log_dir.and_then(open_log_file) {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Resolve the filter directive from the config, falling back to [`DEFAULT_FILTER`].
///
/// A bare level such as `"debug"` keeps the wgpu/naga noise suppression.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config.map(|c| c.debug.log_level.trim()) {
        Some(level) if !level.is_empty() && !level.contains(['=', ',']) => {
            format!("{level},wgpu=warn,naga=warn")
        }
        Some(level) if !level.is_empty() => level.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create the log directory and truncate the log file inside it.
fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_without_config() {
        let directive = filter_directive(None);
        assert_eq!(directive, DEFAULT_FILTER);
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn test_bare_level_keeps_gpu_noise_suppressed() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        let directive = filter_directive(Some(&config));
        assert!(directive.starts_with("debug"));
        assert!(directive.contains("wgpu=warn"));
        assert!(directive.contains("naga=warn"));
    }

    #[test]
    fn test_full_directive_passes_through() {
        let mut config = Config::default();
        config.debug.log_level = "warn,orrery_scene=trace".to_string();
        assert_eq!(filter_directive(Some(&config)), "warn,orrery_scene=trace");
    }

    #[test]
    fn test_empty_level_falls_back_to_default() {
        let mut config = Config::default();
        config.debug.log_level = "   ".to_string();
        assert_eq!(filter_directive(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        for directive in ["info", "debug,orrery_assets=trace", "error"] {
            assert!(
                EnvFilter::try_new(directive).is_ok(),
                "Failed to parse filter: {directive}"
            );
        }
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("logs").join("run");
        assert!(open_log_file(&nested).is_some());
        assert!(nested.join(LOG_FILE_NAME).exists());
    }
}
