//! Startup configuration for the orrery viewer.
//!
//! Settings persist to disk as a RON file, can be overridden from the command
//! line via clap, and tolerate missing or unknown fields so older config files
//! keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{AssetConfig, Config, DataConfig, DebugConfig, SceneOptions, WindowConfig};
pub use error::ConfigError;
