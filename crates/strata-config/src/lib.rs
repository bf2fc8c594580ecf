//! Application configuration for the strata world generator.
//!
//! Settings persist to disk as a RON file, embed the generation config used
//! by `strata-worldgen`, and can be overridden from the command line via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE, Config, DebugConfig, OutputConfig, TerrainConfig, default_config_dir,
};
pub use error::ConfigError;
