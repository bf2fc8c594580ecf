//! Command-line argument parsing for the `strata` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `strata.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Deterministic terrain and biome generator")]
pub struct CliArgs {
    /// World seed (0 picks a random seed and reports it).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Terrain grid resolution in cells per side.
    #[arg(long)]
    pub resolution: Option<usize>,

    /// Pause after every phase and read commands from stdin.
    #[arg(long)]
    pub artist: bool,

    /// Directory outputs are written into.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.generation.seed = seed;
        }
        if let Some(res) = args.resolution {
            self.terrain.resolution = res;
        }
        if let Some(ref dir) = args.output {
            self.output.directory = dir.clone();
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
            seed: Some(42),
            output: Some(PathBuf::from("out")),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.generation.seed, 42);
        assert_eq!(config.output.directory, PathBuf::from("out"));
        // Non-overridden fields retain defaults
        assert_eq!(config.terrain.resolution, 257);
        assert_eq!(config.debug.log_level, "info");
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
        let args = CliArgs::try_parse_from([
            "strata",
            "--seed",
            "9",
            "--resolution",
            "65",
            "--artist",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.resolution, Some(65));
        assert!(args.artist);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }
}
