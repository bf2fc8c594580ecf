//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use strata_worldgen::{GenerationConfig, TerrainLayout};

use crate::error::ConfigError;

/// File name of the persisted config inside the config directory.
pub const CONFIG_FILE: &str = "strata.ron";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Shape of the terrain that gets generated.
    pub terrain: TerrainConfig,
    /// Seed, biomes and phase settings handed to the pipeline.
    pub generation: GenerationConfig,
    /// Where and what to write once a run completes.
    pub output: OutputConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Terrain shape. The terrain is centred on the world origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Side length of the square terrain in world units.
    pub world_size: f64,
    /// Grid side length in cells.
    pub resolution: usize,
    /// World height of a normalized height of 1.0.
    pub height_scale: f64,
    /// Number of splat (texture) layers.
    pub splat_layers: usize,
    /// Number of detail (vegetation) layers.
    pub detail_layers: usize,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory outputs are written into.
    pub directory: PathBuf,
    /// Save the final heightmap as `heightmap.png`.
    pub heightmap_png: bool,
    /// Save the biome map as `biomes.png`.
    pub biome_png: bool,
    /// Save the spawn groups as `spawns.ron`.
    pub spawn_list: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "strata_worldgen=trace").
    pub log_level: String,
}

/// Platform config directory for strata, e.g. `~/.config/strata` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("strata"))
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            world_size: 512.0,
            resolution: 257,
            height_scale: 120.0,
            splat_layers: 4,
            detail_layers: 2,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("strata-out"),
            heightmap_png: true,
            biome_png: true,
            spawn_list: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl TerrainConfig {
    /// Layout of the terrain resource this config describes.
    pub fn layout(&self) -> TerrainLayout {
        TerrainLayout {
            origin: DVec2::splat(-self.world_size * 0.5),
            size: DVec2::splat(self.world_size),
            height_scale: self.height_scale,
            resolution: self.resolution,
            splat_layers: self.splat_layers,
            detail_layers: self.detail_layers,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `strata.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(5)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file: returns `Some(new_config)` if it changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Check the terrain and generation settings before a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.layout().validate().map_err(ConfigError::Invalid)?;
        self.generation.validate().map_err(ConfigError::Invalid)?;
        self.generation.catalog().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(5))
                .unwrap();
        assert!(ron_str.contains("resolution: 257"));
        assert!(ron_str.contains("grassland"), "default biomes are written out");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let ron_str = "(terrain: (resolution: 65), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.terrain.resolution, 65);
        assert_eq!(config.terrain.world_size, 512.0);
        assert_eq!(config.output, OutputConfig::default());
        assert_eq!(config.generation, GenerationConfig::default());
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
        config.terrain.resolution = 129;
        config.generation.seed = 77;
        config.output.directory = PathBuf::from("/tmp/strata");

        config.save(dir.path()).unwrap();
        assert!(dir.path().join(CONFIG_FILE).exists());
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(&dir.path().join("nested")).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("nested").join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.generation.seed = 1234;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.generation.seed), Some(1234));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// This is a comment\n(\n  // Another comment\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_default_config_dir_is_namespaced() {
        if let Some(dir) = default_config_dir() {
            assert!(dir.ends_with("strata"));
        }
    }

    #[test]
    fn test_layout_is_centred() {
        let layout = TerrainConfig::default().layout();
        assert_eq!(layout.origin, DVec2::splat(-256.0));
        assert_eq!(layout.size, DVec2::splat(512.0));
        assert_eq!(layout.resolution, 257);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok(), "defaults must be runnable");

        let mut config = Config::default();
        config.terrain.resolution = 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.generation.edge_margin = -1.0;
        assert!(config.validate().is_err(), "negative edge margin rejected");
    }
}
