//! Generation configuration and the stock biome set.

use serde::{Deserialize, Serialize};

use crate::biome::{BiomeCatalog, BiomeDef, LayoutConfig, VegetationLayer};
use crate::error::GenerationError;
use crate::noise_field::NoiseSettings;
use crate::phase::PhaseKind;
use crate::placement::{ChildRule, ClusterSettings, PlacementCategory, ScatterRule, TerrainFeature};

/// How grid phases turn the biome map into per-cell values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiomeSampling {
    /// Use only the nearest biome at each cell. Borders are hard edges.
    #[default]
    Dominant,
    /// Mix the two nearest biomes by their blend weights.
    Blended,
}

/// Per-phase enable flags. A disabled phase is skipped, not failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseToggles {
    pub biome_layout: bool,
    pub terrain_sculpt: bool,
    pub splatmap_paint: bool,
    pub vegetation: bool,
    pub scatter: bool,
}

impl Default for PhaseToggles {
    fn default() -> Self {
        Self {
            biome_layout: true,
            terrain_sculpt: true,
            splatmap_paint: true,
            vegetation: true,
            scatter: true,
        }
    }
}

impl PhaseToggles {
    /// Whether `kind` should run.
    pub fn is_enabled(&self, kind: PhaseKind) -> bool {
        match kind {
            PhaseKind::BiomeLayout => self.biome_layout,
            PhaseKind::TerrainSculpt => self.terrain_sculpt,
            PhaseKind::SplatmapPaint => self.splatmap_paint,
            PhaseKind::Vegetation => self.vegetation,
            PhaseKind::Scatter => self.scatter,
        }
    }
}

/// Everything a generation run needs besides the terrain it writes into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Run seed. 0 draws a fresh seed at `begin`, which is then stored back
    /// into the run's config so the run can be reproduced.
    pub seed: u64,
    /// World units trimmed from every side of the terrain before generating.
    pub edge_margin: f64,
    /// Biome types available to the layout.
    pub biomes: Vec<BiomeDef>,
    /// Voronoi layout parameters.
    pub layout: LayoutConfig,
    /// Dominant-only or blend-aware sculpting and painting.
    pub sampling: BiomeSampling,
    /// Per-phase enable flags.
    pub phases: PhaseToggles,
    /// Render a preview overlay after each phase in artist mode.
    pub debug_overlays: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            edge_margin: 0.0,
            biomes: default_biomes(),
            layout: LayoutConfig::default(),
            sampling: BiomeSampling::Dominant,
            phases: PhaseToggles::default(),
            debug_overlays: true,
        }
    }
}

impl GenerationConfig {
    /// Reject values no run could use.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if !self.edge_margin.is_finite() || self.edge_margin < 0.0 {
            return Err(GenerationError::InvalidConfig(format!(
                "edge margin must be a non-negative number, got {}",
                self.edge_margin
            )));
        }
        if !self.layout.blend_width.is_finite() || self.layout.blend_width < 0.0 {
            return Err(GenerationError::InvalidConfig(format!(
                "blend width must be a non-negative number, got {}",
                self.layout.blend_width
            )));
        }
        Ok(())
    }

    /// Build the biome catalog, rejecting duplicate names.
    pub fn catalog(&self) -> Result<BiomeCatalog, GenerationError> {
        BiomeCatalog::from_defs(self.biomes.iter().cloned())
    }
}

/// Grassland, forest, and highlands, painting splat layers 0-2 and detail
/// layers 0-1.
pub fn default_biomes() -> Vec<BiomeDef> {
    vec![
        BiomeDef {
            name: "grassland".into(),
            weight: 2.0,
            base_height: 8.0,
            height_variation: 4.0,
            height_noise: NoiseSettings {
                frequency: 0.008,
                octaves: 3,
                ..Default::default()
            },
            texture_layer: 0,
            vegetation: vec![VegetationLayer {
                detail_layer: 0,
                density: 0.6,
                max_density: 12,
            }],
            scatter: vec![ScatterRule {
                name: "rocks".into(),
                object_keys: vec!["rock_small".into(), "rock_medium".into()],
                density: 0.2,
                min_spacing: 6.0,
                category: PlacementCategory::Flat,
                scale_range: (0.8, 1.3),
                ..Default::default()
            }],
            debug_color: [110, 180, 70],
        },
        BiomeDef {
            name: "forest".into(),
            weight: 1.5,
            base_height: 12.0,
            height_variation: 6.0,
            texture_layer: 1,
            vegetation: vec![
                VegetationLayer {
                    detail_layer: 0,
                    density: 0.3,
                    max_density: 6,
                },
                VegetationLayer {
                    detail_layer: 1,
                    density: 0.5,
                    max_density: 10,
                },
            ],
            scatter: vec![ScatterRule {
                name: "trees".into(),
                object_keys: vec!["oak".into(), "birch".into()],
                density: 0.8,
                min_spacing: 4.0,
                slope_range: (0.0, 30.0),
                cluster: Some(ClusterSettings::default()),
                scale_range: (0.9, 1.4),
                children: vec![ChildRule {
                    rule: ScatterRule {
                        name: "mushrooms".into(),
                        object_keys: vec!["mushroom".into()],
                        min_spacing: 0.5,
                        scale_range: (0.5, 1.0),
                        ..Default::default()
                    },
                    radius_min: 1.0,
                    radius_max: 3.0,
                    count: (0, 2),
                    inherit_terrain_filter: true,
                }],
                ..Default::default()
            }],
            debug_color: [30, 110, 40],
            ..Default::default()
        },
        BiomeDef {
            name: "highlands".into(),
            weight: 1.0,
            base_height: 30.0,
            height_variation: 18.0,
            height_noise: NoiseSettings {
                frequency: 0.02,
                octaves: 5,
                power: Some(1.5),
                ..Default::default()
            },
            texture_layer: 2,
            vegetation: vec![VegetationLayer {
                detail_layer: 0,
                density: 0.15,
                max_density: 4,
            }],
            scatter: vec![
                ScatterRule {
                    name: "boulders".into(),
                    object_keys: vec!["boulder".into()],
                    density: 0.15,
                    min_spacing: 10.0,
                    category: PlacementCategory::Slope,
                    scale_range: (1.0, 2.5),
                    ..Default::default()
                },
                ScatterRule {
                    name: "cliff_shrubs".into(),
                    object_keys: vec!["shrub".into()],
                    density: 0.05,
                    min_spacing: 3.0,
                    feature: Some(TerrainFeature::CliffBase),
                    ..Default::default()
                },
            ],
            debug_color: [140, 120, 100],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let config = GenerationConfig::default();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 3);
        catalog
            .validate_layers(3, 2)
            .expect("stock biomes fit a 3-splat, 2-detail terrain");
        assert!(catalog.validate_layers(2, 2).is_err(), "highlands paints layer 2");
    }

    #[test]
    fn test_negative_margin_rejected() {
        let config = GenerationConfig {
            edge_margin: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));
    }

    #[test]
    fn test_toggles_map_to_phases() {
        let toggles = PhaseToggles {
            vegetation: false,
            ..Default::default()
        };
        assert!(!toggles.is_enabled(PhaseKind::Vegetation));
        assert!(PhaseKind::standard().iter().filter(|k| toggles.is_enabled(**k)).count() == 4);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: GenerationConfig = ron::from_str("(seed: 7, sampling: Blended)").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.sampling, BiomeSampling::Blended);
        assert_eq!(config.biomes.len(), 3, "missing biomes fall back to the stock set");
        assert!(config.phases.scatter);
    }
}
