//! Biome definition: the static parameters of a single biome type.

use serde::{Deserialize, Serialize};

use crate::noise_field::NoiseSettings;
use crate::placement::ScatterRule;

/// A vegetation detail layer painted by a biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationLayer {
    /// Index of the terrain detail layer to write.
    pub detail_layer: usize,
    /// Probability in `[0, 1]` that a cell receives vegetation.
    pub density: f64,
    /// Upper bound of the integer density written to a vegetated cell.
    pub max_density: u32,
}

impl Default for VegetationLayer {
    fn default() -> Self {
        Self {
            detail_layer: 0,
            density: 0.3,
            max_density: 8,
        }
    }
}

/// Full descriptor for a biome type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeDef {
    /// Human-readable biome name (e.g., "forest").
    pub name: String,
    /// Relative selection weight when assigning biomes to cells.
    pub weight: f64,
    /// Base terrain height in world units.
    pub base_height: f64,
    /// Maximum noise contribution on top of `base_height`, in world units.
    pub height_variation: f64,
    /// Noise shaping the height variation.
    pub height_noise: NoiseSettings,
    /// Splat layer painted where this biome dominates.
    pub texture_layer: usize,
    /// Vegetation detail layers.
    pub vegetation: Vec<VegetationLayer>,
    /// Discrete object placement rules.
    pub scatter: Vec<ScatterRule>,
    /// RGB color used by debug overlays.
    pub debug_color: [u8; 3],
}

impl Default for BiomeDef {
    fn default() -> Self {
        Self {
            name: "plains".into(),
            weight: 1.0,
            base_height: 10.0,
            height_variation: 5.0,
            height_noise: NoiseSettings::default(),
            texture_layer: 0,
            vegetation: Vec::new(),
            scatter: Vec::new(),
            debug_color: [128, 128, 128],
        }
    }
}
