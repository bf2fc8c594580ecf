//! Biome system: catalog, Voronoi layout, and the blended spatial index.
//!
//! A run partitions its bounds into Voronoi cells, assigns each cell a biome
//! type by weighted selection, and answers nearest-biome and two-biome blend
//! queries through a pluggable (optionally noise-warped) distance metric.

mod catalog;
mod def;
mod distance;
mod map;
mod voronoi;

pub use catalog::{BiomeCatalog, BiomeId};
pub use def::{BiomeDef, VegetationLayer};
pub use distance::{DistanceMetric, EuclideanDistance, WarpConfig, WarpedDistance, metric_for};
pub use map::{BiomeCell, BiomeMap, BiomeQuery, primary_weight, quintic_smoothstep};
pub use voronoi::{LayoutConfig, VoronoiBiomeGenerator, pick_weighted, sample_cell_centers};
