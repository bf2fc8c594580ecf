//! Point-to-cell distance metrics used to partition space into biome cells.
//!
//! The metric is pluggable so border warping can be switched off or tested
//! independently of nearest-cell partitioning.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::BiomeCell;
use crate::noise_field::{NoiseField, NoiseMode, NoiseSettings};

/// Domain-warp settings for biome borders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Disable to get straight Voronoi borders.
    pub enabled: bool,
    /// Maximum distance offset in world units.
    pub strength: f64,
    /// Warp noise base frequency.
    pub frequency: f64,
    /// Warp noise octaves.
    pub octaves: u32,
    /// Warp noise persistence.
    pub persistence: f64,
    /// Warp noise lacunarity.
    pub lacunarity: f64,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 8.0,
            frequency: 0.02,
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl WarpConfig {
    /// Returns `true` if the warp would change any distance.
    pub fn is_active(&self) -> bool {
        self.enabled && self.strength != 0.0
    }
}

/// Distance from a query point to a biome cell.
pub trait DistanceMetric: Send + Sync + fmt::Debug {
    /// Distance used for nearest-cell ordering and blend weights.
    fn distance(&self, point: DVec2, cell: &BiomeCell) -> f64;
}

/// Plain Euclidean distance to the cell center.
#[derive(Clone, Copy, Debug, Default)]
pub struct EuclideanDistance;

impl DistanceMetric for EuclideanDistance {
    fn distance(&self, point: DVec2, cell: &BiomeCell) -> f64 {
        point.distance(cell.center())
    }
}

/// Euclidean distance plus a noise offset keyed per `(point, cell)`.
///
/// Each cell reads the warp noise through its own coordinate shift, so
/// neighbouring cells bend their shared border independently and borders
/// read as organic rather than concentric.
#[derive(Clone, Debug)]
pub struct WarpedDistance {
    noise: NoiseField,
    strength: f64,
}

impl WarpedDistance {
    /// Build a warped metric from settings and a seed.
    pub fn new(config: &WarpConfig, seed: u64) -> Self {
        let settings = NoiseSettings {
            mode: NoiseMode::Fractal,
            frequency: config.frequency,
            octaves: config.octaves,
            persistence: config.persistence,
            lacunarity: config.lacunarity,
            ..Default::default()
        };
        Self {
            noise: NoiseField::new(settings, seed),
            strength: config.strength,
        }
    }

    /// Signed offset in `[-strength, strength]` added to the Euclidean distance.
    pub fn offset(&self, point: DVec2, cell: &BiomeCell) -> f64 {
        let key = cell.index() as f64;
        let v = self
            .noise
            .sample(point.x + key * 173.31, point.y - key * 91.17);
        (v * 2.0 - 1.0) * self.strength
    }
}

impl DistanceMetric for WarpedDistance {
    fn distance(&self, point: DVec2, cell: &BiomeCell) -> f64 {
        point.distance(cell.center()) + self.offset(point, cell)
    }
}

/// Pick the metric a warp configuration asks for.
pub fn metric_for(config: &WarpConfig, seed: u64) -> Box<dyn DistanceMetric> {
    if config.is_active() {
        Box::new(WarpedDistance::new(config, seed))
    } else {
        Box::new(EuclideanDistance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeId;

    fn cell(index: usize, x: f64, y: f64) -> BiomeCell {
        BiomeCell::new(DVec2::new(x, y), BiomeId(0), index)
    }

    #[test]
    fn test_euclidean_distance() {
        let d = EuclideanDistance.distance(DVec2::new(3.0, 4.0), &cell(0, 0.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_warp_offset_bounded_by_strength() {
        let warp = WarpedDistance::new(
            &WarpConfig {
                strength: 4.0,
                ..Default::default()
            },
            17,
        );
        let c = cell(3, 10.0, 10.0);
        for i in 0..200 {
            let p = DVec2::new(i as f64 * 0.73, i as f64 * 1.31);
            let off = warp.offset(p, &c);
            assert!(off.abs() <= 4.0 + 1e-9, "offset {off} exceeds strength");
        }
    }

    #[test]
    fn test_warp_keyed_per_cell() {
        let warp = WarpedDistance::new(&WarpConfig::default(), 5);
        let a = cell(0, 0.0, 0.0);
        let b = cell(1, 0.0, 0.0);
        let differs = (0..32).any(|i| {
            let p = DVec2::new(i as f64 * 3.3, i as f64 * 2.9);
            (warp.offset(p, &a) - warp.offset(p, &b)).abs() > 1e-9
        });
        assert!(differs, "cells at the same center should warp independently");
    }

    #[test]
    fn test_disabled_warp_is_euclidean() {
        let config = WarpConfig {
            enabled: false,
            ..Default::default()
        };
        let metric = metric_for(&config, 1);
        let d = metric.distance(DVec2::new(6.0, 8.0), &cell(2, 0.0, 0.0));
        assert!((d - 10.0).abs() < 1e-12);
    }
}
