//! Terrain landform classification for feature-constrained placement.

use glam::DVec2;

use super::TerrainFeature;
use crate::terrain::TerrainSampler;

/// Answers whether a world point sits on a given landform.
pub trait TerrainFeatureMap {
    /// Returns `true` if `point` belongs to `feature`.
    fn has_feature(&self, feature: TerrainFeature, point: DVec2) -> bool;
}

/// Landforms derived from the height grid by probing a ring around the point.
#[derive(Clone, Copy, Debug)]
pub struct SlopeFeatureMap<'a> {
    sampler: TerrainSampler<'a>,
    /// Slope in degrees at which terrain counts as cliff.
    pub cliff_slope: f64,
    /// Radius of the probe ring in world units.
    pub probe_radius: f64,
    /// Normalized height a valley floor must sit below its surroundings.
    pub valley_depth: f64,
}

const PROBE_DIRECTIONS: [DVec2; 8] = [
    DVec2::new(1.0, 0.0),
    DVec2::new(0.707_106_781_186_547_6, 0.707_106_781_186_547_6),
    DVec2::new(0.0, 1.0),
    DVec2::new(-0.707_106_781_186_547_6, 0.707_106_781_186_547_6),
    DVec2::new(-1.0, 0.0),
    DVec2::new(-0.707_106_781_186_547_6, -0.707_106_781_186_547_6),
    DVec2::new(0.0, -1.0),
    DVec2::new(0.707_106_781_186_547_6, -0.707_106_781_186_547_6),
];

impl<'a> SlopeFeatureMap<'a> {
    /// Feature map with a 45 degree cliff threshold and a probe ring of two
    /// grid cells.
    pub fn new(sampler: TerrainSampler<'a>, cell_size: f64) -> Self {
        Self {
            sampler,
            cliff_slope: 45.0,
            probe_radius: cell_size * 2.0,
            valley_depth: 0.005,
        }
    }

    fn probes(&self, point: DVec2) -> impl Iterator<Item = DVec2> + '_ {
        PROBE_DIRECTIONS
            .iter()
            .map(move |dir| point + *dir * self.probe_radius)
    }
}

impl TerrainFeatureMap for SlopeFeatureMap<'_> {
    fn has_feature(&self, feature: TerrainFeature, point: DVec2) -> bool {
        let height = self.sampler.height_at(point);
        match feature {
            TerrainFeature::CliffEdge => {
                if self.sampler.slope_at(point) < self.cliff_slope {
                    return false;
                }
                let mean = self.probes(point).map(|p| self.sampler.height_at(p)).sum::<f64>()
                    / PROBE_DIRECTIONS.len() as f64;
                height >= mean
            }
            TerrainFeature::CliffBase => {
                self.sampler.slope_at(point) < self.cliff_slope
                    && self.probes(point).any(|p| {
                        self.sampler.slope_at(p) >= self.cliff_slope
                            && self.sampler.height_at(p) > height
                    })
            }
            TerrainFeature::Valley => {
                let mean = self.probes(point).map(|p| self.sampler.height_at(p)).sum::<f64>()
                    / PROBE_DIRECTIONS.len() as f64;
                height < mean - self.valley_depth
            }
        }
    }
}
