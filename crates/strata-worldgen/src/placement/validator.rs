//! Per-candidate placement constraints.

use std::ops::Range;

use glam::DVec2;

use super::{TerrainFeatureMap, TerrainFilter};
use crate::bounds::Bounds;
use crate::terrain::TerrainSampler;

/// Why a candidate was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Outside the placement bounds.
    OutOfBounds,
    /// Height outside the allowed range.
    Height,
    /// Slope outside the allowed range.
    Slope,
    /// Dominant splat layer not whitelisted.
    Texture,
    /// Too close to an accepted placement.
    Spacing,
    /// Required landform absent, or no feature map available.
    Feature,
    /// Rejected by the caller's own filter (e.g. wrong biome).
    Filtered,
}

/// Checks candidates against terrain filters and the set of accepted points.
///
/// Spacing checks are linear in the number of accepted points, which is fine
/// at generation-time scale.
pub struct PlacementValidator<'a> {
    bounds: Bounds,
    sampler: TerrainSampler<'a>,
    features: Option<&'a dyn TerrainFeatureMap>,
    accepted: Vec<DVec2>,
}

impl<'a> PlacementValidator<'a> {
    /// Validator over `bounds` sampling terrain through `sampler`.
    pub fn new(bounds: Bounds, sampler: TerrainSampler<'a>) -> Self {
        Self {
            bounds,
            sampler,
            features: None,
            accepted: Vec::new(),
        }
    }

    /// Attach a landform classifier for feature-constrained rules.
    pub fn with_features(mut self, features: &'a dyn TerrainFeatureMap) -> Self {
        self.features = Some(features);
        self
    }

    /// Placement bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Terrain sampler.
    pub fn sampler(&self) -> TerrainSampler<'a> {
        self.sampler
    }

    /// Accepted points in acceptance order.
    pub fn accepted(&self) -> &[DVec2] {
        &self.accepted
    }

    /// Bounds, height, slope, texture, and landform checks.
    pub fn check_terrain(&self, point: DVec2, filter: &TerrainFilter) -> Result<(), Rejection> {
        if !self.bounds.contains(point) {
            return Err(Rejection::OutOfBounds);
        }
        let height = self.sampler.height_at(point);
        if height < filter.height_range.0 || height > filter.height_range.1 {
            return Err(Rejection::Height);
        }
        let slope = self.sampler.slope_at(point);
        if slope < filter.slope_range.0 || slope > filter.slope_range.1 {
            return Err(Rejection::Slope);
        }
        if let Some(layers) = &filter.allowed_layers
            && !layers.contains(&self.sampler.dominant_layer_at(point))
        {
            return Err(Rejection::Texture);
        }
        if let Some(feature) = filter.feature {
            let present = self
                .features
                .is_some_and(|map| map.has_feature(feature, point));
            if !present {
                return Err(Rejection::Feature);
            }
        }
        Ok(())
    }

    /// Minimum spacing against every accepted point.
    pub fn check_spacing(&self, point: DVec2, min_spacing: f64) -> Result<(), Rejection> {
        self.check_spacing_excluding(point, min_spacing, 0..0)
    }

    /// Minimum spacing against accepted points outside `skip`.
    pub fn check_spacing_excluding(
        &self,
        point: DVec2,
        min_spacing: f64,
        skip: Range<usize>,
    ) -> Result<(), Rejection> {
        let min_sq = min_spacing * min_spacing;
        let too_close = self
            .accepted
            .iter()
            .enumerate()
            .filter(|(i, _)| !skip.contains(i))
            .any(|(_, p)| p.distance_squared(point) < min_sq);
        if too_close { Err(Rejection::Spacing) } else { Ok(()) }
    }

    /// Minimum spacing against accepted points inside `within`.
    pub fn check_spacing_within(
        &self,
        point: DVec2,
        min_spacing: f64,
        within: Range<usize>,
    ) -> Result<(), Rejection> {
        let min_sq = min_spacing * min_spacing;
        let end = within.end.min(self.accepted.len());
        let start = within.start.min(end);
        if self.accepted[start..end]
            .iter()
            .any(|p| p.distance_squared(point) < min_sq)
        {
            Err(Rejection::Spacing)
        } else {
            Ok(())
        }
    }

    /// Terrain checks followed by global spacing.
    pub fn validate(
        &self,
        point: DVec2,
        filter: &TerrainFilter,
        min_spacing: f64,
    ) -> Result<(), Rejection> {
        self.check_terrain(point, filter)?;
        self.check_spacing(point, min_spacing)
    }

    /// Record an accepted point, returning its index.
    pub fn accept(&mut self, point: DVec2) -> usize {
        self.accepted.push(point);
        self.accepted.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{HeightGrid, SplatGrid};
    use crate::placement::TerrainFeature;

    fn open_filter() -> TerrainFilter {
        TerrainFilter {
            height_range: (0.0, 1.0),
            slope_range: (0.0, 90.0),
            allowed_layers: None,
            feature: None,
        }
    }

    fn bounds() -> Bounds {
        Bounds::from_origin_size(DVec2::ZERO, DVec2::splat(10.0))
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let heights = HeightGrid::new(11);
        let splat = SplatGrid::new(11, 2);
        let v = PlacementValidator::new(bounds(), TerrainSampler::new(bounds(), &heights, &splat, 1.0));
        assert_eq!(v.check_terrain(DVec2::new(11.0, 5.0), &open_filter()), Err(Rejection::OutOfBounds));
        assert_eq!(v.check_terrain(DVec2::new(5.0, 5.0), &open_filter()), Ok(()));
    }

    #[test]
    fn test_height_and_texture_filters() {
        let heights = HeightGrid::filled(11, 0.8);
        let splat = SplatGrid::new(11, 2);
        let v = PlacementValidator::new(bounds(), TerrainSampler::new(bounds(), &heights, &splat, 1.0));

        let low_only = TerrainFilter {
            height_range: (0.0, 0.5),
            ..open_filter()
        };
        assert_eq!(v.check_terrain(DVec2::splat(5.0), &low_only), Err(Rejection::Height));

        let layer_one = TerrainFilter {
            allowed_layers: Some(vec![1]),
            ..open_filter()
        };
        assert_eq!(v.check_terrain(DVec2::splat(5.0), &layer_one), Err(Rejection::Texture));
    }

    #[test]
    fn test_feature_without_map_rejected() {
        let heights = HeightGrid::new(11);
        let splat = SplatGrid::new(11, 1);
        let v = PlacementValidator::new(bounds(), TerrainSampler::new(bounds(), &heights, &splat, 1.0));
        let needs_valley = TerrainFilter {
            feature: Some(TerrainFeature::Valley),
            ..open_filter()
        };
        assert_eq!(v.check_terrain(DVec2::splat(5.0), &needs_valley), Err(Rejection::Feature));
    }

    #[test]
    fn test_spacing_checks() {
        let heights = HeightGrid::new(11);
        let splat = SplatGrid::new(11, 1);
        let mut v = PlacementValidator::new(bounds(), TerrainSampler::new(bounds(), &heights, &splat, 1.0));
        v.accept(DVec2::new(5.0, 5.0));
        v.accept(DVec2::new(1.0, 1.0));

        assert_eq!(v.check_spacing(DVec2::new(5.5, 5.0), 2.0), Err(Rejection::Spacing));
        assert_eq!(v.check_spacing(DVec2::new(8.0, 8.0), 2.0), Ok(()));
        assert_eq!(
            v.check_spacing_excluding(DVec2::new(5.5, 5.0), 2.0, 0..1),
            Ok(()),
            "skipped points are ignored"
        );
        assert_eq!(
            v.check_spacing_within(DVec2::new(1.2, 1.0), 1.0, 0..1),
            Ok(()),
            "only points inside the range count"
        );
        assert_eq!(v.check_spacing_within(DVec2::new(1.2, 1.0), 1.0, 1..2), Err(Rejection::Spacing));
    }
}
