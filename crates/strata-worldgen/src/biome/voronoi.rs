//! Voronoi biome layout: seed points by blue-noise-like rejection sampling,
//! biome types by weighted roulette selection.

use std::sync::Arc;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::distance::{WarpConfig, metric_for};
use super::{BiomeCatalog, BiomeId, BiomeMap};
use crate::bounds::Bounds;
use crate::error::GenerationError;
use crate::seed::{derive_seed, det_sqrt};

/// Candidate draws allowed per requested cell.
pub const ATTEMPTS_PER_CELL: usize = 50;

/// Fraction of `sqrt(area / count)` used as the minimum spacing between seeds.
pub const SPACING_FACTOR: f64 = 0.5;

/// Below this share of accepted seeds the sampler gives up on spacing.
pub const MIN_ACCEPTANCE: f64 = 0.5;

const WARP_SALT: u64 = 0x5741_5250;

/// Cell count, blend band, and border warp for a biome layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum number of Voronoi cells (inclusive).
    pub min_cells: usize,
    /// Maximum number of Voronoi cells (inclusive).
    pub max_cells: usize,
    /// Width of the border band where neighbouring biomes blend.
    pub blend_width: f64,
    /// Border domain warp.
    pub warp: WarpConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_cells: 6,
            max_cells: 12,
            blend_width: 12.0,
            warp: WarpConfig::default(),
        }
    }
}

/// Builds [`BiomeMap`]s from bounds, a catalog, and a seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoronoiBiomeGenerator;

impl VoronoiBiomeGenerator {
    /// Generate a biome map.
    ///
    /// Identical inputs always produce an identical cell list and assignment.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::DegenerateInput`] if the catalog is empty or
    /// the configured cell range allows zero cells.
    pub fn generate(
        bounds: Bounds,
        catalog: Arc<BiomeCatalog>,
        layout: &LayoutConfig,
        seed: u64,
    ) -> Result<BiomeMap, GenerationError> {
        if catalog.is_empty() {
            return Err(GenerationError::DegenerateInput(
                "no biomes configured".into(),
            ));
        }
        let lo = layout.min_cells.min(layout.max_cells);
        let hi = layout.min_cells.max(layout.max_cells);
        if hi == 0 {
            return Err(GenerationError::DegenerateInput(
                "cell range allows zero cells".into(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let count = rng.random_range(lo.max(1)..=hi);
        let centers = sample_cell_centers(bounds, count, &mut rng);

        let mut map = BiomeMap::new(Arc::clone(&catalog), layout.blend_width)
            .with_metric(metric_for(&layout.warp, derive_seed(seed, WARP_SALT)));
        for center in centers {
            let biome = pick_weighted(&catalog, &mut rng);
            map.push_cell(center, biome)?;
        }

        debug!(
            cells = map.len(),
            biomes = catalog.len(),
            warped = layout.warp.is_active(),
            "Generated biome layout"
        );
        Ok(map)
    }
}

/// Draw `count` points approximating blue noise.
///
/// Candidates closer than the spacing threshold to an accepted point are
/// rejected, up to `count * ATTEMPTS_PER_CELL` draws. If fewer than half the
/// points were accepted the spaced set is discarded and all points are drawn
/// uniformly; otherwise the shortfall is topped up uniformly. Either way the
/// result has exactly `count` points.
pub fn sample_cell_centers<R: Rng + ?Sized>(
    bounds: Bounds,
    count: usize,
    rng: &mut R,
) -> Vec<DVec2> {
    if count == 0 {
        return Vec::new();
    }
    let spacing = det_sqrt(bounds.area() / count as f64) * SPACING_FACTOR;
    let spacing_sq = spacing * spacing;
    let max_attempts = count * ATTEMPTS_PER_CELL;

    let mut points: Vec<DVec2> = Vec::with_capacity(count);
    let mut attempts = 0;
    while points.len() < count && attempts < max_attempts {
        attempts += 1;
        let candidate = bounds.random_point(rng);
        if points
            .iter()
            .all(|p| p.distance_squared(candidate) > spacing_sq)
        {
            points.push(candidate);
        }
    }

    if (points.len() as f64) < count as f64 * MIN_ACCEPTANCE {
        debug!(
            accepted = points.len(),
            requested = count,
            "Spacing rejection starved; falling back to uniform cell placement"
        );
        points.clear();
    }
    while points.len() < count {
        points.push(bounds.random_point(rng));
    }
    points
}

/// Roulette selection proportional to biome weight.
///
/// Negative weights count as zero; if every weight is zero the pick is uniform.
pub fn pick_weighted<R: Rng + ?Sized>(catalog: &BiomeCatalog, rng: &mut R) -> BiomeId {
    let total = catalog.total_weight();
    if total <= 0.0 {
        return BiomeId(rng.random_range(0..catalog.len()) as u16);
    }
    let mut roll = rng.random::<f64>() * total;
    let mut last = BiomeId(0);
    for (id, def) in catalog.iter() {
        let w = def.weight.max(0.0);
        if w <= 0.0 {
            continue;
        }
        if roll < w {
            return id;
        }
        roll -= w;
        last = id;
    }
    // Floating-point residue past the last bucket.
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeDef;

    fn catalog(weights: &[f64]) -> Arc<BiomeCatalog> {
        let defs = weights.iter().enumerate().map(|(i, &w)| BiomeDef {
            name: format!("biome_{i}"),
            weight: w,
            ..Default::default()
        });
        Arc::new(BiomeCatalog::from_defs(defs).unwrap())
    }

    fn square(side: f64) -> Bounds {
        Bounds::from_origin_size(DVec2::ZERO, DVec2::splat(side))
    }

    #[test]
    fn test_generation_is_deterministic() {
        let layout = LayoutConfig {
            min_cells: 4,
            max_cells: 16,
            ..Default::default()
        };
        let a = VoronoiBiomeGenerator::generate(square(500.0), catalog(&[1.0, 2.0, 3.0]), &layout, 99)
            .unwrap();
        let b = VoronoiBiomeGenerator::generate(square(500.0), catalog(&[1.0, 2.0, 3.0]), &layout, 99)
            .unwrap();
        assert_eq!(a.cells(), b.cells(), "same inputs must give identical cells");
    }

    #[test]
    fn test_different_seeds_differ() {
        let layout = LayoutConfig::default();
        let a = VoronoiBiomeGenerator::generate(square(500.0), catalog(&[1.0, 1.0]), &layout, 1)
            .unwrap();
        let b = VoronoiBiomeGenerator::generate(square(500.0), catalog(&[1.0, 1.0]), &layout, 2)
            .unwrap();
        assert_ne!(a.cells(), b.cells());
    }

    #[test]
    fn test_cell_count_within_range() {
        let layout = LayoutConfig {
            min_cells: 3,
            max_cells: 7,
            ..Default::default()
        };
        for seed in 0..20 {
            let map = VoronoiBiomeGenerator::generate(square(200.0), catalog(&[1.0]), &layout, seed)
                .unwrap();
            assert!((3..=7).contains(&map.len()), "seed {seed}: {} cells", map.len());
            for cell in map.cells() {
                assert!(square(200.0).contains(cell.center()));
            }
        }
    }

    #[test]
    fn test_exact_count_scenario() {
        let layout = LayoutConfig {
            min_cells: 2,
            max_cells: 2,
            ..Default::default()
        };
        let map =
            VoronoiBiomeGenerator::generate(square(100.0), catalog(&[1.0, 1.0]), &layout, 42).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_two_cell_map_blends_at_midpoint() {
        let layout = LayoutConfig {
            min_cells: 2,
            max_cells: 2,
            blend_width: 12.0,
            warp: WarpConfig {
                enabled: false,
                ..Default::default()
            },
        };
        let map =
            VoronoiBiomeGenerator::generate(square(100.0), catalog(&[1.0, 1.0]), &layout, 42).unwrap();
        assert_eq!(map.len(), 2);

        let a = map.cells()[0].center();
        let b = map.cells()[1].center();
        assert!(
            a.distance(b) > layout.blend_width,
            "centres {} apart, spacing should keep them beyond the blend band",
            a.distance(b)
        );

        let mid = map.query((a + b) * 0.5);
        assert!((mid.primary_weight - 0.5).abs() < 1e-6, "midpoint weight {}", mid.primary_weight);
        assert!((mid.secondary_weight - 0.5).abs() < 1e-6);
        assert!((mid.primary_weight + mid.secondary_weight - 1.0).abs() < 1e-12);

        let at_centre = map.query(a);
        assert_eq!(at_centre.primary_weight, 1.0, "outside the blend band the nearest cell wins");
        assert_eq!(at_centre.secondary_weight, 0.0);
        assert_eq!(at_centre.primary, map.cells()[0].biome());
    }

    #[test]
    fn test_spacing_respected_when_room() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let bounds = square(1000.0);
        let points = sample_cell_centers(bounds, 10, &mut rng);
        let spacing = (bounds.area() / 10.0).sqrt() * SPACING_FACTOR;
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(a.distance(*b) > spacing - 1e-9);
            }
        }
    }

    #[test]
    fn test_degenerate_bounds_still_terminates() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let point = Bounds::new(DVec2::splat(5.0), DVec2::splat(5.0));
        let points = sample_cell_centers(point, 8, &mut rng);
        assert_eq!(points.len(), 8, "uniform fallback must fill the request");
    }

    #[test]
    fn test_zero_weight_biome_never_picked() {
        let cat = catalog(&[0.0, 1.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            assert_eq!(pick_weighted(&cat, &mut rng), BiomeId(1));
        }
    }

    #[test]
    fn test_weighted_roulette_proportions() {
        let cat = catalog(&[1.0, 3.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let heavy = (0..4000)
            .filter(|_| pick_weighted(&cat, &mut rng) == BiomeId(1))
            .count();
        let share = heavy as f64 / 4000.0;
        assert!((share - 0.75).abs() < 0.05, "heavy biome share {share}");
    }

    #[test]
    fn test_empty_catalog_is_degenerate() {
        let result = VoronoiBiomeGenerator::generate(
            square(10.0),
            Arc::new(BiomeCatalog::new()),
            &LayoutConfig::default(),
            1,
        );
        assert!(matches!(result, Err(GenerationError::DegenerateInput(_))));
    }

    #[test]
    fn test_zero_cells_is_degenerate() {
        let layout = LayoutConfig {
            min_cells: 0,
            max_cells: 0,
            ..Default::default()
        };
        let result = VoronoiBiomeGenerator::generate(square(10.0), catalog(&[1.0]), &layout, 1);
        assert!(matches!(result, Err(GenerationError::DegenerateInput(_))));
    }
}
