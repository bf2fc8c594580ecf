//! Mutable state of one generation run: grids, their snapshots, and the RNG.

use std::sync::Arc;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::biome::{BiomeCatalog, BiomeMap};
use crate::bounds::Bounds;
use crate::config::GenerationConfig;
use crate::debug_viz::DebugOverlay;
use crate::error::GenerationError;
use crate::grid::{DetailGrids, HeightGrid, SplatGrid};
use crate::phase::CancelToken;
use crate::seed::{resolve_seed, stream_rng};
use crate::spawn::SpawnGroup;
use crate::terrain::{TerrainLayout, TerrainResource, TerrainSampler};

/// Simultaneous mutable access to every grid plus read access to the biome map.
pub struct GridsMut<'a> {
    pub heights: &'a mut HeightGrid,
    pub splat: &'a mut SplatGrid,
    pub detail: &'a mut DetailGrids,
    pub biome_map: Option<&'a BiomeMap>,
}

/// Everything a run's phases read and write.
///
/// Grids are snapshotted from the target at construction and never resized.
/// Only the active phase mutates the context.
pub struct GenerationContext {
    config: GenerationConfig,
    catalog: Arc<BiomeCatalog>,
    layout: TerrainLayout,
    bounds: Bounds,
    seed: u64,
    rng: ChaCha8Rng,

    heights: HeightGrid,
    splat: SplatGrid,
    detail: DetailGrids,
    original_heights: HeightGrid,
    original_splat: SplatGrid,
    original_detail: DetailGrids,

    biome_map: Option<BiomeMap>,
    spawn_groups: Vec<SpawnGroup>,
    debug_overlay: Option<DebugOverlay>,
    overlays_enabled: bool,
    cancel: CancelToken,
}

impl GenerationContext {
    /// Validate `config` against `target` and snapshot the target's grids.
    ///
    /// A configured seed of 0 is replaced by a freshly drawn one, and the
    /// drawn value is written into the context's copy of the config.
    ///
    /// # Errors
    ///
    /// Fails on an unusable layout or config, duplicate biome names, biome
    /// layer indices the terrain lacks, or grids that disagree with the layout.
    pub fn new(
        mut config: GenerationConfig,
        target: &dyn TerrainResource,
    ) -> Result<Self, GenerationError> {
        let layout = target.layout();
        layout.validate()?;
        config.validate()?;
        let catalog = config.catalog()?;
        catalog.validate_layers(layout.splat_layers, layout.detail_layers)?;

        let heights = target.read_heights();
        let splat = target.read_splat();
        let detail = target.read_detail();
        check_shape(&layout, &heights, &splat, &detail)?;

        let seed = resolve_seed(config.seed);
        if config.seed != seed {
            debug!(seed, "Resolved unset seed");
        }
        config.seed = seed;

        let bounds = layout.bounds().shrink(config.edge_margin);
        Ok(Self {
            catalog: Arc::new(catalog),
            layout,
            bounds,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            original_heights: heights.clone(),
            original_splat: splat.clone(),
            original_detail: detail.clone(),
            heights,
            splat,
            detail,
            biome_map: None,
            spawn_groups: Vec::new(),
            debug_overlay: None,
            overlays_enabled: false,
            cancel: CancelToken::new(),
            config,
        })
    }

    /// The run's config, with the resolved seed.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<BiomeCatalog> {
        &self.catalog
    }

    pub fn layout(&self) -> &TerrainLayout {
        &self.layout
    }

    /// Terrain bounds shrunk by the edge margin. Grid indices map onto these.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Resolved, non-zero run seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Side length of every grid.
    pub fn resolution(&self) -> usize {
        self.layout.resolution
    }

    /// World position of grid cell `(x, y)`.
    pub fn cell_to_world(&self, x: usize, y: usize) -> DVec2 {
        self.bounds.grid_to_world(x, y, self.layout.resolution)
    }

    // -- grids ------------------------------------------------------------

    pub fn heights(&self) -> &HeightGrid {
        &self.heights
    }

    pub fn heights_mut(&mut self) -> &mut HeightGrid {
        &mut self.heights
    }

    pub fn splat(&self) -> &SplatGrid {
        &self.splat
    }

    pub fn splat_mut(&mut self) -> &mut SplatGrid {
        &mut self.splat
    }

    pub fn detail(&self) -> &DetailGrids {
        &self.detail
    }

    pub fn detail_mut(&mut self) -> &mut DetailGrids {
        &mut self.detail
    }

    /// Heights as they were before the run.
    pub fn original_heights(&self) -> &HeightGrid {
        &self.original_heights
    }

    /// Splat weights as they were before the run.
    pub fn original_splat(&self) -> &SplatGrid {
        &self.original_splat
    }

    /// Detail densities as they were before the run.
    pub fn original_detail(&self) -> &DetailGrids {
        &self.original_detail
    }

    /// Borrow every grid mutably while reading the biome map.
    pub fn grids_mut(&mut self) -> GridsMut<'_> {
        GridsMut {
            heights: &mut self.heights,
            splat: &mut self.splat,
            detail: &mut self.detail,
            biome_map: self.biome_map.as_ref(),
        }
    }

    /// Point sampling over the current heights and splat weights.
    pub fn sampler(&self) -> TerrainSampler<'_> {
        TerrainSampler::new(self.bounds, &self.heights, &self.splat, self.layout.height_scale)
    }

    /// Sampler, biome map, and RNG together, for placement passes that draw
    /// random numbers while reading terrain.
    pub fn scatter_parts(&mut self) -> (TerrainSampler<'_>, Option<&BiomeMap>, &mut ChaCha8Rng) {
        let sampler =
            TerrainSampler::new(self.bounds, &self.heights, &self.splat, self.layout.height_scale);
        (sampler, self.biome_map.as_ref(), &mut self.rng)
    }

    pub fn restore_heights(&mut self) {
        self.heights.copy_from(&self.original_heights);
    }

    pub fn restore_splat(&mut self) {
        self.splat.copy_from(&self.original_splat);
    }

    pub fn restore_detail(&mut self) {
        self.detail.copy_from(&self.original_detail);
    }

    /// Reset every grid to its pre-run snapshot and drop all phase output.
    pub fn restore_all(&mut self) {
        self.restore_heights();
        self.restore_splat();
        self.restore_detail();
        self.biome_map = None;
        self.spawn_groups.clear();
        self.debug_overlay = None;
    }

    /// Write the current grids into `target`.
    pub fn apply_to(&self, target: &mut dyn TerrainResource) {
        target.write_heights(&self.heights);
        target.write_splat(&self.splat);
        target.write_detail(&self.detail);
    }

    // -- randomness -------------------------------------------------------

    /// Restart the RNG on the stream for `salt`. Phases call this before
    /// running so a re-run after rollback draws the same numbers.
    pub fn reseed(&mut self, salt: u64) {
        self.rng = stream_rng(self.seed, salt);
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Uniform draw in `[0, 1)`.
    pub fn random_value(&mut self) -> f64 {
        self.rng.random()
    }

    /// Uniform draw in `[lo, hi)`; returns `lo` for an empty range.
    pub fn random_range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo { self.rng.random_range(lo..hi) } else { lo }
    }

    // -- phase output -----------------------------------------------------

    pub fn biome_map(&self) -> Option<&BiomeMap> {
        self.biome_map.as_ref()
    }

    pub fn set_biome_map(&mut self, map: Option<BiomeMap>) {
        self.biome_map = map;
    }

    /// Scatter output so far.
    pub fn spawn_groups(&self) -> &[SpawnGroup] {
        &self.spawn_groups
    }

    pub fn push_spawn_group(&mut self, group: SpawnGroup) {
        self.spawn_groups.push(group);
    }

    pub fn clear_spawn_groups(&mut self) {
        self.spawn_groups.clear();
    }

    /// Whether phases should render preview overlays.
    pub fn overlays_enabled(&self) -> bool {
        self.overlays_enabled
    }

    pub fn set_overlays_enabled(&mut self, enabled: bool) {
        self.overlays_enabled = enabled;
    }

    /// Replace the preview overlay; `None` clears it.
    pub fn set_debug_overlay(&mut self, overlay: Option<DebugOverlay>) {
        self.debug_overlay = overlay;
    }

    pub fn debug_overlay(&self) -> Option<&DebugOverlay> {
        self.debug_overlay.as_ref()
    }

    /// Set `overlay` if overlays are enabled. The closure is not called otherwise.
    pub fn publish_overlay(&mut self, overlay: impl FnOnce(&Self) -> DebugOverlay) {
        if self.overlays_enabled {
            let rendered = overlay(self);
            self.debug_overlay = Some(rendered);
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Share `token` with the host so it can cancel the running phase.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = token;
    }
}

fn check_shape(
    layout: &TerrainLayout,
    heights: &HeightGrid,
    splat: &SplatGrid,
    detail: &DetailGrids,
) -> Result<(), GenerationError> {
    let res = layout.resolution;
    if heights.resolution() != res || splat.resolution() != res || detail.resolution() != res {
        return Err(GenerationError::InvalidConfig(format!(
            "terrain grids ({}, {}, {}) do not match layout resolution {res}",
            heights.resolution(),
            splat.resolution(),
            detail.resolution()
        )));
    }
    if splat.layer_count() != layout.splat_layers || detail.layer_count() != layout.detail_layers {
        return Err(GenerationError::InvalidConfig(format!(
            "terrain has {} splat / {} detail layers, layout declares {} / {}",
            splat.layer_count(),
            detail.layer_count(),
            layout.splat_layers,
            layout.detail_layers
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainData;

    fn terrain() -> TerrainData {
        TerrainData::new(TerrainLayout {
            origin: DVec2::ZERO,
            size: DVec2::splat(100.0),
            height_scale: 50.0,
            resolution: 33,
            splat_layers: 3,
            detail_layers: 2,
        })
    }

    #[test]
    fn test_zero_seed_is_resolved_and_persisted() {
        let ctx = GenerationContext::new(GenerationConfig::default(), &terrain()).unwrap();
        assert_ne!(ctx.seed(), 0);
        assert_eq!(ctx.config().seed, ctx.seed(), "resolved seed is kept in the config");
    }

    #[test]
    fn test_explicit_seed_kept() {
        let config = GenerationConfig {
            seed: 1234,
            ..Default::default()
        };
        let ctx = GenerationContext::new(config, &terrain()).unwrap();
        assert_eq!(ctx.seed(), 1234);
    }

    #[test]
    fn test_bounds_shrunk_by_margin() {
        let config = GenerationConfig {
            edge_margin: 10.0,
            ..Default::default()
        };
        let ctx = GenerationContext::new(config, &terrain()).unwrap();
        assert_eq!(ctx.bounds().min, DVec2::splat(10.0));
        assert_eq!(ctx.bounds().max, DVec2::splat(90.0));
        assert_eq!(ctx.cell_to_world(32, 0), DVec2::new(90.0, 10.0));
    }

    #[test]
    fn test_missing_layers_rejected() {
        let small = TerrainData::new(TerrainLayout {
            splat_layers: 1,
            ..terrain().layout()
        });
        let result = GenerationContext::new(GenerationConfig::default(), &small);
        assert!(
            matches!(result, Err(GenerationError::LayerOutOfRange { kind: "texture", .. })),
            "stock biomes paint layers the terrain lacks"
        );
    }

    #[test]
    fn test_restore_all_resets_grids() {
        let mut ctx = GenerationContext::new(GenerationConfig::default(), &terrain()).unwrap();
        ctx.heights_mut().set(3, 3, 0.9);
        ctx.splat_mut().set_one_hot(3, 3, 2);
        ctx.detail_mut().set(1, 3, 3, 7);

        ctx.restore_all();
        assert_eq!(ctx.heights(), ctx.original_heights());
        assert_eq!(ctx.splat(), ctx.original_splat());
        assert_eq!(ctx.detail(), ctx.original_detail());
    }

    #[test]
    fn test_reseed_repeats_stream() {
        let mut ctx = GenerationContext::new(GenerationConfig::default(), &terrain()).unwrap();
        ctx.reseed(5);
        let a: Vec<f64> = (0..4).map(|_| ctx.random_value()).collect();
        ctx.reseed(5);
        let b: Vec<f64> = (0..4).map(|_| ctx.random_value()).collect();
        assert_eq!(a, b);
        assert_eq!(ctx.random_range(3.0, 3.0), 3.0, "empty range returns lo");
    }

    #[test]
    fn test_overlay_only_rendered_when_enabled() {
        let mut ctx = GenerationContext::new(GenerationConfig::default(), &terrain()).unwrap();
        ctx.publish_overlay(|_| panic!("overlays are disabled by default"));
        assert!(ctx.debug_overlay().is_none());

        ctx.set_overlays_enabled(true);
        ctx.publish_overlay(|c| {
            DebugOverlay::new("heightmap", crate::debug_viz::render_heightmap(c.heights()))
        });
        assert_eq!(ctx.debug_overlay().map(|o| o.label), Some("heightmap"));
    }
}
