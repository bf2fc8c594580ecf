use std::sync::Arc;

use crate::biome::VoronoiBiomeGenerator;
use crate::context::GenerationContext;
use crate::debug_viz::{DebugOverlay, render_biome_map};
use crate::error::GenerationError;
use crate::phase::{PhaseProgress, PhaseTransform, SkipReason};

/// Runs the Voronoi generator and stores the resulting map on the context.
#[derive(Clone, Copy, Debug, Default)]
pub struct BiomeLayoutPhase;

impl PhaseTransform for BiomeLayoutPhase {
    fn can_execute(&self, ctx: &GenerationContext) -> Result<(), SkipReason> {
        if ctx.catalog().is_empty() {
            return Err(SkipReason::DegenerateInput("no biomes configured".into()));
        }
        let layout = &ctx.config().layout;
        if layout.min_cells.max(layout.max_cells) == 0 {
            return Err(SkipReason::DegenerateInput(
                "cell range allows zero cells".into(),
            ));
        }
        Ok(())
    }

    fn run(
        &self,
        ctx: &mut GenerationContext,
        progress: &mut PhaseProgress<'_>,
    ) -> Result<(), GenerationError> {
        progress.checkpoint(0)?;
        let map = VoronoiBiomeGenerator::generate(
            ctx.bounds(),
            Arc::clone(ctx.catalog()),
            &ctx.config().layout,
            ctx.seed(),
        )?;
        progress.report(0.5);

        if ctx.overlays_enabled() {
            let image = render_biome_map(&map, ctx.bounds(), ctx.resolution());
            ctx.set_debug_overlay(Some(DebugOverlay::new("biomes", image)));
        }
        ctx.set_biome_map(Some(map));
        Ok(())
    }

    fn rollback(&self, ctx: &mut GenerationContext) {
        ctx.set_biome_map(None);
    }
}
