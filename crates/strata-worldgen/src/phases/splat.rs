use super::{missing_biome_map, require_biome_map};
use crate::biome::BiomeCatalog;
use crate::config::BiomeSampling;
use crate::context::{GenerationContext, GridsMut};
use crate::debug_viz::{DebugOverlay, render_splat};
use crate::error::GenerationError;
use crate::phase::{PhaseProgress, PhaseTransform, SkipReason};

/// Paints each biome's base texture layer into the splat grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct SplatmapPaintPhase;

impl PhaseTransform for SplatmapPaintPhase {
    fn can_execute(&self, ctx: &GenerationContext) -> Result<(), SkipReason> {
        require_biome_map(ctx)
    }

    fn run(
        &self,
        ctx: &mut GenerationContext,
        progress: &mut PhaseProgress<'_>,
    ) -> Result<(), GenerationError> {
        let res = ctx.resolution();
        let bounds = ctx.bounds();
        let sampling = ctx.config().sampling;

        let GridsMut {
            splat, biome_map, ..
        } = ctx.grids_mut();
        let map = biome_map.ok_or_else(|| missing_biome_map("splatmap_paint"))?;

        for y in 0..res {
            progress.row(y, res)?;
            for x in 0..res {
                let point = bounds.grid_to_world(x, y, res);
                match sampling {
                    BiomeSampling::Dominant => {
                        let layer = map.params(map.biome_at(point)).texture_layer;
                        splat.set_one_hot(x, y, layer);
                    }
                    BiomeSampling::Blended => {
                        let q = map.query(point);
                        let cell = splat.cell_mut(x, y);
                        cell.fill(0.0);
                        cell[map.params(q.primary).texture_layer] += q.primary_weight as f32;
                        cell[map.params(q.secondary).texture_layer] += q.secondary_weight as f32;
                    }
                }
            }
        }

        ctx.publish_overlay(|c| {
            let palette = layer_palette(c.catalog(), c.splat().layer_count());
            DebugOverlay::new("splatmap", render_splat(c.splat(), &palette))
        });
        Ok(())
    }

    fn rollback(&self, ctx: &mut GenerationContext) {
        ctx.restore_splat();
    }
}

/// Debug color per splat layer: that of the first biome painting it.
fn layer_palette(catalog: &BiomeCatalog, layers: usize) -> Vec<[u8; 3]> {
    let mut palette: Vec<Option<[u8; 3]>> = vec![None; layers];
    for (_, def) in catalog.iter() {
        if let Some(slot) = palette.get_mut(def.texture_layer)
            && slot.is_none()
        {
            *slot = Some(def.debug_color);
        }
    }
    palette
        .into_iter()
        .map(|c| c.unwrap_or([128, 128, 128]))
        .collect()
}
