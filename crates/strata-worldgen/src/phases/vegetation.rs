use super::{missing_biome_map, require_biome_map};
use crate::config::BiomeSampling;
use crate::context::{GenerationContext, GridsMut};
use crate::debug_viz::{DebugOverlay, render_detail};
use crate::error::GenerationError;
use crate::phase::{PhaseProgress, PhaseTransform, SkipReason};
use crate::seed::{cell_random, derive_seed, name_salt};

const BLEND_PICK_SALT: u64 = 0x5645_4742;

/// Fills detail layers with per-cell vegetation density.
///
/// Every draw is keyed on the cell position, so the result does not depend
/// on scan order.
#[derive(Clone, Copy, Debug, Default)]
pub struct VegetationPhase;

impl PhaseTransform for VegetationPhase {
    fn can_execute(&self, ctx: &GenerationContext) -> Result<(), SkipReason> {
        if ctx.layout().detail_layers == 0 {
            return Err(SkipReason::MissingInput("detail layers on the terrain"));
        }
        require_biome_map(ctx)
    }

    fn run(
        &self,
        ctx: &mut GenerationContext,
        progress: &mut PhaseProgress<'_>,
    ) -> Result<(), GenerationError> {
        let seed = ctx.seed();
        let res = ctx.resolution();
        let bounds = ctx.bounds();
        let sampling = ctx.config().sampling;

        let GridsMut {
            detail, biome_map, ..
        } = ctx.grids_mut();
        let map = biome_map.ok_or_else(|| missing_biome_map("vegetation"))?;
        // Per biome, per vegetation layer: (presence salt, value salt).
        let salts: Vec<Vec<(u64, u64)>> = map
            .catalog()
            .iter()
            .map(|(_, def)| {
                let base = name_salt(&def.name);
                (0..def.vegetation.len() as u64)
                    .map(|i| {
                        let presence = derive_seed(base, i);
                        (presence, derive_seed(presence, 1))
                    })
                    .collect()
            })
            .collect();

        detail.clear();
        for y in 0..res {
            progress.row(y, res)?;
            for x in 0..res {
                let point = bounds.grid_to_world(x, y, res);
                let biome = match sampling {
                    BiomeSampling::Dominant => map.biome_at(point),
                    // Dither between the two nearest biomes by blend weight.
                    BiomeSampling::Blended => {
                        let q = map.query(point);
                        if cell_random(seed, BLEND_PICK_SALT, x, y) < q.primary_weight {
                            q.primary
                        } else {
                            q.secondary
                        }
                    }
                };
                let def = map.params(biome);
                for (layer, &(presence, value)) in def.vegetation.iter().zip(&salts[biome.0 as usize]) {
                    if layer.max_density == 0
                        || cell_random(seed, presence, x, y) >= layer.density
                    {
                        continue;
                    }
                    let draw = cell_random(seed, value, x, y) * layer.max_density as f64;
                    let density = (draw as u32 + 1).min(layer.max_density);
                    let current = detail.get(layer.detail_layer, x, y);
                    detail.set(layer.detail_layer, x, y, current.max(density));
                }
            }
        }

        ctx.publish_overlay(|c| DebugOverlay::new("vegetation", render_detail(c.detail())));
        Ok(())
    }

    fn rollback(&self, ctx: &mut GenerationContext) {
        ctx.restore_detail();
    }
}
