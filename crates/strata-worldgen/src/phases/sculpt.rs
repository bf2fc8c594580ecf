use glam::DVec2;

use super::{missing_biome_map, require_biome_map};
use crate::biome::{BiomeDef, BiomeId};
use crate::config::BiomeSampling;
use crate::context::{GenerationContext, GridsMut};
use crate::debug_viz::{DebugOverlay, render_heightmap};
use crate::error::GenerationError;
use crate::noise_field::NoiseField;
use crate::phase::{PhaseProgress, PhaseTransform, SkipReason};
use crate::seed::{derive_seed, name_salt};

/// Writes normalized heights from each biome's height profile.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerrainSculptPhase;

/// A biome's height contribution in normalized units.
struct HeightProfile {
    noise: NoiseField,
    base: f64,
    variation: f64,
}

impl HeightProfile {
    fn new(def: &BiomeDef, seed: u64, height_scale: f64) -> Self {
        Self {
            noise: NoiseField::new(def.height_noise.clone(), derive_seed(seed, name_salt(&def.name))),
            base: def.base_height / height_scale,
            variation: def.height_variation / height_scale,
        }
    }

    fn height(&self, point: DVec2) -> f64 {
        self.base + self.noise.sample(point.x, point.y) * self.variation
    }
}

impl PhaseTransform for TerrainSculptPhase {
    fn can_execute(&self, ctx: &GenerationContext) -> Result<(), SkipReason> {
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
        let height_scale = ctx.layout().height_scale;
        let sampling = ctx.config().sampling;

        let GridsMut {
            heights, biome_map, ..
        } = ctx.grids_mut();
        let map = biome_map.ok_or_else(|| missing_biome_map("terrain_sculpt"))?;
        let profiles: Vec<HeightProfile> = map
            .catalog()
            .iter()
            .map(|(_, def)| HeightProfile::new(def, seed, height_scale))
            .collect();
        let profile = |id: BiomeId| &profiles[id.0 as usize];

        for y in 0..res {
            progress.row(y, res)?;
            for x in 0..res {
                let point = bounds.grid_to_world(x, y, res);
                let h = match sampling {
                    BiomeSampling::Dominant => profile(map.biome_at(point)).height(point),
                    BiomeSampling::Blended => {
                        let q = map.query(point);
                        let primary = profile(q.primary).height(point);
                        if q.secondary_weight > 0.0 {
                            primary * q.primary_weight
                                + profile(q.secondary).height(point) * q.secondary_weight
                        } else {
                            primary
                        }
                    }
                };
                heights.set(x, y, h.clamp(0.0, 1.0) as f32);
            }
        }

        ctx.publish_overlay(|c| DebugOverlay::new("heightmap", render_heightmap(c.heights())));
        Ok(())
    }

    fn rollback(&self, ctx: &mut GenerationContext) {
        ctx.restore_heights();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::LayoutConfig;
    use crate::config::GenerationConfig;
    use crate::phase::PhaseKind;
    use crate::phases::test_support::{context, run};

    fn config(sampling: BiomeSampling) -> GenerationConfig {
        GenerationConfig {
            seed: 21,
            sampling,
            ..Default::default()
        }
    }

    #[test]
    fn test_heights_in_unit_range() {
        let mut ctx = context(config(BiomeSampling::Dominant));
        run(&mut ctx, &[PhaseKind::BiomeLayout, PhaseKind::TerrainSculpt]);
        assert!(
            ctx.heights().as_slice().iter().all(|h| (0.0..=1.0).contains(h)),
            "heights must be clamped to [0, 1]"
        );
        assert_ne!(ctx.heights(), ctx.original_heights());
    }

    #[test]
    fn test_dominant_single_biome_is_its_profile() {
        let flat = BiomeDef {
            name: "flat".into(),
            base_height: 16.0,
            height_variation: 0.0,
            ..Default::default()
        };
        let mut ctx = context(GenerationConfig {
            seed: 5,
            biomes: vec![flat],
            ..Default::default()
        });
        run(&mut ctx, &[PhaseKind::BiomeLayout, PhaseKind::TerrainSculpt]);
        assert!(
            ctx.heights().as_slice().iter().all(|&h| (h - 0.25).abs() < 1e-6),
            "base 16 over scale 64 is 0.25 everywhere"
        );
    }

    #[test]
    fn test_blended_sampling_softens_borders() {
        let biomes = vec![
            BiomeDef {
                name: "low".into(),
                base_height: 0.0,
                height_variation: 0.0,
                ..Default::default()
            },
            BiomeDef {
                name: "high".into(),
                base_height: 64.0,
                height_variation: 0.0,
                texture_layer: 1,
                ..Default::default()
            },
        ];
        let make = |sampling| {
            let mut ctx = context(GenerationConfig {
                seed: 8,
                biomes: biomes.clone(),
                sampling,
                // Twelve cells between two equally weighted biomes: both appear.
                layout: LayoutConfig {
                    min_cells: 12,
                    max_cells: 12,
                    ..Default::default()
                },
                ..Default::default()
            });
            run(&mut ctx, &[PhaseKind::BiomeLayout, PhaseKind::TerrainSculpt]);
            ctx.heights().clone()
        };

        let dominant = make(BiomeSampling::Dominant);
        assert!(
            dominant.as_slice().iter().all(|&h| h == 0.0 || h == 1.0),
            "dominant sampling only produces profile heights"
        );
        let blended = make(BiomeSampling::Blended);
        let mixed = blended.as_slice().iter().filter(|&&h| h > 0.0 && h < 1.0).count();
        assert!(
            dominant.as_slice().iter().any(|&h| h == 0.0)
                && dominant.as_slice().iter().any(|&h| h == 1.0),
            "layout should contain both biomes"
        );
        assert!(mixed > 0, "blended sampling should produce border heights");
    }
}
