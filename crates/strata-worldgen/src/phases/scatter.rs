use glam::{DVec2, DVec3};
use rand::Rng;
use tracing::{debug, info};

use super::{missing_biome_map, require_biome_map};
use crate::biome::BiomeMap;
use crate::bounds::Bounds;
use crate::context::GenerationContext;
use crate::error::GenerationError;
use crate::phase::{PhaseProgress, PhaseTransform, SkipReason};
use crate::placement::{Placement, PlacementValidator, PositionGenerator, SlopeFeatureMap};
use crate::spawn::{SpawnGroup, SpawnRecord};
use crate::terrain::TerrainSampler;

/// Places every biome's scatter rules and stores the resulting spawn groups.
///
/// Each rule's density is applied to the share of the bounds its biome
/// covers, and candidates outside the biome are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScatterPhase;

impl PhaseTransform for ScatterPhase {
    fn can_execute(&self, ctx: &GenerationContext) -> Result<(), SkipReason> {
        require_biome_map(ctx)
    }

    fn run(
        &self,
        ctx: &mut GenerationContext,
        progress: &mut PhaseProgress<'_>,
    ) -> Result<(), GenerationError> {
        ctx.clear_spawn_groups();
        let res = ctx.resolution();
        let bounds = ctx.bounds();
        let catalog = std::sync::Arc::clone(ctx.catalog());
        let cell_size = bounds.size().x / (res - 1) as f64;

        let mut groups = Vec::new();
        {
            let (sampler, map, rng) = ctx.scatter_parts();
            let map = map.ok_or_else(|| missing_biome_map("scatter"))?;
            let coverage = coverage_fractions(map, bounds, res, progress)?;

            let features = SlopeFeatureMap::new(sampler, cell_size);
            let validator = PlacementValidator::new(bounds, sampler).with_features(&features);
            let mut generator = PositionGenerator::new(validator);

            let rule_count: usize = catalog.iter().map(|(_, def)| def.scatter.len()).sum();
            let mut done = 0;
            for (id, def) in catalog.iter() {
                let area = bounds.area() * coverage[id.0 as usize];
                for (rule_index, rule) in def.scatter.iter().enumerate() {
                    progress.checkpoint(done)?;
                    let key = SpawnGroup::key_for(&def.name, rule_index);
                    let in_biome = |p: DVec2| map.biome_at(p) == id;
                    let (placements, stats) = generator.generate(rule, area, &mut *rng, &in_biome);
                    debug!(
                        biome = %def.name,
                        rule = %rule.name,
                        target = stats.target,
                        accepted = stats.accepted,
                        children = stats.children,
                        attempts = stats.attempts,
                        "Scatter rule placed"
                    );

                    let records = placements
                        .iter()
                        .filter_map(|p| to_record(p, &sampler, &mut *rng, &key))
                        .collect();
                    groups.push(SpawnGroup {
                        key,
                        biome: id,
                        rule: rule.name.clone(),
                        records,
                    });

                    done += 1;
                    progress.report(0.5 + 0.5 * done as f64 / rule_count as f64);
                }
            }
        }

        let records: usize = groups.iter().map(|g| g.records.len()).sum();
        info!(groups = groups.len(), records, "Scatter placed objects");
        for group in groups {
            ctx.push_spawn_group(group);
        }
        Ok(())
    }

    fn rollback(&self, ctx: &mut GenerationContext) {
        ctx.clear_spawn_groups();
    }
}

/// Share of grid cells each biome dominates, indexed by biome id. Scanning
/// reports the first half of the phase's progress.
fn coverage_fractions(
    map: &BiomeMap,
    bounds: Bounds,
    res: usize,
    progress: &mut PhaseProgress<'_>,
) -> Result<Vec<f64>, GenerationError> {
    let mut counts = vec![0_usize; map.catalog().len()];
    for y in 0..res {
        progress.checkpoint(y)?;
        progress.report(0.5 * y as f64 / res as f64);
        for x in 0..res {
            counts[map.biome_at(bounds.grid_to_world(x, y, res)).0 as usize] += 1;
        }
    }
    let cells = (res * res) as f64;
    Ok(counts.into_iter().map(|c| c as f64 / cells).collect())
}

/// Spawn record for a placement; `None` if its rule names no objects.
fn to_record<R: Rng + ?Sized>(
    placement: &Placement<'_>,
    sampler: &TerrainSampler<'_>,
    rng: &mut R,
    group: &str,
) -> Option<SpawnRecord> {
    let rule = placement.rule;
    if rule.object_keys.is_empty() {
        return None;
    }
    let object_key = rule.object_keys[rng.random_range(0..rule.object_keys.len())].clone();
    let rotation = if rule.random_rotation {
        rng.random_range(0.0..360.0)
    } else {
        0.0
    };
    let (lo, hi) = if rule.scale_range.0 <= rule.scale_range.1 {
        rule.scale_range
    } else {
        (rule.scale_range.1, rule.scale_range.0)
    };
    let scale = if hi > lo { rng.random_range(lo..=hi) } else { lo };
    let p = placement.position;
    Some(SpawnRecord {
        object_key,
        position: DVec3::new(p.x, sampler.world_height_at(p), p.y),
        rotation,
        scale,
        group_id: group.to_owned(),
    })
}
