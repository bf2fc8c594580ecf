//! The five concrete pipeline phases.
//!
//! Grid phases scan every cell row by row, mapping index `(x, y)` to world
//! space through the context's generation bounds.

mod layout;
mod scatter;
mod sculpt;
mod splat;
mod vegetation;

pub use layout::BiomeLayoutPhase;
pub use scatter::ScatterPhase;
pub use sculpt::TerrainSculptPhase;
pub use splat::SplatmapPaintPhase;
pub use vegetation::VegetationPhase;

use crate::context::GenerationContext;
use crate::error::GenerationError;
use crate::phase::SkipReason;

/// Skip unless an earlier phase left a non-empty biome map.
fn require_biome_map(ctx: &GenerationContext) -> Result<(), SkipReason> {
    match ctx.biome_map() {
        Some(map) if !map.is_empty() => Ok(()),
        _ => Err(SkipReason::MissingInput("a biome map")),
    }
}

fn missing_biome_map(phase: &'static str) -> GenerationError {
    GenerationError::MissingInput {
        phase,
        missing: "a biome map",
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::DVec2;

    use crate::config::GenerationConfig;
    use crate::context::GenerationContext;
    use crate::phase::{GenerationPhase, PhaseKind, PhaseState};
    use crate::terrain::{TerrainData, TerrainLayout};

    pub fn layout(resolution: usize) -> TerrainLayout {
        TerrainLayout {
            origin: DVec2::ZERO,
            size: DVec2::splat(128.0),
            height_scale: 64.0,
            resolution,
            splat_layers: 3,
            detail_layers: 2,
        }
    }

    pub fn context(config: GenerationConfig) -> GenerationContext {
        GenerationContext::new(config, &TerrainData::new(layout(33))).unwrap()
    }

    /// Run `kinds` in order, asserting each completes.
    pub fn run(ctx: &mut GenerationContext, kinds: &[PhaseKind]) {
        for &kind in kinds {
            let mut phase = GenerationPhase::new(kind);
            assert_eq!(
                phase.execute(ctx, &mut |_| {}),
                PhaseState::Completed,
                "{kind} should complete: {:?}",
                phase.last_error()
            );
        }
    }
}
