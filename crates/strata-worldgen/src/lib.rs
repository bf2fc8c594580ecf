//! Deterministic multi-phase world generation: Voronoi biome layout, terrain
//! sculpting, splat painting, vegetation, and object scatter, with artist-mode
//! pauses and rollback.

mod bounds;
mod config;
mod context;
mod error;
mod grid;
mod noise_field;
mod phase;
mod pipeline;
mod seed;
mod spawn;
mod terrain;

pub mod biome;
pub mod debug_viz;
pub mod phases;
pub mod placement;

pub use biome::{
    BiomeCatalog, BiomeCell, BiomeDef, BiomeId, BiomeMap, BiomeQuery, LayoutConfig,
    VegetationLayer, VoronoiBiomeGenerator, WarpConfig,
};
pub use bounds::Bounds;
pub use config::{BiomeSampling, GenerationConfig, PhaseToggles, default_biomes};
pub use context::{GenerationContext, GridsMut};
pub use debug_viz::{DebugImage, DebugOverlay};
pub use error::GenerationError;
pub use grid::{DetailGrids, Grid, HeightGrid, SplatGrid};
pub use noise_field::{NoiseField, NoiseMode, NoiseSettings};
pub use phase::{
    CancelToken, GenerationPhase, PhaseKind, PhaseProgress, PhaseState, PhaseTransform, SkipReason,
};
pub use pipeline::{EventBus, GenerationPipeline, PipelineEvent};
pub use placement::{ScatterRule, SlopeFeatureMap, TerrainFeatureMap};
pub use seed::{cell_random, derive_seed, name_salt, resolve_seed, stream_rng};
pub use spawn::{CollectingSpawner, ObjectSpawner, SpawnGroup, SpawnRecord};
pub use terrain::{TerrainData, TerrainLayout, TerrainResource, TerrainSampler};
