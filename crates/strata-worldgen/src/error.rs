//! Generation error types.

/// Errors produced while configuring or running world generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The configuration or target terrain cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Inputs are well-formed but produce nothing (no biomes, zero cells).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// A biome with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateBiome(String),

    /// A biome references a texture or detail layer the terrain does not have.
    #[error("biome `{biome}` references {kind} layer {layer}, terrain has {count}")]
    LayerOutOfRange {
        /// Offending biome.
        biome: String,
        /// `"texture"` or `"detail"`.
        kind: &'static str,
        /// Requested layer index.
        layer: usize,
        /// Layers available on the terrain.
        count: usize,
    },

    /// A phase ran without the data an earlier phase should have produced.
    #[error("{phase} requires {missing}")]
    MissingInput {
        /// Phase name.
        phase: &'static str,
        /// Description of the missing data.
        missing: &'static str,
    },

    /// The cancel token was raised while a phase was scanning its grid.
    #[error("{phase} cancelled at row {row}")]
    Cancelled {
        /// Phase name.
        phase: &'static str,
        /// Row being processed when cancellation was observed.
        row: usize,
    },

    /// A phase index outside the pipeline.
    #[error("phase index {index} out of range ({len} phases)")]
    PhaseIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of phases in the pipeline.
        len: usize,
    },

    /// A rollback target after the next pending phase; rolling back may
    /// only move execution backwards.
    #[error("cannot roll back to phase {index}: phase {next} has not run yet")]
    RollbackAhead {
        /// Requested index.
        index: usize,
        /// Next phase that would run.
        next: usize,
    },

    /// An operation that needs an active run was called without one.
    #[error("pipeline is not running")]
    NotRunning,

    /// `begin` was called while a previous run still holds its context or
    /// its terrain.
    #[error("a generation run still holds its terrain; finish it first")]
    AlreadyActive,
}
