//! Phase state machine: skip, run, fail, complete, and roll back one step of
//! the pipeline against a [`GenerationContext`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use crate::context::GenerationContext;
use crate::error::GenerationError;
use crate::phases::{
    BiomeLayoutPhase, ScatterPhase, SplatmapPaintPhase, TerrainSculptPhase, VegetationPhase,
};
use crate::seed::name_salt;

/// Lifecycle of a phase within one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PhaseState {
    #[default]
    Pending,
    Running,
    Completed,
    /// The transform returned an error. The pipeline stops.
    Failed,
    /// A precondition was unmet. Later phases still run.
    Skipped,
}

/// Why a phase did not run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Turned off in the config.
    Disabled,
    /// An upstream phase did not produce what this one reads.
    MissingInput(&'static str),
    /// Inputs are valid but would produce nothing; usually a config mistake.
    DegenerateInput(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::MissingInput(what) => write!(f, "missing {what}"),
            Self::DegenerateInput(why) => write!(f, "degenerate input: {why}"),
        }
    }
}

/// Shared flag a host raises to stop the running phase at the next row.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Progress reporting and cancellation checks for a running phase.
pub struct PhaseProgress<'a> {
    phase: &'static str,
    value: f64,
    cancel: CancelToken,
    sink: &'a mut dyn FnMut(f64),
}

impl<'a> PhaseProgress<'a> {
    /// Progress for `phase`, reporting into `sink`.
    pub fn new(phase: &'static str, cancel: CancelToken, sink: &'a mut dyn FnMut(f64)) -> Self {
        Self {
            phase,
            value: 0.0,
            cancel,
            sink,
        }
    }

    /// Last reported value in `[0, 1]`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Report completion fraction `value`, clamped to `[0, 1]`.
    pub fn report(&mut self, value: f64) {
        self.value = value.clamp(0.0, 1.0);
        (self.sink)(self.value);
    }

    /// Called at the start of row `row` of `rows`: fails if cancellation was
    /// requested, otherwise reports the rows finished so far.
    pub fn row(&mut self, row: usize, rows: usize) -> Result<(), GenerationError> {
        self.checkpoint(row)?;
        self.report(row as f64 / rows.max(1) as f64);
        Ok(())
    }

    /// Fail with [`GenerationError::Cancelled`] if cancellation was requested.
    pub fn checkpoint(&self, row: usize) -> Result<(), GenerationError> {
        if self.cancel.is_cancelled() {
            return Err(GenerationError::Cancelled {
                phase: self.phase,
                row,
            });
        }
        Ok(())
    }
}

/// The work of one phase.
pub trait PhaseTransform: Sync {
    /// `Err` means the phase is skipped; unmet preconditions are not failures.
    fn can_execute(&self, ctx: &GenerationContext) -> Result<(), SkipReason>;

    /// Mutate the context. Errors mark the phase failed.
    fn run(
        &self,
        ctx: &mut GenerationContext,
        progress: &mut PhaseProgress<'_>,
    ) -> Result<(), GenerationError>;

    /// Undo this phase's effect on the context, restoring only what it owns.
    /// Must be safe to call repeatedly and on a phase that never ran.
    fn rollback(&self, ctx: &mut GenerationContext);
}

/// The five pipeline phases, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    BiomeLayout,
    TerrainSculpt,
    SplatmapPaint,
    Vegetation,
    Scatter,
}

impl PhaseKind {
    /// Every phase, in the order the pipeline runs them.
    pub const fn standard() -> [PhaseKind; 5] {
        [
            Self::BiomeLayout,
            Self::TerrainSculpt,
            Self::SplatmapPaint,
            Self::Vegetation,
            Self::Scatter,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BiomeLayout => "biome_layout",
            Self::TerrainSculpt => "terrain_sculpt",
            Self::SplatmapPaint => "splatmap_paint",
            Self::Vegetation => "vegetation",
            Self::Scatter => "scatter",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::BiomeLayout => "Partition the bounds into Voronoi biome cells",
            Self::TerrainSculpt => "Shape the height grid from biome height profiles",
            Self::SplatmapPaint => "Paint biome texture layers into the splat grid",
            Self::Vegetation => "Fill vegetation detail layers",
            Self::Scatter => "Place discrete objects and emit spawn records",
        }
    }

    /// RNG stream salt for this phase.
    pub fn salt(self) -> u64 {
        name_salt(self.name())
    }

    pub fn transform(self) -> &'static dyn PhaseTransform {
        match self {
            Self::BiomeLayout => &BiomeLayoutPhase,
            Self::TerrainSculpt => &TerrainSculptPhase,
            Self::SplatmapPaint => &SplatmapPaintPhase,
            Self::Vegetation => &VegetationPhase,
            Self::Scatter => &ScatterPhase,
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One pipeline step and its run state.
#[derive(Clone, Debug)]
pub struct GenerationPhase {
    kind: PhaseKind,
    state: PhaseState,
    progress: f64,
    last_error: Option<String>,
    skip_reason: Option<SkipReason>,
}

impl GenerationPhase {
    pub fn new(kind: PhaseKind) -> Self {
        Self {
            kind,
            state: PhaseState::Pending,
            progress: 0.0,
            last_error: None,
            skip_reason: None,
        }
    }

    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Completion fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Error message from the last failed execution.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reason for the last skip.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        self.skip_reason.as_ref()
    }

    /// Whether the phase is enabled and its inputs exist.
    pub fn can_execute(&self, ctx: &GenerationContext) -> Result<(), SkipReason> {
        if !ctx.config().phases.is_enabled(self.kind) {
            return Err(SkipReason::Disabled);
        }
        self.kind.transform().can_execute(ctx)
    }

    /// Run the phase, reporting progress into `on_progress`.
    ///
    /// Never returns an error: failures are recorded as [`PhaseState::Failed`]
    /// with the message in [`Self::last_error`].
    pub fn execute(
        &mut self,
        ctx: &mut GenerationContext,
        on_progress: &mut dyn FnMut(f64),
    ) -> PhaseState {
        self.last_error = None;
        self.skip_reason = None;

        if let Err(reason) = self.can_execute(ctx) {
            match &reason {
                SkipReason::DegenerateInput(_) => {
                    warn!(phase = self.name(), %reason, "Phase skipped on degenerate input")
                }
                _ => info!(phase = self.name(), %reason, "Phase skipped"),
            }
            self.state = PhaseState::Skipped;
            self.skip_reason = Some(reason);
            return self.state;
        }

        self.state = PhaseState::Running;
        self.progress = 0.0;
        ctx.reseed(self.kind.salt());

        let mut progress = PhaseProgress::new(self.name(), ctx.cancel_token().clone(), on_progress);
        let result = self.kind.transform().run(ctx, &mut progress);
        self.progress = progress.value();

        match result {
            Ok(()) => {
                self.progress = 1.0;
                self.state = PhaseState::Completed;
            }
            Err(err) => {
                error!(phase = self.name(), error = %err, "Phase failed");
                self.last_error = Some(err.to_string());
                self.state = PhaseState::Failed;
            }
        }
        self.state
    }

    /// Undo the phase and return it to [`PhaseState::Pending`].
    ///
    /// A pending phase has nothing to undo; calling this again is a no-op.
    pub fn rollback(&mut self, ctx: &mut GenerationContext) {
        if self.state == PhaseState::Pending {
            return;
        }
        self.kind.transform().rollback(ctx);
        self.state = PhaseState::Pending;
        self.progress = 0.0;
        self.last_error = None;
        self.skip_reason = None;
    }

    /// Forget run state without touching any context.
    pub(crate) fn clear(&mut self) {
        *self = Self::new(self.kind);
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::config::GenerationConfig;
    use crate::terrain::{TerrainData, TerrainLayout};

    fn context(config: GenerationConfig) -> GenerationContext {
        let terrain = TerrainData::new(TerrainLayout {
            origin: DVec2::ZERO,
            size: DVec2::splat(64.0),
            height_scale: 40.0,
            resolution: 17,
            splat_layers: 3,
            detail_layers: 2,
        });
        GenerationContext::new(config, &terrain).unwrap()
    }

    fn seeded() -> GenerationConfig {
        GenerationConfig {
            seed: 17,
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_order() {
        let names: Vec<_> = PhaseKind::standard().iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            ["biome_layout", "terrain_sculpt", "splatmap_paint", "vegetation", "scatter"]
        );
    }

    #[test]
    fn test_execute_completes_and_reports_progress() {
        let mut ctx = context(seeded());
        let mut layout = GenerationPhase::new(PhaseKind::BiomeLayout);
        assert_eq!(layout.execute(&mut ctx, &mut |_| {}), PhaseState::Completed);

        let mut reports = Vec::new();
        let mut sculpt = GenerationPhase::new(PhaseKind::TerrainSculpt);
        let state = sculpt.execute(&mut ctx, &mut |p| reports.push(p));
        assert_eq!(state, PhaseState::Completed);
        assert_eq!(sculpt.progress(), 1.0);
        assert_eq!(reports.len(), 17, "one report per row");
        assert!(reports.windows(2).all(|w| w[0] <= w[1]), "progress is monotonic");
    }

    #[test]
    fn test_missing_upstream_skips() {
        let mut ctx = context(seeded());
        let mut sculpt = GenerationPhase::new(PhaseKind::TerrainSculpt);
        assert_eq!(sculpt.execute(&mut ctx, &mut |_| {}), PhaseState::Skipped);
        assert!(matches!(sculpt.skip_reason(), Some(SkipReason::MissingInput(_))));
    }

    #[test]
    fn test_disabled_phase_skips() {
        let mut config = seeded();
        config.phases.biome_layout = false;
        let mut ctx = context(config);
        let mut layout = GenerationPhase::new(PhaseKind::BiomeLayout);
        assert_eq!(layout.execute(&mut ctx, &mut |_| {}), PhaseState::Skipped);
        assert_eq!(layout.skip_reason(), Some(&SkipReason::Disabled));
        assert!(ctx.biome_map().is_none());
    }

    #[test]
    fn test_cancelled_phase_fails() {
        let mut ctx = context(seeded());
        GenerationPhase::new(PhaseKind::BiomeLayout).execute(&mut ctx, &mut |_| {});
        ctx.cancel_token().cancel();

        let mut sculpt = GenerationPhase::new(PhaseKind::TerrainSculpt);
        assert_eq!(sculpt.execute(&mut ctx, &mut |_| {}), PhaseState::Failed);
        assert!(
            sculpt.last_error().is_some_and(|e| e.contains("cancelled")),
            "error should mention cancellation: {:?}",
            sculpt.last_error()
        );
    }

    #[test]
    fn test_rollback_is_idempotent() {
        let mut ctx = context(seeded());
        GenerationPhase::new(PhaseKind::BiomeLayout).execute(&mut ctx, &mut |_| {});
        let mut sculpt = GenerationPhase::new(PhaseKind::TerrainSculpt);
        sculpt.execute(&mut ctx, &mut |_| {});
        assert_ne!(ctx.heights(), ctx.original_heights());

        sculpt.rollback(&mut ctx);
        let after_first = ctx.heights().clone();
        sculpt.rollback(&mut ctx);
        assert_eq!(ctx.heights(), &after_first);
        assert_eq!(ctx.heights(), ctx.original_heights());
        assert_eq!(sculpt.state(), PhaseState::Pending);
    }

    #[test]
    fn test_rollback_of_skipped_phase_is_benign() {
        let mut ctx = context(seeded());
        let mut vegetation = GenerationPhase::new(PhaseKind::Vegetation);
        assert_eq!(vegetation.execute(&mut ctx, &mut |_| {}), PhaseState::Skipped);
        vegetation.rollback(&mut ctx);
        assert_eq!(vegetation.state(), PhaseState::Pending);
        assert_eq!(ctx.detail(), ctx.original_detail());
    }

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!other.is_cancelled());
    }
}
