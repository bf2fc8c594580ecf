//! Ordered phase execution with artist-mode pauses, rollback, and reset.
//!
//! The pipeline owns the target terrain for the duration of a run and
//! publishes the context's grids into it after every phase, rollback, and
//! reset. Progress and lifecycle are reported as [`PipelineEvent`]s, both to
//! registered callbacks and to any number of channel subscribers.

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::context::GenerationContext;
use crate::debug_viz::DebugOverlay;
use crate::error::GenerationError;
use crate::phase::{CancelToken, GenerationPhase, PhaseKind, PhaseState, SkipReason};
use crate::spawn::{ObjectSpawner, SpawnGroup};
use crate::terrain::TerrainResource;

/// Lifecycle notifications emitted by a [`GenerationPipeline`].
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    PipelineStarted {
        seed: u64,
        phases: usize,
        artist_mode: bool,
    },
    PhaseStarted {
        index: usize,
        name: &'static str,
    },
    PhaseProgress {
        index: usize,
        name: &'static str,
        progress: f64,
    },
    PhaseCompleted {
        index: usize,
        name: &'static str,
    },
    PhaseSkipped {
        index: usize,
        name: &'static str,
        reason: SkipReason,
    },
    PhaseFailed {
        index: usize,
        name: &'static str,
        error: String,
    },
    PhaseRolledBack {
        index: usize,
        name: &'static str,
    },
    /// Artist mode: waiting for `resume` or `rollback_to` before phase `next`.
    PipelinePaused {
        next: usize,
    },
    PipelineCompleted {
        completed: usize,
        skipped: usize,
    },
    PipelineReset,
}

type Listener = Box<dyn FnMut(&PipelineEvent) + Send>;

/// Fan-out of pipeline events to callbacks and channel subscribers.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    subscribers: Vec<Sender<PipelineEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` synchronously for every event.
    pub fn on_event(&mut self, listener: impl FnMut(&PipelineEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Receive every subsequent event on a channel. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<PipelineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: PipelineEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Runs the five phases in order against an owned terrain resource.
pub struct GenerationPipeline<T: TerrainResource> {
    phases: Vec<GenerationPhase>,
    context: Option<GenerationContext>,
    target: Option<T>,
    events: EventBus,
    spawner: Option<Box<dyn ObjectSpawner>>,
    cancel: CancelToken,
    next: usize,
    running: bool,
    paused: bool,
    artist_mode: bool,
}

impl<T: TerrainResource> Default for GenerationPipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TerrainResource> GenerationPipeline<T> {
    /// Pipeline with the standard phase list and no active run.
    pub fn new() -> Self {
        Self {
            phases: PhaseKind::standard().into_iter().map(GenerationPhase::new).collect(),
            context: None,
            target: None,
            events: EventBus::new(),
            spawner: None,
            cancel: CancelToken::new(),
            next: 0,
            running: false,
            paused: false,
            artist_mode: false,
        }
    }

    /// See [`EventBus::on_event`].
    pub fn on_event(&mut self, listener: impl FnMut(&PipelineEvent) + Send + 'static) {
        self.events.on_event(listener);
    }

    /// See [`EventBus::subscribe`].
    pub fn subscribe(&mut self) -> Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Receive spawn groups whenever the scatter phase completes.
    pub fn set_spawner(&mut self, spawner: impl ObjectSpawner + 'static) {
        self.spawner = Some(Box::new(spawner));
    }

    /// Token that cancels the running phase at its next row. Shared across runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // -- state ------------------------------------------------------------

    pub fn phases(&self) -> &[GenerationPhase] {
        &self.phases
    }

    /// Index of the phase the next `execute_next_phase` call runs.
    pub fn next_phase(&self) -> usize {
        self.next
    }

    /// `true` between `begin` and completion, failure, or reset.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `true` while an artist-mode run waits between phases.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_artist_mode(&self) -> bool {
        self.artist_mode
    }

    pub fn context(&self) -> Option<&GenerationContext> {
        self.context.as_ref()
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    /// Scatter output of the current run.
    pub fn spawn_groups(&self) -> &[SpawnGroup] {
        self.context
            .as_ref()
            .map(|ctx| ctx.spawn_groups())
            .unwrap_or_default()
    }

    /// Latest preview overlay of the current run.
    pub fn debug_overlay(&self) -> Option<&DebugOverlay> {
        self.context.as_ref().and_then(|ctx| ctx.debug_overlay())
    }

    // -- control ----------------------------------------------------------

    /// Start a run of `config` against `target`.
    ///
    /// No phase runs yet; call [`Self::execute_all`] or step with
    /// [`Self::execute_next_phase`]. In artist mode the pipeline pauses
    /// after every phase.
    ///
    /// # Errors
    ///
    /// [`GenerationError::AlreadyActive`] while the pipeline still holds a
    /// previous target (call [`Self::finish`] to take it back, after
    /// [`Self::reset`] if the grids should be restored), or any validation
    /// error from the context. On error the
    /// pipeline state is unchanged and `target` is dropped.
    pub fn begin(
        &mut self,
        config: GenerationConfig,
        target: T,
        artist_mode: bool,
    ) -> Result<(), GenerationError> {
        if self.context.is_some() || self.target.is_some() {
            return Err(GenerationError::AlreadyActive);
        }
        let mut ctx = GenerationContext::new(config, &target)?;
        self.cancel.reset();
        ctx.set_cancel_token(self.cancel.clone());
        ctx.set_overlays_enabled(artist_mode && ctx.config().debug_overlays);

        let seed = ctx.seed();
        for phase in &mut self.phases {
            phase.clear();
        }
        self.context = Some(ctx);
        self.target = Some(target);
        self.next = 0;
        self.running = true;
        self.paused = false;
        self.artist_mode = artist_mode;

        info!(seed, phases = self.phases.len(), artist_mode, "Generation started");
        self.events.emit(PipelineEvent::PipelineStarted {
            seed,
            phases: self.phases.len(),
            artist_mode,
        });
        Ok(())
    }

    /// Run the next pending phase and return its resulting state.
    ///
    /// # Errors
    ///
    /// [`GenerationError::NotRunning`] if no run is active or the run has
    /// already completed or failed.
    pub fn execute_next_phase(&mut self) -> Result<PhaseState, GenerationError> {
        if !self.running || self.next >= self.phases.len() {
            return Err(GenerationError::NotRunning);
        }
        let (Some(ctx), Some(target)) = (self.context.as_mut(), self.target.as_mut()) else {
            return Err(GenerationError::NotRunning);
        };
        self.paused = false;

        let index = self.next;
        let phase = &mut self.phases[index];
        let name = phase.name();
        info!(phase = name, index, "Phase started");
        self.events.emit(PipelineEvent::PhaseStarted { index, name });

        // Each overlay describes only the phase that produced it.
        ctx.set_debug_overlay(None);
        let events = &mut self.events;
        let state = phase.execute(ctx, &mut |progress| {
            events.emit(PipelineEvent::PhaseProgress {
                index,
                name,
                progress,
            })
        });
        ctx.apply_to(target);

        match state {
            PhaseState::Completed => {
                info!(phase = name, index, "Phase completed");
                self.events.emit(PipelineEvent::PhaseCompleted { index, name });
                if phase.kind() == PhaseKind::Scatter
                    && let Some(spawner) = self.spawner.as_mut()
                {
                    debug!(groups = ctx.spawn_groups().len(), "Handing spawn groups to spawner");
                    spawner.spawn(ctx.spawn_groups());
                }
            }
            PhaseState::Skipped => {
                let reason = phase.skip_reason().cloned().unwrap_or(SkipReason::Disabled);
                self.events.emit(PipelineEvent::PhaseSkipped {
                    index,
                    name,
                    reason,
                });
            }
            PhaseState::Failed => {
                let error = phase.last_error().unwrap_or_default().to_owned();
                self.events.emit(PipelineEvent::PhaseFailed { index, name, error });
                self.running = false;
                return Ok(state);
            }
            PhaseState::Pending | PhaseState::Running => {}
        }

        self.next += 1;
        if self.next == self.phases.len() {
            self.complete();
        } else if self.artist_mode {
            self.paused = true;
            info!(next = self.next, "Pipeline paused");
            self.events.emit(PipelineEvent::PipelinePaused { next: self.next });
        }
        Ok(state)
    }

    /// Artist mode: continue with the next phase after a pause.
    pub fn resume(&mut self) -> Result<PhaseState, GenerationError> {
        self.execute_next_phase()
    }

    /// Run every remaining phase until completion or failure, ignoring
    /// artist-mode pauses.
    pub fn execute_all(&mut self) -> Result<(), GenerationError> {
        if !self.running {
            return Err(GenerationError::NotRunning);
        }
        while self.running && self.next < self.phases.len() {
            if self.execute_next_phase()? == PhaseState::Failed {
                break;
            }
        }
        Ok(())
    }

    /// Undo phases from the last executed one down to `index`, so that
    /// `index` is the next phase to run. Also revives a failed run.
    ///
    /// # Errors
    ///
    /// [`GenerationError::NotRunning`] without an active context,
    /// [`GenerationError::PhaseIndexOutOfRange`], or
    /// [`GenerationError::RollbackAhead`] if `index` is past the next
    /// pending phase.
    pub fn rollback_to(&mut self, index: usize) -> Result<(), GenerationError> {
        let len = self.phases.len();
        if index >= len {
            return Err(GenerationError::PhaseIndexOutOfRange { index, len });
        }
        let (Some(ctx), Some(target)) = (self.context.as_mut(), self.target.as_mut()) else {
            return Err(GenerationError::NotRunning);
        };
        if index > self.next {
            return Err(GenerationError::RollbackAhead {
                index,
                next: self.next,
            });
        }

        for i in (index..len).rev() {
            let phase = &mut self.phases[i];
            if phase.state() == PhaseState::Pending {
                continue;
            }
            phase.rollback(ctx);
            self.events.emit(PipelineEvent::PhaseRolledBack {
                index: i,
                name: phase.name(),
            });
        }
        ctx.set_debug_overlay(None);
        ctx.apply_to(target);

        info!(index, "Rolled back");
        self.next = index;
        self.running = true;
        self.paused = self.artist_mode;
        if self.paused {
            self.events.emit(PipelineEvent::PipelinePaused { next: index });
        }
        Ok(())
    }

    /// Restore the target to its pre-run grids and end the run. The target
    /// stays with the pipeline until [`Self::finish`]. No-op without a run.
    pub fn reset(&mut self) {
        let Some(mut ctx) = self.context.take() else {
            return;
        };
        ctx.restore_all();
        if let Some(target) = self.target.as_mut() {
            ctx.apply_to(target);
        }
        for phase in &mut self.phases {
            phase.clear();
        }
        self.next = 0;
        self.running = false;
        self.paused = false;
        info!("Generation reset");
        self.events.emit(PipelineEvent::PipelineReset);
    }

    /// End the run, keeping the generated grids, and hand the target back.
    pub fn finish(&mut self) -> Option<T> {
        self.context = None;
        self.running = false;
        self.paused = false;
        self.next = 0;
        for phase in &mut self.phases {
            phase.clear();
        }
        self.target.take()
    }

    fn complete(&mut self) {
        self.running = false;
        self.paused = false;
        let count = |s: PhaseState| self.phases.iter().filter(|p| p.state() == s).count();
        let completed = count(PhaseState::Completed);
        let skipped = count(PhaseState::Skipped);
        info!(completed, skipped, "Generation completed");
        self.events.emit(PipelineEvent::PipelineCompleted { completed, skipped });
    }
}
