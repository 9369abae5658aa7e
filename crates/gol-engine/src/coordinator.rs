//! The turn loop: load, resume, advance turn by turn, finish.
//!
//! The coordinator owns its [`TurnBackend`] exclusively and calls it from
//! a single thread, so turns are strictly sequential. Pause and quit are
//! observed at turn boundaries: a turn still being computed when the run
//! pauses is committed only after resume, and one still being computed
//! when the run quits is discarded.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use gol_core::{Command, Event, State, TurnId, World, WorldError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, TurnBackend};
use crate::config::{ConfigError, RunConfig};
use crate::control::{ControlLoop, Output};
use crate::image::{ImageError, ImageStore};
use crate::shared::{RunPhase, SharedRun, TurnSnapshot};

// ── Errors and reports ─────────────────────────────────────────────

/// Failure of a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration is invalid or a run thread could not be started.
    #[error("invalid run configuration")]
    Config(#[from] ConfigError),
    /// The initial image could not be read.
    #[error("initial image could not be loaded")]
    Image(#[from] ImageError),
    /// The initial image does not describe a valid world.
    #[error("initial image is not a valid world")]
    World(#[from] WorldError),
    /// Turn computation failed. The run was stopped.
    #[error("turn computation failed")]
    Backend(#[from] BackendError),
    /// The coordinator thread panicked.
    #[error("coordinator thread panicked")]
    Panicked,
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The configured turn count was reached.
    Completed,
    /// A `Quit` command stopped the run.
    Quit,
    /// A `Kill` command stopped the run and tore down remote resources.
    Killed,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Last committed turn.
    pub final_turn: TurnId,
    /// Turns computed by this run (excludes turns restored from a
    /// checkpoint).
    pub turns_executed: u32,
    /// Why the run stopped.
    pub exit: ExitReason,
    /// Wall-clock duration of the run in milliseconds.
    pub total_ms: u64,
}

// ── TurnCoordinator ────────────────────────────────────────────────

/// Drives a run over a [`TurnBackend`].
///
/// Event order for a run that completes:
///
/// ```text
/// CellsFlipped(k0, initial alive)  StateChange(k0, Executing)
/// CellsFlipped(k0+1, ..)           TurnComplete(k0+1)
/// ...
/// FinalTurnComplete(n, alive)      ImageOutputComplete(n, ..)   StateChange(n, Quitting)
/// ```
///
/// where `k0` is `0`, or the checkpoint turn when the backend provides one.
pub struct TurnCoordinator<B> {
    config: RunConfig,
    backend: B,
    store: Arc<dyn ImageStore>,
}

impl<B: TurnBackend> TurnCoordinator<B> {
    /// Validate `config` and pair it with a backend and an image store.
    pub fn new(
        config: RunConfig,
        backend: B,
        store: Arc<dyn ImageStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            store,
        })
    }

    /// The run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the run on the calling thread, spawning the control loop
    /// alongside it. Returns once both have stopped.
    pub fn run(
        mut self,
        commands: Receiver<Command>,
        events: Sender<Event>,
    ) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let target = self.config.target_turn();
        let (turn, world) = self.load_initial(target)?;
        let world = Arc::new(world);
        self.backend.start(&world, turn, target)?;

        info!(
            backend = self.backend.name(),
            start = %turn,
            %target,
            height = world.height(),
            width = world.width(),
            bands = self.config.threads,
            "run started"
        );

        let output = Output::new(events, Arc::clone(&self.store), self.config.clone());
        let shared = Arc::new(SharedRun::new(TurnSnapshot::new(turn, Arc::clone(&world))));
        {
            let mut state = shared.lock();
            output.emit(Event::CellsFlipped {
                turn,
                cells: world.alive_cells(),
            });
            output.emit(Event::StateChange {
                turn,
                state: State::Executing,
            });
            state.phase = RunPhase::Executing;
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);
        let control = ControlLoop::new(Arc::clone(&shared), output.clone(), commands, done_rx);
        let control = thread::Builder::new()
            .name("gol-control".into())
            .spawn(move || control.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("control loop: {e}"),
            })?;

        let mut executed = 0u32;
        let outcome = self.drive(&shared, &output, world, turn, target, &mut executed);
        match &outcome {
            Ok(()) => self.complete(&shared, &output),
            Err(e) => self.abort(&shared, &output, e),
        }

        drop(done_tx);
        if control.join().is_err() {
            warn!("control loop panicked");
        }

        let (final_turn, stop) = {
            let mut state = shared.lock();
            state.phase = RunPhase::Terminated;
            (state.latest.turn, state.stop)
        };
        if stop == Some(ExitReason::Killed) {
            info!(backend = self.backend.name(), "shutting down backend");
            if let Err(e) = self.backend.shutdown() {
                warn!(error = %e, "backend shutdown failed");
            }
        }
        outcome?;

        let report = RunReport {
            final_turn,
            turns_executed: executed,
            exit: stop.unwrap_or(ExitReason::Completed),
            total_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            final_turn = %report.final_turn,
            turns = report.turns_executed,
            exit = ?report.exit,
            total_ms = report.total_ms,
            "run finished"
        );
        Ok(report)
    }

    fn load_initial(&mut self, target: TurnId) -> Result<(TurnId, World), RunError> {
        let cfg = &self.config;
        let name = cfg.input_name();
        let bytes = self.store.load(&name, cfg.height, cfg.width)?;
        let initial = World::from_bytes(cfg.height, cfg.width, &bytes)?;
        debug!(%name, alive = initial.alive_count(), "initial image loaded");

        match self.backend.checkpoint(&initial, target)? {
            Some(cp) if cp.world.dims() == initial.dims() && cp.turn < target => {
                info!(turn = %cp.turn, backend = self.backend.name(), "resuming from checkpoint");
                Ok((cp.turn, cp.world))
            }
            Some(cp) => {
                debug!(turn = %cp.turn, "checkpoint not resumable; starting fresh");
                Ok((TurnId(0), initial))
            }
            None => Ok((TurnId(0), initial)),
        }
    }

    fn drive(
        &mut self,
        shared: &SharedRun,
        output: &Output,
        mut world: Arc<World>,
        mut turn: TurnId,
        target: TurnId,
        executed: &mut u32,
    ) -> Result<(), BackendError> {
        while turn < target {
            if shared.wait_while_paused(shared.lock()).phase == RunPhase::Quitting {
                return Ok(());
            }

            let next = Arc::new(self.backend.advance(&world, turn)?);
            let flipped = world.flipped(&next)?;
            let next_turn = turn.next();

            let mut state = shared.wait_while_paused(shared.lock());
            if state.phase == RunPhase::Quitting {
                debug!(turn = %next_turn, "run quitting; in-flight turn discarded");
                return Ok(());
            }
            output.emit(Event::CellsFlipped {
                turn: next_turn,
                cells: flipped,
            });
            output.emit(Event::TurnComplete { turn: next_turn });
            state.latest = Arc::new(TurnSnapshot::new(next_turn, Arc::clone(&next)));
            drop(state);

            debug!(turn = %next_turn, "turn committed");
            world = next;
            turn = next_turn;
            *executed += 1;
        }
        Ok(())
    }

    fn complete(&self, shared: &SharedRun, output: &Output) {
        let snap = {
            let mut state = shared.lock();
            if state.phase == RunPhase::Quitting {
                return;
            }
            state.phase = RunPhase::Quitting;
            state.stop = Some(ExitReason::Completed);
            shared.notify();
            Arc::clone(&state.latest)
        };
        output.finish(&snap);
    }

    fn abort(&self, shared: &SharedRun, output: &Output, err: &BackendError) {
        error!(backend = self.backend.name(), error = %err, "turn computation failed; stopping run");
        let mut state = shared.lock();
        if state.phase != RunPhase::Quitting {
            state.phase = RunPhase::Quitting;
            output.emit(Event::StateChange {
                turn: state.latest.turn,
                state: State::Quitting,
            });
            shared.notify();
        }
    }
}
