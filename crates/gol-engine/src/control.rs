//! Command servicing and population telemetry, concurrent with the turn
//! loop.
//!
//! The control loop runs on its own thread for the lifetime of a run and
//! multiplexes three sources with `crossbeam_channel::select!`: a telemetry
//! ticker, the command stream, and the coordinator's termination signal.
//! It only ever reads the last completed [`TurnSnapshot`].

use std::ops::ControlFlow;
use std::sync::Arc;

use crossbeam_channel::{never, select, tick, Receiver, Sender};
use gol_core::{Command, Event, State};
use tracing::{debug, error, info};

use crate::config::RunConfig;
use crate::coordinator::ExitReason;
use crate::image::ImageStore;
use crate::shared::{RunPhase, SharedRun, TurnSnapshot};

/// Where events and snapshots leave the engine. Shared by the coordinator
/// and the control loop.
#[derive(Clone)]
pub(crate) struct Output {
    events: Sender<Event>,
    store: Arc<dyn ImageStore>,
    config: RunConfig,
}

impl Output {
    pub fn new(events: Sender<Event>, store: Arc<dyn ImageStore>, config: RunConfig) -> Self {
        Self {
            events,
            store,
            config,
        }
    }

    pub fn emit(&self, event: Event) {
        // A consumer that hung up no longer wants events; the run goes on.
        let _ = self.events.send(event);
    }

    /// Save `snap` and emit `ImageOutputComplete` once it is written.
    /// A failed save is logged and emits nothing.
    pub fn save(&self, snap: &TurnSnapshot) {
        let name = self.config.output_name(snap.turn);
        let world = &snap.world;
        match self
            .store
            .save(&name, world.height(), world.width(), &world.to_bytes())
        {
            Ok(()) => {
                info!(turn = %snap.turn, %name, "snapshot saved");
                self.emit(Event::ImageOutputComplete {
                    turn: snap.turn,
                    filename: name,
                });
            }
            Err(e) => error!(turn = %snap.turn, %name, error = %e, "snapshot save failed"),
        }
    }

    /// The terminal sequence: `FinalTurnComplete`, save, `StateChange(Quitting)`.
    pub fn finish(&self, snap: &TurnSnapshot) {
        self.emit(Event::FinalTurnComplete {
            turn: snap.turn,
            alive: snap.world.alive_cells(),
        });
        self.save(snap);
        self.emit(Event::StateChange {
            turn: snap.turn,
            state: State::Quitting,
        });
    }
}

/// The control side of a run. Built and spawned by the
/// [`TurnCoordinator`](crate::TurnCoordinator).
pub(crate) struct ControlLoop {
    shared: Arc<SharedRun>,
    output: Output,
    commands: Receiver<Command>,
    done: Receiver<()>,
}

impl ControlLoop {
    pub fn new(
        shared: Arc<SharedRun>,
        output: Output,
        commands: Receiver<Command>,
        done: Receiver<()>,
    ) -> Self {
        Self {
            shared,
            output,
            commands,
            done,
        }
    }

    /// Service commands and telemetry until the coordinator drops its end
    /// of `done` or a quit is handled here.
    pub fn run(self) {
        let ticker = tick(self.output.config.telemetry_interval);
        let closed = never();
        let mut open = true;
        loop {
            let commands = if open { &self.commands } else { &closed };
            select! {
                recv(self.done) -> _ => break,
                recv(ticker) -> _ => self.report_alive(),
                recv(commands) -> msg => match msg {
                    Ok(cmd) => {
                        if self.handle(cmd).is_break() {
                            break;
                        }
                    }
                    Err(_) => {
                        debug!("command stream closed");
                        open = false;
                    }
                },
            }
        }
        debug!("control loop stopped");
    }

    fn report_alive(&self) {
        let state = self.shared.lock();
        if state.phase == RunPhase::Executing {
            self.output.emit(Event::AliveCellsCount {
                turn: state.latest.turn,
                count: state.latest.alive,
            });
        }
    }

    fn handle(&self, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Save => {
                if self.is_quitting(cmd) {
                    return ControlFlow::Continue(());
                }
                let snap = self.shared.latest();
                self.output.save(&snap);
                ControlFlow::Continue(())
            }
            Command::PauseToggle => {
                self.toggle_pause();
                ControlFlow::Continue(())
            }
            Command::Quit => self.stop(ExitReason::Quit),
            Command::Kill => self.stop(ExitReason::Killed),
        }
    }

    fn is_quitting(&self, cmd: Command) -> bool {
        let phase = self.shared.phase();
        let quitting = matches!(phase, RunPhase::Quitting | RunPhase::Terminated);
        if quitting {
            debug!(command = ?cmd, "run is quitting; command ignored");
        }
        quitting
    }

    fn toggle_pause(&self) {
        let mut state = self.shared.lock();
        let (phase, announced) = match state.phase {
            RunPhase::Executing => (RunPhase::Paused, State::Paused),
            RunPhase::Paused => (RunPhase::Executing, State::Executing),
            other => {
                debug!(phase = ?other, "pause toggle ignored");
                return;
            }
        };
        state.phase = phase;
        info!(turn = %state.latest.turn, state = %announced, "pause toggled");
        // Announced under the lock so no turn event can slip in between.
        self.output.emit(Event::StateChange {
            turn: state.latest.turn,
            state: announced,
        });
        self.shared.notify();
    }

    fn stop(&self, reason: ExitReason) -> ControlFlow<()> {
        let snap = {
            let mut state = self.shared.lock();
            if matches!(state.phase, RunPhase::Quitting | RunPhase::Terminated) {
                debug!(?reason, "run is already quitting; command ignored");
                return ControlFlow::Continue(());
            }
            state.phase = RunPhase::Quitting;
            state.stop = Some(reason);
            self.shared.notify();
            Arc::clone(&state.latest)
        };
        info!(turn = %snap.turn, ?reason, "stop requested");
        self.output.finish(&snap);
        ControlFlow::Break(())
    }
}
