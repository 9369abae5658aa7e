//! The broker: single source of truth for a run's turn and world.
//!
//! A client loads an initial world, then advances it with versioned
//! `Step(from_turn)` calls. The broker computes each turn either on its
//! own band pool or through remote workers, records the flipped cells of
//! recent turns in a [`TurnRing`], and keeps its state when the client
//! disconnects so a later client can resume from the checkpoint.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gol_core::{CellCoord, TurnId, World};
use gol_engine::{BackendError, Checkpoint, ConfigError, LocalEngine, TurnBackend, TurnRing};
use tracing::{debug, info, warn};

use crate::client::BrokerClient;
use crate::error::{ErrorCode, RpcError};
use crate::message::{CheckpointInfo, Request, Response};
use crate::remote::RemoteWorkers;
use crate::server::{Service, ShutdownHandle};
use crate::worker::DEFAULT_TERMINATE_GRACE;

// ── BrokerConfig ────────────────────────────────────────────────

/// Broker settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Worker addresses. Empty means compute on the broker's own pool.
    pub workers: Vec<String>,
    /// Band count for local computation.
    pub threads: usize,
    /// Sub-bands each remote worker splits its band into.
    pub band_threads: usize,
    /// Number of per-turn diff records retained.
    pub history: usize,
    /// Delay between `Terminate` and shutdown.
    pub terminate_grace: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            workers: Vec::new(),
            threads: 4,
            band_threads: 4,
            history: 64,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
        }
    }
}

impl BrokerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 || self.band_threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.history < 2 {
            return Err(ConfigError::HistoryTooShort {
                capacity: self.history,
            });
        }
        Ok(())
    }
}

// ── BrokerService ───────────────────────────────────────────────

/// What the broker remembers about one computed turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnRecord {
    /// Cells that changed in this turn, row-major.
    pub flipped: Vec<CellCoord>,
    /// Alive count after this turn.
    pub alive: usize,
}

struct Loaded {
    turn: TurnId,
    target: TurnId,
    world: Arc<World>,
    history: TurnRing<TurnRecord>,
}

/// Serves `Load`, `Step`, `Diff`, `Status`, `Snapshot`, `Checkpoint` and
/// `Terminate`.
pub struct BrokerService {
    state: Mutex<Option<Loaded>>,
    compute: Mutex<Box<dyn TurnBackend>>,
    config: BrokerConfig,
}

impl BrokerService {
    /// Validate `config` and set up computation: remote workers when any
    /// are configured, the local pool otherwise.
    pub fn new(config: BrokerConfig) -> Result<Self, BrokerSetupError> {
        config.validate()?;
        let compute: Box<dyn TurnBackend> = if config.workers.is_empty() {
            Box::new(LocalEngine::new(config.threads)?)
        } else {
            Box::new(RemoteWorkers::connect(&config.workers, config.band_threads)?)
        };
        Ok(Self::with_backend(config, compute))
    }

    /// Use an explicit compute backend.
    pub fn with_backend(config: BrokerConfig, compute: Box<dyn TurnBackend>) -> Self {
        info!(compute = compute.name(), history = config.history, "broker ready");
        Self {
            state: Mutex::new(None),
            compute: Mutex::new(compute),
            config,
        }
    }

    fn state(&self) -> MutexGuard<'_, Option<Loaded>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, world: Arc<World>, turn: TurnId, target: TurnId) -> Response {
        info!(%turn, %target, height = world.height(), width = world.width(), "world loaded");
        *self.state() = Some(Loaded {
            turn,
            target,
            world,
            history: TurnRing::new(self.config.history),
        });
        Response::Ack
    }

    /// Advance from `from_turn`.
    ///
    /// The compute lock serialises steps; the state lock is only held to
    /// read the current turn and to commit, so queries are answered from
    /// the last completed turn while a step is computing.
    fn step(&self, from_turn: TurnId) -> Response {
        let Some(turn) = from_turn.checked_next() else {
            return Response::error(
                ErrorCode::InvalidRequest,
                format!("cannot step past turn {from_turn}"),
            );
        };
        let mut compute = self.compute.lock().unwrap_or_else(PoisonError::into_inner);

        let world = {
            let guard = self.state();
            let Some(loaded) = guard.as_ref() else {
                return no_world();
            };
            if loaded.turn == turn {
                debug!(%from_turn, "step retried; replaying current turn");
                return Response::Turn {
                    turn,
                    world: Arc::clone(&loaded.world),
                };
            }
            if loaded.turn != from_turn {
                return conflict(loaded.turn, from_turn);
            }
            Arc::clone(&loaded.world)
        };

        let next = match compute.advance(&world, from_turn) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                warn!(%from_turn, error = %e, "turn computation failed");
                return Response::error(ErrorCode::Backend, e.to_string());
            }
        };
        let flipped = match world.flipped(&next) {
            Ok(f) => f,
            Err(e) => return Response::error(ErrorCode::Backend, e.to_string()),
        };

        let mut guard = self.state();
        let Some(loaded) = guard.as_mut() else {
            return no_world();
        };
        // A Load while computing replaces the world under us.
        if loaded.turn != from_turn || !Arc::ptr_eq(&loaded.world, &world) {
            return conflict(loaded.turn, from_turn);
        }
        loaded.history.push(
            turn,
            TurnRecord {
                flipped,
                alive: next.alive_count(),
            },
        );
        loaded.turn = turn;
        loaded.world = Arc::clone(&next);
        debug!(%turn, "turn computed");
        Response::Turn { turn, world: next }
    }

    fn diff(&self, turn: TurnId) -> Response {
        let guard = self.state();
        let Some(loaded) = guard.as_ref() else {
            return no_world();
        };
        match loaded.history.get(turn) {
            Some(record) => Response::Diff {
                turn,
                flipped: record.flipped.clone(),
            },
            None => Response::error(
                ErrorCode::NotAvailable,
                format!("no record for turn {turn} (broker at {})", loaded.turn),
            ),
        }
    }

    fn terminate(&self, shutdown: &ShutdownHandle) -> Response {
        info!(grace = ?self.config.terminate_grace, "terminate requested");
        let mut compute = self.compute.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = compute.shutdown() {
            warn!(error = %e, "forwarding terminate to workers failed");
        }
        shutdown.schedule_after(self.config.terminate_grace);
        Response::Ack
    }
}

fn no_world() -> Response {
    Response::error(ErrorCode::NoWorld, "no world loaded")
}

fn conflict(at: TurnId, from_turn: TurnId) -> Response {
    Response::error(
        ErrorCode::Conflict,
        format!("broker is at turn {at}, step requested from {from_turn}"),
    )
}

impl Service for BrokerService {
    fn name(&self) -> &str {
        "broker"
    }

    fn handle(&self, request: Request, shutdown: &ShutdownHandle) -> Response {
        match request {
            Request::Load {
                world,
                turn,
                target,
            } => self.load(world, turn, target),
            Request::Step { from_turn } => self.step(from_turn),
            Request::Diff { turn } => self.diff(turn),
            Request::Status => match self.state().as_ref() {
                Some(l) => Response::Status {
                    turn: l.turn,
                    alive: l.world.alive_count() as u64,
                },
                None => no_world(),
            },
            Request::Snapshot => match self.state().as_ref() {
                Some(l) => Response::Turn {
                    turn: l.turn,
                    world: Arc::clone(&l.world),
                },
                None => no_world(),
            },
            Request::Checkpoint => Response::Checkpoint(self.state().as_ref().map(|l| {
                CheckpointInfo {
                    turn: l.turn,
                    target: l.target,
                    world: Arc::clone(&l.world),
                }
            })),
            Request::Terminate => self.terminate(shutdown),
            Request::ComputeBand { .. } => Response::error(
                ErrorCode::InvalidRequest,
                "ComputeBand is not served by the broker",
            ),
        }
    }
}

/// Failure setting up a [`BrokerService`].
#[derive(Debug, thiserror::Error)]
pub enum BrokerSetupError {
    /// Invalid configuration or pool start failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A configured worker could not be reached.
    #[error(transparent)]
    Workers(#[from] BackendError),
}

// ── BrokerBackend ───────────────────────────────────────────────

/// Turn backend that drives a remote broker.
///
/// The broker holds the authoritative world; each turn is one versioned
/// `Step`. On start the broker is loaded with the run's starting state;
/// a compatible unfinished run on the broker is offered as a checkpoint.
pub struct BrokerBackend {
    client: BrokerClient,
}

impl BrokerBackend {
    /// Connect to the broker at `endpoint`.
    pub fn connect(endpoint: &str) -> Result<Self, BackendError> {
        let client = BrokerClient::connect(endpoint).map_err(|e| BackendError::Unreachable {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { client })
    }

    fn err(&self, e: RpcError) -> BackendError {
        self.client.rpc().backend_error(e)
    }
}

impl TurnBackend for BrokerBackend {
    fn name(&self) -> &str {
        "broker"
    }

    fn checkpoint(
        &mut self,
        initial: &World,
        target: TurnId,
    ) -> Result<Option<Checkpoint>, BackendError> {
        let cp = self.client.checkpoint().map_err(|e| self.err(e))?;
        Ok(cp
            .filter(|cp| cp.world.dims() == initial.dims() && cp.turn < target)
            .map(|cp| Checkpoint {
                turn: cp.turn,
                world: Arc::unwrap_or_clone(cp.world),
            }))
    }

    fn start(
        &mut self,
        world: &Arc<World>,
        turn: TurnId,
        target: TurnId,
    ) -> Result<(), BackendError> {
        self.client
            .load(world, turn, target)
            .map_err(|e| self.err(e))
    }

    fn advance(&mut self, _world: &Arc<World>, turn: TurnId) -> Result<World, BackendError> {
        let (next_turn, world) = self.client.step(turn).map_err(|e| self.err(e))?;
        if next_turn != turn.next() {
            return Err(BackendError::Remote {
                endpoint: self.client.rpc().endpoint().to_owned(),
                reason: format!("stepped from {turn} but broker returned turn {next_turn}"),
            });
        }
        Ok(Arc::unwrap_or_clone(world))
    }

    fn shutdown(&mut self) -> Result<(), BackendError> {
        self.client.terminate().map_err(|e| self.err(e))
    }
}
