//! The seam between the turn coordinator and whatever computes a turn.

use std::sync::Arc;

use gol_core::{TurnId, World, WorldError};
use thiserror::Error;

/// Failure computing a turn. Every variant is fatal to the run: there is
/// no retry and no failover to another worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The local band pool lost a worker thread or was shut down.
    #[error("band pool shut down")]
    PoolShutDown,
    /// A remote endpoint could not be reached.
    #[error("endpoint {endpoint} unreachable: {reason}")]
    Unreachable {
        /// Address of the endpoint.
        endpoint: String,
        /// Transport-level description of the failure.
        reason: String,
    },
    /// A remote call was made but failed or returned an error response.
    #[error("call to {endpoint} failed: {reason}")]
    Remote {
        /// Address of the endpoint.
        endpoint: String,
        /// Description of the failure.
        reason: String,
    },
    /// Band results could not be reassembled into a world.
    #[error("band reassembly failed: {0}")]
    Reassembly(#[from] WorldError),
}

/// Partial progress of an earlier run that a new run can resume from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    /// Last completed turn of the earlier run.
    pub turn: TurnId,
    /// World at that turn.
    pub world: World,
}

/// Computes successive generations for a [`TurnCoordinator`](crate::TurnCoordinator).
///
/// Implementations: [`LocalEngine`](crate::LocalEngine) (thread pool),
/// plus remote workers and the broker in `gol-rpc`. A backend is owned by
/// the coordinator's thread and is only ever called from it, one turn at a
/// time.
pub trait TurnBackend: Send {
    /// Short human-readable name used in log lines.
    fn name(&self) -> &str;

    /// Look for resumable progress compatible with `initial` that has not
    /// yet reached `target`. Backends without persistent state return
    /// `Ok(None)`.
    fn checkpoint(
        &mut self,
        _initial: &World,
        _target: TurnId,
    ) -> Result<Option<Checkpoint>, BackendError> {
        Ok(None)
    }

    /// Called once before the first [`advance`](Self::advance) with the
    /// world and turn the run starts from.
    fn start(
        &mut self,
        _world: &Arc<World>,
        _turn: TurnId,
        _target: TurnId,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    /// Compute the generation after `world`, which is the state at `turn`.
    fn advance(&mut self, world: &Arc<World>, turn: TurnId) -> Result<World, BackendError>;

    /// Tear down remote resources. Called only when the run was killed.
    fn shutdown(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

impl<B: TurnBackend + ?Sized> TurnBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn checkpoint(
        &mut self,
        initial: &World,
        target: TurnId,
    ) -> Result<Option<Checkpoint>, BackendError> {
        (**self).checkpoint(initial, target)
    }

    fn start(
        &mut self,
        world: &Arc<World>,
        turn: TurnId,
        target: TurnId,
    ) -> Result<(), BackendError> {
        (**self).start(world, turn, target)
    }

    fn advance(&mut self, world: &Arc<World>, turn: TurnId) -> Result<World, BackendError> {
        (**self).advance(world, turn)
    }

    fn shutdown(&mut self) -> Result<(), BackendError> {
        (**self).shutdown()
    }
}
