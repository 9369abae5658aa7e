//! The one piece of state shared between the coordinator and the control
//! loop.
//!
//! Everything else crosses threads by message: commands and events over
//! crossbeam channels, worlds as immutable `Arc<World>` snapshots. The run
//! phase, the last completed snapshot and the stop request live together
//! behind one mutex with a condvar for pause/resume, so a phase flip and
//! the event announcing it are never observed out of order.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use gol_core::{TurnId, World};

use crate::coordinator::ExitReason;

/// The most recently completed turn, as seen by the control loop.
#[derive(Clone, Debug)]
pub struct TurnSnapshot {
    /// Completed turn number.
    pub turn: TurnId,
    /// World after `turn`.
    pub world: Arc<World>,
    /// Alive cell count of `world`.
    pub alive: usize,
}

impl TurnSnapshot {
    /// Snapshot `world` as the state after `turn`.
    pub fn new(turn: TurnId, world: Arc<World>) -> Self {
        let alive = world.alive_count();
        Self { turn, world, alive }
    }
}

/// Lifecycle of a run.
///
/// ```text
/// Idle → Executing ⇄ Paused
///            ↓         ↓
///         Quitting → Terminated
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunPhase {
    Idle,
    Executing,
    Paused,
    Quitting,
    Terminated,
}

pub(crate) struct RunState {
    pub phase: RunPhase,
    pub latest: Arc<TurnSnapshot>,
    /// Who moved the run to `Quitting`. `None` while running, and after a
    /// backend failure.
    pub stop: Option<ExitReason>,
}

pub(crate) struct SharedRun {
    state: Mutex<RunState>,
    changed: Condvar,
}

impl SharedRun {
    pub fn new(initial: TurnSnapshot) -> Self {
        Self {
            state: Mutex::new(RunState {
                phase: RunPhase::Idle,
                latest: Arc::new(initial),
                stop: None,
            }),
            changed: Condvar::new(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block while the run is paused, re-acquiring `guard` on wake-up.
    pub fn wait_while_paused<'a>(
        &self,
        guard: MutexGuard<'a, RunState>,
    ) -> MutexGuard<'a, RunState> {
        self.changed
            .wait_while(guard, |s| s.phase == RunPhase::Paused)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake any thread blocked in [`wait_while_paused`](Self::wait_while_paused).
    pub fn notify(&self) {
        self.changed.notify_all();
    }

    pub fn phase(&self) -> RunPhase {
        self.lock().phase
    }

    pub fn latest(&self) -> Arc<TurnSnapshot> {
        Arc::clone(&self.lock().latest)
    }
}
