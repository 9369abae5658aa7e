//! World patterns and controllable backends.
//!
//! - [`GatedBackend`]: local computation that only advances when a
//!   [`Gate`] hands out a permit.
//! - [`FailingBackend`]: fails deterministically at a given turn.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use gol_core::{CellCoord, TurnId, World};
use gol_engine::{BackendError, LocalEngine, TurnBackend};

/// A vertical period-2 blinker centred in a `size × size` world.
pub fn blinker(size: usize) -> World {
    let c = size / 2;
    let alive = [(c, c - 1), (c, c), (c, c + 1)].map(CellCoord::from);
    World::with_alive(size, size, alive).unwrap()
}

/// A 2×2 still life with its top-left corner at `(1, 1)`.
pub fn block(height: usize, width: usize) -> World {
    let alive = [(1, 1), (2, 1), (1, 2), (2, 2)].map(CellCoord::from);
    World::with_alive(height, width, alive).unwrap()
}

/// A south-east glider with its bounding box at the top-left corner.
pub fn glider(height: usize, width: usize) -> World {
    let alive = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)].map(CellCoord::from);
    World::with_alive(height, width, alive).unwrap()
}

/// A deterministic pseudo-random world with roughly `density_pct`% of
/// cells alive.
pub fn random_world(height: usize, width: usize, density_pct: u64, seed: u64) -> World {
    let mut state = seed;
    let alive = (0..height * width).filter_map(|i| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % 100 < density_pct).then(|| CellCoord::new(i % width, i / width))
    });
    World::with_alive(height, width, alive.collect::<Vec<_>>()).unwrap()
}

// ── GatedBackend ───────────────────────────────────────────────────

/// Releases turns to a [`GatedBackend`].
///
/// Dropping the gate lets the backend run freely.
pub struct Gate {
    permits: Sender<()>,
    entered: Receiver<TurnId>,
}

impl Gate {
    /// Allow `n` more turns to be computed.
    pub fn release(&self, n: usize) {
        for _ in 0..n {
            let _ = self.permits.send(());
        }
    }

    /// Block until the backend starts computing a turn, returning the turn
    /// it advances from.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within [`EVENT_TIMEOUT`](crate::EVENT_TIMEOUT).
    pub fn wait_entered(&self) -> TurnId {
        self.entered
            .recv_timeout(crate::EVENT_TIMEOUT)
            .expect("backend never entered advance")
    }
}

/// Local computation that waits for a [`Gate`] permit before every turn.
pub struct GatedBackend {
    inner: LocalEngine,
    permits: Receiver<()>,
    entered: Sender<TurnId>,
}

impl GatedBackend {
    pub fn new(threads: usize) -> (Self, Gate) {
        let (permit_tx, permit_rx) = crossbeam_channel::unbounded();
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let backend = Self {
            inner: LocalEngine::new(threads).unwrap(),
            permits: permit_rx,
            entered: entered_tx,
        };
        let gate = Gate {
            permits: permit_tx,
            entered: entered_rx,
        };
        (backend, gate)
    }
}

impl TurnBackend for GatedBackend {
    fn name(&self) -> &str {
        "gated"
    }

    fn advance(&mut self, world: &Arc<World>, turn: TurnId) -> Result<World, BackendError> {
        let _ = self.entered.send(turn);
        // Disconnected means the gate was dropped: run freely.
        let _ = self.permits.recv();
        self.inner.step(world)
    }
}

// ── FailingBackend ─────────────────────────────────────────────────

/// Computes locally until `fail_at`, then reports an unreachable worker.
pub struct FailingBackend {
    inner: LocalEngine,
    fail_at: TurnId,
}

impl FailingBackend {
    /// Fails when asked to advance from `fail_at`.
    pub fn new(fail_at: TurnId) -> Self {
        Self {
            inner: LocalEngine::new(1).unwrap(),
            fail_at,
        }
    }
}

impl TurnBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn advance(&mut self, world: &Arc<World>, turn: TurnId) -> Result<World, BackendError> {
        if turn >= self.fail_at {
            return Err(BackendError::Unreachable {
                endpoint: "127.0.0.1:1".into(),
                reason: "connection refused".into(),
            });
        }
        self.inner.step(world)
    }
}
