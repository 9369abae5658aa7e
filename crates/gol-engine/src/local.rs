//! In-process parallel turn engine.

use std::sync::Arc;

use gol_core::{Band, Cell, TurnId, World};
use tracing::debug;

use crate::backend::{BackendError, TurnBackend};
use crate::config::ConfigError;
use crate::pool::BandPool;

/// Computes turns on a fixed pool of band worker threads.
///
/// Each turn is split into `threads` row bands which run concurrently and
/// are stitched back together in partition order, so the result is
/// identical to a single-band computation for every band count.
pub struct LocalEngine {
    pool: BandPool,
    threads: usize,
}

impl LocalEngine {
    /// Create an engine that splits every turn into `threads` bands.
    ///
    /// Returns [`ConfigError::NoThreads`] for zero and
    /// [`ConfigError::ThreadSpawnFailed`] if the pool cannot be started.
    pub fn new(threads: usize) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        let pool = BandPool::new(threads)?;
        debug!(threads, "band pool started");
        Ok(Self { pool, threads })
    }

    /// Number of bands per turn.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Compute the next generation of an arbitrary rectangle of `world`,
    /// split into `parts` row bands. The rectangle must already have been
    /// checked against the world's dimensions.
    pub fn compute_region(
        &self,
        world: &Arc<World>,
        region: Band,
        parts: usize,
    ) -> Result<Vec<Cell>, BackendError> {
        self.pool.compute(world, region, parts)
    }

    /// Compute the full generation after `world`.
    pub fn step(&self, world: &Arc<World>) -> Result<World, BackendError> {
        let cells = self.pool.compute(world, world.full_band(), self.threads)?;
        Ok(World::from_cells(world.height(), world.width(), cells)?)
    }
}

impl TurnBackend for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    fn advance(&mut self, world: &Arc<World>, _turn: TurnId) -> Result<World, BackendError> {
        self.step(world)
    }
}
