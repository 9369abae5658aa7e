//! Turn backend that fans each turn out to remote band workers.

use std::sync::Arc;
use std::thread;

use gol_core::{partition, Band, Cell, TurnId, World};
use gol_engine::{BackendError, TurnBackend};
use tracing::{info, warn};

use crate::client::WorkerClient;

/// Splits every turn into one row band per worker and calls all workers
/// concurrently. The first failure fails the turn; there is no retry and
/// no reassignment to another worker.
pub struct RemoteWorkers {
    workers: Vec<WorkerClient>,
    band_threads: u32,
}

impl RemoteWorkers {
    /// Connect to every address in `endpoints`. Each worker splits its
    /// band into `band_threads` sub-bands.
    pub fn connect<S: AsRef<str>>(
        endpoints: &[S],
        band_threads: usize,
    ) -> Result<Self, BackendError> {
        if endpoints.is_empty() {
            return Err(BackendError::Unreachable {
                endpoint: String::new(),
                reason: "no worker addresses configured".into(),
            });
        }
        let workers = endpoints
            .iter()
            .map(|e| {
                let endpoint = e.as_ref();
                WorkerClient::connect(endpoint).map_err(|err| BackendError::Unreachable {
                    endpoint: endpoint.to_owned(),
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(workers = workers.len(), "connected to workers");
        Ok(Self {
            workers,
            band_threads: band_threads.max(1) as u32,
        })
    }

    /// Number of connected workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether no workers are connected.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Compute the generation after `world`.
    pub fn compute(&mut self, world: &Arc<World>) -> Result<World, BackendError> {
        let (height, width) = world.dims();
        let bands: Vec<Band> = partition(height, self.workers.len())
            .into_iter()
            .map(|rows| Band::rows(rows.start, rows.end, width))
            .collect();
        let threads = self.band_threads;

        let results: Vec<Result<Vec<Cell>, BackendError>> = thread::scope(|s| {
            let handles: Vec<_> = self
                .workers
                .iter_mut()
                .zip(bands)
                .filter(|(_, band)| !band.is_empty())
                .map(|(worker, band)| {
                    s.spawn(move || {
                        let result = worker.compute_band(world, band, threads);
                        result.map_err(|e| worker.rpc().backend_error(e))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(BackendError::Remote {
                            endpoint: String::new(),
                            reason: "worker call panicked".into(),
                        })
                    })
                })
                .collect()
        });

        let bands = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(World::from_bands(height, width, bands)?)
    }

    /// Send `Terminate` to every worker. All workers are tried; the first
    /// failure is returned.
    pub fn terminate(&mut self) -> Result<(), BackendError> {
        let mut first = None;
        for worker in &mut self.workers {
            if let Err(e) = worker.terminate() {
                let err = worker.rpc().backend_error(e);
                warn!(error = %err, "worker terminate failed");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl TurnBackend for RemoteWorkers {
    fn name(&self) -> &str {
        "remote"
    }

    fn advance(&mut self, world: &Arc<World>, _turn: TurnId) -> Result<World, BackendError> {
        self.compute(world)
    }

    fn shutdown(&mut self) -> Result<(), BackendError> {
        self.terminate()
    }
}
