//! Fixed pool of band worker threads.
//!
//! Each worker receives [`BandTask`] requests via a crossbeam channel, runs
//! the band kernel against the task's shared read-only world, and sends the
//! cells back on the task's reply channel. Replies may arrive in any order;
//! [`BandPool::compute`] reassembles them in partition order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use gol_core::{next_band, Band, Cell, World};

use crate::backend::BackendError;
use crate::config::ConfigError;

/// One band of one turn.
struct BandTask {
    world: Arc<World>,
    band: Band,
    index: usize,
    reply: Sender<BandOutput>,
}

/// Cells computed for the band at `index` of the partition.
struct BandOutput {
    index: usize,
    cells: Vec<Cell>,
}

/// A fixed set of named kernel threads shared across turns.
pub(crate) struct BandPool {
    task_tx: Option<Sender<BandTask>>,
    workers: Vec<JoinHandle<()>>,
}

impl BandPool {
    /// Spawn `threads` workers (at least one).
    pub fn new(threads: usize) -> Result<Self, ConfigError> {
        let threads = threads.max(1);
        let (task_tx, task_rx) = crossbeam_channel::bounded::<BandTask>(threads * 4);
        let mut workers = Vec::with_capacity(threads);
        for i in 0..threads {
            let task_rx = task_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("gol-band-{i}"))
                .spawn(move || worker_loop(task_rx))
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("band worker {i}: {e}"),
                })?;
            workers.push(handle);
        }
        Ok(Self {
            task_tx: Some(task_tx),
            workers,
        })
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Compute the next generation of `region`, split into `parts` row
    /// bands that run concurrently, and stitch the bands back together in
    /// partition order.
    pub fn compute(
        &self,
        world: &Arc<World>,
        region: Band,
        parts: usize,
    ) -> Result<Vec<Cell>, BackendError> {
        let task_tx = self.task_tx.as_ref().ok_or(BackendError::PoolShutDown)?;
        let bands = region.split_rows(parts);
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(bands.len());

        let mut results: Vec<Option<Vec<Cell>>> = vec![None; bands.len()];
        let mut pending = 0usize;
        for (index, band) in bands.into_iter().enumerate() {
            if band.is_empty() {
                results[index] = Some(Vec::new());
                continue;
            }
            task_tx
                .send(BandTask {
                    world: Arc::clone(world),
                    band,
                    index,
                    reply: reply_tx.clone(),
                })
                .map_err(|_| BackendError::PoolShutDown)?;
            pending += 1;
        }
        // Only the tasks hold reply senders now: if a worker dies mid-band,
        // recv() below fails instead of blocking forever.
        drop(reply_tx);

        for _ in 0..pending {
            let out = reply_rx.recv().map_err(|_| BackendError::PoolShutDown)?;
            results[out.index] = Some(out.cells);
        }

        let mut cells = Vec::with_capacity(region.len());
        for part in results {
            cells.extend(part.ok_or(BackendError::PoolShutDown)?);
        }
        Ok(cells)
    }
}

impl Drop for BandPool {
    fn drop(&mut self) {
        // Closing the task channel ends every worker loop.
        self.task_tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(task_rx: Receiver<BandTask>) {
    while let Ok(task) = task_rx.recv() {
        let cells = next_band(&task.world, task.band);
        // Best-effort reply: the caller only drops its receiver on failure.
        let _ = task.reply.send(BandOutput {
            index: task.index,
            cells,
        });
    }
}
