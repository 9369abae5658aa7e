//! The remote band worker.
//!
//! Stateless across calls: every `ComputeBand` carries the full world. The
//! requested rectangle is split into `threads` row sub-bands on the
//! worker's own pool and stitched back in order.

use std::time::Duration;

use gol_engine::{ConfigError, LocalEngine};
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::message::{Request, Response};
use crate::server::{Service, ShutdownHandle};

/// Default delay between a `Terminate` call and the worker stopping.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// Worker settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Size of the band pool.
    pub threads: usize,
    /// Delay between `Terminate` and shutdown.
    pub terminate_grace: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
        }
    }
}

impl WorkerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        Ok(())
    }
}

/// Serves `ComputeBand` and `Terminate`.
pub struct WorkerService {
    engine: LocalEngine,
    config: WorkerConfig,
}

impl WorkerService {
    /// Validate `config` and start the band pool.
    pub fn new(config: WorkerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine: LocalEngine::new(config.threads)?,
            config,
        })
    }
}

impl Service for WorkerService {
    fn name(&self) -> &str {
        "worker"
    }

    fn handle(&self, request: Request, shutdown: &ShutdownHandle) -> Response {
        match request {
            Request::ComputeBand {
                world,
                band,
                threads,
            } => {
                if let Err(e) = band.check_within(world.height(), world.width()) {
                    return Response::error(ErrorCode::InvalidRequest, e.to_string());
                }
                if band.is_empty() {
                    return Response::error(ErrorCode::InvalidRequest, "empty band");
                }
                // More sub-bands than rows would only add empty ones.
                let parts = (threads as usize).clamp(1, band.height());
                debug!(
                    rows = ?(band.start_y..band.end_y),
                    cols = ?(band.start_x..band.end_x),
                    parts,
                    "computing band"
                );
                match self.engine.compute_region(&world, band, parts) {
                    Ok(cells) => Response::Band { cells },
                    Err(e) => {
                        warn!(error = %e, "band computation failed");
                        Response::error(ErrorCode::Backend, e.to_string())
                    }
                }
            }
            Request::Terminate => {
                info!(grace = ?self.config.terminate_grace, "terminate requested");
                shutdown.schedule_after(self.config.terminate_grace);
                Response::Ack
            }
            other => Response::error(
                ErrorCode::InvalidRequest,
                format!("{} is not served by workers", other.kind()),
            ),
        }
    }
}
