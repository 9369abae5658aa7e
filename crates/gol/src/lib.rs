//! Game of Life on a torus: parallel, distributed, and live-controlled.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the `gol` sub-crates, plus the pieces the binaries share: a PGM
//! directory [`ImageStore`](engine::ImageStore), the keyboard command
//! reader, and tracing setup.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use gol::prelude::*;
//!
//! struct OneImage(Vec<u8>);
//! impl ImageStore for OneImage {
//!     fn load(&self, _: &str, _: usize, _: usize) -> Result<Vec<u8>, ImageError> {
//!         Ok(self.0.clone())
//!     }
//!     fn save(&self, _: &str, _: usize, _: usize, _: &[u8]) -> Result<(), ImageError> {
//!         Ok(())
//!     }
//! }
//!
//! let blinker = World::with_alive(5, 5, [(2, 1), (2, 2), (2, 3)].map(CellCoord::from)).unwrap();
//! let config = RunConfig { turns: 4, threads: 2, width: 5, height: 5, ..RunConfig::default() };
//! let store = Arc::new(OneImage(blinker.to_bytes()));
//! let coordinator = TurnCoordinator::new(config, LocalEngine::new(2).unwrap(), store).unwrap();
//! let run = RunHandle::spawn(coordinator).unwrap();
//! let events: Vec<Event> = run.events().iter().collect();
//! let report = run.join().unwrap();
//! assert_eq!(report.final_turn, TurnId(4));
//! assert!(matches!(events.last(), Some(Event::StateChange { state: State::Quitting, .. })));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gol-core` | World, bands, kernel, events, commands |
//! | [`engine`] | `gol-engine` | Coordinator, control loop, local engine |
//! | [`rpc`] | `gol-rpc` | Wire protocol, worker, broker |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod keys;
pub mod pgm;

/// Core types and the compute kernel (`gol-core`).
pub use gol_core as types;

/// Turn coordination and local computation (`gol-engine`).
pub use gol_engine as engine;

/// Remote workers and the broker (`gol-rpc`).
pub use gol_rpc as rpc;

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Common imports for running the engine.
pub mod prelude {
    pub use gol_core::{Band, Cell, CellCoord, Command, Event, State, TurnId, World};

    pub use gol_engine::{
        BackendError, ExitReason, ImageError, ImageStore, LocalEngine, RunConfig, RunError,
        RunHandle, RunReport, TurnBackend, TurnCoordinator,
    };

    pub use gol_rpc::{BrokerBackend, RemoteWorkers};

    pub use crate::pgm::PgmStore;
}
