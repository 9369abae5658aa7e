//! Turn-execution control core for Game of Life runs.
//!
//! Provides the [`TurnCoordinator`] that drives a run turn by turn over a
//! pluggable [`TurnBackend`] (the thread-pooled [`LocalEngine`] here, remote
//! workers or a broker in `gol-rpc`). Each run also starts a control loop
//! that services pause/save/quit commands and population telemetry
//! concurrently with the compute path; [`RunHandle`] puts the whole run on
//! a background thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod config;
pub(crate) mod control;
pub mod coordinator;
pub mod image;
pub mod local;
pub(crate) mod pool;
pub mod ring;
pub mod run;
pub(crate) mod shared;

pub use backend::{BackendError, Checkpoint, TurnBackend};
pub use config::{ConfigError, RunConfig};
pub use coordinator::{ExitReason, RunError, RunReport, TurnCoordinator};
pub use image::{ImageError, ImageStore};
pub use local::LocalEngine;
pub use ring::TurnRing;
pub use run::RunHandle;
pub use shared::TurnSnapshot;
