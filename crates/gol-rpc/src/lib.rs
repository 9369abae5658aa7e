//! Remote workers and the broker for distributed Game of Life runs.
//!
//! Everything speaks one small framed binary protocol over TCP (see
//! [`codec`] and [`message`]):
//!
//! - [`WorkerService`] computes bands of a world it is sent in full.
//! - [`RemoteWorkers`] is a [`TurnBackend`](gol_engine::TurnBackend) that
//!   splits each turn across a set of workers.
//! - [`BrokerService`] owns a run's authoritative state and advances it
//!   with versioned steps; [`BrokerBackend`] drives it from a coordinator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod broker;
pub mod client;
pub mod codec;
pub mod error;
pub mod message;
pub mod remote;
pub mod server;
pub mod worker;

pub use broker::{BrokerBackend, BrokerConfig, BrokerService, BrokerSetupError, TurnRecord};
pub use client::{BrokerClient, RpcClient, WorkerClient};
pub use error::{ErrorCode, RpcError};
pub use message::{CheckpointInfo, Request, Response};
pub use remote::RemoteWorkers;
pub use server::{RunningServer, Server, Service, ShutdownHandle};
pub use worker::{WorkerConfig, WorkerService, DEFAULT_TERMINATE_GRACE};
