//! Core types for the toroidal Game of Life turn engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! grid ([`World`]), coordinates and turn identifiers, row partitioning,
//! the pure band compute kernel, lifecycle events and control commands.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod band;
pub mod cell;
pub mod command;
pub mod error;
pub mod event;
pub mod id;
pub mod kernel;
pub mod world;

pub use band::{partition, partition_rows, Band};
pub use cell::Cell;
pub use command::Command;
pub use error::WorldError;
pub use event::{Event, State};
pub use id::{CellCoord, TurnId};
pub use kernel::{next_band, next_cell, next_world};
pub use world::World;
