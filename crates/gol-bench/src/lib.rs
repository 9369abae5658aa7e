//! Benchmark worlds for the Game of Life engine.
//!
//! - [`reference_world`]: 512x512 soup at 30% density
//! - [`soup`]: deterministic random world of any size

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use gol_core::World;

/// Side length of the reference benchmark world.
pub const REFERENCE_SIZE: usize = 512;

/// The reference benchmark world: 512x512, ~30% alive.
pub fn reference_world(seed: u64) -> World {
    soup(REFERENCE_SIZE, REFERENCE_SIZE, 30, seed)
}

/// A `height × width` world with roughly `density_pct`% of cells alive.
pub fn soup(height: usize, width: usize, density_pct: u64, seed: u64) -> World {
    gol_test_utils::random_world(height, width, density_pct, seed)
}
