//! The band compute kernel: Conway's rule applied over a rectangle.
//!
//! Pure functions with no shared mutable state. Concurrent calls over
//! disjoint bands of the same read-only [`World`] are safe and always
//! produce the same cells as one call over the whole grid.

use crate::band::Band;
use crate::cell::Cell;
use crate::world::World;

/// Next state of one cell given its current state and live neighbour count.
///
/// A live cell survives with 2 or 3 live neighbours and dies otherwise; a
/// dead cell is born with exactly 3.
pub fn next_cell(current: Cell, alive_neighbours: u8) -> Cell {
    match (current, alive_neighbours) {
        (Cell::Alive, 2) | (Cell::Alive, 3) => Cell::Alive,
        (Cell::Dead, 3) => Cell::Alive,
        _ => Cell::Dead,
    }
}

/// Compute the next generation of `band`, row-major.
///
/// Returns exactly `band.height() * band.width()` cells. Neighbour lookups
/// use the full grid with wraparound, so bands at the world edge see the
/// opposite edge.
///
/// The band must lie inside `world`; callers validate remote requests with
/// [`Band::check_within`] first.
pub fn next_band(world: &World, band: Band) -> Vec<Cell> {
    debug_assert!(band.check_within(world.height(), world.width()).is_ok());
    let mut out = Vec::with_capacity(band.len());
    for y in band.start_y..band.end_y {
        for x in band.start_x..band.end_x {
            let current = world.get_wrapped(x as isize, y as isize);
            out.push(next_cell(current, world.alive_neighbours(x, y)));
        }
    }
    out
}

/// Compute the next generation of the whole grid in a single band.
pub fn next_world(world: &World) -> World {
    world.successor(next_band(world, world.full_band()))
}
