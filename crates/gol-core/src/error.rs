//! Error types for grid construction and band reassembly.

use thiserror::Error;

/// Errors constructing or combining [`World`](crate::World) grids.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Height or width is zero.
    #[error("world dimensions must be non-zero, got {height}x{width}")]
    EmptyWorld {
        /// Requested number of rows.
        height: usize,
        /// Requested number of columns.
        width: usize,
    },
    /// The number of supplied cells does not equal `height * width`.
    #[error("expected {expected} cells, got {actual}")]
    CellCountMismatch {
        /// `height * width`.
        expected: usize,
        /// Number of cells actually supplied.
        actual: usize,
    },
    /// Two worlds with different dimensions were compared.
    #[error("world dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch {
        /// `(height, width)` of the left-hand world.
        left: (usize, usize),
        /// `(height, width)` of the right-hand world.
        right: (usize, usize),
    },
    /// A band does not lie inside the world.
    #[error("band rows {start_y}..{end_y} cols {start_x}..{end_x} outside {height}x{width} world")]
    BandOutOfBounds {
        /// First row of the band.
        start_y: usize,
        /// One past the last row of the band.
        end_y: usize,
        /// First column of the band.
        start_x: usize,
        /// One past the last column of the band.
        end_x: usize,
        /// World height.
        height: usize,
        /// World width.
        width: usize,
    },
}
