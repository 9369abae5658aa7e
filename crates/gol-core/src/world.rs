//! Toroidal cell grid.

use smallvec::SmallVec;

use crate::band::Band;
use crate::cell::Cell;
use crate::error::WorldError;
use crate::id::CellCoord;

/// The 8 neighbour offsets as `(dx, dy)`: NW, N, NE, W, E, SW, S, SE.
pub(crate) const OFFSETS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Wrap a possibly out-of-range index onto `[0, len)`.
fn wrap_axis(val: isize, len: usize) -> usize {
    val.rem_euclid(len as isize) as usize
}

/// A `height × width` grid of cells with periodic (torus) boundaries.
///
/// Cells are stored row-major. A `World` is never mutated once it has been
/// published for a turn: each turn produces a fresh grid, so readers holding
/// an `Arc<World>` from an earlier turn never observe a torn state.
///
/// # Examples
///
/// ```
/// use gol_core::{Cell, CellCoord, World};
///
/// let mut world = World::new(4, 4).unwrap();
/// world.set(CellCoord::new(3, 3), Cell::Alive);
///
/// // (0, 0) sees (3, 3) through the wrapped corner.
/// assert_eq!(world.get_wrapped(-1, -1), Cell::Alive);
/// assert_eq!(world.alive_count(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    height: usize,
    width: usize,
    cells: Vec<Cell>,
}

impl World {
    /// Create an all-dead world.
    ///
    /// Returns `Err(WorldError::EmptyWorld)` if either dimension is zero.
    pub fn new(height: usize, width: usize) -> Result<Self, WorldError> {
        if height == 0 || width == 0 {
            return Err(WorldError::EmptyWorld { height, width });
        }
        Ok(Self {
            height,
            width,
            cells: vec![Cell::Dead; height * width],
        })
    }

    /// Build a world from row-major cells.
    pub fn from_cells(height: usize, width: usize, cells: Vec<Cell>) -> Result<Self, WorldError> {
        if height == 0 || width == 0 {
            return Err(WorldError::EmptyWorld { height, width });
        }
        if cells.len() != height * width {
            return Err(WorldError::CellCountMismatch {
                expected: height * width,
                actual: cells.len(),
            });
        }
        Ok(Self {
            height,
            width,
            cells,
        })
    }

    /// Decode a row-major byte stream (`255` alive, anything else dead).
    pub fn from_bytes(height: usize, width: usize, bytes: &[u8]) -> Result<Self, WorldError> {
        let cells = bytes.iter().copied().map(Cell::from_byte).collect();
        Self::from_cells(height, width, cells)
    }

    /// Build a world with the given cells alive and every other cell dead.
    ///
    /// Coordinates outside the grid are wrapped onto it.
    pub fn with_alive<I>(height: usize, width: usize, alive: I) -> Result<Self, WorldError>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut world = Self::new(height, width)?;
        for c in alive {
            let c = CellCoord::new(c.x % width, c.y % height);
            world.set(c, Cell::Alive);
        }
        Ok(world)
    }

    /// Reassemble a world from full-width row bands, in partition order.
    ///
    /// The concatenated bands must cover exactly `height * width` cells.
    pub fn from_bands<I>(height: usize, width: usize, bands: I) -> Result<Self, WorldError>
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let mut cells = Vec::with_capacity(height * width);
        for band in bands {
            cells.extend(band);
        }
        Self::from_cells(height, width, cells)
    }

    /// A world with the same dimensions as `self` holding `cells`.
    pub(crate) fn successor(&self, cells: Vec<Cell>) -> World {
        debug_assert_eq!(cells.len(), self.cells.len());
        World {
            height: self.height,
            width: self.width,
            cells,
        }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Row-major cell slice.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Encode as row-major bytes (`0`/`255`).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.as_byte()).collect()
    }

    /// The band covering every cell of this world.
    pub fn full_band(&self) -> Band {
        Band::rows(0, self.height, self.width)
    }

    /// Cell at an in-range coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the grid.
    pub fn get(&self, coord: CellCoord) -> Cell {
        assert!(
            coord.x < self.width && coord.y < self.height,
            "coordinate {coord} outside {}x{} world",
            self.height,
            self.width
        );
        self.cells[coord.y * self.width + coord.x]
    }

    /// Cell at `(x, y)` after wrapping both axes onto the torus.
    pub fn get_wrapped(&self, x: isize, y: isize) -> Cell {
        let x = wrap_axis(x, self.width);
        let y = wrap_axis(y, self.height);
        self.cells[y * self.width + x]
    }

    /// Overwrite one cell. Only used while building a world, before it is
    /// shared with any reader.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the grid.
    pub fn set(&mut self, coord: CellCoord, cell: Cell) {
        assert!(
            coord.x < self.width && coord.y < self.height,
            "coordinate {coord} outside {}x{} world",
            self.height,
            self.width
        );
        self.cells[coord.y * self.width + coord.x] = cell;
    }

    /// The 8 wrapped neighbours of `coord`.
    ///
    /// On grids narrower or shorter than 3 cells the same neighbour can
    /// appear more than once, exactly as the wrapped count sees it.
    pub fn neighbours(&self, coord: CellCoord) -> SmallVec<[CellCoord; 8]> {
        let (x, y) = (coord.x as isize, coord.y as isize);
        OFFSETS_8
            .iter()
            .map(|&(dx, dy)| {
                CellCoord::new(wrap_axis(x + dx, self.width), wrap_axis(y + dy, self.height))
            })
            .collect()
    }

    /// Number of live cells among the 8 wrapped neighbours of `(x, y)`.
    pub fn alive_neighbours(&self, x: usize, y: usize) -> u8 {
        let (x, y) = (x as isize, y as isize);
        OFFSETS_8
            .iter()
            .filter(|&&(dx, dy)| self.get_wrapped(x + dx, y + dy).is_alive())
            .count() as u8
    }

    /// Every live coordinate, in row-major order.
    pub fn alive_cells(&self) -> Vec<CellCoord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_alive())
            .map(|(i, _)| CellCoord::new(i % self.width, i / self.width))
            .collect()
    }

    /// Number of live cells.
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_alive()).count()
    }

    /// Coordinates whose state differs between `self` and `next`, row-major.
    pub fn flipped(&self, next: &World) -> Result<Vec<CellCoord>, WorldError> {
        if self.dims() != next.dims() {
            return Err(WorldError::DimensionMismatch {
                left: self.dims(),
                right: next.dims(),
            });
        }
        Ok(self
            .cells
            .iter()
            .zip(&next.cells)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| CellCoord::new(i % self.width, i / self.width))
            .collect())
    }
}
