//! Strongly-typed identifiers: [`TurnId`] and [`CellCoord`].

use std::fmt;

/// Number of completed generations in a run.
///
/// Starts at zero (or at a resumed checkpoint value) and is incremented
/// exactly once per completed turn. Never decreases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u32);

impl TurnId {
    /// The turn that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The following turn, or `None` if this is the last representable one.
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TurnId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A cell position: `x` is the column, `y` the row.
///
/// Valid coordinates satisfy `x < width` and `y < height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    /// Column index.
    pub x: usize,
    /// Row index.
    pub y: usize,
}

impl CellCoord {
    /// Construct a coordinate from a column and a row.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(usize, usize)> for CellCoord {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_next_increments_by_one() {
        assert_eq!(TurnId(0).next(), TurnId(1));
        assert_eq!(TurnId(41).next().next(), TurnId(43));
    }

    #[test]
    fn checked_next_stops_at_max() {
        assert_eq!(TurnId(7).checked_next(), Some(TurnId(8)));
        assert_eq!(TurnId(u32::MAX).checked_next(), None);
    }

    #[test]
    fn coord_orders_by_column_then_row() {
        let a = CellCoord::new(0, 5);
        let b = CellCoord::new(1, 0);
        assert!(a < b);
        assert_eq!(CellCoord::from((3, 4)), CellCoord { x: 3, y: 4 });
        assert_eq!(a.to_string(), "(0, 5)");
    }
}
