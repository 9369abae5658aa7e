//! Rectangular compute bands and the row partitioner.

use std::ops::Range;

use crate::error::WorldError;

/// A half-open rectangle `[start_y, end_y) × [start_x, end_x)` assigned to
/// one compute unit for one turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Band {
    /// First row (inclusive).
    pub start_y: usize,
    /// Last row (exclusive).
    pub end_y: usize,
    /// First column (inclusive).
    pub start_x: usize,
    /// Last column (exclusive).
    pub end_x: usize,
}

impl Band {
    /// A rectangle with explicit row and column ranges.
    pub fn new(start_y: usize, end_y: usize, start_x: usize, end_x: usize) -> Self {
        Self {
            start_y,
            end_y,
            start_x,
            end_x,
        }
    }

    /// A full-width band covering rows `[start_y, end_y)`.
    pub fn rows(start_y: usize, end_y: usize, width: usize) -> Self {
        Self::new(start_y, end_y, 0, width)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.end_y.saturating_sub(self.start_y)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.end_x.saturating_sub(self.start_x)
    }

    /// Number of cells covered.
    pub fn len(&self) -> usize {
        self.height() * self.width()
    }

    /// Whether the band covers no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that the band lies inside a `height × width` grid.
    pub fn check_within(&self, height: usize, width: usize) -> Result<(), WorldError> {
        if self.start_y > self.end_y
            || self.start_x > self.end_x
            || self.end_y > height
            || self.end_x > width
        {
            return Err(WorldError::BandOutOfBounds {
                start_y: self.start_y,
                end_y: self.end_y,
                start_x: self.start_x,
                end_x: self.end_x,
                height,
                width,
            });
        }
        Ok(())
    }

    /// Split this band's rows into `n` contiguous sub-bands sharing its
    /// column range. See [`partition_rows`].
    pub fn split_rows(&self, n: usize) -> Vec<Band> {
        partition_rows(self.start_y, self.end_y, n)
            .into_iter()
            .map(|r| Band::new(r.start, r.end, self.start_x, self.end_x))
            .collect()
    }
}

/// Split rows `[start, end)` into `n` contiguous ranges in ascending order.
///
/// Each range holds `(end - start) / n` rows except the last, which absorbs
/// the remainder, so the sizes always sum to `end - start`. `n == 0` is
/// treated as `1`. When `n` exceeds the row count the leading ranges are
/// empty.
pub fn partition_rows(start: usize, end: usize, n: usize) -> Vec<Range<usize>> {
    let n = n.max(1);
    let total = end.saturating_sub(start);
    let per_unit = total / n;
    (0..n)
        .map(|i| {
            let lo = start + i * per_unit;
            let hi = if i == n - 1 { end.max(start) } else { lo + per_unit };
            lo..hi
        })
        .collect()
}

/// Split `[0, height)` into `n` row ranges. Shorthand for
/// [`partition_rows(0, height, n)`](partition_rows).
pub fn partition(height: usize, n: usize) -> Vec<Range<usize>> {
    partition_rows(0, height, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn even_split() {
        assert_eq!(partition(8, 4), vec![0..2, 2..4, 4..6, 6..8]);
    }

    #[test]
    fn last_range_absorbs_remainder() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
        assert_eq!(partition(5, 2), vec![0..2, 2..5]);
    }

    #[test]
    fn zero_units_treated_as_one() {
        assert_eq!(partition(7, 0), vec![0..7]);
    }

    #[test]
    fn more_units_than_rows_leaves_leading_ranges_empty() {
        assert_eq!(partition(2, 3), vec![0..0, 0..0, 0..2]);
    }

    #[test]
    fn split_rows_keeps_columns() {
        let band = Band::new(4, 9, 2, 6);
        let parts = band.split_rows(2);
        assert_eq!(parts, vec![Band::new(4, 6, 2, 6), Band::new(6, 9, 2, 6)]);
        assert_eq!(parts.iter().map(Band::len).sum::<usize>(), band.len());
    }

    #[test]
    fn check_within_rejects_overhang() {
        assert!(Band::new(0, 4, 0, 4).check_within(4, 4).is_ok());
        assert!(Band::new(0, 5, 0, 4).check_within(4, 4).is_err());
        assert!(Band::new(3, 2, 0, 4).check_within(4, 4).is_err());
    }

    proptest! {
        #[test]
        fn partition_covers_rows_exactly_once(height in 1usize..200, n_seed in 0usize..200) {
            let n = 1 + n_seed % height;
            let ranges = partition(height, n);
            prop_assert_eq!(ranges.len(), n);
            prop_assert_eq!(ranges[0].start, 0);
            prop_assert_eq!(ranges[n - 1].end, height);
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            let total: usize = ranges.iter().map(|r| r.len()).sum();
            prop_assert_eq!(total, height);
            for r in &ranges[..n - 1] {
                prop_assert_eq!(r.len(), height / n);
            }
        }
    }
}
