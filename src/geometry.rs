//! Straight-line cell geometry.
//!
//! A drag gesture is described by the cell where it started (the anchor) and
//! the cell currently under the pointer. [`resolve`] turns that pair into the
//! run of cells between them, provided the two lie on one of the eight
//! compass lines (horizontal, vertical or 45° diagonal).

use std::fmt;

/// A grid coordinate, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Move `steps` unit steps of `(d_row, d_col)` away from this cell.
    ///
    /// Returns `None` if the result would leave the non-negative quadrant.
    fn offset(self, d_row: isize, d_col: isize, steps: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(d_row.checked_mul(steps)?)?,
            col: self.col.checked_add_signed(d_col.checked_mul(steps)?)?,
        })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// An ordered, non-empty, contiguous and collinear run of cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellPath(Vec<Cell>);

impl CellPath {
    /// A one-cell path (a press without movement).
    pub fn single(cell: Cell) -> Self {
        Self(vec![cell])
    }

    /// Build a path from an explicit cell list, checking that the cells form
    /// one straight, gap-free line in order.
    pub fn from_cells(cells: Vec<Cell>) -> Option<Self> {
        let (&first, &last) = (cells.first()?, cells.last()?);
        if cells.len() == 1 {
            return Some(Self(cells));
        }
        let expected = resolve(first, last)?;
        (expected.0 == cells).then_some(Self(cells))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn start(&self) -> Cell {
        self.0.first().copied().unwrap_or(Cell::new(0, 0))
    }

    pub fn end(&self) -> Cell {
        self.0.last().copied().unwrap_or(Cell::new(0, 0))
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.0.contains(&cell)
    }
}

impl<'a> IntoIterator for &'a CellPath {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Resolve the straight run of cells from `start` to `current`, inclusive.
///
/// Returns `None` when the two cells coincide or do not share a row, a
/// column or a diagonal. Callers tracking a drag keep their previous path in
/// that case instead of clearing it.
pub fn resolve(start: Cell, current: Cell) -> Option<CellPath> {
    let d_row = signed_delta(start.row, current.row)?;
    let d_col = signed_delta(start.col, current.col)?;

    let horizontal = d_row == 0 && d_col != 0;
    let vertical = d_col == 0 && d_row != 0;
    let diagonal = d_row != 0 && d_row.abs() == d_col.abs();
    if !(horizontal || vertical || diagonal) {
        return None;
    }

    let steps = d_row.abs().max(d_col.abs());
    let (step_row, step_col) = (d_row.signum(), d_col.signum());
    let cells = (0..=steps)
        .map(|i| start.offset(step_row, step_col, i))
        .collect::<Option<Vec<_>>>()?;
    Some(CellPath(cells))
}

fn signed_delta(from: usize, to: usize) -> Option<isize> {
    let from = isize::try_from(from).ok()?;
    let to = isize::try_from(to).ok()?;
    to.checked_sub(from)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    fn cells(raw: &[(usize, usize)]) -> Vec<Cell> {
        raw.iter().copied().map(Cell::from).collect()
    }

    #[test]
    fn horizontal_run_left_to_right() {
        let path = resolve(Cell::new(0, 0), Cell::new(0, 2)).unwrap();
        assert_eq!(path.cells(), cells(&[(0, 0), (0, 1), (0, 2)]).as_slice());
    }

    #[test]
    fn horizontal_run_right_to_left() {
        let path = resolve(Cell::new(1, 3), Cell::new(1, 1)).unwrap();
        assert_eq!(path.cells(), cells(&[(1, 3), (1, 2), (1, 1)]).as_slice());
    }

    #[test]
    fn vertical_run_both_ways() {
        let down = resolve(Cell::new(0, 0), Cell::new(2, 0)).unwrap();
        assert_eq!(down.cells(), cells(&[(0, 0), (1, 0), (2, 0)]).as_slice());

        let up = resolve(Cell::new(2, 4), Cell::new(0, 4)).unwrap();
        assert_eq!(up.cells(), cells(&[(2, 4), (1, 4), (0, 4)]).as_slice());
    }

    #[test]
    fn all_four_diagonals() {
        let origin = Cell::new(2, 2);
        for (target, middle) in [
            ((0, 0), (1, 1)),
            ((0, 4), (1, 3)),
            ((4, 0), (3, 1)),
            ((4, 4), (3, 3)),
        ] {
            let path = resolve(origin, target.into()).unwrap();
            assert_eq!(path.cells(), cells(&[(2, 2), middle, target]).as_slice());
        }
    }

    #[test]
    fn same_cell_is_invalid() {
        assert!(resolve(Cell::new(3, 3), Cell::new(3, 3)).is_none());
    }

    #[test]
    fn off_line_hover_is_invalid() {
        assert!(resolve(Cell::new(0, 0), Cell::new(1, 2)).is_none());
        assert!(resolve(Cell::new(4, 4), Cell::new(1, 2)).is_none());
        assert!(resolve(Cell::new(0, 5), Cell::new(3, 1)).is_none());
    }

    #[test]
    fn valid_paths_have_expected_length_and_endpoints() {
        let start = Cell::new(5, 5);
        for row in 0..11 {
            for col in 0..11 {
                let current = Cell::new(row, col);
                let d_row = row as isize - 5;
                let d_col = col as isize - 5;
                let on_line = (d_row == 0) != (d_col == 0) || (d_row != 0 && d_row.abs() == d_col.abs());
                match resolve(start, current) {
                    Some(path) => {
                        assert!(on_line, "{current} should be invalid");
                        let steps = d_row.abs().max(d_col.abs()) as usize;
                        assert_eq!(path.len(), steps + 1);
                        assert_eq!(path.start(), start);
                        assert_eq!(path.end(), current);
                    }
                    None => assert!(!on_line, "{current} should resolve"),
                }
            }
        }
    }

    #[test]
    fn from_cells_accepts_straight_runs_only() {
        assert!(CellPath::from_cells(cells(&[(0, 0), (1, 1), (2, 2)])).is_some());
        assert!(CellPath::from_cells(cells(&[(4, 4)])).is_some());
        // gap
        assert!(CellPath::from_cells(cells(&[(0, 0), (0, 2)])).is_none());
        // bend
        assert!(CellPath::from_cells(cells(&[(0, 0), (0, 1), (1, 1)])).is_none());
        assert!(CellPath::from_cells(Vec::new()).is_none());
    }

    #[test]
    fn single_cell_path() {
        let path = CellPath::single(Cell::new(2, 1));
        assert_eq!(path.len(), 1);
        assert!(!path.is_empty());
        assert_eq!(path.start(), path.end());
        assert!(path.contains(Cell::new(2, 1)));
    }
}
