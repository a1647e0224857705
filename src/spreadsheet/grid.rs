use crate::spreadsheet::cell::CellValue;
use std::collections::HashMap;

static EMPTY: CellValue = CellValue::Empty;

/// The full contents of one worksheet: a rectangle anchored at A1.
/// Only non-empty cells are stored. Built once at load and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: HashMap<(usize, usize), CellValue>,
}

impl Grid {
    pub(crate) fn with_size(rows: usize, cols: usize) -> Self {
        Grid {
            rows,
            cols,
            cells: HashMap::new(),
        }
    }

    /// Builds a grid from ragged rows; short rows are padded with empty cells.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Grid::with_size(rows.len(), cols);
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                grid.set(row, col, value);
            }
        }
        grid
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if row >= self.rows || col >= self.cols {
            return;
        }
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of non-empty cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Positions outside the used area read as empty.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }
}
