use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::reference::index_to_reference;

/// Cells collected from one worksheet while its record stream is read.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    pub(crate) cells: Vec<Cell>,
    /// Used area, determined from the cells pushed so far
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell; empty values carry no content and are not stored.
    pub(crate) fn push(&mut self, cell: Cell) {
        if cell.value.is_empty() {
            return;
        }
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    /// Replaces the value of an already pushed cell, e.g. a formula's string result
    /// that arrives in a later record.
    pub(crate) fn update(&mut self, row: usize, col: usize, value: CellValue) {
        match self.cells.iter_mut().rev().find(|cell| cell.row == row && cell.col == col) {
            Some(cell) => cell.value = value,
            None => self.push(Cell { row, col, value }),
        }
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|lower| row < lower).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|upper| upper < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|lower| col < lower).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|upper| upper < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// The used area as an A1-style range, e.g. `A1:L56`.
    pub(crate) fn dimension(&self) -> Option<String> {
        let (row_lower, row_upper) = self.row_lower_bound.zip(self.row_upper_bound)?;
        let (col_lower, col_upper) = self.col_lower_bound.zip(self.col_upper_bound)?;
        Some(format!(
            "{}:{}",
            index_to_reference(row_lower, col_lower),
            index_to_reference(row_upper, col_upper)
        ))
    }

    /// Lays the cells out on a rectangular grid anchored at A1.
    /// When a position was written twice, the later cell wins.
    pub(crate) fn finish(self) -> Grid {
        let rows = self.row_upper_bound.map(|row| row + 1).unwrap_or(0);
        let cols = self.col_upper_bound.map(|col| col + 1).unwrap_or(0);
        let mut grid = Grid::with_size(rows, cols);
        for cell in self.cells {
            grid.set(cell.row, cell.col, cell.value);
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: CellValue) {
        sheet.push(Cell { row, col, value });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("capbudg.xls", "Sheet1");

        assert!(sheet.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.row_upper_bound, None);
        assert_eq!(sheet.col_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert_eq!(sheet.dimension(), None);
        assert_eq!(sheet.finish().rows(), 0);
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("capbudg.xls", "Sheet1");
        push(&mut sheet, 3, 2, CellValue::from(50000.0));
        push(&mut sheet, 1, 1, CellValue::from("Initial Investment="));
        push(&mut sheet, 3, 1, CellValue::Empty);

        assert_eq!(sheet.cells.len(), 2);
        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(2));
        assert_eq!(sheet.dimension().as_deref(), Some("B2:C4"));
    }

    #[test]
    fn sheet_finish_anchors_at_a1() {
        let mut sheet = Sheet::new("capbudg.xls", "Sheet1");
        push(&mut sheet, 1, 1, CellValue::from("Initial Investment="));
        push(&mut sheet, 1, 2, CellValue::from(50000.0));
        let grid = sheet.finish();

        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.get(0, 0), &CellValue::Empty);
        assert_eq!(grid.get(1, 1), &CellValue::from("Initial Investment="));
        assert_eq!(grid.get(1, 2), &CellValue::from(50000i64));
    }

    #[test]
    fn sheet_update_replaces_formula_result() {
        let mut sheet = Sheet::new("capbudg.xls", "Sheet1");
        push(&mut sheet, 0, 0, CellValue::Text(String::new()));
        sheet.update(0, 0, CellValue::from("NPV"));
        sheet.update(0, 1, CellValue::from("IRR"));

        assert_eq!(sheet.cells.len(), 2);
        let grid = sheet.finish();
        assert_eq!(grid.get(0, 0), &CellValue::from("NPV"));
        assert_eq!(grid.get(0, 1), &CellValue::from("IRR"));
    }
}
