//! # Table Module
//!
//! Named rectangular views over the worksheet grid. Each table keeps its first column
//! as row labels and the remaining columns as row values.
pub(crate) mod layout;
pub(crate) mod range;
pub(crate) mod registry;

use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::CellValue;
use crate::spreadsheet::Grid;
use crate::spreadsheet::Number;
use crate::table::layout::Slice;

pub use crate::table::layout::builtin_layouts;
pub use crate::table::layout::load_layouts;
pub use crate::table::layout::validate_layouts;
pub use crate::table::layout::LayoutError;
pub use crate::table::layout::TableLayout;
pub use crate::table::range::Range;
pub use crate::table::range::RangeError;
pub use crate::table::registry::QueryError;
pub use crate::table::registry::RowSum;
pub use crate::table::registry::TableDetails;
pub use crate::table::registry::TableRegistry;

/// A value cell that cannot take part in a row sum.
#[derive(Clone, Debug, PartialEq)]
pub struct NonNumericCell {
    /// A1-style position on the worksheet
    pub reference: String,
    pub value: CellValue,
}

/// An immutable table cut out of the grid.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    /// Worksheet row of each table row
    rows: Vec<usize>,
    /// Worksheet column of each value column
    value_cols: Vec<usize>,
    labels: Vec<String>,
    values: Vec<Vec<CellValue>>,
}

impl Table {
    pub(crate) fn from_grid(name: &str, slice: &Slice, grid: &Grid) -> Self {
        let rows: Vec<usize> = slice.rows.clone().collect();
        let (label_col, value_cols) = slice
            .cols
            .split_first()
            .map(|(label, values)| (*label, values.to_vec()))
            .unwrap_or_default();
        let labels = rows.iter().map(|row| grid.get(*row, label_col).to_label()).collect();
        let values = rows
            .iter()
            .map(|row| value_cols.iter().map(|col| grid.get(*row, *col).clone()).collect())
            .collect();
        Table {
            name: name.to_owned(),
            rows,
            value_cols,
            labels,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row labels in row order, duplicates and empty labels included.
    pub fn row_names(&self) -> &[String] {
        &self.labels
    }

    /// Index of the first row whose label equals `label` exactly.
    pub fn find_row(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|candidate| candidate == label)
    }

    /// Sums the value columns of row `index`. Empty and non-numeric cells are not
    /// skipped: the first one found is returned as the error.
    pub fn sum_row(&self, index: usize) -> Result<Number, NonNumericCell> {
        let Some(values) = self.values.get(index) else {
            return Ok(Number::default());
        };
        values
            .iter()
            .zip(&self.value_cols)
            .try_fold(Number::default(), |sum, (value, col)| match value.as_number() {
                Some(number) => Ok(sum + number),
                None => Err(NonNumericCell {
                    reference: index_to_reference(self.rows[index], *col),
                    value: value.clone(),
                }),
            })
    }
}
