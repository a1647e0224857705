//! Declarative description of where each table sits on the worksheet.
//!
//! A layout names an A1-style rectangle, keeps every `step`-th column of it and then
//! removes the `drop` columns. The first remaining column holds the row labels.

use crate::error::ResultMessage;
use crate::error::TablesError;
use crate::spreadsheet::reference::col_to_index;
use crate::table::range::Range;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Duplicate table name '{0}'")]
    DuplicateNameError(String),

    #[error("Table '{0}': range '{1}' must name both corners, top-left first")]
    IncompleteRangeError(String, String),

    #[error("Table '{0}': column step must be at least 1")]
    ZeroStepError(String),

    #[error("Table '{0}': dropped column '{1}' is not a column letter inside the range")]
    DropColumnError(String, String),

    #[error("Table '{0}': no column left after step and drop")]
    NoColumnError(String),

    #[error("Table '{0}': range '{1}' exceeds the sheet limits of 65536 rows and 256 columns")]
    SheetLimitError(String, String),
}

/// BIFF8 worksheet limits: rows 1..=65536, columns A..=IV.
const MAX_ROWS: usize = 65536;
const MAX_COLS: usize = 256;

fn default_step() -> usize {
    1
}

/// One entry of the table layout configuration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TableLayout {
    pub name: String,
    /// Inclusive A1-style range, e.g. `A4:C10`
    pub range: String,
    #[serde(default = "default_step")]
    pub step: usize,
    /// Column letters removed after stepping
    #[serde(default)]
    pub drop: Vec<String>,
}

/// Grid coordinates selected by a layout.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Slice {
    pub(crate) rows: RangeInclusive<usize>,
    /// Selected columns in order; the first one is the label column.
    pub(crate) cols: Vec<usize>,
}

impl TableLayout {
    pub fn new(name: &str, range: &str, step: usize, drop: &[&str]) -> Self {
        TableLayout {
            name: name.to_owned(),
            range: range.to_owned(),
            step,
            drop: drop.iter().map(|col| (*col).to_owned()).collect(),
        }
    }

    /// Resolves the declaration into concrete row and column indexes.
    pub(crate) fn slice(&self) -> Result<Slice, TablesError> {
        let range = Range::try_from(self.range.as_str())?;
        let ((row_lower, col_lower), (row_upper, col_upper)) = range
            .corners()
            .ok_or_else(|| LayoutError::IncompleteRangeError(self.name.to_owned(), self.range.to_owned()))?;
        if row_upper >= MAX_ROWS || col_upper >= MAX_COLS {
            Err(LayoutError::SheetLimitError(self.name.to_owned(), self.range.to_owned()))?;
        }
        if self.step == 0 {
            Err(LayoutError::ZeroStepError(self.name.to_owned()))?;
        }

        let mut dropped = HashSet::new();
        for letters in &self.drop {
            let col = col_to_index(letters.trim())
                .filter(|col| (col_lower..=col_upper).contains(col))
                .ok_or_else(|| LayoutError::DropColumnError(self.name.to_owned(), letters.to_owned()))?;
            dropped.insert(col);
        }

        let cols: Vec<usize> = (col_lower..=col_upper)
            .step_by(self.step)
            .filter(|col| !dropped.contains(col))
            .collect();
        if cols.is_empty() {
            Err(LayoutError::NoColumnError(self.name.to_owned()))?;
        }
        Ok(Slice { rows: row_lower..=row_upper, cols })
    }
}

/// Where the tables of the capital budgeting workbook live on its first sheet.
pub fn builtin_layouts() -> Vec<TableLayout> {
    vec![
        TableLayout::new("INITIAL INVESTMENT", "A4:C10", 2, &[]),
        TableLayout::new("CASHFLOW DETAILS", "E4:G7", 2, &[]),
        TableLayout::new("DISCOUNT RATE", "I4:K11", 2, &[]),
        TableLayout::new("WORKING CAPITAL", "A13:C15", 2, &[]),
        TableLayout::new("INITIAL INVESTMENT Details", "A25:B31", 1, &[]),
        TableLayout::new("Investment Measures", "B54:C56", 1, &[]),
        TableLayout::new("GROWTH RATES", "A19:L20", 1, &["B", "C"]),
        TableLayout::new("SALVAGE VALUE", "A34:L35", 1, &["B"]),
        TableLayout::new("OPERATING CASHFLOWS", "A38:L51", 1, &["B"]),
    ]
}

/// Reads layouts from a JSON array of `{name, range, step?, drop?}` objects.
pub fn load_layouts(path: &Path) -> Result<Vec<TableLayout>, TablesError> {
    let load = || -> Result<Vec<TableLayout>, TablesError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    };
    load().with_prefix(&format!("Load table layouts '{}'", path.display()))
}

/// Checks that names are unique and every layout resolves.
pub fn validate_layouts(layouts: &[TableLayout]) -> Result<(), TablesError> {
    let mut names = HashSet::new();
    for layout in layouts {
        if !names.insert(layout.name.as_str()) {
            Err(LayoutError::DuplicateNameError(layout.name.to_owned()))?;
        }
        layout.slice()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_layouts_are_valid() {
        let layouts = builtin_layouts();
        assert_eq!(layouts.len(), 9);
        validate_layouts(&layouts).unwrap();
    }

    #[test]
    fn step_keeps_every_other_column() {
        let slice = TableLayout::new("INITIAL INVESTMENT", "A4:C10", 2, &[]).slice().unwrap();
        assert_eq!(slice.rows, 3..=9);
        assert_eq!(slice.cols, vec![0, 2]);
    }

    #[test]
    fn drop_removes_columns() {
        let slice = TableLayout::new("GROWTH RATES", "A19:L20", 1, &["B", "C"]).slice().unwrap();
        assert_eq!(slice.rows, 18..=19);
        assert_eq!(slice.cols, vec![0, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn rejects_invalid_layouts() {
        let cases = [
            TableLayout::new("partial", "A:C", 1, &[]),
            TableLayout::new("reversed", "C10:A4", 1, &[]),
            TableLayout::new("zero step", "A4:C10", 0, &[]),
            TableLayout::new("outside drop", "A4:C10", 1, &["D"]),
            TableLayout::new("bad drop", "A4:C10", 1, &["1"]),
            TableLayout::new("nothing left", "B4:B10", 1, &["B"]),
        ];
        for layout in cases {
            assert!(layout.slice().is_err(), "{} should be rejected", layout.name);
        }
    }

    #[test]
    fn rejects_ranges_past_sheet_limits() {
        let tall = TableLayout::new("tall", "A1:A4000000000", 1, &[]).slice().unwrap_err();
        assert_eq!(
            tall.to_string(),
            "Table 'tall': range 'A1:A4000000000' exceeds the sheet limits of 65536 rows and 256 columns"
        );
        assert!(TableLayout::new("wide", "A1:IW1", 1, &[]).slice().is_err());
        assert!(TableLayout::new("last cell", "A1:IV65536", 1, &[]).slice().is_ok());
    }

    #[test]
    fn overlong_column_letters_are_errors() {
        let range = TableLayout::new("X", "A1:ZZZZZZZZZZZZZZZZ1", 1, &[]).slice().unwrap_err();
        assert!(matches!(range, TablesError::LayoutError(LayoutError::IncompleteRangeError(..))));

        let drop = TableLayout::new("Y", "A1:C1", 1, &["ZZZZZZZZZZZZZZZZ"]).slice().unwrap_err();
        assert!(matches!(drop, TablesError::LayoutError(LayoutError::DropColumnError(..))));
    }

    #[test]
    fn rejects_duplicate_names() {
        let layouts = vec![
            TableLayout::new("DISCOUNT RATE", "I4:K11", 2, &[]),
            TableLayout::new("DISCOUNT RATE", "A4:C10", 2, &[]),
        ];
        let error = validate_layouts(&layouts).unwrap_err();
        assert_eq!(error.to_string(), "Duplicate table name 'DISCOUNT RATE'");
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"[
            {"name": "DISCOUNT RATE", "range": "I4:K11", "step": 2},
            {"name": "SALVAGE VALUE", "range": "A34:L35", "drop": ["B"]}
        ]"#;
        let layouts: Vec<TableLayout> = serde_json::from_str(json).unwrap();
        assert_eq!(layouts[0], TableLayout::new("DISCOUNT RATE", "I4:K11", 2, &[]));
        assert_eq!(layouts[1], TableLayout::new("SALVAGE VALUE", "A34:L35", 1, &["B"]));
    }

    #[test]
    fn load_reports_path() {
        let error = load_layouts(Path::new("./missing-layouts.json")).unwrap_err();
        assert!(error.to_string().starts_with("Load table layouts './missing-layouts.json'"));
    }
}
