use crate::error::TablesError;
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::fmt::Display;
use thiserror::Error;

/// Errors related to Excel-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// An Excel-style cell range with optional boundaries, all 0-based and inclusive.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Range {
    pub row_lower_bound: Option<usize>,
    pub row_upper_bound: Option<usize>,
    pub col_lower_bound: Option<usize>,
    pub col_upper_bound: Option<usize>,
}

impl Range {
    /// Both corners, when the range names a complete rectangle in top-left to bottom-right order.
    pub fn corners(&self) -> Option<((usize, usize), (usize, usize))> {
        let upper_left = self.row_lower_bound.zip(self.col_lower_bound)?;
        let lower_right = self.row_upper_bound.zip(self.col_upper_bound)?;
        (upper_left.0 <= lower_right.0 && upper_left.1 <= lower_right.1).then_some((upper_left, lower_right))
    }
}

impl TryFrom<&str> for Range {
    type Error = TablesError;

    /// Parses "A4", "A4:C10", "B:D" or "4:10" (case-insensitive).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern");
        let value = value.trim().to_ascii_uppercase();
        let captures = pattern
            .captures(value.as_str())
            .filter(|_| !value.is_empty())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let bound = |index: usize, parse: fn(&str) -> Option<usize>| captures.get(index).map(|matcher| matcher.as_str()).and_then(parse);
        Ok(Range {
            col_lower_bound: bound(1, col_to_index),
            row_lower_bound: bound(2, row_to_index),
            col_upper_bound: bound(4, col_to_index),
            row_upper_bound: bound(5, row_to_index),
        }
        .single_cell(captures.get(3).is_none()))
    }
}

impl Range {
    /// "A4" alone selects exactly that cell.
    fn single_cell(self, is_single: bool) -> Self {
        if is_single {
            Range {
                row_upper_bound: self.row_lower_bound,
                col_upper_bound: self.col_lower_bound,
                ..self
            }
        } else {
            self
        }
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.corners() {
            Some(((row_lower, col_lower), (row_upper, col_upper))) => write!(
                f,
                "{}:{}",
                index_to_reference(row_lower, col_lower),
                index_to_reference(row_upper, col_upper)
            ),
            None => write!(f, "{:?}", self),
        }
    }
}
