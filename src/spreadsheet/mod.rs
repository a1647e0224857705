//! # Spreadsheet Module
//!
//! Reads a workbook from disk into a [`Grid`]: the full, immutable contents of one
//! worksheet. Legacy Excel workbooks (`.xls`, `.xla`) are supported through a pure Rust
//! reader of the compound file container and its BIFF8 record stream.
pub(crate) mod cell;
pub(crate) mod grid;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xls;

use crate::error::ResultMessage;
use crate::error::TablesError;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xls::XlsSpreadsheet;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub use crate::spreadsheet::cell::CellValue;
pub use crate::spreadsheet::cell::Number;
pub use crate::spreadsheet::grid::Grid;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported spreadsheet format '{0}'")]
    UnsupportedFormatError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' contains no worksheet")]
    SpreadsheetEmptyError(String),

    #[error("Sheet '{1}' not found in '{0}'")]
    SheetNotFoundError(String, String),
}

/// A workbook opened for reading, one worksheet at a time.
pub(crate) trait Spreadsheet {
    /// Source file name, for messages.
    fn name(&self) -> String;

    /// Worksheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, TablesError>;
}

fn open_spreadsheet(path: &Path) -> Result<Box<dyn Spreadsheet>, TablesError> {
    match path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase).as_deref() {
        Some("xls") | Some("xla") => Ok(Box::new(XlsSpreadsheet::open(path)?)),
        _ => Err(SpreadsheetError::UnsupportedFormatError(path.to_string_lossy().to_string()))?,
    }
}

/// Loads one worksheet of the workbook at `path` into a [`Grid`].
///
/// When `sheet_name` is `None` the first worksheet is used.
pub fn load_grid(path: &Path, sheet_name: Option<&str>) -> Result<Grid, TablesError> {
    let mut spreadsheet = open_spreadsheet(path)
        .with_prefix(&format!("Open workbook '{}'", path.display()))?;
    let sheet_name = match sheet_name {
        Some(name) => name.to_owned(),
        None => spreadsheet
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(spreadsheet.name()))?,
    };
    debug!(workbook = %spreadsheet.name(), sheets = ?spreadsheet.sheet_names(), "workbook opened");

    let sheet = spreadsheet.read_sheet(&sheet_name)?;
    if sheet.is_empty() {
        warn!(workbook = %sheet.file_name, sheet = %sheet.name, "worksheet has no cells");
    }
    info!(
        workbook = %sheet.file_name,
        sheet = %sheet.name,
        cells = sheet.cells.len(),
        dimension = %sheet.dimension().unwrap_or_default(),
        "worksheet loaded"
    );
    Ok(sheet.finish())
}
