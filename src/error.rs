use thiserror::Error;

/// Crate-wide error for everything that can fail while loading the workbook and its tables.
/// Aggregates the module errors so `?` composes across layers.
#[derive(Error, Debug)]
pub enum TablesError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    XlsError(#[from] crate::spreadsheet::xls::XlsError),

    // Table module errors
    #[error("{0}")]
    RangeError(#[from] crate::table::range::RangeError),

    #[error("{0}")]
    LayoutError(#[from] crate::table::layout::LayoutError),
}

pub(crate) trait ResultOptionChain {
    /// Falls back to `f` only when the result is `Ok(None)`.
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, TablesError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| TablesError::WithContextError(format!("{}: {}", message, e)))
    }
}
