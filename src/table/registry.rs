use crate::error::TablesError;
use crate::spreadsheet::Grid;
use crate::spreadsheet::Number;
use crate::table::layout::validate_layouts;
use crate::table::layout::TableLayout;
use crate::table::Table;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Why a query could not be answered. These are ordinary outcomes reported to the
/// caller, never process failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("No table with name <{0}> found.")]
    InvalidTableName(String),

    #[error("No row with name <{row}> found in table <{table}>.")]
    InvalidRowName { table: String, row: String },

    #[error("Row <{row}> in table <{table}> has a non-numeric value at <{reference}>.")]
    NonNumericRowData { table: String, row: String, reference: String },
}

impl QueryError {
    /// Key under which the message is reported in a response body.
    pub fn key(&self) -> &'static str {
        match self {
            QueryError::InvalidTableName(_) => "Invalid Table Name",
            QueryError::InvalidRowName { .. } => "Invalid Row Name",
            QueryError::NonNumericRowData { .. } => "Invalid Row Data",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableDetails {
    pub table_name: String,
    pub row_names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowSum {
    pub table_name: String,
    pub row_name: String,
    pub sum: Number,
}

/// Tables by name, in declaration order. Built once, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct TableRegistry {
    tables: Vec<Table>,
}

impl TableRegistry {
    /// Cuts every layout out of the grid. Layouts are validated first, so a bad
    /// configuration fails here rather than at query time.
    pub fn build(grid: &Grid, layouts: &[TableLayout]) -> Result<Self, TablesError> {
        validate_layouts(layouts)?;
        let mut tables = Vec::with_capacity(layouts.len());
        for layout in layouts {
            let table = Table::from_grid(&layout.name, &layout.slice()?, grid);
            debug!(table = %layout.name, range = %layout.range, rows = table.row_count(), "table registered");
            tables.push(table);
        }
        info!(tables = tables.len(), "table registry built");
        Ok(TableRegistry { tables })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name() == name)
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.name().to_owned()).collect()
    }

    pub fn describe_table(&self, table_name: &str) -> Result<TableDetails, QueryError> {
        let table = self.lookup(table_name)?;
        Ok(TableDetails {
            table_name: table.name().to_owned(),
            row_names: table.row_names().to_vec(),
        })
    }

    /// Sums the values of the first row labelled `row_name`.
    pub fn sum_row(&self, table_name: &str, row_name: &str) -> Result<RowSum, QueryError> {
        let table = self.lookup(table_name)?;
        let index = table.find_row(row_name).ok_or_else(|| QueryError::InvalidRowName {
            table: table_name.to_owned(),
            row: row_name.to_owned(),
        })?;
        let sum = table.sum_row(index).map_err(|cell| {
            debug!(table = table_name, row = row_name, reference = %cell.reference, value = ?cell.value, "row is not summable");
            QueryError::NonNumericRowData {
                table: table_name.to_owned(),
                row: row_name.to_owned(),
                reference: cell.reference,
            }
        })?;
        debug!(table = table_name, row = row_name, %sum, "row summed");
        Ok(RowSum {
            table_name: table_name.to_owned(),
            row_name: row_name.to_owned(),
            sum,
        })
    }

    fn lookup(&self, table_name: &str) -> Result<&Table, QueryError> {
        self.get(table_name)
            .ok_or_else(|| QueryError::InvalidTableName(table_name.to_owned()))
    }
}
