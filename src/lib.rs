//! # Capital Budgeting Tables
//!
//! Loads the first worksheet of a capital budgeting workbook (`capbudg.xls`), cuts it
//! into named tables at fixed positions and serves them over a read-only JSON API.
//!
//! ## Endpoints
//!
//! - `GET /`: service metadata
//! - `GET /list_tables`: table names in declaration order
//! - `GET /get_table_details/{table_name}`: row labels of one table
//! - `GET /row_sum/{table_name}/{row_name}`: sum of the numeric values of one row
//!
//! The workbook is read once at startup by a pure Rust BIFF8 reader; every request is
//! answered from the immutable [`TableRegistry`].
pub mod config;
mod error;
mod helpers;
pub mod server;
pub mod spreadsheet;
pub mod table;

pub use crate::config::Config;
pub use crate::error::TablesError;
pub use crate::spreadsheet::load_grid;
pub use crate::table::TableRegistry;
