//! Command line and environment configuration.

use crate::error::TablesError;
use crate::table::builtin_layouts;
use crate::table::load_layouts;
use crate::table::TableLayout;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "capbudg-tables")]
#[command(author, version, about = "Serve the tables of a capital budgeting workbook as JSON")]
pub struct Config {
    /// Workbook to load (.xls)
    #[arg(short, long, env = "CAPBUDG_FILE", default_value = "./Data/capbudg.xls")]
    pub file: PathBuf,

    /// Worksheet holding the tables (default: first worksheet)
    #[arg(short, long, env = "CAPBUDG_SHEET")]
    pub sheet: Option<String>,

    /// JSON file replacing the built-in table layouts
    #[arg(short, long, env = "CAPBUDG_LAYOUT")]
    pub layout: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "PORT", default_value_t = 9090)]
    pub port: u16,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Layouts from `--layout` when given, the built-in ones otherwise.
    pub fn layouts(&self) -> Result<Vec<TableLayout>, TablesError> {
        match &self.layout {
            Some(path) => load_layouts(path),
            None => Ok(builtin_layouts()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["capbudg-tables", "--host", "127.0.0.1", "--port", "9090"]).unwrap();
        assert_eq!(config.file, PathBuf::from("./Data/capbudg.xls"));
        assert_eq!(config.sheet, None);
        assert_eq!(config.address(), "127.0.0.1:9090");
        assert_eq!(config.layouts().unwrap(), builtin_layouts());
    }

    #[test]
    fn explicit_arguments() {
        let config = Config::try_parse_from([
            "capbudg-tables",
            "--file",
            "book.xls",
            "--sheet",
            "Sheet2",
            "--host",
            "localhost",
            "--port",
            "8080",
        ])
        .unwrap();
        assert_eq!(config.file, PathBuf::from("book.xls"));
        assert_eq!(config.sheet.as_deref(), Some("Sheet2"));
        assert_eq!(config.address(), "localhost:8080");
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Config::try_parse_from(["capbudg-tables", "--port", "http"]).is_err());
    }

    #[test]
    fn missing_layout_file_fails() {
        let config = Config::try_parse_from(["capbudg-tables", "--layout", "./missing-layouts.json"]).unwrap();
        assert!(config.layouts().is_err());
    }
}
