use crate::error::ResultOptionChain;
use crate::error::TablesError;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::match_biff8_record;
use crate::spreadsheet::cell::to_error_value;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

// BIFF8 record types
const FORMULA: u16 = 6;        // Formula with its cached result
const EOF: u16 = 10;           // End of a substream
const FILE_PASS: u16 = 47;     // Workbook is encrypted
const BOUND_SHEET8: u16 = 133; // Sheet name, type and substream offset
const MUL_RK: u16 = 189;       // Run of RK numbers in one row
const SST: u16 = 252;          // Shared string table
const LABEL_SST: u16 = 253;    // String cell referencing the shared string table
const NUMBER: u16 = 515;       // Double cell
const LABEL: u16 = 516;        // Inline string cell
const BOOL_ERR: u16 = 517;     // Boolean or error cell
const STRING: u16 = 519;       // String result of the preceding formula
const RK: u16 = 638;           // Compressed number cell
const BOF: u16 = 2057;         // Beginning of a substream

/// `BOUNDSHEET8.dt` value for worksheets (as opposed to charts and macro sheets).
const WORKSHEET: u8 = 0;

#[derive(Error, Debug)]
pub enum XlsError {
    #[error("Invalid formula value '{0:#018x}'")]
    FormulaValueError(u64),

    #[error("Shared string index '{0}' out of range")]
    SharedStringIndexError(usize),
}

/// An Excel 97-2003 workbook with its global records already parsed.
pub(crate) struct XlsSpreadsheet {
    name: String,
    reader: Biff8Reader,
    shared_strings: Vec<String>,
    /// Worksheet names and their substream offsets, in workbook order
    sheets: Vec<(String, usize)>,
}

impl XlsSpreadsheet {
    /// Opens the workbook and reads its globals substream: sheet directory and shared strings.
    pub(crate) fn open(path: &Path) -> Result<XlsSpreadsheet, TablesError> {
        let file_name = path.to_string_lossy().to_string();
        let mut buf_reader = BufReader::new(File::open(path)?);
        let cfb = Cfb::new(&mut buf_reader)?;
        if cfb.exists("EncryptedPackage") {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
        }
        let mut reader = cfb.read("Workbook")
            .ok_none_else(|| cfb.read("Book"))?
            .map(Biff8Reader::new)
            .ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?;

        let (shared_strings, sheets) = read_globals(&mut reader, &file_name)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }

        Ok(XlsSpreadsheet {
            name: file_name,
            reader,
            shared_strings,
            sheets,
        })
    }
}

impl Spreadsheet for XlsSpreadsheet {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, TablesError> {
        let pointer = self.sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, pointer)| *pointer)
            .ok_or_else(|| SpreadsheetError::SheetNotFoundError(self.name.to_owned(), sheet_name.to_owned()))?;

        let mut sheet = Sheet::new(&self.name, sheet_name);
        self.reader.goto(pointer);
        read_worksheet(&mut self.reader, &self.shared_strings, &mut sheet)?;
        Ok(sheet)
    }
}

/// Walks the globals substream up to its EOF, returning the shared strings and
/// the worksheets with their substream offsets. Chart and macro sheets are skipped.
fn read_globals(reader: &mut Biff8Reader, file_name: &str) -> Result<(Vec<String>, Vec<(String, usize)>), TablesError> {
    let mut shared_strings = Vec::new();
    let mut sheets: Vec<(String, usize)> = Vec::new();
    match_biff8_record!(reader => {
        EOF => break,
        FILE_PASS => Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?,
        SST => shared_strings = load_shared_strings(reader)?,
        BOUND_SHEET8 => {
            let pointer = reader.read_u32()? as usize;
            let _visibility = reader.read_u8()?;
            let kind = reader.read_u8()?;
            let sheet_name = reader.read_short_xl_unicode_string()?;
            if kind == WORKSHEET {
                sheets.push((sheet_name, pointer));
            }
        }
    });
    Ok((shared_strings, sheets))
}

/// Walks one worksheet substream, starting at its BOF, and collects every value-bearing cell record.
fn read_worksheet(reader: &mut Biff8Reader, shared_strings: &[String], sheet: &mut Sheet) -> Result<(), TablesError> {
    // A formula with a string result is followed by a STRING record holding the text.
    let mut pending_string: Option<(usize, usize)> = None;
    reader.next()?;
    while let Some(tag) = reader.next()? {
        match tag {
            BOF | EOF => break,
            MUL_RK => {
                let row = reader.read_u16()? as usize;
                let col_lower_bound = reader.read_u16()? as usize;
                let col_upper_bound = reader.get_u16_back(2)? as usize;
                for col in col_lower_bound..=col_upper_bound {
                    reader.skip(2)?;
                    let value = CellValue::from(reader.read_rk_number()?);
                    sheet.push(Cell { row, col, value });
                }
            }
            NUMBER | RK | LABEL_SST | LABEL | BOOL_ERR => {
                let row = reader.read_u16()? as usize;
                let col = reader.read_u16()? as usize;
                reader.skip(2)?; // ixfe
                let value = match tag {
                    NUMBER => CellValue::from(reader.read_f64()?),
                    RK => CellValue::from(reader.read_rk_number()?),
                    LABEL_SST => {
                        let index = reader.read_u32()? as usize;
                        let text = shared_strings
                            .get(index)
                            .ok_or(XlsError::SharedStringIndexError(index))?;
                        CellValue::Text(text.to_owned())
                    }
                    LABEL => CellValue::Text(reader.read_xl_unicode_string()?),
                    _ => read_bool_or_error(reader)?,
                };
                sheet.push(Cell { row, col, value });
            }
            FORMULA => {
                let row = reader.read_u16()? as usize;
                let col = reader.read_u16()? as usize;
                reader.skip(2)?; // ixfe
                match read_formula_result(reader.read_u64()?)? {
                    Some(value) => sheet.push(Cell { row, col, value }),
                    None => pending_string = Some((row, col)),
                }
            }
            STRING => {
                if let Some((row, col)) = pending_string.take() {
                    let value = CellValue::Text(reader.read_xl_unicode_string()?);
                    sheet.update(row, col, value);
                }
            }
            _ => (),
        }
    }
    Ok(())
}

/// Loads the shared string table; strings may span CONTINUE records.
fn load_shared_strings(reader: &mut Biff8Reader) -> Result<Vec<String>, TablesError> {
    reader.skip(4)?; // cstTotal
    let count = reader.read_u32()? as usize;
    let mut shared_strings = Vec::with_capacity(count);
    for _ in 0..count {
        shared_strings.push(reader.read_xl_unicode_rich_extended_string()?);
    }
    Ok(shared_strings)
}

/// BOOLERR payload after the cell header: a value byte and an is-error flag.
fn read_bool_or_error(reader: &mut Biff8Reader) -> Result<CellValue, TablesError> {
    let value = reader.read_u8()?;
    let is_error = reader.read_u8()? != 0;
    Ok(if is_error {
        CellValue::Error(to_error_value(value).to_owned())
    } else {
        CellValue::Bool(value != 0)
    })
}

/// Decodes a cached `FormulaValue`. Returns `None` when the result is a string that
/// follows in a separate STRING record.
fn read_formula_result(formula: u64) -> Result<Option<CellValue>, XlsError> {
    if formula >> 48 != 0xFFFF {
        return Ok(Some(CellValue::from(f64::from_bits(formula))));
    }
    let value = ((formula >> 16) & 0xFF) as u8;
    match formula & 0xFF {
        0 => Ok(None),
        1 => Ok(Some(CellValue::Bool(value != 0))),
        2 => Ok(Some(CellValue::Error(to_error_value(value).to_owned()))),
        3 => Ok(Some(CellValue::Text(String::new()))),
        _ => Err(XlsError::FormulaValueError(formula)),
    }
}
