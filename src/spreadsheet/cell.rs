use serde::Serialize;
use serde::Serializer;
use std::fmt::Display;
use std::ops::Add;

/// Converts BIFF error codes to their spreadsheet spelling.
pub(crate) fn to_error_value(code: u8) -> &'static str {
    match code {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        0x2B => "#GETTING_DATA",
        _ => "#ERROR!",
    }
}

/// A numeric cell value that remembers whether it is integral.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Workbooks store every number as a double; integral values within `i64` range
    /// are normalised to `Int`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Number::Int(value as i64)
        } else {
            Number::Float(value)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(value) => *value as f64,
            Number::Float(value) => *value,
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::Int(0)
    }
}

impl Add for Number {
    type Output = Number;

    /// Integers stay integers until one side is fractional or the sum overflows.
    fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(lhs), Number::Int(rhs)) => lhs
                .checked_add(rhs)
                .map(Number::Int)
                .unwrap_or_else(|| Number::Float(lhs as f64 + rhs as f64)),
            (lhs, rhs) => Number::Float(lhs.as_f64() + rhs.as_f64()),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{}", value),
            Number::Float(value) => write!(f, "{}", value),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::Int(value) => serializer.serialize_i64(*value),
            Number::Float(value) => serializer.serialize_f64(*value),
        }
    }
}

/// The content of one grid cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(Number),
    Text(String),
    /// Error literal such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            CellValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Renders the cell the way a row label is shown to clients: empty cells become "".
    pub fn to_label(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(true) => "TRUE".to_owned(),
            CellValue::Bool(false) => "FALSE".to_owned(),
            CellValue::Number(number) => number.to_string(),
            CellValue::Text(text) => text.to_owned(),
            CellValue::Error(code) => code.to_owned(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(Number::from_f64(value))
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(Number::Int(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

/// A cell read from a worksheet, with its 0-based position.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) value: CellValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_doubles_become_integers() {
        assert_eq!(Number::from_f64(50000.0), Number::Int(50000));
        assert_eq!(Number::from_f64(-3.0), Number::Int(-3));
        assert_eq!(Number::from_f64(0.125), Number::Float(0.125));
        assert!(matches!(Number::from_f64(f64::NAN), Number::Float(_)));
        assert!(matches!(Number::from_f64(1e300), Number::Float(_)));
    }

    #[test]
    fn addition_keeps_integers_until_fractional() {
        assert_eq!(Number::Int(2) + Number::Int(3), Number::Int(5));
        assert_eq!(Number::Int(2) + Number::Float(0.5), Number::Float(2.5));
        assert_eq!(Number::Float(0.5) + Number::Float(0.5), Number::Float(1.0));
        assert_eq!(Number::Int(i64::MAX) + Number::Int(1), Number::Float(i64::MAX as f64 + 1.0));
    }

    #[test]
    fn numbers_serialize_by_kind() {
        assert_eq!(serde_json::to_string(&Number::Int(50000)).unwrap(), "50000");
        assert_eq!(serde_json::to_string(&Number::Float(0.1)).unwrap(), "0.1");
        assert_eq!(serde_json::to_string(&Number::Float(1.0)).unwrap(), "1.0");
    }

    #[test]
    fn labels() {
        assert_eq!(CellValue::Empty.to_label(), "");
        assert_eq!(CellValue::from(" b. Riskless rate=").to_label(), " b. Riskless rate=");
        assert_eq!(CellValue::from(5.0).to_label(), "5");
        assert_eq!(CellValue::from(0.1).to_label(), "0.1");
        assert_eq!(CellValue::Bool(true).to_label(), "TRUE");
        assert_eq!(CellValue::Error(to_error_value(0x07).to_owned()).to_label(), "#DIV/0!");
    }
}
