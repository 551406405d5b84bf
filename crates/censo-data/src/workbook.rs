//! Decoded workbook model and the reader seam.
//!
//! Binary spreadsheet decoding is not this crate's business: an external
//! reader produces a [`Workbook`] — ordered sheets of typed cells — and
//! everything downstream consumes only that. [`JsonWorkbookReader`] handles
//! the decoded-JSON form used by the CLI and the test suites.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use censo_core::error::{CensoError, Result};

/// One spreadsheet cell.
///
/// Serialized untagged: `null` is empty, numbers stay numbers, ISO
/// `YYYY-MM-DD` strings become date cells, anything else is text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    /// The cell's content as display text.
    ///
    /// Whole numbers print without a decimal point so identifier columns
    /// that arrive as numeric cells keep their digits intact.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Date(d) => d.format("%d-%m-%Y").to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// One worksheet: a stable name and a row-major cell grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

/// A whole decoded workbook, sheets in their original tab order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

/// The seam to the external spreadsheet decoder.
pub trait WorkbookReader {
    /// Decode raw file bytes into a [`Workbook`].
    fn read(bytes: &[u8], filename: &str) -> Result<Workbook>;
}

/// Reader for workbooks already decoded to JSON.
pub struct JsonWorkbookReader;

impl WorkbookReader for JsonWorkbookReader {
    fn read(bytes: &[u8], filename: &str) -> Result<Workbook> {
        serde_json::from_slice(bytes).map_err(|e| CensoError::WorkbookDecode {
            file: filename.to_string(),
            cause: e.to_string(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── Cell ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_cell_text_number_whole() {
        assert_eq!(Cell::Number(12345678.0).text(), "12345678");
    }

    #[test]
    fn test_cell_text_number_fractional() {
        assert_eq!(Cell::Number(61.5).text(), "61.5");
    }

    #[test]
    fn test_cell_text_trims() {
        assert_eq!(Cell::Text("  NEUMONIA  ".to_string()).text(), "NEUMONIA");
    }

    #[test]
    fn test_cell_text_date() {
        assert_eq!(Cell::Date(date(2025, 11, 1)).text(), "01-11-2025");
    }

    #[test]
    fn test_cell_is_blank() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::Text("   ".to_string()).is_blank());
        assert!(!Cell::Text("x".to_string()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    // ── Cell serde ────────────────────────────────────────────────────────────

    #[test]
    fn test_cell_deserialize_variants() {
        let cells: Vec<Cell> =
            serde_json::from_str(r#"[null, 42.0, "2025-11-01", "PEREZ"]"#).unwrap();
        assert_eq!(cells[0], Cell::Empty);
        assert_eq!(cells[1], Cell::Number(42.0));
        assert_eq!(cells[2], Cell::Date(date(2025, 11, 1)));
        assert_eq!(cells[3], Cell::Text("PEREZ".to_string()));
    }

    #[test]
    fn test_cell_serialize_empty_as_null() {
        assert_eq!(serde_json::to_string(&Cell::Empty).unwrap(), "null");
    }

    // ── JsonWorkbookReader ────────────────────────────────────────────────────

    #[test]
    fn test_json_reader_roundtrip() {
        let json = r#"{
            "sheets": [
                {"name": "01-11", "rows": [["RUT", "NOMBRE"], ["1-9", "PEREZ"]]}
            ]
        }"#;
        let wb = JsonWorkbookReader::read(json.as_bytes(), "test.json").unwrap();
        assert_eq!(wb.sheets.len(), 1);
        assert_eq!(wb.sheets[0].name, "01-11");
        assert_eq!(wb.sheets[0].rows.len(), 2);
    }

    #[test]
    fn test_json_reader_bad_input_is_decode_error() {
        let err = JsonWorkbookReader::read(b"not json", "bad.json").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Failed to decode workbook"));
        assert!(msg.contains("bad.json"));
    }

    #[test]
    fn test_json_reader_missing_sheets_defaults_empty() {
        let wb = JsonWorkbookReader::read(b"{}", "empty.json").unwrap();
        assert!(wb.sheets.is_empty());
    }
}
