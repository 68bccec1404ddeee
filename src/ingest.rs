//! Ingestion normalizer for delimited text and spreadsheet input.
//!
//! Produces the ordered [`RawRow`] sequence the rest of the pipeline
//! consumes. Header names are trimmed and upper-cased here, once; source
//! row order is preserved because it breaks ties between weighings that
//! share a date.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use thiserror::Error;
use tracing::debug;

use crate::fields::{RawRow, Scalar, normalize_header};

/// Fatal ingestion failures. Anything row-shaped that merely fails to
/// resolve is not an error and never reaches this type.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("spreadsheet contains no sheets")]
    EmptyWorkbook,

    #[error("input has no usable header row")]
    MissingHeader,
}

/// Source file format, decided by the caller (normally from the extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

impl InputFormat {
    /// Guesses the format from a file extension. `.csv` is delimited text;
    /// `.xlsx`/`.xls` are spreadsheets.
    pub fn from_path(path: &Path) -> Option<InputFormat> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Some(InputFormat::Csv),
            Some("xlsx") | Some("xls") => Some(InputFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Parses delimited text into normalized rows.
///
/// The first row is the header. Fully empty rows are skipped; numeric
/// strings are typed as numbers.
///
/// # Errors
///
/// Returns [`IngestError`] when the content is structurally unreadable or
/// carries no usable header.
pub fn parse_csv(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let mut fields = HashMap::with_capacity(headers.len());
        for (col, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let scalar = record
                .get(col)
                .map(Scalar::from_text)
                .unwrap_or(Scalar::Empty);
            fields.insert(header.clone(), scalar);
        }
        let row = RawRow::new(index, fields);
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), "Delimited input normalized");
    Ok(rows)
}

/// Parses spreadsheet bytes into normalized rows.
///
/// Only the first sheet is read; its first row is the header. Date cells
/// surface as serial numbers and are resolved later by the date resolver.
///
/// # Errors
///
/// Returns [`IngestError`] when the workbook is unreadable, has no sheets,
/// or carries no usable header.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Vec<RawRow>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyWorkbook)??;

    let mut row_iter = range.rows();
    let header_row = row_iter.next().ok_or(IngestError::MissingHeader)?;
    let headers: Vec<String> = header_row.iter().map(header_from_cell).collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (index, cells) in row_iter.enumerate() {
        let mut fields = HashMap::with_capacity(headers.len());
        for (col, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let scalar = cells
                .get(col)
                .map(scalar_from_cell)
                .unwrap_or(Scalar::Empty);
            fields.insert(header.clone(), scalar);
        }
        let row = RawRow::new(index, fields);
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), "Spreadsheet input normalized");
    Ok(rows)
}

fn header_from_cell(cell: &Data) -> String {
    match cell {
        Data::String(s) => normalize_header(s),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format!("{}", f),
        _ => String::new(),
    }
}

fn scalar_from_cell(cell: &Data) -> Scalar {
    match cell {
        Data::Int(i) => Scalar::Number(*i as f64),
        Data::Float(f) => Scalar::Number(*f),
        Data::String(s) => Scalar::from_text(s),
        Data::Bool(b) => Scalar::Text(b.to_string()),
        Data::DateTime(dt) => Scalar::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Scalar::Text(s.clone()),
        Data::Error(_) | Data::Empty => Scalar::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::LogicalField;

    #[test]
    fn test_parse_csv_normalizes_headers() {
        let rows = parse_csv(" animal ,Data,peso\nB001,15/03/2024,250\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text(LogicalField::Identifier).unwrap(), "B001");
        assert_eq!(rows[0].number(LogicalField::Weight), Some(250.0));
    }

    #[test]
    fn test_parse_csv_types_numeric_strings() {
        let rows = parse_csv("ANIMAL,PESO\nB001,287.5\n").unwrap();
        assert_eq!(
            rows[0].resolve(LogicalField::Weight),
            Some(&Scalar::Number(287.5))
        );
    }

    #[test]
    fn test_parse_csv_skips_fully_empty_rows() {
        let rows = parse_csv("ANIMAL,PESO\nB001,250\n,\nB002,300\n").unwrap();
        assert_eq!(rows.len(), 2);
        // Source indexes still reflect original row order.
        assert_eq!(rows[0].source_index, 0);
        assert_eq!(rows[1].source_index, 2);
    }

    #[test]
    fn test_parse_csv_short_rows_pad_with_empty() {
        let rows = parse_csv("ANIMAL,DATA,PESO\nB001,15/03/2024\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].resolve(LogicalField::Weight).is_none());
    }

    #[test]
    fn test_parse_csv_without_header_is_fatal() {
        let err = parse_csv("").unwrap_err();
        assert!(matches!(err, IngestError::MissingHeader));
    }

    #[test]
    fn test_parse_spreadsheet_rejects_garbage() {
        let err = parse_spreadsheet(&[0xFF, 0xFE, 0x00, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Spreadsheet(_) | IngestError::Io(_)
        ));
    }

    #[test]
    fn test_scalar_from_cell_mapping() {
        assert_eq!(scalar_from_cell(&Data::Int(12)), Scalar::Number(12.0));
        assert_eq!(
            scalar_from_cell(&Data::Float(44197.0)),
            Scalar::Number(44197.0)
        );
        assert_eq!(
            scalar_from_cell(&Data::String("Pasto A".into())),
            Scalar::Text("Pasto A".into())
        );
        assert_eq!(scalar_from_cell(&Data::Empty), Scalar::Empty);
    }

    #[test]
    fn test_input_format_from_path() {
        assert_eq!(
            InputFormat::from_path(Path::new("pesagens.csv")),
            Some(InputFormat::Csv)
        );
        assert_eq!(
            InputFormat::from_path(Path::new("Pesagens.XLSX")),
            Some(InputFormat::Spreadsheet)
        );
        assert_eq!(InputFormat::from_path(Path::new("dados.txt")), None);
    }
}
