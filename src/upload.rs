//! Uploaded file parsing: CSV text and spreadsheet workbooks

use crate::types::table::{Cell, Table, TableError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::debug;

/// Upload format, chosen by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Spreadsheet,
}

impl UploadFormat {
    /// Detect the format from the uploaded file name (case-insensitive suffix)
    pub fn from_file_name(name: &str) -> Result<Self, TableError> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(UploadFormat::Csv)
        } else if [".xlsx", ".xlsm", ".xls", ".ods"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            Ok(UploadFormat::Spreadsheet)
        } else {
            Err(TableError::UnsupportedFormat(name.to_string()))
        }
    }
}

fn column_name(raw: &str, index: usize) -> String {
    let name = raw.trim();
    if name.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        name.to_string()
    }
}

/// Parse an uploaded file into a table
pub fn read_table(file_name: &str, bytes: &[u8]) -> Result<Table, TableError> {
    let format = UploadFormat::from_file_name(file_name)?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(TableError::EmptyFile);
    }

    let table = match format {
        UploadFormat::Csv => read_csv(bytes)?,
        UploadFormat::Spreadsheet => read_spreadsheet(bytes)?,
    };

    debug!(
        file = %file_name,
        format = ?format,
        rows = table.row_count(),
        columns = table.columns().len(),
        "Parsed upload"
    );
    Ok(table)
}

/// Comma-delimited text with a header row
pub fn read_csv(bytes: &[u8]) -> Result<Table, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| TableError::Unreadable(e.to_string()))?;
    if headers.is_empty() {
        return Err(TableError::EmptyFile);
    }
    let mut table = Table::new(
        headers
            .iter()
            .enumerate()
            .map(|(i, h)| column_name(h, i))
            .collect(),
    );

    for record in reader.records() {
        let record = record.map_err(|e| TableError::Unreadable(e.to_string()))?;
        table.push_row(record.iter().map(Cell::parse).collect());
    }

    Ok(table)
}

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Int(v) => Cell::Int(*v),
        Data::Float(v) => Cell::Float(*v),
        Data::Bool(v) => Cell::Bool(*v),
        Data::String(v) if v.trim().is_empty() => Cell::Empty,
        Data::String(v) => Cell::parse(v),
        Data::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

/// First worksheet of a workbook; the first row is the header
pub fn read_spreadsheet(bytes: &[u8]) -> Result<Table, TableError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| TableError::Unreadable(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableError::Unreadable("workbook has no worksheets".to_string()))?
        .map_err(|e| TableError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or(TableError::EmptyFile)?;
    let mut table = Table::new(
        header
            .iter()
            .enumerate()
            .map(|(i, h)| column_name(&h.to_string(), i))
            .collect(),
    );

    for row in rows {
        table.push_row(row.iter().map(spreadsheet_cell).collect());
    }
    table.normalize_integral_columns();

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(UploadFormat::from_file_name("rides.csv").unwrap(), UploadFormat::Csv);
        assert_eq!(UploadFormat::from_file_name("RIDES.CSV").unwrap(), UploadFormat::Csv);
        assert_eq!(
            UploadFormat::from_file_name("rides.xlsx").unwrap(),
            UploadFormat::Spreadsheet
        );
        assert!(matches!(
            UploadFormat::from_file_name("rides.json"),
            Err(TableError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_csv() {
        let data = b"hr,temp,holiday,note\n8,0.5,0,\n17,0.62,1,busy\n";
        let table = read_table("upload.csv", data).unwrap();

        assert_eq!(table.columns(), &["hr", "temp", "holiday", "note"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.rows()[0],
            vec![Cell::Int(8), Cell::Float(0.5), Cell::Int(0), Cell::Empty]
        );
        assert_eq!(table.rows()[1][3], Cell::Text("busy".into()));
    }

    #[test]
    fn test_header_only_csv() {
        let table = read_csv(b"hr,temp\n").unwrap();
        assert_eq!(table.columns().len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_blank_header_gets_placeholder_name() {
        let table = read_csv(b",hr\n0,5\n").unwrap();
        assert_eq!(table.columns(), &["Unnamed: 0", "hr"]);
    }

    #[test]
    fn test_ragged_csv_is_unreadable() {
        let err = read_csv(b"a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, TableError::Unreadable(_)));
    }

    #[test]
    fn test_empty_upload() {
        assert!(matches!(read_table("x.csv", b""), Err(TableError::EmptyFile)));
        assert!(matches!(read_table("x.csv", b"  \n"), Err(TableError::EmptyFile)));
    }

    fn workbook(build: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        build(workbook.add_worksheet());
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_read_spreadsheet() {
        let bytes = workbook(|sheet| {
            for (col, name) in ["hr", "temp", "holiday", "note", "year"].iter().enumerate() {
                sheet.write_string(0, col as u16, *name).unwrap();
            }
            sheet.write_number(1, 0, 8).unwrap();
            sheet.write_number(1, 1, 0.5).unwrap();
            sheet.write_boolean(1, 2, false).unwrap();
            sheet.write_string(1, 3, "busy").unwrap();
            sheet.write_number(1, 4, 2012).unwrap();
            sheet.write_number(2, 0, 17).unwrap();
            sheet.write_number(2, 1, 2).unwrap();
            sheet.write_boolean(2, 2, true).unwrap();
            sheet.write_number(2, 4, 2012).unwrap();
        });

        let table = read_table("rides.xlsx", &bytes).unwrap();
        assert_eq!(table.columns(), &["hr", "temp", "holiday", "note", "year"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.rows()[0],
            vec![
                Cell::Int(8),
                Cell::Float(0.5),
                Cell::Bool(false),
                Cell::Text("busy".into()),
                Cell::Int(2012)
            ]
        );
        // the gap in `note` is empty; `temp` stays fractional as a column
        assert_eq!(
            table.rows()[1],
            vec![
                Cell::Int(17),
                Cell::Float(2.0),
                Cell::Bool(true),
                Cell::Empty,
                Cell::Int(2012)
            ]
        );
    }

    #[test]
    fn test_header_only_spreadsheet() {
        let bytes = workbook(|sheet| {
            sheet.write_string(0, 0, "hr").unwrap();
            sheet.write_string(0, 1, "temp").unwrap();
        });
        let table = read_table("rides.xlsx", &bytes).unwrap();
        assert_eq!(table.columns(), &["hr", "temp"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_garbage_spreadsheet_is_unreadable() {
        let err = read_table("x.xlsx", b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, TableError::Unreadable(_)));
    }
}
