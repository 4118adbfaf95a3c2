//! Spreadsheet reading and writing.
//!
//! The rest of the crate only sees [`Sheet`]: an ordered list of rows of
//! [`Cell`]s taken from the first worksheet of a document.

use crate::error::{RankError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Worksheet name used when writing xlsx output.
pub const OUTPUT_SHEET_NAME: &str = "분석 결과";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the cell, following spreadsheet-to-JSON rules:
    /// blank text is 0, booleans are 1/0, anything unparsable is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => Some(0.0),
            Cell::Number(n) => Some(*n),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    Some(0.0)
                } else {
                    t.parse::<f64>().ok()
                }
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&Data> for Cell {
    fn from(d: &Data) -> Self {
        match d {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(x) => Cell::Number(*x),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::Error(_) => Cell::Empty,
            other => Cell::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Option<&[Cell]> {
        self.rows.first().map(|r| r.as_slice())
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        if self.rows.is_empty() { &[] } else { &self.rows[1..] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Ods,
    Csv,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" => Ok(SheetFormat::Xlsx),
            "xls" => Ok(SheetFormat::Xls),
            "ods" => Ok(SheetFormat::Ods),
            "csv" => Ok(SheetFormat::Csv),
            _ => Err(RankError::Parse(format!(
                "unsupported spreadsheet extension for '{}'",
                path.display()
            ))),
        }
    }
}

/// Reads the whole file into memory, then decodes its first sheet.
pub fn read_file(path: &Path) -> Result<Sheet> {
    let format = SheetFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read spreadsheet");
    read_sheet(bytes, format)
}

pub fn read_sheet(bytes: Vec<u8>, format: SheetFormat) -> Result<Sheet> {
    let sheet = match format {
        SheetFormat::Csv => read_csv(&bytes)?,
        _ => read_workbook(bytes)?,
    };
    debug!(rows = sheet.len(), ?format, "decoded sheet");
    Ok(sheet)
}

fn read_workbook(bytes: Vec<u8>) -> Result<Sheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| RankError::Parse(format!("cannot open workbook: {}", e)))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| RankError::Parse("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| RankError::Parse(format!("cannot read sheet '{}': {}", first, e)))?;
    let rows: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    Ok(Sheet { rows })
}

fn read_csv(bytes: &[u8]) -> Result<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RankError::Parse(format!("csv: {}", e)))?;
        rows.push(
            record
                .iter()
                .map(|f| if f.is_empty() { Cell::Empty } else { Cell::text(f) })
                .collect(),
        );
    }
    Ok(Sheet { rows })
}

pub fn write_sheet(sheet: &Sheet, format: SheetFormat) -> Result<Vec<u8>> {
    match format {
        SheetFormat::Xlsx => write_xlsx(sheet),
        SheetFormat::Csv => write_csv(sheet),
        other => Err(RankError::Export(format!("writing {:?} is not supported", other))),
    }
}

fn write_xlsx(sheet: &Sheet) -> Result<Vec<u8>> {
    let xlsx = |e: rust_xlsxwriter::XlsxError| RankError::Export(e.to_string());
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET_NAME).map_err(xlsx)?;
    for (r, row) in sheet.rows.iter().enumerate() {
        let r = r as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n).map_err(xlsx)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s.as_str()).map_err(xlsx)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(r, c, *b).map_err(xlsx)?;
                }
            }
        }
    }
    workbook.save_to_buffer().map_err(xlsx)
}

fn write_csv(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in &sheet.rows {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .map_err(|e| RankError::Export(format!("csv: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| RankError::Export(format!("csv: {}", e)))
}
