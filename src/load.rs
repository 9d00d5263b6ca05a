use super::error::LoadError;
use super::{DateTimeNum, TimeTemperature, COLUMNS};
use calamine::{open_workbook_auto, DataType, Reader};
use chrono::prelude::*;
use std::fmt;
use std::path::Path;

/// serial day of 1970-01-01 in spreadsheet dates (day 0 is 1899-12-30)
const SPREADSHEET_UNIX_EPOCH: f64 = 25569.;

const TEXT_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];
const TEXT_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// A single spreadsheet cell, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn from_text(s: &str) -> Cell {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else if let Ok(v) = s.parse::<f64>() {
            Cell::Number(v)
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn from_calamine(c: &DataType) -> Cell {
        match c {
            DataType::Empty => Cell::Empty,
            DataType::Float(v) => Cell::Number(*v),
            DataType::Int(v) => Cell::Number(*v as f64),
            DataType::DateTime(v) => match from_spreadsheet_serial(*v) {
                Some(dt) => Cell::DateTime(dt),
                None => Cell::Number(*v),
            },
            // ods stores dates and times as iso text
            DataType::DateTimeIso(s) => match parse_datetime(s) {
                Some(dt) => Cell::DateTime(dt),
                None => Cell::Text(s.clone()),
            },
            DataType::Duration(v) => Cell::Number(*v),
            DataType::String(s) => Cell::from_text(s),
            DataType::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(format!("{:?}", other)),
        }
    }

    /// numeric coercion, NaN counts as missing
    fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if !v.is_nan() => Some(*v),
            Cell::Text(s) => s.parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        }
    }

    fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(v) => v.is_nan(),
            _ => false,
        }
    }

    fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Number(v) => from_spreadsheet_serial(*v),
            Cell::Text(s) => parse_datetime(s),
            Cell::Empty => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::DateTime(dt) => write!(f, "{}", dt.format(super::DT_FORMAT)),
        }
    }
}

/// A row as read from the file, with its 1-based row number.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: usize,
    pub cells: [Cell; 3],
}

impl RawRow {
    /// pads short rows with empty cells and ignores extra columns
    pub fn new(line: usize, mut cells: Vec<Cell>) -> RawRow {
        cells.resize(COLUMNS.len(), Cell::Empty);
        let mut it = cells.into_iter();
        let mut next = || it.next().unwrap_or(Cell::Empty);
        RawRow {
            line,
            cells: [next(), next(), next()],
        }
    }
}

/// Why a row was dropped during cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Missing { column: &'static str },
    NonNumeric { value: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Missing { column } => write!(f, "missing value in column {}", column),
            Rejection::NonNumeric { value } => {
                write!(f, "'{}' is not a numeric temperature", value)
            }
        }
    }
}

/// A row that passed validation; the time stamp is not interpreted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRow<'a> {
    pub time: &'a Cell,
    pub celsius: f64,
    pub fahrenheit: &'a Cell,
}

/// Checks one row: no missing cell anywhere, numeric celsius.
pub fn validate_row(row: &RawRow) -> Result<ValidRow<'_>, Rejection> {
    if let Some(i) = row.cells.iter().position(Cell::is_missing) {
        return Err(Rejection::Missing { column: COLUMNS[i] });
    }
    let [time, celsius, fahrenheit] = &row.cells;
    let celsius = celsius.to_number().ok_or_else(|| Rejection::NonNumeric {
        value: celsius.to_string(),
    })?;
    Ok(ValidRow {
        time,
        celsius,
        fahrenheit,
    })
}

/// The cleaned table together with the rows that were dropped.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub data: TimeTemperature,
    pub rejected: Vec<(usize, Rejection)>,
}

/// Drops invalid rows, keeping the original order, and parses the time stamps.
/// An unparsable time stamp on an otherwise valid row is an error.
pub fn clean(rows: &[RawRow]) -> Result<Cleaned, LoadError> {
    let mut data = TimeTemperature::new(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        let valid = match validate_row(row) {
            Ok(v) => v,
            Err(r) => {
                log::debug!("dropping row {}: {}", row.line, r);
                rejected.push((row.line, r));
                continue;
            }
        };
        let time = valid.time.to_datetime().ok_or_else(|| LoadError::Timestamp {
            row: row.line,
            value: valid.time.to_string(),
        })?;
        data.time.push(time);
        data.celsius.push(valid.celsius);
        data.fahrenheit.push(valid.fahrenheit.to_string());
    }
    Ok(Cleaned { data, rejected })
}

/// Reads all rows of the first worksheet, or of a csv file, without any header.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        "csv" => read_csv(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

fn read_workbook(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let workbook_err = |source| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet(path.to_path_buf()))?
        .map_err(workbook_err)?;
    let first_line = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let rows = range
        .rows()
        .enumerate()
        .map(|(i, r)| RawRow::new(first_line + i, r.iter().map(Cell::from_calamine).collect()))
        .collect();
    Ok(rows)
}

fn read_csv(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        rows.push(RawRow::new(i + 1, record.iter().map(Cell::from_text).collect()));
    }
    Ok(rows)
}

/// Reads and cleans the spreadsheet into the measurement table.
pub fn read_data(path: &Path) -> Result<TimeTemperature, LoadError> {
    let rows = read_rows(path)?;
    log::info!("read {} rows from {}", rows.len(), path.display());
    let cleaned = clean(&rows)?;
    if !cleaned.rejected.is_empty() {
        log::warn!(
            "dropped {} rows with missing or non-numeric values",
            cleaned.rejected.len()
        );
    }
    Ok(cleaned.data)
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TEXT_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            TEXT_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// spreadsheet serial date (days since 1899-12-30) to datetime, millisecond precision
pub fn from_spreadsheet_serial(serial: f64) -> Option<NaiveDateTime> {
    NaiveDateTime::from_day_number(serial - SPREADSHEET_UNIX_EPOCH)
}
