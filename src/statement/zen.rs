//! ZenMoney CSV exports.
//!
//! ZenMoney prepends a banner line before the real header and the delimiter
//! depends on the locale the export was made in, so both are detected.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rust_decimal::Decimal;
use thiserror::Error;

const HEADER_INDICATORS: [&str; 6] = ["date", "category", "payee", "comment", "outcome", "income"];
const MIN_HEADER_INDICATORS: usize = 3;
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

#[derive(Debug, Error)]
pub enum ZenError {
    #[error("failed to read ZenMoney export: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed ZenMoney CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("header row {row} is past the end of the file ({lines} lines)")]
    HeaderRowOutOfRange { row: usize, lines: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZenTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// One data row, with cells addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct ZenRow<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> ZenRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|header| header == column)
            .map(|index| self.cell(index))
    }

    pub fn cell(&self, index: usize) -> &'a str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}

impl ZenTable {
    pub fn load<P: AsRef<Path>>(path: P, header_row: Option<usize>) -> Result<ZenTable, ZenError> {
        let text = fs::read_to_string(path)?;
        ZenTable::parse(&text, header_row)
    }

    /// Parse an export, auto-detecting the header row unless one is given.
    pub fn parse(text: &str, header_row: Option<usize>) -> Result<ZenTable, ZenError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines: Vec<&str> = text.split_inclusive('\n').collect();

        let header_row = header_row.unwrap_or_else(|| find_header_row(text));
        if header_row >= lines.len() {
            return Err(ZenError::HeaderRowOutOfRange { row: header_row, lines: lines.len() });
        }

        let body = lines[header_row..].concat();
        let delimiter = detect_delimiter(lines[header_row]);
        debug!("zen export: header row {}, delimiter {:?}", header_row, delimiter as char);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }

            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.resize(headers.len().max(cells.len()), String::new());
            rows.push(cells);
        }

        Ok(ZenTable { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> impl Iterator<Item = ZenRow<'_>> {
        self.rows.iter().map(|cells| ZenRow {
            headers: &self.headers,
            cells,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// First line naming enough of the usual ZenMoney columns, or line 0.
pub fn find_header_row(text: &str) -> usize {
    text.lines()
        .position(|line| {
            let line = line.to_lowercase();
            HEADER_INDICATORS
                .iter()
                .filter(|indicator| line.contains(*indicator))
                .count()
                >= MIN_HEADER_INDICATORS
        })
        .unwrap_or(0)
}

/// First delimiter that splits the header line into more than one column.
pub fn detect_delimiter(header_line: &str) -> u8 {
    DELIMITERS
        .iter()
        .copied()
        .find(|&delimiter| {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .from_reader(header_line.as_bytes());

            matches!(reader.records().next(), Some(Ok(record)) if record.len() > 1)
        })
        .unwrap_or(b',')
}

/// Parse an amount written with either decimal separator and optional digit grouping spaces.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Parse a date with an explicit `strftime` format. Formats with a time part
/// are accepted too; the time is dropped.
pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, format)
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, format).ok().map(|dt| dt.date()))
}
