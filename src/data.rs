use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::statement::income::PeriodTotal;
use crate::statement::matching::TransactionMatch;
use crate::statement::transfers::TransferPair;
use crate::statement::zen::ZenTable;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, PartialEq, Error)]
pub enum TableError {
    #[error("expected a JSON array of records")]
    NotAnArray,
    #[error("element {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// Read a whole input, from `path` or standard input.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut input)
                .context("failed to read standard input")?;
            Ok(input)
        },
    }
}

/// Writer for `path`, or standard output when no path is given.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        },
        None => Ok(Box::new(io::stdout().lock())),
    }
}

pub fn export_json<W: Write>(records: &[Value], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Records flattened into rows under the union of their keys.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    /// Columns appear in the order their key is first seen; absent keys are empty cells.
    pub fn from_records(records: &[Value]) -> Result<RecordTable, TableError> {
        let mut headers: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut objects = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or(TableError::NotAnObject { index })?;
            for key in object.keys() {
                if seen.insert(key.as_str()) {
                    headers.push(key.clone());
                }
            }
            objects.push(object);
        }

        let rows = objects
            .into_iter()
            .map(|object| {
                headers
                    .iter()
                    .map(|header| object.get(header).map(render_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(RecordTable { headers, rows })
    }

    pub fn from_json(json: &str) -> Result<RecordTable> {
        let document: Value = serde_json::from_str(json).context("input is not valid JSON")?;
        let records = document.as_array().ok_or(TableError::NotAnArray)?;

        Ok(RecordTable::from_records(records)?)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
        if !self.headers.is_empty() {
            csv_writer.write_record(&self.headers)?;
        }
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }

        csv_writer.flush()?;

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct TransferRecord {
    pub account_number: String,
    pub operation_date_time: String,
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub from_transaction_id: Option<String>,
    pub to_transaction_id: Option<String>,
    pub from_stmt_entry_id: Option<String>,
    pub to_stmt_entry_id: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub from_amount_equivalent: Option<Decimal>,
    pub to_amount_equivalent: Option<Decimal>,
}

impl From<&TransferPair> for TransferRecord {
    fn from(pair: &TransferPair) -> Self {
        TransferRecord {
            account_number: pair.account_number().clone(),
            operation_date_time: format_datetime(*pair.operated_at()),
            from_currency: pair.from_currency().clone(),
            to_currency: pair.to_currency().clone(),
            from_amount: *pair.from_amount(),
            to_amount: *pair.to_amount(),
            from_transaction_id: pair.from_transaction_id().clone(),
            to_transaction_id: pair.to_transaction_id().clone(),
            from_stmt_entry_id: pair.from_stmt_entry_id().clone(),
            to_stmt_entry_id: pair.to_stmt_entry_id().clone(),
            exchange_rate: *pair.exchange_rate(),
            from_amount_equivalent: *pair.from_amount_equivalent(),
            to_amount_equivalent: *pair.to_amount_equivalent(),
        }
    }
}

pub fn export_transfers<W: Write>(pairs: &[TransferPair], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    for pair in pairs {
        let record: TransferRecord = pair.into();
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;

    Ok(())
}

const MATCH_COLUMNS: [&str; 15] = [
    "zen_date",
    "zen_amount",
    "zen_amount_column",
    "credo_date",
    "credo_amount",
    "credo_description",
    "credo_currency",
    "credo_transaction_id",
    "match_quality",
    "is_currency_transfer",
    "transfer_type",
    "transfer_pair_currency",
    "transfer_pair_amount",
    "transfer_pair_transaction_id",
    "exchange_rate",
];

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

fn match_row(found: &TransactionMatch<'_>) -> Vec<String> {
    let credo = found.credo;
    let mut row = vec![
        format_date(found.zen_date),
        found.zen_amount.to_string(),
        found.zen_amount_column.to_string(),
        format_datetime(found.credo_date),
        found.credo_amount.to_string(),
        credo.description.clone().unwrap_or_default(),
        credo.currency.clone().unwrap_or_default(),
        credo.transaction_id.clone().unwrap_or_default(),
        found.quality.as_str().to_string(),
        found.transfer.is_some().to_string(),
    ];

    match found.transfer {
        Some(link) => row.extend([
            link.side.as_str().to_string(),
            link.counterpart_currency().unwrap_or_default().to_string(),
            link.counterpart_amount().to_string(),
            link.counterpart_transaction_id().unwrap_or_default().to_string(),
            link.exchange_rate().map(|rate| rate.to_string()).unwrap_or_default(),
        ]),
        None => row.extend(std::iter::repeat(String::new()).take(5)),
    }

    row.extend(found.zen_row.cells().iter().cloned());
    row
}

/// Matches as CSV: fixed match columns, then every ZenMoney column prefixed with `zen_`.
pub fn export_matches<W: Write>(matches: &[TransactionMatch<'_>], zen: &ZenTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    let header: Vec<String> = MATCH_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(zen.headers().iter().map(|column| format!("zen_{}", column)))
        .collect();
    csv_writer.write_record(&header)?;

    for found in matches {
        csv_writer.write_record(match_row(found))?;
    }

    csv_writer.flush()?;

    Ok(())
}

#[derive(Debug, Serialize)]
pub struct IncomeRecord {
    pub date: String,
    pub income: Decimal,
}

impl From<&PeriodTotal> for IncomeRecord {
    fn from(total: &PeriodTotal) -> Self {
        IncomeRecord {
            date: format_date(total.period_end),
            income: total.income,
        }
    }
}

pub fn export_income<W: Write>(totals: &[PeriodTotal], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    for total in totals {
        let record: IncomeRecord = total.into();
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;

    Ok(())
}
