use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use super::credo::CredoTransaction;
use super::transfers::{TransferIndex, TransferLink};
use super::zen::{parse_amount, parse_date, ZenRow, ZenTable};

const EXACT_THRESHOLD: Decimal = dec!(0.01);

#[derive(Debug, PartialEq, Error)]
pub enum MatchError {
    #[error("no date column found in ZenMoney CSV")]
    NoDateColumn,
    #[error("no amount column found in ZenMoney CSV")]
    NoAmountColumn,
    #[error("date tolerance of {0} days is out of range")]
    ToleranceOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOptions {
    /// `strftime` format of the ZenMoney date column.
    pub date_format: String,
    pub date_tolerance_days: i64,
    /// Relative tolerance, `0.01` is one percent.
    pub amount_tolerance: Decimal,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            date_format: "%Y-%m-%d".to_string(),
            date_tolerance_days: 1,
            amount_tolerance: dec!(0.01),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchQuality {
    Exact,
    Approximate,
}

impl MatchQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchQuality::Exact => "exact",
            MatchQuality::Approximate => "approximate",
        }
    }
}

/// A ZenMoney amount paired with a bank transaction.
#[derive(Debug, Clone)]
pub struct TransactionMatch<'a> {
    pub zen_date: NaiveDate,
    pub zen_amount: Decimal,
    pub zen_amount_column: &'a str,
    pub zen_row: ZenRow<'a>,
    pub credo: &'a CredoTransaction,
    pub credo_date: NaiveDateTime,
    pub credo_amount: Decimal,
    pub quality: MatchQuality,
    pub transfer: Option<TransferLink<'a>>,
}

fn date_column(headers: &[String]) -> Option<usize> {
    headers.iter().position(|header| header.to_lowercase().contains("date"))
}

fn columns_where<F>(headers: &[String], predicate: F) -> Vec<usize>
where
    F: Fn(&str) -> bool,
{
    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| predicate(&header.to_lowercase()))
        .map(|(index, _)| index)
        .collect()
}

/// Income columns then outcome columns; generic amount columns only when neither exists.
fn amount_columns(headers: &[String]) -> Vec<usize> {
    let mut columns = columns_where(headers, |h| h.contains("income") && !h.contains("currency"));
    columns.extend(columns_where(headers, |h| h.contains("outcome") && !h.contains("currency")));

    if columns.is_empty() {
        columns = columns_where(headers, |h| h.contains("amount") || h.contains("sum"));
    }

    columns
}

fn tolerance_bounds(amount: Decimal, tolerance: Decimal) -> Option<(Decimal, Decimal)> {
    let a = amount.checked_mul(Decimal::ONE.checked_sub(tolerance)?)?;
    let b = amount.checked_mul(Decimal::ONE.checked_add(tolerance)?)?;
    Some((a.min(b), a.max(b)))
}

/// Match every dated, non-zero ZenMoney amount against the bank transactions.
///
/// Outcome amounts are negated before comparison since bank debits are negative.
/// Every bank transaction inside both windows is reported, so one ZenMoney row
/// can produce several matches.
pub fn match_transactions<'a>(
    zen: &'a ZenTable,
    credo: &'a [CredoTransaction],
    transfers: &TransferIndex<'a>,
    options: &MatchOptions,
) -> Result<Vec<TransactionMatch<'a>>, MatchError> {
    let headers = zen.headers();
    let date_index = date_column(headers).ok_or(MatchError::NoDateColumn)?;
    let amount_indices = amount_columns(headers);
    if amount_indices.is_empty() {
        return Err(MatchError::NoAmountColumn);
    }

    let dated_credo: Vec<(&CredoTransaction, NaiveDateTime)> = credo
        .iter()
        .filter_map(|tx| tx.operated_at().map(|at| (tx, at)))
        .collect();
    debug!("{} of {} bank transactions have a usable date", dated_credo.len(), credo.len());

    let tolerance = Duration::try_days(options.date_tolerance_days)
        .ok_or(MatchError::ToleranceOutOfRange(options.date_tolerance_days))?;
    let mut matches = Vec::new();

    for row in zen.rows() {
        let Some(zen_date) = parse_date(row.cell(date_index), &options.date_format) else {
            continue;
        };
        let Some(midnight) = zen_date.and_hms_opt(0, 0, 0) else {
            continue;
        };
        let date_min = midnight.checked_sub_signed(tolerance).unwrap_or(NaiveDateTime::MIN);
        let date_max = midnight.checked_add_signed(tolerance).unwrap_or(NaiveDateTime::MAX);

        for &column in &amount_indices {
            let column_name = headers[column].as_str();
            let Some(mut zen_amount) = parse_amount(row.cell(column)) else {
                continue;
            };
            if zen_amount.is_zero() {
                continue;
            }
            if column_name.to_lowercase().contains("outcome") {
                zen_amount = -zen_amount.abs();
            }

            let Some((amount_min, amount_max)) = tolerance_bounds(zen_amount, options.amount_tolerance) else {
                debug!("amount {} in column {} overflows the tolerance window, skipping", zen_amount, column_name);
                continue;
            };

            for &(tx, credo_date) in &dated_credo {
                if credo_date < date_min || credo_date > date_max {
                    continue;
                }

                let Some(credo_amount) = tx.amount() else {
                    debug!("amount of bank transaction {:?} overflows, skipping", tx.transaction_id);
                    continue;
                };
                if credo_amount < amount_min || credo_amount > amount_max {
                    continue;
                }

                let difference = zen_amount.checked_sub(credo_amount).map(|diff| diff.abs());
                let quality = if difference.is_some_and(|diff| diff < EXACT_THRESHOLD) {
                    MatchQuality::Exact
                } else {
                    MatchQuality::Approximate
                };

                matches.push(TransactionMatch {
                    zen_date,
                    zen_amount,
                    zen_amount_column: column_name,
                    zen_row: row,
                    credo: tx,
                    credo_date,
                    credo_amount,
                    quality,
                    transfer: tx.transaction_id.as_deref().and_then(|id| transfers.get(id)),
                });
            }
        }
    }

    info!("found {} matches", matches.len());

    Ok(matches)
}
