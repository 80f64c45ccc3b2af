use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use thiserror::Error;

use super::parse_datetime;
use super::zen::{parse_amount, ZenTable};

#[derive(Debug, PartialEq, Error)]
pub enum IncomeError {
    #[error("unknown grouping period '{0}', expected one of D, W, M, Q, Y")]
    UnknownPeriod(String),
    #[error("ZenMoney CSV has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("income total for the period ending {0} overflows")]
    TotalOverflow(NaiveDate),
}

/// Calendar bucket for income totals. Each bucket is labelled by its last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Day,
    /// Weeks end on Sunday.
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl FromStr for Period {
    type Err = IncomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "D" => Ok(Period::Day),
            "W" => Ok(Period::Week),
            "M" => Ok(Period::Month),
            "Q" => Ok(Period::Quarter),
            "Y" | "A" => Ok(Period::Year),
            _ => Err(IncomeError::UnknownPeriod(s.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Period::Day => "D",
            Period::Week => "W",
            Period::Month => "M",
            Period::Quarter => "Q",
            Period::Year => "Y",
        };
        f.write_str(code)
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

impl Period {
    /// Last day of the period containing `date`.
    pub fn end_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => {
                let days_to_sunday = (7 - date.weekday().num_days_from_sunday()) % 7;
                date + Days::new(u64::from(days_to_sunday))
            },
            Period::Month => last_day_of_month(date.year(), date.month()),
            Period::Quarter => last_day_of_month(date.year(), (date.month0() / 3 + 1) * 3),
            Period::Year => last_day_of_month(date.year(), 12),
        }
    }

    fn next_end(self, end: NaiveDate) -> Option<NaiveDate> {
        end.succ_opt().map(|next| self.end_of(next))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotal {
    pub period_end: NaiveDate,
    pub income: Decimal,
}

/// Total pure income per period.
///
/// A row counts when its income is positive and its outcome cell is empty, which
/// leaves out transfers between own accounts. Periods between the first and the
/// last income are reported with a zero total.
pub fn summarize_income(table: &ZenTable, period: Period) -> Result<Vec<PeriodTotal>, IncomeError> {
    for column in ["date", "income", "outcome"] {
        if !table.headers().iter().any(|header| header == column) {
            return Err(IncomeError::MissingColumn(column));
        }
    }

    let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for row in table.rows() {
        let outcome_empty = row.get("outcome").map_or(true, |cell| cell.trim().is_empty());
        let income = row.get("income").and_then(parse_amount).unwrap_or_default();
        if !outcome_empty || income <= Decimal::ZERO {
            continue;
        }

        let Some(date) = row.get("date").and_then(parse_datetime).map(|dt| dt.date()) else {
            debug!("skipping income row without a usable date: {:?}", row.cells());
            continue;
        };

        let period_end = period.end_of(date);
        let total = totals.entry(period_end).or_default();
        *total = total.checked_add(income).ok_or(IncomeError::TotalOverflow(period_end))?;
    }

    let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
        return Ok(Vec::new());
    };

    let mut summary = Vec::new();
    let mut current = Some(first);
    while let Some(period_end) = current.filter(|end| *end <= last) {
        summary.push(PeriodTotal {
            period_end,
            income: totals.get(&period_end).copied().unwrap_or_default(),
        });
        current = period.next_end(period_end);
    }

    Ok(summary)
}
