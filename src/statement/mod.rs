use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub mod credo;
pub mod har;
pub mod income;
pub mod matching;
pub mod transfers;
pub mod zen;

#[cfg(test)]
mod transfers_tests;

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Eleven digits of epoch milliseconds reach back to 1973.
const MIN_EPOCH_MILLIS_DIGITS: usize = 11;

/// Best-effort timestamp parsing for the formats seen in bank and ZenMoney exports.
///
/// Offsets are dropped and the local wall-clock time is kept. A bare date maps to
/// midnight. All-digit values are compact `YYYYMMDD` or `YYYYMMDDHHMMSS` dates at
/// 8 and 14 digits, epoch milliseconds when they have 11 digits or more.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return match raw.len() {
            8 => NaiveDate::parse_from_str(raw, "%Y%m%d").ok().and_then(|date| date.and_hms_opt(0, 0, 0)),
            14 => NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S").ok(),
            len if len >= MIN_EPOCH_MILLIS_DIGITS => {
                let millis = raw.parse::<i64>().ok()?;
                DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
            },
            _ => None,
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Identifiers show up as JSON strings or numbers depending on the endpoint.
pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
