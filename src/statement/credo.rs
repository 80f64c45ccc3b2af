use std::io::Read;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{deserialize_text, parse_datetime};

/// Typed view over one extracted transaction record.
///
/// Every field is optional: the bank omits whatever does not apply to a given
/// operation, and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredoTransaction {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub account_number: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub transaction_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stmt_entry_id: Option<String>,
    #[serde(default)]
    pub debit: Option<Decimal>,
    #[serde(default)]
    pub credit: Option<Decimal>,
    #[serde(default)]
    pub amount_equivalent: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub operation_date_time: Option<String>,
}

impl CredoTransaction {
    /// Signed amount: credits are positive, debits negative. `None` when the
    /// difference does not fit in a `Decimal`.
    pub fn amount(&self) -> Option<Decimal> {
        self.credit.unwrap_or_default().checked_sub(self.debit.unwrap_or_default())
    }

    pub fn operated_at(&self) -> Option<NaiveDateTime> {
        self.operation_date_time.as_deref().and_then(parse_datetime)
    }
}

/// Load the JSON array produced by `credo-extract`.
pub fn load_transactions<R: Read>(reader: R) -> Result<Vec<CredoTransaction>, serde_json::Error> {
    serde_json::from_reader(reader)
}
