//! Transaction extraction from browser HAR captures.
//!
//! The bank's web client pages through transactions with a JSON API. A HAR
//! export of a browsing session therefore holds every page the user scrolled
//! through, each one a response body carrying `data.transactionPagingList.itemList`.
//! The extractor parses the capture once, keeps the bodies that mention the
//! paging list and concatenates their item lists in capture order.

use std::borrow::Cow;
use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Substring identifying a transaction-paging response body.
pub const TRANSACTION_MARKER: &str = "transactionPagingList";

const ITEM_LIST_POINTER: &str = "/data/transactionPagingList/itemList";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid HAR document: {0}")]
    Har(#[source] serde_json::Error),
    #[error("entry {entry}: response body is not valid JSON: {source}")]
    Payload {
        entry: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("entry {entry}: response has no data.transactionPagingList.itemList")]
    MissingItemList { entry: usize },
    #[error("entry {entry}: data.transactionPagingList.itemList is not an array")]
    InvalidItemList { entry: usize },
}

/// What to do with a matching response that lacks the item list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingItemList {
    /// Abort the whole extraction.
    #[default]
    Fail,
    /// Log a warning and move on to the next entry.
    Skip,
}

/// An explicit `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
pub struct Har {
    #[serde(default, deserialize_with = "null_as_default")]
    pub log: Log,
}

#[derive(Debug, Default, Deserialize)]
pub struct Log {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: Response,
}

#[derive(Debug, Default, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Content,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl Content {
    /// Response body as text, decoding base64 bodies.
    ///
    /// Undecodable bodies yield `None`: they cannot be a JSON transaction page.
    pub fn body(&self) -> Option<Cow<'_, str>> {
        let text = self.text.as_deref()?;

        match self.encoding.as_deref() {
            Some(encoding) if encoding.eq_ignore_ascii_case("base64") => match STANDARD.decode(text.trim()) {
                Ok(bytes) => Some(Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())),
                Err(err) => {
                    debug!("undecodable base64 body, err={}", err);
                    None
                },
            },
            _ => Some(Cow::Borrowed(text)),
        }
    }
}

impl Har {
    /// Parse a HAR document. Well-formed JSON that is not an object has no entries.
    pub fn parse(har_text: &str) -> Result<Har, ExtractError> {
        let document: Value = serde_json::from_str(har_text).map_err(ExtractError::Har)?;

        if !document.is_object() {
            debug!("input is not a HAR object, treating it as an empty log");
            return Ok(Har::default());
        }

        Har::deserialize(document).map_err(ExtractError::Har)
    }
}

#[derive(Debug, Clone)]
pub struct Extractor {
    marker: String,
    missing: MissingItemList,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor {
            marker: TRANSACTION_MARKER.to_string(),
            missing: MissingItemList::default(),
        }
    }
}

impl Extractor {
    pub fn new() -> Extractor {
        Extractor::default()
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Extractor {
        self.marker = marker.into();
        self
    }

    pub fn with_missing_item_list(mut self, missing: MissingItemList) -> Extractor {
        self.missing = missing;
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Concatenate the item lists of every matching response, in entry order.
    ///
    /// The first failure aborts the run and nothing is returned.
    pub fn extract(&self, har_text: &str) -> Result<Vec<Value>, ExtractError> {
        let har = Har::parse(har_text)?;
        let mut records = Vec::new();

        for (index, entry) in har.log.entries.iter().enumerate() {
            let Some(body) = entry.response.content.body() else {
                continue;
            };

            if !body.contains(self.marker.as_str()) {
                debug!("skipping entry {}, no transaction marker", index);
                continue;
            }

            let mut payload: Value =
                serde_json::from_str(&body).map_err(|source| ExtractError::Payload { entry: index, source })?;

            match payload.pointer_mut(ITEM_LIST_POINTER).map(Value::take) {
                Some(Value::Array(items)) => {
                    debug!("entry {} holds {} transactions", index, items.len());
                    records.extend(items);
                },
                Some(Value::Null) | None => match self.missing {
                    MissingItemList::Fail => return Err(ExtractError::MissingItemList { entry: index }),
                    MissingItemList::Skip => warn!("entry {} matched but has no item list, skipping", index),
                },
                Some(_) => return Err(ExtractError::InvalidItemList { entry: index }),
            }
        }

        Ok(records)
    }

    pub fn extract_reader<R: Read>(&self, mut reader: R) -> Result<Vec<Value>, ExtractError> {
        let mut har_text = String::new();
        reader.read_to_string(&mut har_text)?;
        self.extract(&har_text)
    }
}

/// Extract with the default marker and strict missing-field handling.
pub fn extract(har_text: &str) -> Result<Vec<Value>, ExtractError> {
    Extractor::default().extract(har_text)
}
