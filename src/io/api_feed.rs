//! Banking API transaction feed
//!
//! Converts the JSON transaction list returned by a bank's API into canonical
//! transactions. Fetching the feed (authorization, HTTP) happens elsewhere;
//! this module only sees the response body.
//!
//! Entries are converted independently. An entry whose creation time cannot
//! be parsed is skipped and its ID is grouped under the error message.

use std::collections::BTreeMap;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::strategy::ParseContext;
use crate::types::{FieldError, Transaction, TransactionField, TransactionType, UploadError};

/// One entry of the feed
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedTransaction {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    /// Signed amount in minor units (pence, cents)
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    /// RFC 3339 creation time
    #[serde(default)]
    pub created: String,
    /// The API's own category label
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: String,
    /// Payment scheme, e.g. `mastercard` or `faster_payments`
    #[serde(default)]
    pub scheme: String,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    transactions: Vec<FeedTransaction>,
}

/// Outcome of converting a feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedFeed {
    pub transactions: Vec<Transaction>,
    /// Error message → IDs of the entries skipped for it
    pub skipped: BTreeMap<String, Vec<String>>,
}

/// Outcome of importing a feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedReport {
    /// Entries turned into transactions
    pub converted: usize,
    /// Transactions newly inserted by the sink
    pub persisted: usize,
    /// Error message → IDs of the entries skipped for it
    pub skipped: BTreeMap<String, Vec<String>>,
}

/// Decode a feed response body
pub fn parse_feed(content: &[u8]) -> Result<Vec<FeedTransaction>, UploadError> {
    let response: FeedResponse =
        serde_json::from_slice(content).map_err(|e| UploadError::InvalidFormat {
            message: e.to_string(),
        })?;
    Ok(response.transactions)
}

/// Convert feed entries for the bank and user of `context`
pub fn convert_feed(entries: Vec<FeedTransaction>, context: &ParseContext) -> ConvertedFeed {
    let mut converted = ConvertedFeed {
        transactions: Vec::with_capacity(entries.len()),
        skipped: BTreeMap::new(),
    };

    for entry in entries {
        match convert_entry(&entry, context) {
            Ok(tx) => converted.transactions.push(tx),
            Err(e) => converted
                .skipped
                .entry(e.to_string())
                .or_default()
                .push(entry.id),
        }
    }

    converted
}

fn convert_entry(
    entry: &FeedTransaction,
    context: &ParseContext,
) -> Result<Transaction, FieldError> {
    let created = entry.created.trim();
    if created.is_empty() {
        return Err(FieldError::empty(TransactionField::Date));
    }
    let date = DateTime::parse_from_rfc3339(created)
        .map_err(|_| FieldError::invalid_date(created))?
        .naive_utc();

    let mut tx = Transaction::new(context.bank_id, context.user_id);
    tx.external_id = entry.id.clone();
    tx.transaction_date = Some(date);
    tx.amount = Some(Decimal::new(entry.amount, 2));
    tx.tx_type = if entry.amount < 0 {
        TransactionType::Outcome
    } else {
        TransactionType::Income
    };
    tx.description = describe(entry);
    tx.category_id = context
        .keywords
        .infer_from_parts(&[entry.category.as_str(), entry.description.as_str()]);
    Ok(tx)
}

/// Non-empty description, category, notes and scheme joined by `", "`
fn describe(entry: &FeedTransaction) -> String {
    [&entry.description, &entry.category, &entry.notes, &entry.scheme]
        .into_iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
