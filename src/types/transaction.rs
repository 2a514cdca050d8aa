//! Canonical transaction types
//!
//! Every bank-specific input (CSV export or API feed) is normalized into the
//! [`Transaction`] shape defined here.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::{CategoryId, UNCATEGORIZED_ID};

/// Bank identifier
pub type BankId = i64;

/// User identifier
pub type UserId = i64;

/// Direction of a transaction
///
/// Parsers start every row as `Unspecified` and only move it to `Income` or
/// `Outcome` when the bank's format lets them infer the direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming into the account
    Income,

    /// Money leaving the account
    Outcome,

    /// Direction could not be inferred
    #[default]
    Unspecified,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::Income => "income",
            TransactionType::Outcome => "outcome",
            TransactionType::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

/// Canonical transaction fields a CSV column can feed
///
/// The declaration order is the order in which parsers run field handlers for
/// a row, so bank-specific post-processing always sees amount and category
/// already populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionField {
    Date,
    Amount,
    Description,
    Category,
    ExternalId,
}

impl TransactionField {
    /// All fields in handler order
    pub const ALL: [TransactionField; 5] = [
        TransactionField::Date,
        TransactionField::Amount,
        TransactionField::Description,
        TransactionField::Category,
        TransactionField::ExternalId,
    ];
}

impl fmt::Display for TransactionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionField::Date => "date",
            TransactionField::Amount => "amount",
            TransactionField::Description => "description",
            TransactionField::Category => "category",
            TransactionField::ExternalId => "external_id",
        };
        f.write_str(name)
    }
}

/// Canonical transaction record
///
/// Bank and user are injected by the caller, never parsed from the row. The
/// category and type always hold a valid value: [`Transaction::new`] seeds
/// them with the uncategorized sentinel and `Unspecified` before any field
/// handler runs, so partially parsed rows still carry canonical defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Bank the transaction was imported from
    pub bank_id: BankId,

    /// Owner of the transaction
    pub user_id: UserId,

    /// Identifier assigned by the source (empty when the source has none)
    pub external_id: String,

    /// Signed amount; `None` when the amount could not be parsed
    pub amount: Option<Decimal>,

    /// Spending category
    pub category_id: CategoryId,

    /// Free-text description
    pub description: String,

    /// Direction of the transaction
    pub tx_type: TransactionType,

    /// When the transaction happened; `None` when the date could not be parsed
    pub transaction_date: Option<NaiveDateTime>,

    /// Number of identical rows preceding this one in the same upload
    ///
    /// Tells apart repeated rows without an external ID, such as two equal
    /// fares on one day.
    pub occurrence: u32,

    /// When this record was built
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction carrying only the caller-injected identity and
    /// the canonical defaults
    pub fn new(bank_id: BankId, user_id: UserId) -> Self {
        Transaction {
            bank_id,
            user_id,
            external_id: String::new(),
            amount: None,
            category_id: UNCATEGORIZED_ID,
            description: String::new(),
            tx_type: TransactionType::Unspecified,
            transaction_date: None,
            occurrence: 0,
            created_at: Utc::now(),
        }
    }
}
