//! Header mapping configuration

use serde::{Deserialize, Serialize};

use super::transaction::{BankId, TransactionField};

/// Links one raw CSV column name of a bank to the canonical fields it feeds
///
/// A single column may feed several fields, e.g. a combined description
/// column that populates both the description and the category inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    pub bank_id: BankId,
    /// Column name as it appears in the bank's export
    pub name: String,
    /// Whether an upload missing this column is rejected
    #[serde(default)]
    pub required: bool,
    /// Canonical fields fed by this column, in order
    pub fields: Vec<TransactionField>,
}
