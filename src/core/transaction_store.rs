//! Thread-safe, month-partitioned transaction storage
//!
//! This module provides [`InMemoryTransactionStore`], the in-process
//! implementation of the [`TransactionSink`] persistence contract.
//!
//! # Design
//!
//! Rows are filed into partitions keyed by the month of their transaction
//! date (`YYYY_MM`); rows without a date go to the `undated` partition. A
//! concurrent set of natural keys makes every insert an upsert-or-skip:
//! the first occurrence of a key wins and later ones are ignored.
//!
//! # Thread Safety
//!
//! Both maps are `DashMap`-backed, so chunk workers persisting different
//! batches proceed in parallel. Claiming a natural key is atomic, which keeps
//! concurrent uploads of overlapping files from inserting the same row twice.
//!
//! # Strict partitions
//!
//! A store built with [`InMemoryTransactionStore::with_strict_partitions`]
//! behaves like a partitioned relational table: a batch containing a row for
//! a month without a partition (or an undated row) is rejected as a whole.

use chrono::{Months, NaiveDate, NaiveDateTime};
use dashmap::{DashMap, DashSet};
use rust_decimal::Decimal;

use super::traits::TransactionSink;
use crate::types::{BankId, StoreError, Transaction, UserId};

/// Partition of rows whose date could not be parsed
pub const UNDATED_PARTITION: &str = "undated";

/// Uniqueness key of a stored transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    /// Rows carrying a source-assigned ID
    External {
        bank_id: BankId,
        external_id: String,
    },
    /// Rows without an ID are identified by their content and by how many
    /// identical rows precede them in their upload
    Fingerprint {
        bank_id: BankId,
        user_id: UserId,
        date: Option<NaiveDateTime>,
        amount: Option<Decimal>,
        description: String,
        occurrence: u32,
    },
}

impl NaturalKey {
    pub fn of(tx: &Transaction) -> Self {
        if tx.external_id.is_empty() {
            NaturalKey::Fingerprint {
                bank_id: tx.bank_id,
                user_id: tx.user_id,
                date: tx.transaction_date,
                amount: tx.amount,
                description: tx.description.clone(),
                occurrence: tx.occurrence,
            }
        } else {
            NaturalKey::External {
                bank_id: tx.bank_id,
                external_id: tx.external_id.clone(),
            }
        }
    }
}

/// Partition a transaction date is filed under
pub fn partition_key(date: Option<NaiveDateTime>) -> String {
    match date {
        Some(date) => date.format("%Y_%m").to_string(),
        None => UNDATED_PARTITION.to_string(),
    }
}

/// In-memory transaction store with month partitions
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    /// Natural keys of every stored row
    keys: DashSet<NaturalKey>,

    /// Partition key → rows in insertion order
    partitions: DashMap<String, Vec<Transaction>>,

    /// Reject rows whose partition was not created beforehand
    strict_partitions: bool,
}

impl InMemoryTransactionStore {
    /// Create a store that creates partitions on demand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that only accepts rows for pre-created partitions
    pub fn with_strict_partitions() -> Self {
        Self {
            strict_partitions: true,
            ..Self::default()
        }
    }

    /// Create a month partition if it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` when `key` is not a `YYYY_MM` month key.
    pub fn ensure_partition(&self, key: &str) -> Result<(), StoreError> {
        NaiveDate::parse_from_str(&format!("{key}_01"), "%Y_%m_%d")
            .map_err(|_| StoreError::constraint(format!("invalid partition key '{key}'")))?;
        self.partitions.entry(key.to_string()).or_insert_with(Vec::new);
        Ok(())
    }

    /// Create partitions for `months` consecutive months starting at `from`
    ///
    /// # Returns
    ///
    /// The partition keys that exist afterwards, in month order.
    pub fn pre_create_partitions(
        &self,
        from: NaiveDate,
        months: u32,
    ) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::with_capacity(months as usize);
        for offset in 0..months {
            let month = from
                .checked_add_months(Months::new(offset))
                .ok_or_else(|| StoreError::constraint("partition month out of range"))?;
            let key = month.format("%Y_%m").to_string();
            self.ensure_partition(&key)?;
            keys.push(key);
        }
        Ok(keys)
    }

    /// Insert a batch, skipping rows whose natural key is already stored
    ///
    /// # Returns
    ///
    /// * `Ok(n)` - number of newly inserted rows
    /// * `Err(StoreError::Constraint)` - empty batch, or a missing partition in
    ///   strict mode; nothing from the batch is stored
    pub fn insert_batch(&self, transactions: Vec<Transaction>) -> Result<usize, StoreError> {
        if transactions.is_empty() {
            return Err(StoreError::constraint("no transactions to save"));
        }

        if self.strict_partitions {
            if let Some(missing) = transactions
                .iter()
                .map(|tx| partition_key(tx.transaction_date))
                .find(|key| key == UNDATED_PARTITION || !self.partitions.contains_key(key))
            {
                return Err(StoreError::constraint(format!("no partition for '{missing}'")));
            }
        }

        let mut inserted = 0;
        for tx in transactions {
            // First occurrence wins
            if !self.keys.insert(NaturalKey::of(&tx)) {
                continue;
            }
            self.partitions
                .entry(partition_key(tx.transaction_date))
                .or_insert_with(Vec::new)
                .push(tx);
            inserted += 1;
        }

        Ok(inserted)
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of rows in one partition (0 when it does not exist)
    pub fn partition_len(&self, key: &str) -> usize {
        self.partitions.get(key).map(|rows| rows.len()).unwrap_or(0)
    }

    /// Existing partition keys, sorted
    pub fn partition_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .partitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Stored rows of one bank and user, ordered by date then external ID
    pub fn transactions_for(&self, bank_id: BankId, user_id: UserId) -> Vec<Transaction> {
        let mut rows: Vec<Transaction> = self
            .partitions
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|tx| tx.bank_id == bank_id && tx.user_id == user_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        rows.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then_with(|| a.external_id.cmp(&b.external_id))
        });
        rows
    }
}

impl TransactionSink for InMemoryTransactionStore {
    async fn save_transactions(&self, transactions: Vec<Transaction>) -> Result<usize, StoreError> {
        self.insert_batch(transactions)
    }
}
