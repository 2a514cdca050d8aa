//! Collaborator traits for persistence and reference data
//!
//! The ingestion pipeline only depends on these seams, so a relational store,
//! the in-memory stores of this crate, or test doubles can be plugged in
//! interchangeably.

use std::future::Future;

use crate::types::{
    Bank, BankId, Category, CategoryId, HeaderMapping, Keyword, StoreError, Transaction,
};

/// Bulk transaction persistence
///
/// Implementations must upsert-or-skip on the natural key of a transaction
/// (bank + external ID), so re-uploading overlapping data never duplicates
/// rows.
pub trait TransactionSink: Send + Sync + 'static {
    /// Persist a batch in one call
    ///
    /// # Returns
    ///
    /// * `Ok(n)` - number of rows newly inserted; skipped duplicates are not counted
    /// * `Err(StoreError)` - the whole batch failed
    fn save_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Read access to the reference tables backing the registries
pub trait ReferenceStore: Send + Sync + 'static {
    fn bank(&self, id: BankId) -> impl Future<Output = Result<Bank, StoreError>> + Send;

    fn banks(&self) -> impl Future<Output = Result<Vec<Bank>, StoreError>> + Send;

    fn category(&self, id: CategoryId) -> impl Future<Output = Result<Category, StoreError>> + Send;

    fn categories(&self) -> impl Future<Output = Result<Vec<Category>, StoreError>> + Send;

    fn keywords(&self) -> impl Future<Output = Result<Vec<Keyword>, StoreError>> + Send;

    /// Header mappings of every bank
    fn header_mappings(
        &self,
    ) -> impl Future<Output = Result<Vec<HeaderMapping>, StoreError>> + Send;

    /// Header mappings of a single bank (empty when none are configured)
    fn header_mappings_for_bank(
        &self,
        bank_id: BankId,
    ) -> impl Future<Output = Result<Vec<HeaderMapping>, StoreError>> + Send;
}
