//! Cached access to reference data
//!
//! The [`Registry`] sits between the ingestion pipeline and a
//! [`ReferenceStore`]. Lookups are served from the caches; a miss falls
//! through to the store and the answer is written back, so the next lookup
//! of the same key stays in memory.
//!
//! # Architecture
//!
//! ```text
//! Registry<R>
//!     ├── Arc<R>              (reference store)
//!     ├── BankCache           (bank ID → bank)
//!     ├── CategoryCache       (category ID → category)
//!     ├── KeywordCache        (keyword index snapshot)
//!     └── HeaderMappingCache  (bank ID → header mappings)
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use super::cache::{group_by_bank, BankCache, CategoryCache, HeaderMappingCache, KeywordCache};
use super::categorizer::KeywordIndex;
use super::traits::ReferenceStore;
use crate::types::{Bank, BankId, Category, CategoryId, HeaderMapping, StoreError};

#[derive(Debug)]
pub struct Registry<R> {
    store: Arc<R>,
    banks: BankCache,
    categories: CategoryCache,
    keywords: KeywordCache,
    header_mappings: HeaderMappingCache,
}

impl<R: ReferenceStore> Registry<R> {
    /// Create a registry with empty caches
    ///
    /// Nothing is loaded until [`Registry::initialize`] runs or the first
    /// lookup misses.
    pub fn new(store: Arc<R>) -> Self {
        Self {
            store,
            banks: BankCache::new(),
            categories: CategoryCache::new(),
            keywords: KeywordCache::new(),
            header_mappings: HeaderMappingCache::new(),
        }
    }

    pub fn store(&self) -> &Arc<R> {
        &self.store
    }

    /// Bulk-load every cache from the store
    ///
    /// Existing cache contents are replaced as a whole.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        let banks = self.store.banks().await?;
        let categories = self.store.categories().await?;
        let keywords = self.store.keywords().await?;
        let mappings = self.store.header_mappings().await?;

        info!(
            banks = banks.len(),
            categories = categories.len(),
            keywords = keywords.len(),
            header_mappings = mappings.len(),
            "reference caches loaded"
        );

        self.banks
            .replace_all(banks.into_iter().map(|bank| (bank.id, bank)));
        self.categories
            .replace_all(categories.into_iter().map(|category| (category.id, category)));
        self.keywords.replace(KeywordIndex::new(keywords));
        self.header_mappings.replace_all(group_by_bank(mappings));
        Ok(())
    }

    pub async fn bank(&self, id: BankId) -> Result<Bank, StoreError> {
        if let Some(bank) = self.banks.get(&id) {
            return Ok(bank);
        }

        debug!(bank_id = id, "bank cache miss");
        let bank = self.store.bank(id).await?;
        self.banks.insert(id, bank.clone());
        Ok(bank)
    }

    pub async fn category(&self, id: CategoryId) -> Result<Category, StoreError> {
        if let Some(category) = self.categories.get(&id) {
            return Ok(category);
        }

        debug!(category_id = id, "category cache miss");
        let category = self.store.category(id).await?;
        self.categories.insert(id, category.clone());
        Ok(category)
    }

    /// Look up a category by exact name
    ///
    /// A miss reloads the whole category table once; `Ok(None)` means the
    /// store does not know the name either.
    pub async fn category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        if let Some(found) = self
            .categories
            .snapshot()
            .and_then(|categories| categories.values().find(|c| c.name == name).cloned())
        {
            return Ok(Some(found));
        }

        debug!(category = name, "category name cache miss");
        let categories = self.store.categories().await?;
        let found = categories.iter().find(|c| c.name == name).cloned();
        self.categories
            .replace_all(categories.into_iter().map(|category| (category.id, category)));
        Ok(found)
    }

    /// Current keyword index snapshot
    ///
    /// The returned `Arc` stays valid even if the keywords are reloaded while
    /// the caller is still using it.
    pub async fn keyword_index(&self) -> Result<Arc<KeywordIndex>, StoreError> {
        if let Some(index) = self.keywords.load() {
            return Ok(index);
        }

        debug!("keyword cache miss");
        self.reload_keywords().await
    }

    /// Replace the keyword snapshot with the store's current keywords
    pub async fn reload_keywords(&self) -> Result<Arc<KeywordIndex>, StoreError> {
        let keywords = self.store.keywords().await?;
        let index = self.keywords.replace(KeywordIndex::new(keywords));
        info!(keywords = index.len(), "keyword index reloaded");
        Ok(index)
    }

    /// Header mappings configured for a bank
    ///
    /// An empty answer from the store is not cached, so mappings added later
    /// are picked up by the next upload.
    pub async fn header_mappings(&self, bank_id: BankId) -> Result<Vec<HeaderMapping>, StoreError> {
        if let Some(mappings) = self.header_mappings.get(&bank_id) {
            return Ok(mappings);
        }

        debug!(bank_id, "header mapping cache miss");
        let mappings = self.store.header_mappings_for_bank(bank_id).await?;
        if !mappings.is_empty() {
            self.header_mappings.insert(bank_id, mappings.clone());
        }
        Ok(mappings)
    }
}
