//! In-memory reference tables
//!
//! [`InMemoryReferenceStore`] serves banks, categories, keywords and header
//! mappings loaded from a [`ReferenceData`] seed. It counts every query it
//! answers, which lets callers observe how often the registries fall through
//! to the store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use super::traits::ReferenceStore;
use crate::io::reference_seed::ReferenceData;
use crate::types::{Bank, BankId, Category, CategoryId, HeaderMapping, Keyword, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryReferenceStore {
    data: RwLock<ReferenceData>,
    queries: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryReferenceStore {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Number of queries answered so far, failed ones included
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Make every following query fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn add_bank(&self, bank: Bank) {
        self.write(|data| data.banks.push(bank));
    }

    pub fn add_category(&self, category: Category) {
        self.write(|data| data.categories.push(category));
    }

    pub fn add_keyword(&self, keyword: Keyword) {
        self.write(|data| data.keywords.push(keyword));
    }

    pub fn add_header_mapping(&self, mapping: HeaderMapping) {
        self.write(|data| data.header_mappings.push(mapping));
    }

    fn write(&self, f: impl FnOnce(&mut ReferenceData)) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut data);
    }

    /// Count the query and hand out the tables
    fn read(&self) -> Result<RwLockReadGuard<'_, ReferenceData>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("reference store offline"));
        }
        Ok(self.data.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    async fn bank(&self, id: BankId) -> Result<Bank, StoreError> {
        self.read()?
            .banks
            .iter()
            .find(|bank| bank.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("bank", id))
    }

    async fn banks(&self) -> Result<Vec<Bank>, StoreError> {
        Ok(self.read()?.banks.clone())
    }

    async fn category(&self, id: CategoryId) -> Result<Category, StoreError> {
        self.read()?
            .categories
            .iter()
            .find(|category| category.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("category", id))
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.read()?.categories.clone())
    }

    async fn keywords(&self) -> Result<Vec<Keyword>, StoreError> {
        Ok(self.read()?.keywords.clone())
    }

    async fn header_mappings(&self) -> Result<Vec<HeaderMapping>, StoreError> {
        Ok(self.read()?.header_mappings.clone())
    }

    async fn header_mappings_for_bank(
        &self,
        bank_id: BankId,
    ) -> Result<Vec<HeaderMapping>, StoreError> {
        Ok(self
            .read()?
            .header_mappings
            .iter()
            .filter(|mapping| mapping.bank_id == bank_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImportMethod, TransactionField};

    fn store() -> InMemoryReferenceStore {
        InMemoryReferenceStore::new(ReferenceData {
            banks: vec![Bank {
                id: 1,
                name: "Revolut".to_string(),
                import_methods: vec![ImportMethod::Csv],
            }],
            header_mappings: vec![
                HeaderMapping {
                    bank_id: 1,
                    name: "Date".to_string(),
                    required: true,
                    fields: vec![TransactionField::Date],
                },
                HeaderMapping {
                    bank_id: 2,
                    name: "Amount".to_string(),
                    required: true,
                    fields: vec![TransactionField::Amount],
                },
            ],
            ..ReferenceData::default()
        })
    }

    #[tokio::test]
    async fn test_bank_lookup() {
        let store = store();
        assert_eq!(store.bank(1).await.unwrap().name, "Revolut");
        assert_eq!(store.bank(9).await, Err(StoreError::not_found("bank", 9)));
        assert_eq!(store.queries(), 2);
    }

    #[tokio::test]
    async fn test_header_mappings_are_filtered_by_bank() {
        let store = store();
        let mappings = store.header_mappings_for_bank(2).await.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].name, "Amount");
        assert!(store.header_mappings_for_bank(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_added_rows_are_visible() {
        let store = store();
        store.add_category(Category {
            id: 4,
            name: "Groceries".to_string(),
            description: None,
        });
        assert_eq!(store.category(4).await.unwrap().name, "Groceries");
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_query() {
        let store = store();
        store.set_unavailable(true);
        assert!(matches!(store.banks().await, Err(StoreError::Unavailable { .. })));
        assert!(matches!(store.keywords().await, Err(StoreError::Unavailable { .. })));

        store.set_unavailable(false);
        assert!(store.banks().await.is_ok());
    }
}
