//! Reloadable in-memory caches
//!
//! Caches are read-mostly and written only on initialization or when a miss
//! is refilled from the store. Every cache is one reader/writer lock around an
//! `Arc` snapshot:
//!
//! - writers build a complete new value and swap the `Arc` in one step, so a
//!   reader never observes a half-updated map
//! - readers clone the `Arc` and release the lock immediately, so a long
//!   parse never blocks a reload
//!
//! Caches are plain owned values injected where they are needed; there is no
//! global state.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use super::categorizer::KeywordIndex;
use crate::types::{Bank, BankId, Category, CategoryId, HeaderMapping};

/// A single atomically replaceable snapshot
///
/// `None` until the first load, which lets callers tell "never loaded" apart
/// from "loaded and empty".
#[derive(Debug)]
pub struct Snapshot<T> {
    current: RwLock<Option<Arc<T>>>,
}

impl<T> Snapshot<T> {
    /// Create an empty, not yet loaded snapshot
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Replace the whole snapshot, returning the new one
    pub fn replace(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::clone(&value));
        value
    }

    /// Current snapshot, if one was loaded
    pub fn load(&self) -> Option<Arc<T>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Build a new snapshot from the current one and swap it in
    ///
    /// The write lock is held while `f` runs so concurrent updates are not lost.
    /// `f` receives `None` when nothing was loaded yet.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = f(guard.as_deref());
        *guard = Some(Arc::new(next));
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyed cache over a [`Snapshot`] of a `HashMap`
#[derive(Debug)]
pub struct SnapshotCache<K, V> {
    snapshot: Snapshot<HashMap<K, V>>,
}

impl<K, V> SnapshotCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            snapshot: Snapshot::new(),
        }
    }

    /// Replace every entry with the given ones
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.snapshot.replace(entries.into_iter().collect());
    }

    /// Look up one key
    pub fn get(&self, key: &K) -> Option<V> {
        self.snapshot
            .load()
            .and_then(|map| map.get(key).cloned())
    }

    /// Add or overwrite one key by swapping in a copied map
    pub fn insert(&self, key: K, value: V) {
        self.snapshot.update(|current| {
            let mut next = current.cloned().unwrap_or_default();
            next.insert(key, value);
            next
        });
    }

    /// The whole map, if it was loaded
    pub fn snapshot(&self) -> Option<Arc<HashMap<K, V>>> {
        self.snapshot.load()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_loaded()
    }
}

impl<K, V> Default for SnapshotCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Bank ID → header mappings configured for that bank
pub type HeaderMappingCache = SnapshotCache<BankId, Vec<HeaderMapping>>;

/// Bank ID → bank
pub type BankCache = SnapshotCache<BankId, Bank>;

/// Category ID → category
pub type CategoryCache = SnapshotCache<CategoryId, Category>;

/// Keyword table used by category inference
pub type KeywordCache = Snapshot<KeywordIndex>;

/// Group header mappings by bank for a bulk cache load
pub fn group_by_bank(mappings: Vec<HeaderMapping>) -> HashMap<BankId, Vec<HeaderMapping>> {
    let mut grouped: HashMap<BankId, Vec<HeaderMapping>> = HashMap::new();
    for mapping in mappings {
        grouped.entry(mapping.bank_id).or_default().push(mapping);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Keyword, TransactionField};
    use std::thread;

    fn mapping(bank_id: BankId, name: &str) -> HeaderMapping {
        HeaderMapping {
            bank_id,
            name: name.to_string(),
            required: false,
            fields: vec![TransactionField::Description],
        }
    }

    #[test]
    fn test_snapshot_starts_unloaded() {
        let snapshot: Snapshot<u32> = Snapshot::new();
        assert!(!snapshot.is_loaded());
        assert!(snapshot.load().is_none());
    }

    #[test]
    fn test_loaded_empty_is_distinct_from_unloaded() {
        let cache: KeywordCache = Snapshot::new();
        cache.replace(KeywordIndex::new(Vec::<Keyword>::new()));

        assert!(cache.is_loaded());
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_replace_all_discards_previous_entries() {
        let cache: HeaderMappingCache = SnapshotCache::new();
        cache.replace_all(vec![(1, vec![mapping(1, "Date")])]);
        cache.replace_all(vec![(2, vec![mapping(2, "Amount")])]);

        assert!(cache.get(&1).is_none());
        assert_eq!(cache.get(&2).unwrap()[0].name, "Amount");
    }

    #[test]
    fn test_insert_does_not_mutate_reader_snapshot() {
        let cache: HeaderMappingCache = SnapshotCache::new();
        cache.replace_all(vec![(1, vec![mapping(1, "Date")])]);

        let before = cache.snapshot().unwrap();
        cache.insert(2, vec![mapping(2, "Amount")]);
        let after = cache.snapshot().unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert!(after.contains_key(&1));
    }

    #[test]
    fn test_insert_into_unloaded_cache() {
        let cache: HeaderMappingCache = SnapshotCache::new();
        cache.insert(5, vec![mapping(5, "Date")]);

        assert!(cache.is_loaded());
        assert_eq!(cache.get(&5).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_inserts_are_not_lost() {
        let cache: Arc<CategoryCache> = Arc::new(SnapshotCache::new());

        let handles: Vec<_> = (0..8)
            .map(|id| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache.insert(
                        id,
                        Category {
                            id,
                            name: format!("category {id}"),
                            description: None,
                        },
                    );
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.snapshot().unwrap().len(), 8);
    }

    #[test]
    fn test_group_by_bank() {
        let grouped = group_by_bank(vec![
            mapping(1, "Date"),
            mapping(2, "Amount"),
            mapping(1, "Amount"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&1].len(), 2);
        assert_eq!(grouped[&1][1].name, "Amount");
    }
}
