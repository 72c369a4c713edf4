//! Persisted ordered collections.
//!
//! # Responsibility
//! - Hold one entity sequence in memory, hydrated from its store key.
//! - Persist the whole sequence on every append.
//!
//! # Invariants
//! - Insertion order is creation order and is never rearranged.
//! - The in-memory sequence only changes when the store write succeeded.

use crate::store::{load_or_default, save, KvStore, StoreKey, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One named, independently persisted sequence.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    key: StoreKey,
    items: Vec<T>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Starts an empty collection for `key` without touching storage.
    pub fn empty(key: StoreKey) -> Self {
        Self {
            key,
            items: Vec::new(),
        }
    }

    /// Hydrates from storage. A missing key yields an empty collection.
    pub fn load<S: KvStore + ?Sized>(store: &S, key: StoreKey) -> StoreResult<Self> {
        let items = load_or_default::<Vec<T>, _>(store, key)?;
        Ok(Self { key, items })
    }

    /// Appends `item` and rewrites the full sequence under this key.
    ///
    /// On a failed write the item is dropped again and the error returned.
    pub fn append<S: KvStore + ?Sized>(&mut self, store: &S, item: T) -> StoreResult<&T> {
        self.items.push(item);
        if let Err(err) = save(store, self.key, &self.items) {
            self.items.pop();
            return Err(err);
        }
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }

    /// Removes the newest item, persisting the shortened sequence first.
    ///
    /// Memory is untouched when the write fails.
    pub fn remove_last<S: KvStore + ?Sized>(&mut self, store: &S) -> StoreResult<Option<T>> {
        let Some((_, kept)) = self.items.split_last() else {
            return Ok(None);
        };
        save(store, self.key, kept)?;
        Ok(self.items.pop())
    }

    /// Drops in-memory items after the backing key was wiped elsewhere.
    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn key(&self) -> StoreKey {
        self.key
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
