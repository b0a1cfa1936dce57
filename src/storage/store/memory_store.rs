//! An in-memory store.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::storage::{
    Bytes, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey, StorePrefix,
    WritableStorageTraits,
};

/// An in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data_map: RwLock<BTreeMap<StoreKey, Bytes>>,
}

impl MemoryStore {
    /// Create a new, empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.data_map.read().get(key).cloned())
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.data_map.write().insert(key.clone(), value);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.data_map.write().remove(key);
        Ok(())
    }

    fn ensure_prefix(&self, _prefix: &StorePrefix) -> Result<(), StorageError> {
        // prefixes are implicit
        Ok(())
    }

    fn rename_prefix(&self, from: &StorePrefix, to: &StorePrefix) -> Result<(), StorageError> {
        let mut data_map = self.data_map.write();
        let moved: Vec<StoreKey> = data_map
            .keys()
            .filter(|key| key.has_prefix(from) && !(to.starts_with(from) && key.has_prefix(to)))
            .cloned()
            .collect();
        if moved.is_empty() {
            return if data_map.keys().any(|key| key.has_prefix(to)) {
                Ok(())
            } else {
                Err(StorageError::RenameSourceMissing(from.clone(), to.clone()))
            };
        }
        for key in moved {
            if let (Some(value), Some(new_key)) =
                (data_map.remove(&key), key.with_prefix_replaced(from, to))
            {
                data_map.insert(new_key, value);
            }
        }
        Ok(())
    }
}
