//! Stores.
//!
//! A [`FilesystemStore`] maps keys to files below a base directory.
//! A [`MemoryStore`] holds values in memory and is primarily useful for tests and temporary hierarchies.

mod filesystem_store;
mod memory_store;

pub use filesystem_store::{FilesystemStore, FilesystemStoreCreateError};
pub use memory_store::MemoryStore;

#[cfg(test)]
mod test_util {
    use std::error::Error;

    use crate::storage::{
        Bytes, ReadableStorageTraits, StorageError, StoreKey, StorePrefix, WritableStorageTraits,
    };

    fn key(key: &str) -> StoreKey {
        StoreKey::new(key).unwrap()
    }

    fn prefix(prefix: &str) -> StorePrefix {
        StorePrefix::new(prefix).unwrap()
    }

    pub fn store_write_read<T: ReadableStorageTraits + WritableStorageTraits>(
        store: &T,
    ) -> Result<(), Box<dyn Error>> {
        store.set(&key("a/b"), vec![0u8, 1, 2].into())?;
        assert_eq!(store.get(&key("a/b"))?.unwrap(), vec![0u8, 1, 2]);
        store.set(&key("a/b"), vec![3u8].into())?;
        assert_eq!(store.get(&key("a/b"))?.unwrap(), vec![3u8]);
        assert!(store.get(&key("a/c"))?.is_none());
        store.erase(&key("a/b"))?;
        store.erase(&key("a/b"))?;
        assert!(store.get(&key("a/b"))?.is_none());
        Ok(())
    }

    pub fn store_rename<T: ReadableStorageTraits + WritableStorageTraits>(
        store: &T,
    ) -> Result<(), Box<dyn Error>> {
        store.ensure_prefix(&prefix("potato/"))?;
        store.ensure_prefix(&prefix("potato/"))?;
        store.set(&key("potato/zarr.json"), Bytes::from_static(b"{}"))?;
        store.set(&key("potato/c/0/0"), vec![1u8, 2].into())?;

        // Rename into a child of the source
        store.rename_prefix(&prefix("potato/"), &prefix("potato/s0/"))?;
        assert!(store.get(&key("potato/zarr.json"))?.is_none());
        assert!(store.get(&key("potato/c/0/0"))?.is_none());
        assert_eq!(store.get(&key("potato/s0/zarr.json"))?.unwrap(), b"{}".to_vec());
        assert_eq!(store.get(&key("potato/s0/c/0/0"))?.unwrap(), vec![1u8, 2]);

        // Renaming again is a no-op
        store.rename_prefix(&prefix("potato/"), &prefix("potato/s0/"))?;
        assert!(store.get(&key("potato/s0/s0/c/0/0"))?.is_none());
        store.rename_prefix(&prefix("potato/s0/"), &prefix("potato/s1/"))?;
        store.rename_prefix(&prefix("potato/s0/"), &prefix("potato/s1/"))?;
        assert!(store.get(&key("potato/s0/zarr.json"))?.is_none());
        assert_eq!(store.get(&key("potato/s1/zarr.json"))?.unwrap(), b"{}".to_vec());
        assert_eq!(store.get(&key("potato/s1/c/0/0"))?.unwrap(), vec![1u8, 2]);

        assert!(matches!(
            store.rename_prefix(&prefix("missing/"), &prefix("other/")),
            Err(StorageError::RenameSourceMissing(_, _))
        ));
        Ok(())
    }
}
