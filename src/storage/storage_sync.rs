use crate::{
    array::ArrayMetadata,
    node::{GroupMetadata, NodeMetadata, NodePath},
};

use super::{data_key, meta_key, Bytes, MaybeBytes, StorageError, StoreKey, StorePrefix};

/// Readable storage traits.
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve the value (bytes) associated with a given [`StoreKey`].
    ///
    /// Returns [`None`] if the key is not found.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;
}

/// Writable storage traits.
pub trait WritableStorageTraits: Send + Sync {
    /// Store bytes at a [`StoreKey`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] on failure to store.
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError>;

    /// Erase a [`StoreKey`].
    ///
    /// Succeeds if the key does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;

    /// Ensure `prefix` exists in the store, creating it (and any parents) if it does not.
    ///
    /// Succeeds if the prefix already exists.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn ensure_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError>;

    /// Move every key under `from` to the same relative key under `to`.
    ///
    /// `to` may lie below `from` (e.g. `dataset/` to `dataset/s0/`).
    /// The rename is idempotent: it succeeds without changes if `from` no longer holds any keys but `to` does.
    ///
    /// # Errors
    /// Returns [`StorageError::RenameSourceMissing`] if neither `from` nor `to` hold any keys, or another [`StorageError`] if there is an underlying storage error.
    fn rename_prefix(&self, from: &StorePrefix, to: &StorePrefix) -> Result<(), StorageError>;
}

/// A supertrait of [`ReadableStorageTraits`] and [`WritableStorageTraits`].
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T> ReadableWritableStorageTraits for T where
    T: ReadableStorageTraits + WritableStorageTraits
{
}

fn store_node_metadata<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    metadata: &NodeMetadata,
) -> Result<(), StorageError> {
    let key = meta_key(path);
    let json = serde_json::to_vec_pretty(metadata)
        .map_err(|err| StorageError::InvalidMetadata(key.clone(), err.to_string()))?;
    storage.ensure_prefix(&key.parent())?;
    storage.set(&key, json.into())
}

/// Create a group.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn create_group<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    group: &GroupMetadata,
) -> Result<(), StorageError> {
    store_node_metadata(storage, path, &NodeMetadata::Group(group.clone()))
}

/// Create an array.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn create_array<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    array: &ArrayMetadata,
) -> Result<(), StorageError> {
    store_node_metadata(storage, path, &NodeMetadata::Array(array.clone()))
}

/// Retrieve the metadata of the node at `path`.
///
/// Returns [`None`] if there is no metadata document at `path`.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store or the metadata is invalid.
pub fn retrieve_node_metadata<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<Option<NodeMetadata>, StorageError> {
    let key = meta_key(path);
    match storage.get(&key)? {
        Some(bytes) => {
            let metadata: NodeMetadata = serde_json::from_slice(&bytes)
                .map_err(|err| StorageError::InvalidMetadata(key, err.to_string()))?;
            Ok(Some(metadata))
        }
        None => Ok(None),
    }
}

/// Store a chunk.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn store_chunk<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    array_path: &NodePath,
    chunk_grid_indices: &[u64],
    chunk_serialised: Bytes,
) -> Result<(), StorageError> {
    storage.set(&data_key(array_path, chunk_grid_indices), chunk_serialised)
}

/// Retrieve a chunk.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn retrieve_chunk<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    array_path: &NodePath,
    chunk_grid_indices: &[u64],
) -> Result<MaybeBytes, StorageError> {
    storage.get(&data_key(array_path, chunk_grid_indices))
}

/// Erase a chunk.
///
/// Succeeds if the chunk does not exist.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn erase_chunk<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    array_path: &NodePath,
    chunk_grid_indices: &[u64],
) -> Result<(), StorageError> {
    storage.erase(&data_key(array_path, chunk_grid_indices))
}
