//! Storage ([stores](store) and storage traits).
//!
//! A [store] is a system that can be used to store and retrieve data from a hierarchy of arrays and groups.
//! This crate includes a [`FilesystemStore`](store::FilesystemStore) and a [`MemoryStore`](store::MemoryStore).
//!
//! Metadata documents are stored at `<path>/zarr.json` ([`meta_key`]) and chunks at
//! `<path>/c/<i>/<j>/...` ([`data_key`]).

mod storage_sync;
pub mod store;
mod store_key;
mod store_prefix;

use thiserror::Error;

use crate::node::{NodePath, NodePathError};

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError};

pub use self::storage_sync::{
    create_array, create_group, erase_chunk, retrieve_chunk, retrieve_node_metadata, store_chunk,
    ReadableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits,
};

/// The type for bytes used in storage.
pub type Bytes = bytes::Bytes;

/// An alias for bytes which may or may not be available.
pub type MaybeBytes = Option<Bytes>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An error parsing the metadata for a key.
    #[error("error parsing metadata for {0}: {1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error("invalid node path {0}")]
    NodePathError(#[from] NodePathError),
    /// Neither the source nor the destination of a rename exist.
    #[error("cannot rename {0} to {1}: the source prefix does not exist")]
    RenameSourceMissing(StorePrefix, StorePrefix),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Return the metadata key (`zarr.json`) given a node path.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    let prefix = StorePrefix::from(path);
    StoreKey::new_unchecked(format!("{}zarr.json", prefix.as_str()))
}

/// Return the data key of the chunk at `chunk_grid_indices` of the array at `path`.
///
/// Keys use the `default` chunk key encoding with a `/` separator, e.g. `dataset/s1/c/0/2/1`.
#[must_use]
pub fn data_key(path: &NodePath, chunk_grid_indices: &[u64]) -> StoreKey {
    let prefix = StorePrefix::from(path);
    let mut key = format!("{}c", prefix.as_str());
    for index in chunk_grid_indices {
        key.push('/');
        key.push_str(&index.to_string());
    }
    StoreKey::new_unchecked(key)
}
