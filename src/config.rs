//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `zarrs_pyramid` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # Pyramid Configuration Options
///
/// ## Default Workers
/// > default: `60`
///
/// The default number of worker threads used to process the blocks of a pyramid level.
/// The same workers are reused for every level.
///
/// Note that the default can be overridden for any pyramid with [`PyramidOptions`](crate::pyramid::PyramidOptions).
///
/// ## Default Max Retries
/// > default: `0`
///
/// The default number of times a failing block is retried before the pyramid build is aborted.
///
/// # Array Configuration Options
///
/// ## Store Empty Chunks
/// > default: [`false`]
///
/// If false, a chunk where every element equals the fill value is erased from the store rather than written.
/// Reads of a missing chunk return the fill value, so this does not change the contents of an array.
#[derive(Debug)]
pub struct Config {
    default_workers: usize,
    default_max_retries: usize,
    store_empty_chunks: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            default_workers: 60,
            default_max_retries: 0,
            store_empty_chunks: false,
        }
    }
}

impl Config {
    /// Get the [default workers](#default-workers) configuration.
    #[must_use]
    pub fn default_workers(&self) -> usize {
        self.default_workers
    }

    /// Set the [default workers](#default-workers) configuration.
    pub fn set_default_workers(&mut self, default_workers: usize) {
        self.default_workers = default_workers;
    }

    /// Get the [default max retries](#default-max-retries) configuration.
    #[must_use]
    pub fn default_max_retries(&self) -> usize {
        self.default_max_retries
    }

    /// Set the [default max retries](#default-max-retries) configuration.
    pub fn set_default_max_retries(&mut self, default_max_retries: usize) {
        self.default_max_retries = default_max_retries;
    }

    /// Get the [store empty chunks](#store-empty-chunks) configuration.
    #[must_use]
    pub fn store_empty_chunks(&self) -> bool {
        self.store_empty_chunks
    }

    /// Set the [store empty chunks](#store-empty-chunks) configuration.
    pub fn set_store_empty_chunks(&mut self, store_empty_chunks: bool) {
        self.store_empty_chunks = store_empty_chunks;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `zarrs_pyramid` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global `zarrs_pyramid` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
