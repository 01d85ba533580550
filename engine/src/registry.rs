//! Store registry.
//!
//! Hands out one [`LogStore`] per backing path. Two handles on the same file
//! would each hold their own in-memory map and drift apart, so every request
//! for a path already opened returns the existing store.

use crate::log_store::{LogStore, StoreOptions};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process-level map from backing path to open store.
///
/// Construct one at startup and share it by reference (or `Arc`).
#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: DashMap<PathBuf, Arc<LogStore>>,
    options: StoreOptions,
}

impl StoreRegistry {
    /// Create an empty registry using default store options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that opens stores with `options`.
    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            stores: DashMap::new(),
            options,
        }
    }

    /// Return the store for `path`, opening it on first request.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get_or_create(&self, path: impl AsRef<Path>) -> Arc<LogStore> {
        let path = path.as_ref().to_path_buf();
        self.stores
            .entry(path.clone())
            .or_insert_with(|| {
                tracing::debug!(path = %path.display(), "opening store");
                LogStore::open(path, self.options)
            })
            .value()
            .clone()
    }

    /// The store for `path`, if one has been opened.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<LogStore>> {
        self.stores.get(path.as_ref()).map(|entry| entry.clone())
    }

    /// Number of open stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether no store has been opened.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
