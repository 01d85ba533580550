//! Keyed store contract and the in-memory store.
//!
//! The sync engine only talks to storage through [`KeyedStore`]: point get,
//! set and remove, a full traversal, and the store's [`LoadGate`].

use crate::error::StoreResult;
use crate::gate::LoadGate;
use crate::{Key, Record};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A key-addressable store with asynchronous write acknowledgment.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Current value for `key`, if any.
    fn get(&self, key: &str) -> Option<Record>;

    /// Set `key` to `value`. Resolves once the write is acknowledged.
    async fn set(&self, key: &str, value: Record) -> StoreResult<()>;

    /// Remove `key`. Resolves once the removal is acknowledged.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Visit every entry in ascending key order.
    ///
    /// `visit` must not call back into the store.
    fn for_each(&self, visit: &mut dyn FnMut(&str, &Record));

    /// Gate that opens once the store has finished loading.
    fn gate(&self) -> &LoadGate;
}

/// A store that keeps everything in memory.
///
/// Useful for tests and for ephemeral data. It counts mutations so callers can
/// check whether a write was actually issued.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Key, Record>>,
    gate: LoadGate,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store that is not ready yet. Call
    /// [`MemoryStore::mark_ready`] to open it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that is ready immediately.
    pub fn ready() -> Self {
        Self {
            gate: LoadGate::opened(),
            ..Self::default()
        }
    }

    /// Pre-populate entries without counting them as writes.
    pub fn seed<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Record)>,
        K: Into<Key>,
    {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(key.into(), value);
        }
    }

    /// Open the load gate, releasing queued work. Returns how many waiters
    /// were released.
    pub fn mark_ready(&self) -> usize {
        let released = self.gate.open();
        tracing::debug!(released, "memory store ready");
        released
    }

    /// Number of set/remove calls issued against this store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Record> {
        self.entries.read().get(key).cloned()
    }

    async fn set(&self, key: &str, value: Record) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.write().remove(key);
        Ok(())
    }

    fn for_each(&self, visit: &mut dyn FnMut(&str, &Record)) {
        for (key, value) in self.entries.read().iter() {
            visit(key, value);
        }
    }

    fn gate(&self) -> &LoadGate {
        &self.gate
    }
}
