//! Append-only log store.
//!
//! Every entry lives in memory. Each mutation is also appended to a JSON-lines
//! file (see [`crate::log`]). Opening a store returns immediately; the file is
//! replayed on a background task and the store's [`LoadGate`] opens when the
//! replay finishes.

use crate::error::{StoreError, StoreResult};
use crate::gate::LoadGate;
use crate::log::{self, LogLine};
use crate::store::KeyedStore;
use crate::{Key, Record};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Options for opening a [`LogStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Fail the load on the first malformed line instead of skipping it.
    pub strict: bool,
}

impl StoreOptions {
    /// Options with strict replay enabled.
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// A keyed store persisted as an append-only log file.
#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
    options: StoreOptions,
    entries: RwLock<BTreeMap<Key, Record>>,
    /// Append handle. `None` until loaded, and forever if the load failed.
    file: tokio::sync::Mutex<Option<File>>,
    gate: LoadGate,
    load_error: Mutex<Option<String>>,
}

impl LogStore {
    /// Open the store at `path` and start replaying its log.
    ///
    /// Must be called from within a tokio runtime. The returned store is not
    /// ready until its gate opens.
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Arc<Self> {
        let store = Arc::new(Self {
            path: path.into(),
            options,
            entries: RwLock::new(BTreeMap::new()),
            file: tokio::sync::Mutex::new(None),
            gate: LoadGate::new(),
            load_error: Mutex::new(None),
        });

        tokio::spawn(Arc::clone(&store).load());
        store
    }

    /// Open the store and wait for it to finish loading.
    pub async fn open_ready(path: impl Into<PathBuf>, options: StoreOptions) -> Arc<Self> {
        let store = Self::open(path, options);
        store.gate.wait().await;
        store
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the store was opened with.
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Why the load failed, if it did.
    pub fn load_error(&self) -> Option<String> {
        self.load_error.lock().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    async fn load(self: Arc<Self>) {
        match self.replay().await {
            Ok(count) => {
                tracing::info!(path = %self.path.display(), entries = count, "store loaded");
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "store failed to load");
                *self.load_error.lock() = Some(e.to_string());
            }
        }
        // Open even on failure so queued callers see write errors instead of
        // waiting forever.
        self.gate.open();
    }

    async fn replay(&self) -> StoreResult<usize> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut entries = BTreeMap::new();
        let stats = log::replay(&contents, self.options.strict, &mut entries)?;
        tracing::debug!(
            applied = stats.applied,
            skipped = stats.skipped,
            torn_tail = stats.torn_tail,
            "log replayed"
        );

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        let mut file = options.open(&self.path).await?;
        if stats.torn_tail {
            // Terminate the partial line so the next append starts cleanly.
            file.write_all(b"\n").await?;
            file.flush().await?;
        }

        let count = entries.len();
        *self.entries.write() = entries;
        *self.file.lock().await = Some(file);
        Ok(count)
    }

    /// Apply `line` to memory and append it to the log.
    ///
    /// The append handle is held across both steps so that memory and file
    /// agree on the order of writes to the same key.
    async fn append(&self, line: LogLine) -> StoreResult<()> {
        self.gate.wait().await;

        let encoded = line.encode()?;
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or(StoreError::Closed)?;

        line.apply(&mut self.entries.write());
        file.write_all(encoded.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl KeyedStore for LogStore {
    fn get(&self, key: &str) -> Option<Record> {
        self.entries.read().get(key).cloned()
    }

    async fn set(&self, key: &str, value: Record) -> StoreResult<()> {
        self.append(LogLine::set(key, value)).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.append(LogLine::remove(key)).await
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
