//! Sync engine.
//!
//! Translates CRUD verbs into keyed store operations:
//!
//! - `read` on an item is a point lookup (falling back to fixtures)
//! - `read` on a collection is a prefix scan, deduplicated by value
//! - `create` and `update` are one upsert that skips writes of unchanged data
//! - `delete` removes the key and succeeds if it is already absent
//!
//! Every call first waits on the store's load gate, so work issued while the
//! store is still replaying its log runs once loading completes.

use crate::error::{Error, Result};
use crate::fixtures::Fixtures;
use crate::operation::{Outcome, Verb};
use crate::record::{resolve_key, Participant};
use crate::store::KeyedStore;
use crate::Record;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Executes CRUD verbs against a keyed store.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn KeyedStore>,
    fixtures: Arc<Fixtures>,
}

impl SyncEngine {
    /// Create an engine over `store` with no fixtures.
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self {
            store,
            fixtures: Arc::new(Fixtures::new()),
        }
    }

    /// Use `fixtures` as the fallback for point reads.
    pub fn with_fixtures(mut self, fixtures: Fixtures) -> Self {
        self.fixtures = Arc::new(fixtures);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn KeyedStore> {
        &self.store
    }

    /// The fixture set consulted by point reads.
    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    /// Execute `verb` for `participant` once the store is ready.
    ///
    /// Mutations succeed with [`Outcome::Empty`]; they never echo the stored
    /// value back.
    pub async fn execute(&self, verb: Verb, participant: &dyn Participant) -> Result<Outcome> {
        let gate = self.store.gate();
        if !gate.is_open() {
            tracing::debug!(%verb, "store still loading, deferring");
        }
        gate.wait().await;

        let key = resolve_key(participant).ok_or(Error::UnresolvableKey)?;
        tracing::debug!(%verb, key = %key, item = participant.is_item(), "dispatching");

        match verb {
            Verb::Read if participant.is_item() => self.read_item(&key),
            Verb::Read => Ok(Outcome::Collection(collection_scan(
                self.store.as_ref(),
                &key,
            ))),
            Verb::Create | Verb::Update => self.upsert(&key, participant.snapshot()).await,
            Verb::Delete => self.delete(&key).await,
        }
    }

    /// Execute a verb given by name.
    ///
    /// Names other than `create`, `read`, `update` and `delete` fail with
    /// [`Error::UnknownVerb`] without touching the store.
    pub async fn execute_named(&self, verb: &str, participant: &dyn Participant) -> Result<Outcome> {
        let verb: Verb = verb.parse()?;
        self.execute(verb, participant).await
    }

    /// Spawn `execute` on the runtime and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<P>(&self, verb: Verb, participant: P) -> JoinHandle<Result<Outcome>>
    where
        P: Participant + 'static,
    {
        let engine = self.clone();
        tokio::spawn(async move { engine.execute(verb, &participant).await })
    }

    /// Point lookup. A stored `null` counts as a miss, matching the scan.
    fn read_item(&self, key: &str) -> Result<Outcome> {
        if let Some(record) = self.store.get(key).filter(|r| !r.is_null()) {
            return Ok(Outcome::Record(record));
        }
        match self.fixtures.get(key) {
            Some(record) => {
                tracing::debug!(key, "served from fixtures");
                Ok(Outcome::Record(record.clone()))
            }
            None => Err(Error::NotFound(key.to_string())),
        }
    }

    /// Replace the stored value with `snapshot` unless it is already equal.
    async fn upsert(&self, key: &str, snapshot: Record) -> Result<Outcome> {
        if self.store.get(key).as_ref() == Some(&snapshot) {
            tracing::debug!(key, "unchanged, skipping write");
            return Ok(Outcome::Empty);
        }

        self.store.set(key, snapshot).await.map_err(|e| {
            tracing::error!(key, error = %e, "set failed");
            Error::StoreWrite(e)
        })?;
        Ok(Outcome::Empty)
    }

    async fn delete(&self, key: &str) -> Result<Outcome> {
        if self.store.get(key).is_none() {
            return Ok(Outcome::Empty);
        }

        self.store.remove(key).await.map_err(|e| {
            tracing::error!(key, error = %e, "remove failed");
            Error::StoreWrite(e)
        })?;
        Ok(Outcome::Empty)
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("ready", &self.store.gate().is_open())
            .field("fixtures", &self.fixtures.len())
            .finish()
    }
}

/// Collect every non-null value whose key starts with `prefix`.
///
/// Values come back in store traversal order. A value structurally equal to
/// one already collected is skipped, so two keys holding the same record
/// yield it once. The empty prefix matches every key.
pub fn collection_scan(store: &dyn KeyedStore, prefix: &str) -> Vec<Record> {
    let mut members: Vec<Record> = Vec::new();
    store.for_each(&mut |key, value| {
        if value.is_null() || !key.starts_with(prefix) {
            return;
        }
        if !members.contains(value) {
            members.push(value.clone());
        }
    });
    members
}
