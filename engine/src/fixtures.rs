//! Read-only fixture records.
//!
//! Fixtures seed well-known keys without writing them to the live store. A
//! point read falls back to them only when the store has no entry for the key.

use crate::error::{Error, Result};
use crate::log;
use crate::{Key, Record};
use std::collections::BTreeMap;
use std::path::Path;

/// Static `(key, record)` seed list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixtures {
    entries: BTreeMap<Key, Record>,
}

impl Fixtures {
    /// Create an empty fixture set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixture. A later fixture for the same key replaces the earlier one.
    pub fn insert(&mut self, key: impl Into<Key>, record: Record) {
        self.entries.insert(key.into(), record);
    }

    /// Builder form of [`Fixtures::insert`].
    pub fn with(mut self, key: impl Into<Key>, record: Record) -> Self {
        self.insert(key, record);
        self
    }

    /// Fixture record for `key`.
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.entries.get(key)
    }

    /// Number of fixtures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fixtures.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse fixtures written in the log line format.
    pub fn from_log_str(contents: &str) -> Result<Self> {
        Self::from_log_bytes(contents.as_bytes())
    }

    /// Parse raw fixture bytes. Any malformed line, including invalid UTF-8,
    /// rejects the whole set.
    pub fn from_log_bytes(contents: &[u8]) -> Result<Self> {
        let mut entries = BTreeMap::new();
        log::replay(contents, true, &mut entries).map_err(|e| Error::Fixture(e.to_string()))?;
        Ok(Self { entries })
    }

    /// Load fixtures from a file in the log line format.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Fixture(format!("{}: {}", path.display(), e)))?;
        let fixtures = Self::from_log_bytes(&contents)?;
        tracing::debug!(path = %path.display(), count = fixtures.len(), "fixtures loaded");
        Ok(fixtures)
    }
}

impl<K: Into<Key>> FromIterator<(K, Record)> for Fixtures {
    fn from_iter<I: IntoIterator<Item = (K, Record)>>(iter: I) -> Self {
        let mut fixtures = Self::new();
        for (key, record) in iter {
            fixtures.insert(key, record);
        }
        fixtures
    }
}
