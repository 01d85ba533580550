//! Storage key providers.
//!
//! Keys follow a URL convention: `{collection-prefix}/{id}` for items and the
//! bare prefix for collections. A participant supplies its key either as a
//! literal string or as a closure evaluated each time the key is needed.

use crate::Key;
use std::fmt;
use std::sync::Arc;

/// Source of a participant's storage key.
#[derive(Clone)]
pub enum KeyProvider {
    /// A fixed key.
    Literal(Key),
    /// A key computed at call time.
    Computed(Arc<dyn Fn() -> Key + Send + Sync>),
}

impl KeyProvider {
    /// Create a literal key provider.
    pub fn literal(key: impl Into<Key>) -> Self {
        KeyProvider::Literal(key.into())
    }

    /// Create a computed key provider.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> Key + Send + Sync + 'static,
    {
        KeyProvider::Computed(Arc::new(f))
    }

    /// Produce the key.
    pub fn resolve(&self) -> Key {
        match self {
            KeyProvider::Computed(f) => f(),
            KeyProvider::Literal(key) => key.clone(),
        }
    }
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyProvider::Literal(key) => f.debug_tuple("Literal").field(key).finish(),
            KeyProvider::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for KeyProvider {
    fn from(key: &str) -> Self {
        KeyProvider::literal(key)
    }
}

impl From<String> for KeyProvider {
    fn from(key: String) -> Self {
        KeyProvider::Literal(key)
    }
}

/// Last non-empty path segment of a key, used as an item id.
pub(crate) fn last_segment(key: &str) -> &str {
    key.rsplit('/').find(|s| !s.is_empty()).unwrap_or("")
}
