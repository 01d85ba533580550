//! Error types for the keysync engine.

use crate::Key;
use thiserror::Error;

/// Errors reported by a keyed store on load or on write acknowledgment.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("corrupt log line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("store is closed")]
    Closed,
}

/// Result type for keyed store primitives.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// All possible errors from the sync engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("record not found: {0}")]
    NotFound(Key),

    /// The store rejected a set or remove. The store's error is forwarded as-is.
    #[error("store write failed: {0}")]
    StoreWrite(#[from] StoreError),

    #[error("participant has no resolvable key")]
    UnresolvableKey,

    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("invalid fixtures: {0}")]
    Fixture(String),
}

impl Error {
    /// True for point reads that missed both the store and the fixtures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True when the store reported a failed write.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Error::StoreWrite(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
