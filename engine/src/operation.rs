//! Verbs and outcomes.
//!
//! Callers express work as one of four CRUD verbs. Each verb produces an
//! [`Outcome`] on success.

use crate::{Error, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A CRUD verb understood by the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl Verb {
    /// All verbs, in the order they are usually listed.
    pub const ALL: [Verb; 4] = [Verb::Create, Verb::Read, Verb::Update, Verb::Delete];

    /// Lowercase name of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| Error::UnknownVerb(s.to_string()))
    }
}

/// Successful result of executing a verb.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A point read hit.
    Record(Record),
    /// Members of a collection scan, in store traversal order.
    Collection(Vec<Record>),
    /// A mutation completed (or was unnecessary). Rendered as `{}`.
    Empty,
}

impl Outcome {
    /// The record of a point read.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Outcome::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The members of a collection scan.
    pub fn as_collection(&self) -> Option<&[Record]> {
        match self {
            Outcome::Collection(records) => Some(records),
            _ => None,
        }
    }

    /// Whether this is the empty mutation response.
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    /// Render as a JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Record(record) => record,
            Outcome::Collection(records) => Value::Array(records),
            Outcome::Empty => Value::Object(serde_json::Map::new()),
        }
    }
}
