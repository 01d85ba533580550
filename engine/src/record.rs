//! Participants: the objects the engine persists or queries.
//!
//! An item participant has a non-empty id and addresses one stored record.
//! A collection participant has no id and stands for every record whose key
//! starts with its prefix.

use crate::key::{last_segment, KeyProvider};
use crate::{Key, Record};
use serde_json::{Map, Value};

/// Capability contract for anything the engine can sync.
pub trait Participant: Send + Sync {
    /// Item identifier. `None` or empty marks a collection participant.
    fn id(&self) -> Option<&str>;

    /// Where the storage key comes from.
    fn key(&self) -> Option<&KeyProvider>;

    /// Plain-data snapshot of the participant's current state.
    fn snapshot(&self) -> Record;

    /// Whether this participant addresses a single item.
    fn is_item(&self) -> bool {
        self.id().is_some_and(|id| !id.is_empty())
    }
}

/// Resolve a participant's storage key.
///
/// Returns `None` when the participant carries no key provider.
pub fn resolve_key(participant: &dyn Participant) -> Option<Key> {
    participant.key().map(KeyProvider::resolve)
}

/// A single item with an id and a flat set of fields.
///
/// The snapshot is the field map as a JSON object, including `id`.
#[derive(Debug, Clone)]
pub struct Model {
    id: Option<String>,
    key: Option<KeyProvider>,
    fields: Map<String, Value>,
}

impl Model {
    /// Create a model with the given id and no key provider.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(id.clone()));
        Self {
            id: Some(id),
            key: None,
            fields,
        }
    }

    /// Create a model stored at a literal key, taking its id from the last
    /// path segment of the key.
    pub fn at(key: impl Into<Key>) -> Self {
        let key = key.into();
        let id = last_segment(&key).to_string();
        Self::new(id).with_key(KeyProvider::Literal(key))
    }

    /// Create a model from a stored record. Object fields are copied; the id
    /// is read from the record's `id` field when present.
    pub fn from_record(key: impl Into<Key>, record: &Record) -> Self {
        let mut model = Self::at(key);
        if let Value::Object(fields) = record {
            for (name, value) in fields {
                model.set(name.clone(), value.clone());
            }
        }
        model
    }

    /// Set the key provider.
    pub fn with_key(mut self, key: impl Into<KeyProvider>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Use a closure to compute the key on each access.
    pub fn with_computed_key<F>(self, f: F) -> Self
    where
        F: Fn() -> Key + Send + Sync + 'static,
    {
        self.with_key(KeyProvider::computed(f))
    }

    /// Builder form of [`Model::set`].
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field. Setting `id` also changes the item id.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        if name == "id" {
            self.id = value.as_str().map(str::to_string);
        }
        self.fields.insert(name, value);
        self
    }

    /// Read a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Participant for Model {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&KeyProvider> {
        self.key.as_ref()
    }

    fn snapshot(&self) -> Record {
        Value::Object(self.fields.clone())
    }
}

/// A collection placeholder: a key prefix and no id.
#[derive(Debug, Clone)]
pub struct CollectionRef {
    key: Option<KeyProvider>,
}

impl CollectionRef {
    /// Collection rooted at a literal prefix.
    pub fn new(prefix: impl Into<Key>) -> Self {
        Self {
            key: Some(KeyProvider::Literal(prefix.into())),
        }
    }

    /// Collection whose prefix is computed on each access.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> Key + Send + Sync + 'static,
    {
        Self {
            key: Some(KeyProvider::computed(f)),
        }
    }

    /// Collection without any key provider.
    pub fn unkeyed() -> Self {
        Self { key: None }
    }
}

impl Participant for CollectionRef {
    fn id(&self) -> Option<&str> {
        None
    }

    fn key(&self) -> Option<&KeyProvider> {
        self.key.as_ref()
    }

    fn snapshot(&self) -> Record {
        Value::Array(Vec::new())
    }
}
