//! # Keysync Engine
//!
//! Maps CRUD operations onto an append-only, asynchronously loaded key-value
//! store.
//!
//! Records are addressed by URL-style keys: an item lives at
//! `{collection-prefix}/{id}` and a collection is just its prefix. Reading a
//! collection scans every key under the prefix.
//!
//! ## Core Concepts
//!
//! ### Participants
//!
//! Anything implementing [`Participant`] can be synced. It supplies:
//! - an optional id (present for items, absent for collections)
//! - a [`KeyProvider`], either a literal key or a closure
//! - a JSON snapshot of its state
//!
//! [`Model`] and [`CollectionRef`] are the ready-made participants.
//!
//! ### Verbs
//!
//! [`SyncEngine::execute`] takes one of four [`Verb`]s:
//! - `read` on an item: point lookup, falling back to [`Fixtures`]
//! - `read` on a collection: prefix scan, deduplicated by value
//! - `create` / `update`: full replacement, skipped if the value is unchanged
//! - `delete`: removal, a no-op if the key is absent
//!
//! Mutations resolve to [`Outcome::Empty`] once the store acknowledges the
//! write.
//!
//! ### Load Gate
//!
//! A [`LogStore`] replays its log on a background task after it is opened.
//! Calls made before the replay finishes wait on the store's [`LoadGate`] and
//! run, in the order they arrived, once it opens.
//!
//! ## Quick Start
//!
//! ```rust
//! use keysync_engine::{CollectionRef, MemoryStore, Model, SyncEngine, Verb};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> keysync_engine::error::Result<()> {
//! let engine = SyncEngine::new(Arc::new(MemoryStore::ready()));
//!
//! let banana = Model::new("banana")
//!     .with_key("/api/Fruits/banana")
//!     .with_field("name", "Yellow Banana");
//! engine.execute(Verb::Create, &banana).await?;
//!
//! let fruits = engine
//!     .execute(Verb::Read, &CollectionRef::new("/api/Fruits"))
//!     .await?;
//! assert_eq!(fruits.as_collection().unwrap().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Persistence
//!
//! Use [`StoreRegistry::get_or_create`] to open a [`LogStore`]. The registry
//! guarantees one store per backing file.

pub mod error;
pub mod fixtures;
pub mod gate;
pub mod key;
pub mod log;
pub mod log_store;
pub mod operation;
pub mod record;
pub mod registry;
pub mod store;
pub mod sync;

// Re-export main types at crate root
pub use error::{Error, StoreError};
pub use fixtures::Fixtures;
pub use gate::LoadGate;
pub use key::KeyProvider;
pub use log::LogLine;
pub use log_store::{LogStore, StoreOptions};
pub use operation::{Outcome, Verb};
pub use record::{resolve_key, CollectionRef, Model, Participant};
pub use registry::StoreRegistry;
pub use store::{KeyedStore, MemoryStore};
pub use sync::{collection_scan, SyncEngine};

/// Type aliases for clarity
pub type Key = String;
pub type Record = serde_json::Value;
