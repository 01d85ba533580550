//! End-to-end tests against an on-disk log store.
//!
//! The store is seeded with a small fruit and vegetable log, then driven
//! through the full create/read/update/delete cycle.

use keysync_engine::{
    CollectionRef, Error, Fixtures, KeyedStore, Model, Outcome, Participant, StoreOptions,
    StoreRegistry, SyncEngine, Verb,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const PRODUCE: &str = concat!(
    r#"{"key":"/api/Fruits/apple","val":{"id":"apple","name":"McIntosh Apple"}}"#,
    "\n",
    r#"{"key":"/api/Fruits/melon","val":{"id":"melon","name":"Cantaloupe"}}"#,
    "\n",
    r#"{"key":"/api/Veggies/broccoli","val":{"id":"broccoli","name":"Broccoli"}}"#,
    "\n",
);

fn produce_db(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("test.db");
    std::fs::write(&path, PRODUCE).unwrap();
    path
}

fn banana() -> Model {
    Model::new("banana")
        .with_computed_key(|| "/api/Fruits/banana".to_string())
        .with_field("name", "Yellow Banana")
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn initial_reads() {
    let dir = TempDir::new().unwrap();
    let registry = StoreRegistry::new();
    let engine = SyncEngine::new(registry.get_or_create(produce_db(&dir)));

    let orange = Model::at("/api/Fruits/orange");
    let err = engine.execute(Verb::Read, &orange).await.unwrap_err();
    assert!(err.is_not_found());

    let apple = Model::at("/api/Fruits/apple");
    let outcome = engine.execute(Verb::Read, &apple).await.unwrap();
    assert_eq!(outcome.as_record().unwrap()["name"], "McIntosh Apple");
}

#[tokio::test]
async fn collection_contains_only_fruits() {
    let dir = TempDir::new().unwrap();
    let registry = StoreRegistry::new();
    let engine = SyncEngine::new(registry.get_or_create(produce_db(&dir)));

    let fruits = CollectionRef::computed(|| "/api/Fruits".to_string());
    let outcome = engine.execute(Verb::Read, &fruits).await.unwrap();

    let ids: Vec<_> = outcome
        .as_collection()
        .unwrap()
        .iter()
        .map(|r| r["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("apple"), json!("melon")]);
}

// ============================================================================
// Full CRUD cycle
// ============================================================================

#[tokio::test]
async fn create_read_update_delete() {
    let dir = TempDir::new().unwrap();
    let path = produce_db(&dir);
    let registry = StoreRegistry::new();
    let engine = SyncEngine::new(registry.get_or_create(&path));

    let mut banana = banana();

    let outcome = engine.execute(Verb::Create, &banana).await.unwrap();
    assert_eq!(outcome.into_value(), json!({}));

    let outcome = engine.execute(Verb::Read, &banana).await.unwrap();
    assert_eq!(outcome.as_record().unwrap()["name"], "Yellow Banana");

    banana.set("name", "Brown Banana");
    let outcome = engine.execute(Verb::Update, &banana).await.unwrap();
    assert_eq!(outcome, Outcome::Empty);

    let outcome = engine.execute(Verb::Read, &banana).await.unwrap();
    assert_eq!(outcome.as_record().unwrap()["name"], "Brown Banana");

    let outcome = engine.execute(Verb::Delete, &banana).await.unwrap();
    assert_eq!(outcome, Outcome::Empty);

    let err = engine.execute_named("reread", &banana).await.unwrap_err();
    assert!(matches!(err, Error::UnknownVerb(_)));

    let err = engine.execute(Verb::Read, &banana).await.unwrap_err();
    assert!(err.is_not_found());

    // create, update and delete each appended one line.
    let lines = std::fs::read_to_string(&path).unwrap().lines().count();
    assert_eq!(lines, 6);
}

#[tokio::test]
async fn state_persists_across_registries() {
    let dir = TempDir::new().unwrap();
    let path = produce_db(&dir);

    {
        let registry = StoreRegistry::new();
        let engine = SyncEngine::new(registry.get_or_create(&path));
        engine.execute(Verb::Create, &banana()).await.unwrap();
        engine
            .execute(Verb::Delete, &Model::at("/api/Fruits/melon"))
            .await
            .unwrap();
    }

    let registry = StoreRegistry::with_options(StoreOptions::strict());
    let engine = SyncEngine::new(registry.get_or_create(&path));
    let outcome = engine
        .execute(Verb::Read, &CollectionRef::new("/api/Fruits"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Collection(vec![
            json!({"id": "apple", "name": "McIntosh Apple"}),
            json!({"id": "banana", "name": "Yellow Banana"}),
        ])
    );
}

#[tokio::test]
async fn repeated_create_does_not_grow_log() {
    let dir = TempDir::new().unwrap();
    let path = produce_db(&dir);
    let registry = StoreRegistry::new();
    let engine = SyncEngine::new(registry.get_or_create(&path));

    for _ in 0..3 {
        engine.execute(Verb::Create, &banana()).await.unwrap();
    }

    let lines = std::fs::read_to_string(&path).unwrap().lines().count();
    assert_eq!(lines, 4);
}

// ============================================================================
// Load gate
// ============================================================================

#[tokio::test]
async fn calls_issued_during_load_all_complete() {
    let dir = TempDir::new().unwrap();
    let registry = StoreRegistry::new();
    let store = registry.get_or_create(produce_db(&dir));
    let engine = SyncEngine::new(store.clone());

    // Issued before the background replay has had a chance to run.
    let handles = vec![
        engine.submit(Verb::Read, Model::at("/api/Fruits/apple")),
        engine.submit(Verb::Read, CollectionRef::new("/api/Veggies")),
        engine.submit(Verb::Create, banana()),
        engine.submit(Verb::Delete, Model::at("/api/Fruits/melon")),
    ];

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(outcomes[0].as_record().unwrap()["id"], "apple");
    assert_eq!(outcomes[1].as_collection().unwrap().len(), 1);
    assert!(outcomes[2].is_empty());
    assert!(outcomes[3].is_empty());

    assert!(store.get("/api/Fruits/banana").is_some());
    assert!(store.get("/api/Fruits/melon").is_none());
}

#[tokio::test]
async fn gate_callbacks_run_once_in_order() {
    let dir = TempDir::new().unwrap();
    let registry = StoreRegistry::new();
    let store = registry.get_or_create(produce_db(&dir));

    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let runs = Arc::new(AtomicUsize::new(0));
    for i in 0..4 {
        let order = order.clone();
        let runs = runs.clone();
        store.gate().when_ready(move || {
            runs.fetch_add(1, Ordering::SeqCst);
            order.lock().push(i);
        });
    }

    store.gate().wait().await;
    assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    assert_eq!(runs.load(Ordering::SeqCst), 4);
}

// ============================================================================
// Fixtures
// ============================================================================

#[tokio::test]
async fn fixture_file_backs_reads() {
    let dir = TempDir::new().unwrap();
    let fixture_path = dir.path().join("fixtures.db");
    std::fs::write(
        &fixture_path,
        concat!(r#"{"key":"/api/Fruits/kiwi","val":{"id":"kiwi"}}"#, "\n"),
    )
    .unwrap();

    let registry = StoreRegistry::new();
    let store = registry.get_or_create(produce_db(&dir));
    let engine = SyncEngine::new(store.clone())
        .with_fixtures(Fixtures::load(&fixture_path).await.unwrap());

    let kiwi = Model::at("/api/Fruits/kiwi");
    let outcome = engine.execute(Verb::Read, &kiwi).await.unwrap();
    assert_eq!(outcome, Outcome::Record(kiwi.snapshot()));

    // Fixtures are never written back.
    assert!(store.get("/api/Fruits/kiwi").is_none());
}
