use app_lib::adapters::{InMemoryStore, JsonFileStore};
use cinnarios_core::ports::{storage_keys, KeyValueStore};
use std::collections::HashMap;

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("storage.json"));

    assert_eq!(store.get(storage_keys::USER).await.unwrap(), None);
    store.set(storage_keys::USER, r#"{"a":1}"#).await.unwrap();
    store.set(storage_keys::REGISTERED_EVENTS, "[]").await.unwrap();
    assert_eq!(
        store.get(storage_keys::USER).await.unwrap().as_deref(),
        Some(r#"{"a":1}"#)
    );

    store.remove(storage_keys::USER).await.unwrap();
    assert_eq!(store.get(storage_keys::USER).await.unwrap(), None);
    // Removing a missing key is fine.
    store.remove(storage_keys::USER).await.unwrap();

    let on_disk: HashMap<String, String> =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[storage_keys::REGISTERED_EVENTS], "[]");
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");

    JsonFileStore::new(&path)
        .set(storage_keys::DASHBOARD_FEATURES, r#"{"darkMode":true}"#)
        .await
        .unwrap();

    let reopened = JsonFileStore::new(&path);
    assert_eq!(
        reopened
            .get(storage_keys::DASHBOARD_FEATURES)
            .await
            .unwrap()
            .as_deref(),
        Some(r#"{"darkMode":true}"#)
    );
}

#[tokio::test]
async fn test_corrupt_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "this is not json").unwrap();

    let store = JsonFileStore::new(&path);
    assert_eq!(store.get(storage_keys::USER).await.unwrap(), None);

    store.set(storage_keys::USER, "x").await.unwrap();
    assert_eq!(
        store.get(storage_keys::USER).await.unwrap().as_deref(),
        Some("x")
    );
}

#[tokio::test]
async fn test_in_memory_store() {
    let store = InMemoryStore::new();
    store.set("k", "v").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}
