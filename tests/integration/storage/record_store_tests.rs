// tests/integration/storage/record_store_tests.rs
#[path = "../../common/mod.rs"]
mod common;

use common::{open_store, record, setup_test_store, TEST_PASSPHRASE};
use context_vault::storage::{encrypted::StorageError, ContextStore};
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn test_round_trip() {
    let (store, _temp_dir) = setup_test_store().await;

    let original = record(json!({
        "installedAppId": "5f3c2b1a-app",
        "locationId": "loc-1",
        "authToken": "access",
        "refreshToken": "refresh",
        "config": {
            "switches": [{"deviceId": "d1", "componentId": "main"}],
            "threshold": 21.5,
            "enabled": true,
            "label": null
        }
    }));

    let stored = store.put(original.clone()).await.unwrap();
    assert_eq!(stored, original);

    let retrieved = store.get("5f3c2b1a-app").await.unwrap();
    assert_eq!(retrieved, original);
}

#[tokio::test]
async fn test_get_missing_is_empty() {
    let (store, _temp_dir) = setup_test_store().await;

    let result = store.get("nonexistent-id").await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_merge_update() {
    let (store, _temp_dir) = setup_test_store().await;

    store
        .put(record(json!({"installedAppId": "app-1", "a": 1, "b": 2})))
        .await
        .unwrap();

    let merged = store
        .update("app-1", record(json!({"b": 3, "c": 4})))
        .await
        .unwrap();
    let expected = json!({"installedAppId": "app-1", "a": 1, "b": 3, "c": 4});

    assert_eq!(Value::Object(merged), expected);
    assert_eq!(Value::Object(store.get("app-1").await.unwrap()), expected);
}

#[tokio::test]
async fn test_update_null_replaces_field() {
    let (store, _temp_dir) = setup_test_store().await;

    store
        .put(record(json!({"installedAppId": "app-1", "token": "abc"})))
        .await
        .unwrap();
    store
        .update("app-1", record(json!({"token": null})))
        .await
        .unwrap();

    let retrieved = store.get("app-1").await.unwrap();
    assert_eq!(retrieved.get("token"), Some(&Value::Null));
}

#[tokio::test]
async fn test_delete_then_get() {
    let (store, temp_dir) = setup_test_store().await;

    store
        .put(record(json!({"installedAppId": "app-1", "a": 1})))
        .await
        .unwrap();
    store.delete("app-1").await.unwrap();

    assert!(!temp_dir.path().join("app-1.data").exists());
    assert!(store.get("app-1").await.unwrap().is_empty());

    let result = store.delete("app-1").await;
    assert!(matches!(result, Err(StorageError::NotFound(id)) if id == "app-1"));
}

#[tokio::test]
async fn test_put_overwrites_in_full() {
    let (store, _temp_dir) = setup_test_store().await;

    store
        .put(record(json!({"installedAppId": "app-1", "a": 1, "b": 2})))
        .await
        .unwrap();
    store
        .put(record(json!({"installedAppId": "app-1", "c": 3})))
        .await
        .unwrap();

    assert_eq!(
        Value::Object(store.get("app-1").await.unwrap()),
        json!({"installedAppId": "app-1", "c": 3})
    );
}

#[tokio::test]
async fn test_traversal_ids_rejected() {
    let (store, temp_dir) = setup_test_store().await;

    for id in ["../escape", "nested/id", "..", ".vault", ""] {
        assert!(matches!(
            store.get(id).await,
            Err(StorageError::InvalidId { .. })
        ));
        assert!(matches!(
            store.update(id, record(json!({"a": 1}))).await,
            Err(StorageError::InvalidId { .. })
        ));
        assert!(matches!(
            store.delete(id).await,
            Err(StorageError::InvalidId { .. })
        ));
        assert!(matches!(
            store.put(record(json!({"installedAppId": id}))).await,
            Err(StorageError::InvalidId { .. })
        ));
    }

    let parent = temp_dir.path().parent().unwrap();
    assert!(!parent.join("escape.data").exists());
}

#[tokio::test]
async fn test_reopen_reads_existing_records() {
    let temp_dir = tempfile::tempdir().unwrap();

    {
        let store = open_store(temp_dir.path(), TEST_PASSPHRASE).await;
        store
            .put(record(json!({"installedAppId": "app-1", "a": 1})))
            .await
            .unwrap();
    }

    let reopened = open_store(temp_dir.path(), TEST_PASSPHRASE).await;
    assert_eq!(
        Value::Object(reopened.get("app-1").await.unwrap()),
        json!({"installedAppId": "app-1", "a": 1})
    );
}

#[tokio::test]
async fn test_wrong_passphrase_reports_corruption() {
    let temp_dir = tempfile::tempdir().unwrap();

    let store = open_store(temp_dir.path(), TEST_PASSPHRASE).await;
    store
        .put(record(json!({"installedAppId": "app-1", "a": 1})))
        .await
        .unwrap();

    let intruder = open_store(temp_dir.path(), "not-the-passphrase").await;
    let result = intruder.get("app-1").await;
    assert!(matches!(result, Err(StorageError::CorruptRecord { .. })));

    // Update must not paper over an unreadable record
    let result = intruder.update("app-1", record(json!({"b": 2}))).await;
    assert!(matches!(result, Err(StorageError::CorruptRecord { .. })));
    assert_eq!(
        Value::Object(store.get("app-1").await.unwrap()),
        json!({"installedAppId": "app-1", "a": 1})
    );
}

#[tokio::test]
async fn test_stores_are_independent() {
    let (first, _first_dir) = setup_test_store().await;
    let (second, _second_dir) = setup_test_store().await;

    first
        .put(record(json!({"installedAppId": "app-1", "owner": "first"})))
        .await
        .unwrap();

    assert!(second.get("app-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_access() {
    let (store, _temp_dir) = setup_test_store().await;
    let store = Arc::new(store);

    let mut handles = Vec::new();

    // Spawn multiple tasks doing simultaneous reads and writes on distinct ids
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("app_{}", i);
            let data = record(json!({"installedAppId": id, "index": i}));

            store.put(data.clone()).await.unwrap();
            let retrieved = store.get(&id).await.unwrap();
            assert_eq!(data, retrieved);
        }));
    }

    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }
}

#[test_log::test(tokio::test)]
async fn test_concurrent_updates_keep_every_field() {
    let (store, _temp_dir) = setup_test_store().await;
    let store = Arc::new(store);

    store
        .put(record(json!({"installedAppId": "shared"})))
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let mut fields = serde_json::Map::new();
                fields.insert(format!("field_{}", i), json!(i));
                store.update("shared", fields).await.unwrap();
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    let merged = store.get("shared").await.unwrap();
    assert_eq!(merged.len(), 21);
    for i in 0..20 {
        assert_eq!(merged.get(&format!("field_{}", i)), Some(&json!(i)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_open_of_one_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dir = temp_dir.path().join("fresh");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dir = dir.clone();
            tokio::spawn(async move { open_store(&dir, TEST_PASSPHRASE).await })
        })
        .collect();

    let stores: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    // Every instance derived the same key, so each reads what another wrote
    stores[0]
        .put(record(json!({"installedAppId": "app-1", "value": 1})))
        .await
        .unwrap();
    for store in &stores {
        let retrieved = store.get("app-1").await.unwrap();
        assert_eq!(retrieved.get("value"), Some(&json!(1)));
    }
}

#[tokio::test]
async fn test_shared_as_trait_object() {
    let (store, _temp_dir) = setup_test_store().await;
    let store: Arc<dyn ContextStore> = Arc::new(store);

    let worker = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update("app-9", record(json!({"stage": "installed"})))
                .await
                .unwrap()
        })
    };

    let merged = worker.await.unwrap();
    assert_eq!(merged.get("installedAppId"), Some(&json!("app-9")));
    assert_eq!(store.get("app-9").await.unwrap(), merged);
}
