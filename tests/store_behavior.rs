//! End-to-end behavior of the configuration store against a real directory.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ipconf::store::ReloadOutcome;
use ipconf::{ConfigDocument, ConfigStore};
use tempfile::TempDir;

mod common;

#[tokio::test]
async fn test_first_start_provisions_empty_document() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;

    assert!(store.get().ip_addresses.is_empty());
    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk, serde_json::json!({ "ipAddresses": [] }));

    store.close().await;
}

#[tokio::test]
async fn test_save_then_get_round_trips_and_writes_indented_file() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;

    store.save(ConfigDocument::new(["1.2.3.4"])).await.unwrap();

    assert_eq!(store.get().ip_addresses, vec!["1.2.3.4"]);
    let text = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(text, "{\n  \"ipAddresses\": [\n    \"1.2.3.4\"\n  ]\n}\n");

    let doc = ConfigDocument::new(["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
    store.save(doc.clone()).await.unwrap();
    assert_eq!(store.get(), doc);

    store.close().await;
}

#[tokio::test]
async fn test_returned_documents_are_isolated() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;
    store.save(ConfigDocument::new(["1.1.1.1"])).await.unwrap();
    let file_before = std::fs::read(store.path()).unwrap();

    let mut copy = store.get();
    copy.ip_addresses.push("6.6.6.6".into());
    copy.ip_addresses[0] = "0.0.0.0".into();

    assert_eq!(store.get().ip_addresses, vec!["1.1.1.1"]);
    assert_eq!(std::fs::read(store.path()).unwrap(), file_before);

    store.close().await;
}

#[tokio::test]
async fn test_failed_save_changes_nothing() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;
    store.save(ConfigDocument::new(["1.1.1.1"])).await.unwrap();
    store.close().await;

    // Removing the directory makes staging the temporary file fail.
    std::fs::remove_dir_all(root.path().join("Data")).unwrap();

    let err = store.save(ConfigDocument::new(["2.2.2.2"])).await;
    assert!(err.is_err());
    assert_eq!(store.get().ip_addresses, vec!["1.1.1.1"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_save_leaves_file_bytes_untouched() {
    use std::os::unix::fs::PermissionsExt;

    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;
    store.save(ConfigDocument::new(["1.1.1.1", "2.2.2.2"])).await.unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let data = root.path().join("Data");
    std::fs::set_permissions(&data, std::fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users ignore directory permissions; nothing to assert then.
    let check = data.join(".write-check");
    if std::fs::File::create(&check).is_ok() {
        std::fs::remove_file(&check).unwrap();
        std::fs::set_permissions(&data, std::fs::Permissions::from_mode(0o755)).unwrap();
        store.close().await;
        return;
    }

    let result = store.save(ConfigDocument::new(["9.9.9.9"])).await;
    std::fs::set_permissions(&data, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert!(result.is_err());
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
    assert_eq!(store.get().ip_addresses, vec!["1.1.1.1", "2.2.2.2"]);
    let leftovers: Vec<_> = std::fs::read_dir(&data)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "config.json")
        .collect();
    assert!(leftovers.is_empty(), "stray files: {leftovers:?}");

    store.close().await;
}

#[tokio::test]
async fn test_close_interrupts_retry_backoff() {
    let root = TempDir::new().unwrap();
    let mut settings = common::store_settings(root.path());
    settings.retry_base_delay_ms = 5000;
    settings.retry_max_delay_ms = 5000;
    let store = ConfigStore::open(&settings).await.unwrap();
    assert!(store.is_watching().await);

    std::fs::write(store.path(), br#"{"ipAddresses":["10.0.0.1""#).unwrap();
    // Past the reload delay and the first read, into the first backoff sleep.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let closed = tokio::time::timeout(Duration::from_millis(500), store.close()).await;
    assert!(closed.is_ok(), "close() waited on the backoff");
    assert!(store.get().is_empty());
}

#[tokio::test]
async fn test_external_write_is_picked_up() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;
    assert!(store.is_watching().await);

    std::fs::write(store.path(), br#"{ "ipAddresses": ["203.0.113.5", "203.0.113.6"] }"#).unwrap();

    let expected = ConfigDocument::new(["203.0.113.5", "203.0.113.6"]);
    assert!(common::wait_for_document(&store, &expected).await);

    store.close().await;
}

#[tokio::test]
async fn test_editor_style_rename_is_picked_up() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;

    let swap = root.path().join("Data").join("config.json.swp");
    std::fs::write(&swap, br#"{"ipAddresses":["198.51.100.1"]}"#).unwrap();
    std::fs::rename(&swap, store.path()).unwrap();

    let expected = ConfigDocument::new(["198.51.100.1"]);
    assert!(common::wait_for_document(&store, &expected).await);

    store.close().await;
}

#[tokio::test]
async fn test_malformed_file_keeps_last_good_snapshot() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;
    let good = ConfigDocument::new(["192.0.2.1"]);
    std::fs::write(store.path(), serde_json::to_vec(&good).unwrap()).unwrap();
    assert!(common::wait_for_document(&store, &good).await);

    std::fs::write(store.path(), b"this is { not json").unwrap();
    // Give the watcher time to react, then drive a pass directly as well.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.reload().await, ReloadOutcome::Rejected);

    assert_eq!(store.get(), good);
    store.close().await;
}

#[tokio::test]
async fn test_delete_resets_and_recreate_restores() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;
    let doc = ConfigDocument::new(["192.0.2.7"]);
    std::fs::write(store.path(), serde_json::to_vec(&doc).unwrap()).unwrap();
    assert!(common::wait_for_document(&store, &doc).await);

    std::fs::remove_file(store.path()).unwrap();
    assert!(common::wait_for_document(&store, &ConfigDocument::default()).await);

    std::fs::write(store.path(), serde_json::to_vec(&doc).unwrap()).unwrap();
    assert!(common::wait_for_document(&store, &doc).await);

    store.close().await;
}

#[tokio::test]
async fn test_own_save_is_not_reloaded_into_stale_state() {
    let root = TempDir::new().unwrap();
    let store = common::open_store(&root).await;

    for i in 0..5 {
        store
            .save(ConfigDocument::new([format!("10.0.0.{i}")]))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(store.get().ip_addresses, vec!["10.0.0.4"]);
    store.close().await;
}

#[tokio::test]
async fn test_poll_fallback_reloads_without_watch_events() {
    let root = TempDir::new().unwrap();
    let mut settings = common::store_settings(root.path());
    settings.watch = false;
    settings.poll_interval_secs = Some(1);
    let store = ConfigStore::open(&settings).await.unwrap();
    assert!(!store.is_watching().await);

    std::fs::write(store.path(), br#"{"ipAddresses":["192.0.2.99"]}"#).unwrap();

    let expected = ConfigDocument::new(["192.0.2.99"]);
    assert!(common::wait_for_document(&store, &expected).await);
    store.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_partial_documents() {
    let root = TempDir::new().unwrap();
    let store = Arc::new(common::open_store(&root).await);

    let old = ConfigDocument::new((0..200).map(|i| format!("10.0.{}.{}", i / 256, i % 256)));
    let new = ConfigDocument::new((0..200).map(|i| format!("172.16.{}.{}", i / 256, i % 256)));
    store.save(old.clone()).await.unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(AtomicUsize::new(0));
    let mut readers = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        let reads = Arc::clone(&reads);
        let (old, new) = (old.clone(), new.clone());
        readers.push(tokio::spawn(async move {
            while !done.load(Ordering::Relaxed) {
                let seen = store.get();
                assert!(seen == old || seen == new, "observed a mixed document");
                reads.fetch_add(1, Ordering::Relaxed);
                tokio::task::yield_now().await;
            }
        }));
    }

    for i in 0..10 {
        let doc = if i % 2 == 0 { new.clone() } else { old.clone() };
        store.save(doc).await.unwrap();
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.await.unwrap();
    }
    assert!(reads.load(Ordering::Relaxed) > 0);
    assert_eq!(store.get(), old);
    store.close().await;
}
