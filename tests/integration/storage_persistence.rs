//! Integration tests for the file store
//!
//! These tests verify that:
//! - Data survives reopening the store
//! - The on-disk layout matches what dashboards read
//! - Disabled storage falls back to memory

use site_pulse::config::StorageConfig;
use site_pulse::storage::{self, ResultStore, files::FileStore};
use site_pulse::ResultKind;
use tempfile::tempdir;

use crate::helpers::create_order_result;

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();

    {
        let store = FileStore::new(dir.path(), 100, 30).await.unwrap();
        store.append(&create_order_result("store", 4)).await.unwrap();
        store.append(&create_order_result("store", 5)).await.unwrap();
    }

    let config = StorageConfig::Files {
        path: dir.path().to_path_buf(),
        summary_cap: 100,
        history_days: 30,
    };
    let store = storage::open(&config).await.unwrap();

    assert_eq!(store.history("store", ResultKind::Commerce, 30).await.len(), 2);
    assert_eq!(store.summary("store", ResultKind::Commerce).await.len(), 2);
    assert!(store.get_stats().await.contains("1 daily logs"));
}

#[tokio::test]
async fn test_on_disk_layout() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path(), 100, 30).await.unwrap();
    let result = create_order_result("gelball store", 4);
    store.append(&result).await.unwrap();

    let kind_dir = dir.path().join("commerce");
    let daily = kind_dir.join(format!("commerce-{}.json", result.timestamp.format("%Y-%m-%d")));
    let content: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(daily).unwrap()).unwrap();

    assert_eq!(content[0]["site"], "gelball store");
    assert_eq!(content[0]["metrics"]["kind"], "commerce");
    assert_eq!(content[0]["metrics"]["orders_24h"], 4);
    assert!(kind_dir.join("commerce-summary-gelball_store.json").exists());
    assert!(!kind_dir.join("commerce-latest.json.tmp").exists());
}

#[tokio::test]
async fn test_memory_backend_when_storage_disabled() {
    let store = storage::open(&StorageConfig::None).await.unwrap();
    store.append(&create_order_result("store", 1)).await.unwrap();
    assert!(store.get_stats().await.starts_with("In-Memory"));
}
