//! Tests for StateManager

use super::*;
use tempfile::tempdir;

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/test-state.json");
    assert!(!manager.is_in_memory());
    assert_eq!(manager.path().to_str().unwrap(), "/tmp/test-state.json");
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[test]
fn test_from_file_missing_is_empty() {
    let dir = tempdir().unwrap();
    let manager = StateManager::from_file(dir.path().join("state.json")).unwrap();
    assert!(!manager.is_in_memory());
}

#[test]
fn test_from_file_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = StateManager::from_file(&path).unwrap_err();
    assert!(matches!(err, crate::error::Error::State { .. }));
}

#[tokio::test]
async fn test_from_json() {
    let manager = StateManager::from_json(
        r#"{"resources": {"ZMAT": {"watermark": "20240101", "watermark_column": "LAEDA"}}}"#,
    )
    .unwrap();
    assert!(manager.is_in_memory());
    assert_eq!(
        manager.watermark_for("ZMAT", "LAEDA").await,
        Some("20240101".to_string())
    );
}

// ============================================================================
// Run Recording Tests
// ============================================================================

#[tokio::test]
async fn test_record_run_sets_watermark() {
    let manager = StateManager::in_memory();
    assert!(manager.get_resource("ZMAT").await.is_none());

    manager
        .record_run(
            "ZMAT",
            Some(("LAEDA".to_string(), "20240105".to_string())),
            42,
        )
        .await
        .unwrap();

    let resource = manager.get_resource("ZMAT").await.unwrap();
    assert_eq!(resource.watermark.as_deref(), Some("20240105"));
    assert_eq!(resource.watermark_column.as_deref(), Some("LAEDA"));
    assert_eq!(resource.rows_last_run, 42);
    assert!(resource.last_run_at.is_some());
}

#[tokio::test]
async fn test_full_run_clears_watermark() {
    let manager = StateManager::in_memory();
    manager
        .record_run("ZMAT", Some(("LAEDA".to_string(), "1".to_string())), 1)
        .await
        .unwrap();
    manager.record_run("ZMAT", None, 10).await.unwrap();

    let resource = manager.get_resource("ZMAT").await.unwrap();
    assert!(resource.watermark.is_none());
    assert_eq!(resource.rows_last_run, 10);
}

#[tokio::test]
async fn test_watermark_for_other_column_ignored() {
    let manager = StateManager::in_memory();
    manager
        .record_run("ZMAT", Some(("LAEDA".to_string(), "1".to_string())), 1)
        .await
        .unwrap();

    assert_eq!(manager.watermark_for("ZMAT", "ERSDA").await, None);
}

#[tokio::test]
async fn test_clear_resource() {
    let manager = StateManager::in_memory();
    manager.record_run("ZMAT", None, 1).await.unwrap();
    manager.record_run("ZCUST", None, 2).await.unwrap();

    manager.clear_resource("ZMAT").await.unwrap();
    assert!(manager.get_resource("ZMAT").await.is_none());
    assert!(manager.get_resource("ZCUST").await.is_some());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_record_run_persists_atomically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let manager = StateManager::new(&path);
    manager
        .record_run("ZMAT", Some(("LAEDA".to_string(), "20240105".to_string())), 3)
        .await
        .unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reloaded = StateManager::from_file(&path).unwrap();
    assert_eq!(
        reloaded.watermark_for("ZMAT", "LAEDA").await,
        Some("20240105".to_string())
    );
}

#[tokio::test]
async fn test_load_replaces_cached_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let writer = StateManager::new(&path);
    let reader = StateManager::new(&path);

    writer.record_run("ZMAT", None, 7).await.unwrap();
    assert!(reader.get_resource("ZMAT").await.is_none());

    reader.load().await.unwrap();
    assert_eq!(reader.get_resource("ZMAT").await.unwrap().rows_last_run, 7);
}

#[tokio::test]
async fn test_clone_shares_state() {
    let manager = StateManager::in_memory();
    let clone = manager.clone();

    manager.record_run("ZMAT", None, 5).await.unwrap();
    assert_eq!(clone.get_resource("ZMAT").await.unwrap().rows_last_run, 5);
}

#[tokio::test]
async fn test_empty_file_is_empty_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "").unwrap();

    let manager = StateManager::from_file(&path).unwrap();
    assert!(manager.state().await.resources.is_empty());
}
