//! Integration tests for the batch coordinator
//!
//! Covers settle-all semantics, input-order preservation, aggregate
//! statistics, batch record finalization, and temp-file cleanup.

use filebatch_ingest::db;
use filebatch_ingest::models::{ItemStatus, UploadedFile};
use filebatch_ingest::services::batch_coordinator::run_batch;
use filebatch_ingest::services::temp_store::TempStore;
use serde_json::json;
use sqlx::SqlitePool;

// File-backed database: item tasks hit the pool concurrently, so every
// pool connection must see the same database.
async fn test_pool(dir: &tempfile::TempDir) -> SqlitePool {
    filebatch_common::db::init_database(&dir.path().join("test.db"))
        .await
        .expect("Failed to create test database")
}

async fn write_upload(
    store: &TempStore,
    original_name: &str,
    media_type: &str,
    bytes: &[u8],
) -> UploadedFile {
    let stored_name = TempStore::stored_name(original_name);
    let temp_path = store.store(&stored_name, bytes).await.unwrap();
    UploadedFile {
        temp_path,
        stored_name,
        original_name: original_name.to_string(),
        media_type: media_type.to_string(),
        size_bytes: bytes.len() as i64,
    }
}

#[tokio::test]
async fn test_empty_batch_rejected_without_batch_record() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    let result = run_batch(&pool, &store, Vec::new()).await;
    assert!(result.is_err());

    let batches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(batches, 0, "No batch record for an empty request");
}

#[tokio::test]
async fn test_mixed_batch_scenario() {
    // Batch of 3: valid JSON, valid CSV, malformed JSON
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    let uploads = vec![
        write_upload(&store, "good.json", "application/json", br#"[{"x":1}]"#).await,
        write_upload(&store, "rows.csv", "text/csv", b"a,b\n1,2").await,
        write_upload(&store, "broken.json", "application/json", b"{oops").await,
    ];

    let outcome = run_batch(&pool, &store, uploads).await.unwrap();

    assert_eq!(outcome.stats.total, 3);
    assert_eq!(outcome.stats.succeeded, 2);
    assert_eq!(outcome.stats.failed, 1);

    // Rows come back in submission order with terminal statuses
    assert_eq!(outcome.results[0].filename, "good.json");
    assert_eq!(outcome.results[0].status, ItemStatus::Completed);
    assert_eq!(outcome.results[0].payload, Some(json!([{"x": 1}])));

    assert_eq!(outcome.results[1].filename, "rows.csv");
    assert_eq!(outcome.results[1].status, ItemStatus::Completed);
    assert_eq!(outcome.results[1].records_count, 1);
    assert_eq!(outcome.results[1].payload, Some(json!([{"a": "1", "b": "2"}])));

    assert_eq!(outcome.results[2].filename, "broken.json");
    assert_eq!(outcome.results[2].status, ItemStatus::Failed);
    assert_eq!(outcome.results[2].records_count, 0);
    assert_eq!(outcome.results[2].processing_time_ms, 0);
    assert!(outcome.results[2].payload.is_none());
    assert!(outcome.results[2].error_message.is_some());

    // Batch record finalized with matching counts and the failed filename
    let batch = db::batches::find_batch(&pool, outcome.batch_guid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.files_declared, 3);
    assert_eq!(batch.files_succeeded, 2);
    assert_eq!(batch.files_failed, 1);
    assert_eq!(batch.files_succeeded + batch.files_failed, batch.files_declared);
    assert!(batch.completed_at.is_some());
    assert_eq!(batch.error_details.len(), 1);
    assert_eq!(batch.error_details[0].filename, "broken.json");
}

#[tokio::test]
async fn test_result_order_matches_submission_order() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    // Interleave sizes and outcomes so completion order differs from
    // submission order: a large text file, failures, small files.
    let big_text = "line\n".repeat(50_000);
    let mut uploads = Vec::new();
    uploads.push(write_upload(&store, "file-00.txt", "text/plain", big_text.as_bytes()).await);
    for i in 1..10 {
        let (name, media_type, bytes): (String, &str, Vec<u8>) = if i % 3 == 0 {
            (format!("file-{:02}.json", i), "application/json", b"{bad".to_vec())
        } else if i % 3 == 1 {
            (
                format!("file-{:02}.json", i),
                "application/json",
                format!(r#"[{{"i":{}}}]"#, i).into_bytes(),
            )
        } else {
            (format!("file-{:02}.csv", i), "text/csv", b"a\n1".to_vec())
        };
        uploads.push(write_upload(&store, &name, media_type, &bytes).await);
    }

    let expected: Vec<String> = uploads.iter().map(|u| u.original_name.clone()).collect();
    let outcome = run_batch(&pool, &store, uploads).await.unwrap();

    let actual: Vec<String> = outcome.results.iter().map(|r| r.filename.clone()).collect();
    assert_eq!(actual, expected, "Rows must preserve submission order");

    // Every item has a terminal status
    assert!(outcome
        .results
        .iter()
        .all(|r| r.status == ItemStatus::Completed || r.status == ItemStatus::Failed));
    assert_eq!(
        outcome.stats.succeeded + outcome.stats.failed,
        outcome.stats.total
    );
}

#[tokio::test]
async fn test_one_failure_never_suppresses_sibling_results() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    let uploads = vec![
        write_upload(&store, "bad.csv", "text/csv", b"").await,
        write_upload(&store, "ok-1.json", "application/json", br#"{"a":1}"#).await,
        write_upload(&store, "ok-2.txt", "text/plain", b"hello\n\nworld").await,
    ];

    let outcome = run_batch(&pool, &store, uploads).await.unwrap();

    assert_eq!(outcome.results.len(), 3);
    assert_eq!(outcome.results[0].status, ItemStatus::Failed);
    assert_eq!(outcome.results[1].status, ItemStatus::Completed);
    assert_eq!(outcome.results[1].records_count, 1);
    assert_eq!(outcome.results[2].status, ItemStatus::Completed);
    assert_eq!(
        outcome.results[2].payload,
        Some(json!([
            {"lineNumber": 1, "content": "hello"},
            {"lineNumber": 2, "content": "world"},
        ]))
    );

    // Batch is closed once all items settled, despite the failure
    let batch = db::batches::find_batch(&pool, outcome.batch_guid)
        .await
        .unwrap()
        .unwrap();
    assert!(batch.completed_at.is_some());
}

#[tokio::test]
async fn test_all_temp_files_released() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    let uploads = vec![
        write_upload(&store, "ok.json", "application/json", br#"[1,2,3]"#).await,
        write_upload(&store, "bad.json", "application/json", b"nope").await,
        write_upload(&store, "empty.json", "application/json", b"[]").await,
    ];
    let temp_paths: Vec<_> = uploads.iter().map(|u| u.temp_path.clone()).collect();

    run_batch(&pool, &store, uploads).await.unwrap();

    for path in temp_paths {
        assert!(!path.exists(), "Temp file not released: {}", path.display());
    }
}

#[tokio::test]
async fn test_header_only_csv_is_a_failed_item() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    let uploads = vec![write_upload(&store, "header-only.csv", "text/csv", b"a,b").await];
    let outcome = run_batch(&pool, &store, uploads).await.unwrap();

    assert_eq!(outcome.stats.succeeded, 0);
    assert_eq!(outcome.stats.failed, 1);
    assert!(outcome.results[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("empty"));
}

#[tokio::test]
async fn test_item_rows_persisted_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    let uploads = vec![
        write_upload(&store, "a.json", "application/json", br#"[{"x":1}]"#).await,
        write_upload(&store, "b.json", "application/json", b"x").await,
    ];

    let outcome = run_batch(&pool, &store, uploads).await.unwrap();

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE batch_guid = ?")
            .bind(outcome.batch_guid.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 2);

    let terminal: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM items WHERE batch_guid = ? AND status IN ('completed', 'failed')",
    )
    .bind(outcome.batch_guid.to_string())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(terminal, 2, "Every item reaches a terminal status");
}

#[tokio::test]
async fn test_large_batch_settles() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir).await;
    let store = TempStore::new(dir.path().to_path_buf());

    let mut uploads = Vec::new();
    for i in 0..20 {
        let bytes = format!(r#"[{{"i":{}}}]"#, i).into_bytes();
        uploads.push(
            write_upload(&store, &format!("f{}.json", i), "application/json", &bytes).await,
        );
    }

    let outcome = run_batch(&pool, &store, uploads).await.unwrap();
    assert_eq!(outcome.stats.total, 20);
    assert_eq!(outcome.stats.succeeded, 20);
    assert_eq!(outcome.stats.failed, 0);
}
