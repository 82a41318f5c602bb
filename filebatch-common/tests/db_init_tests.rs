//! Database initialization tests

use filebatch_common::db::init_database;
use sqlx::Row;

#[tokio::test]
async fn test_init_creates_database_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("filebatch.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists(), "Database file created, parents included");

    let rows = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let tables: Vec<String> = rows.iter().map(|r| r.get("name")).collect();
    assert!(tables.contains(&"batches".to_string()));
    assert!(tables.contains(&"items".to_string()));
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("filebatch.db");

    let pool = init_database(&db_path).await.unwrap();
    drop(pool);

    // Re-opening an existing database must not fail or lose data
    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_wal_mode_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("filebatch.db");

    let pool = init_database(&db_path).await.unwrap();

    // WAL is a persistent database-level setting, visible on any connection
    let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
