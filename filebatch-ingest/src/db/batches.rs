//! Batch record database operations
//!
//! The batch row is written exactly twice: once at creation and once on
//! finalization, both by the batch coordinator.

use crate::models::{Batch, BatchErrorDetail};
use chrono::{DateTime, Utc};
use filebatch_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Insert a new open batch record
pub async fn create_batch(pool: &SqlitePool, batch: &Batch) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO batches (
            guid, files_declared, files_succeeded, files_failed,
            error_details, total_time_ms, started_at, completed_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(batch.guid.to_string())
    .bind(batch.files_declared)
    .bind(batch.files_succeeded)
    .bind(batch.files_failed)
    .bind(encode_error_details(&batch.error_details)?)
    .bind(batch.total_time_ms)
    .bind(batch.started_at.to_rfc3339())
    .bind(batch.completed_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Final update after every item has settled: counts, duration, completion
pub async fn finalize_batch(
    pool: &SqlitePool,
    guid: Uuid,
    files_succeeded: i64,
    files_failed: i64,
    total_time_ms: i64,
    error_details: &[BatchErrorDetail],
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE batches
        SET files_succeeded = ?,
            files_failed = ?,
            error_details = ?,
            total_time_ms = ?,
            completed_at = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(files_succeeded)
    .bind(files_failed)
    .bind(encode_error_details(error_details)?)
    .bind(total_time_ms)
    .bind(Utc::now().to_rfc3339())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one batch by guid
pub async fn find_batch(pool: &SqlitePool, guid: Uuid) -> Result<Option<Batch>> {
    let row = sqlx::query("SELECT * FROM batches WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|r| batch_from_row(&r)).transpose()
}

fn encode_error_details(details: &[BatchErrorDetail]) -> Result<String> {
    serde_json::to_string(details)
        .map_err(|e| Error::Internal(format!("Serialize error details failed: {}", e)))
}

fn batch_from_row(row: &SqliteRow) -> Result<Batch> {
    let guid: String = row.get("guid");
    let error_details: String = row.get("error_details");
    let started_at: String = row.get("started_at");
    let completed_at: Option<String> = row.get("completed_at");

    Ok(Batch {
        guid: Uuid::parse_str(&guid)
            .map_err(|e| Error::Internal(format!("Invalid guid in database: {}", e)))?,
        files_declared: row.get("files_declared"),
        files_succeeded: row.get("files_succeeded"),
        files_failed: row.get("files_failed"),
        error_details: serde_json::from_str(&error_details)
            .map_err(|e| Error::Internal(format!("Corrupt batch error details: {}", e)))?,
        total_time_ms: row.get("total_time_ms"),
        started_at: parse_timestamp(&started_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        filebatch_common::db::init::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_find_batch() {
        let pool = test_pool().await;

        let batch = Batch::new(3);
        create_batch(&pool, &batch).await.expect("Failed to save batch");

        let loaded = find_batch(&pool, batch.guid)
            .await
            .expect("Failed to load batch")
            .expect("Batch not found");

        assert_eq!(loaded.files_declared, 3);
        assert_eq!(loaded.files_succeeded, 0);
        assert!(loaded.completed_at.is_none());
        assert!(loaded.error_details.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_batch_stamps_completion() {
        let pool = test_pool().await;

        let batch = Batch::new(2);
        create_batch(&pool, &batch).await.unwrap();

        let details = vec![BatchErrorDetail {
            filename: "bad.json".to_string(),
            error: "malformed JSON: expected value".to_string(),
            timestamp: Utc::now(),
        }];
        finalize_batch(&pool, batch.guid, 1, 1, 128, &details)
            .await
            .unwrap();

        let loaded = find_batch(&pool, batch.guid).await.unwrap().unwrap();
        assert_eq!(loaded.files_succeeded, 1);
        assert_eq!(loaded.files_failed, 1);
        assert_eq!(loaded.files_succeeded + loaded.files_failed, loaded.files_declared);
        assert_eq!(loaded.total_time_ms, 128);
        assert!(loaded.completed_at.is_some());
        assert_eq!(loaded.error_details.len(), 1);
        assert_eq!(loaded.error_details[0].filename, "bad.json");
    }

    #[tokio::test]
    async fn test_find_missing_batch_is_none() {
        let pool = test_pool().await;
        assert!(find_batch(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }
}
