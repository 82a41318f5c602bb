//! Item record database operations

use crate::models::{Item, ItemStatus};
use chrono::{DateTime, Utc};
use filebatch_common::{Error, Result};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Insert a new item record (status pending)
pub async fn create_item(pool: &SqlitePool, item: &Item) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO items (
            guid, batch_guid, filename, original_name, media_type, size_bytes,
            status, records_count, payload, error_message, processing_time_ms,
            received_at, completed_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.guid.to_string())
    .bind(item.batch_guid.to_string())
    .bind(&item.filename)
    .bind(&item.original_name)
    .bind(&item.media_type)
    .bind(item.size_bytes)
    .bind(item.status.as_str())
    .bind(item.records_count)
    .bind(item.payload.as_ref().map(|p| p.to_string()))
    .bind(&item.error_message)
    .bind(item.processing_time_ms)
    .bind(item.received_at.to_rfc3339())
    .bind(item.completed_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Transition an item to processing
pub async fn mark_processing(pool: &SqlitePool, guid: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE items
        SET status = 'processing', updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist a successful outcome: payload, record count, completion time
pub async fn complete_item(
    pool: &SqlitePool,
    guid: Uuid,
    records_count: i64,
    payload: &Value,
    processing_time_ms: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE items
        SET status = 'completed',
            records_count = ?,
            payload = ?,
            error_message = NULL,
            processing_time_ms = ?,
            completed_at = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(records_count)
    .bind(payload.to_string())
    .bind(processing_time_ms)
    .bind(Utc::now().to_rfc3339())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist a failed outcome; the payload stays NULL
pub async fn fail_item(pool: &SqlitePool, guid: Uuid, error_message: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE items
        SET status = 'failed',
            error_message = ?,
            completed_at = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(error_message)
    .bind(Utc::now().to_rfc3339())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one item by guid, including its payload
pub async fn load_item(pool: &SqlitePool, guid: Uuid) -> Result<Option<Item>> {
    let row = sqlx::query("SELECT * FROM items WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|r| item_from_row(&r)).transpose()
}

/// Load a page of items, newest first, payload excluded (it can be large)
pub async fn list_items(pool: &SqlitePool, page: i64, limit: i64) -> Result<(Vec<Item>, i64)> {
    let offset = (page - 1) * limit;

    let rows = sqlx::query(
        r#"
        SELECT guid, batch_guid, filename, original_name, media_type, size_bytes,
               status, records_count, NULL AS payload, error_message,
               processing_time_ms, received_at, completed_at
        FROM items
        ORDER BY received_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(item_from_row(&row)?);
    }

    Ok((items, total))
}

/// Update caller-editable fields; returns the updated item, None if absent
pub async fn update_item_fields(
    pool: &SqlitePool,
    guid: Uuid,
    original_name: Option<&str>,
    records_count: Option<i64>,
) -> Result<Option<Item>> {
    if let Some(name) = original_name {
        sqlx::query(
            "UPDATE items SET original_name = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(name)
        .bind(guid.to_string())
        .execute(pool)
        .await?;
    }

    if let Some(count) = records_count {
        sqlx::query(
            "UPDATE items SET records_count = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(count)
        .bind(guid.to_string())
        .execute(pool)
        .await?;
    }

    load_item(pool, guid).await
}

/// Delete an item record; returns false if it did not exist
pub async fn delete_item(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM items WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn item_from_row(row: &SqliteRow) -> Result<Item> {
    let guid: String = row.get("guid");
    let batch_guid: String = row.get("batch_guid");
    let status: String = row.get("status");
    let payload: Option<String> = row.get("payload");
    let received_at: String = row.get("received_at");
    let completed_at: Option<String> = row.get("completed_at");

    Ok(Item {
        guid: parse_uuid(&guid)?,
        batch_guid: parse_uuid(&batch_guid)?,
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        media_type: row.get("media_type"),
        size_bytes: row.get("size_bytes"),
        status: ItemStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown item status: {}", status)))?,
        records_count: row.get("records_count"),
        payload: payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(|e| Error::Internal(format!("Corrupt item payload: {}", e)))?,
        error_message: row.get("error_message"),
        processing_time_ms: row.get("processing_time_ms"),
        received_at: parse_timestamp(&received_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Invalid guid in database: {}", e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}
