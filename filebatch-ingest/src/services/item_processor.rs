//! Item processor
//!
//! Wraps one uploaded file's lifecycle: persist the intake record, invoke
//! the matching parser, persist the outcome, and release temp storage
//! exactly once on every exit path.
//!
//! Parse failures, the empty-result rule, and read errors are captured into
//! the item's failed row and returned as `ItemOutcome::Failed`; they never
//! escape this module. Only store (database) failures propagate as `Err`,
//! since item bookkeeping cannot be guaranteed without the store.

use crate::db;
use crate::models::{Item, UploadedFile};
use crate::parsers::{self, ParseError};
use crate::services::temp_store::TempStore;
use filebatch_common::Result;
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Failures local to one item; each becomes that item's error message
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Parser succeeded syntactically but produced zero usable records
    #[error("file is empty or contains no valid records")]
    EmptyResult,

    #[error("failed to read uploaded file: {0}")]
    Read(#[from] std::io::Error),
}

/// Terminal outcome of one item, as consumed by the batch coordinator.
/// The coordinator never re-reads the store for this.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Completed {
        item_guid: Uuid,
        records_count: i64,
        processing_time_ms: i64,
        payload: Value,
    },
    Failed {
        item_guid: Uuid,
        message: String,
    },
}

/// Process one uploaded file within a batch.
///
/// The intake record is persisted (pending, then processing) before any
/// parsing begins, so a crash mid-parse is observable as "processing"
/// rather than silently missing.
pub async fn process(
    pool: &SqlitePool,
    temp_store: &TempStore,
    upload: &UploadedFile,
    batch_guid: Uuid,
) -> Result<ItemOutcome> {
    let started = Instant::now();

    let item = Item::new(
        batch_guid,
        upload.stored_name.clone(),
        upload.original_name.clone(),
        upload.media_type.clone(),
        upload.size_bytes,
    );
    db::items::create_item(pool, &item).await?;
    db::items::mark_processing(pool, item.guid).await?;

    info!(
        item_id = %item.guid,
        batch_id = %batch_guid,
        file = %upload.original_name,
        media_type = %upload.media_type,
        "Processing file"
    );

    let outcome = settle(pool, &item, upload, started).await;

    // Release temp storage exactly once, after the outcome is decided.
    // A release failure is logged, never escalated: it must not override
    // or mask the item's primary outcome.
    if let Err(e) = temp_store.release(&upload.temp_path).await {
        warn!(
            item_id = %item.guid,
            file = %upload.stored_name,
            error = %e,
            "Failed to remove temp file"
        );
    }

    outcome
}

/// Read, parse, and persist the terminal status. `Err` here is a store
/// failure only; item-local failures land in the failed row.
async fn settle(
    pool: &SqlitePool,
    item: &Item,
    upload: &UploadedFile,
    started: Instant,
) -> Result<ItemOutcome> {
    match parse_upload(upload).await {
        Ok(payload) => {
            let records_count = parsers::record_count(&payload);
            let processing_time_ms = started.elapsed().as_millis() as i64;

            db::items::complete_item(pool, item.guid, records_count, &payload, processing_time_ms)
                .await?;

            info!(
                item_id = %item.guid,
                file = %upload.original_name,
                records = records_count,
                elapsed_ms = processing_time_ms,
                "File processed"
            );

            Ok(ItemOutcome::Completed {
                item_guid: item.guid,
                records_count,
                processing_time_ms,
                payload,
            })
        }
        Err(e) => {
            let message = e.to_string();
            db::items::fail_item(pool, item.guid, &message).await?;

            warn!(
                item_id = %item.guid,
                file = %upload.original_name,
                error = %message,
                "File processing failed"
            );

            Ok(ItemOutcome::Failed {
                item_guid: item.guid,
                message,
            })
        }
    }
}

/// Read the temp file and parse it by declared media type, applying the
/// empty-result rule: an empty collection is a failure, not a zero-record
/// success.
async fn parse_upload(upload: &UploadedFile) -> std::result::Result<Value, ItemError> {
    let bytes = tokio::fs::read(&upload.temp_path).await?;
    let payload = parsers::parse(&bytes, &upload.media_type)?;

    if parsers::is_structurally_empty(&payload) {
        return Err(ItemError::EmptyResult);
    }

    Ok(payload)
}
