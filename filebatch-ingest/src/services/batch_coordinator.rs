//! Batch coordinator
//!
//! Fans out one item-processor task per uploaded file, waits for every task
//! to settle (success or failure) with no cancellation and no fail-fast,
//! then rebuilds result rows in original submission order and finalizes the
//! batch record.
//!
//! Only the coordinator writes the batch row, exactly twice: creation and
//! the final update after the settle-all barrier.

use crate::db;
use crate::models::{Batch, BatchErrorDetail, ItemStatus, UploadedFile};
use crate::services::item_processor::{self, ItemOutcome};
use crate::services::temp_store::TempStore;
use chrono::Utc;
use filebatch_common::{Error, Result};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// One per-item result row, in original submission order
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub filename: String,
    pub status: ItemStatus,
    pub records_count: i64,
    pub processing_time_ms: i64,
    pub payload: Option<Value>,
    pub error_message: Option<String>,
}

/// Aggregate statistics for one batch
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchStats {
    pub total: i64,
    pub succeeded: i64,
    pub failed: i64,
    pub total_time_ms: i64,
}

/// Everything returned to the caller for one ingestion request
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub batch_guid: Uuid,
    pub results: Vec<ItemReport>,
    pub stats: BatchStats,
}

/// Run one batch: fan out, settle all, aggregate, finalize.
///
/// An empty upload list is rejected before any batch record is created.
/// Item-local failures are captured into their result rows; store failures
/// (the item tasks' or the coordinator's own) surface as the returned `Err`
/// after every task has settled.
pub async fn run_batch(
    pool: &SqlitePool,
    temp_store: &TempStore,
    uploads: Vec<UploadedFile>,
) -> Result<BatchOutcome> {
    if uploads.is_empty() {
        return Err(Error::InvalidInput("no files received".to_string()));
    }

    let started = Instant::now();
    let batch = Batch::new(uploads.len() as i64);
    db::batches::create_batch(pool, &batch).await?;

    info!(
        batch_id = %batch.guid,
        files = uploads.len(),
        "Processing batch"
    );

    let handles: Vec<_> = uploads
        .iter()
        .cloned()
        .map(|upload| {
            let pool = pool.clone();
            let temp_store = temp_store.clone();
            let batch_guid = batch.guid;
            tokio::spawn(async move {
                item_processor::process(&pool, &temp_store, &upload, batch_guid).await
            })
        })
        .collect();

    // Settle-all barrier: join_all waits for every task and preserves the
    // input order, so rows come back aligned with the submitted file list
    // no matter which task finishes first.
    let settled = join_all(handles).await;

    let mut results = Vec::with_capacity(uploads.len());
    let mut store_error: Option<Error> = None;

    for (upload, joined) in uploads.iter().zip(settled) {
        let report = match joined {
            Ok(Ok(ItemOutcome::Completed {
                records_count,
                processing_time_ms,
                payload,
                ..
            })) => ItemReport {
                filename: upload.original_name.clone(),
                status: ItemStatus::Completed,
                records_count,
                processing_time_ms,
                payload: Some(payload),
                error_message: None,
            },
            Ok(Ok(ItemOutcome::Failed { message, .. })) => {
                failed_report(&upload.original_name, message)
            }
            Ok(Err(e)) => {
                // Store failure inside the item task: the row is reported
                // failed for aggregation, but the batch-level operation
                // errors once everything has settled.
                let message = e.to_string();
                if store_error.is_none() {
                    store_error = Some(e);
                }
                failed_report(&upload.original_name, message)
            }
            Err(join_err) => {
                // A panicked task settles as a failed row; it never
                // suppresses sibling results.
                error!(
                    batch_id = %batch.guid,
                    file = %upload.original_name,
                    error = %join_err,
                    "Item task panicked"
                );
                failed_report(
                    &upload.original_name,
                    format!("item processing aborted unexpectedly: {}", join_err),
                )
            }
        };
        results.push(report);
    }

    let succeeded = results
        .iter()
        .filter(|r| r.status == ItemStatus::Completed)
        .count() as i64;
    let failed = results.len() as i64 - succeeded;
    let total_time_ms = started.elapsed().as_millis() as i64;

    let error_details: Vec<BatchErrorDetail> = results
        .iter()
        .filter(|r| r.status == ItemStatus::Failed)
        .map(|r| BatchErrorDetail {
            filename: r.filename.clone(),
            error: r
                .error_message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
            timestamp: Utc::now(),
        })
        .collect();

    let finalized = db::batches::finalize_batch(
        pool,
        batch.guid,
        succeeded,
        failed,
        total_time_ms,
        &error_details,
    )
    .await;

    if let Some(err) = store_error {
        // Bookkeeping integrity is gone; the finalize above was best effort
        // so the record is not left open when avoidable.
        if let Err(e) = finalized {
            warn!(
                batch_id = %batch.guid,
                error = %e,
                "Batch finalize failed after item store error"
            );
        }
        return Err(err);
    }
    finalized?;

    info!(
        batch_id = %batch.guid,
        succeeded,
        failed,
        elapsed_ms = total_time_ms,
        "Batch completed"
    );

    Ok(BatchOutcome {
        batch_guid: batch.guid,
        results,
        stats: BatchStats {
            total: uploads.len() as i64,
            succeeded,
            failed,
            total_time_ms,
        },
    })
}

fn failed_report(filename: &str, message: String) -> ItemReport {
    ItemReport {
        filename: filename.to_string(),
        status: ItemStatus::Failed,
        records_count: 0,
        processing_time_ms: 0,
        payload: None,
        error_message: Some(message),
    }
}
