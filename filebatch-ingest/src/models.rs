//! Data model for items and batches
//!
//! An `Item` is one uploaded file's processing record; a `Batch` spans one
//! ingestion request. Items reference their batch by guid; the batch itself
//! never holds item rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

/// Item lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Record created, processing not started
    Pending,
    /// Parsing in progress; a crash mid-parse is observable as this state
    Processing,
    /// Parsed successfully, payload persisted
    Completed,
    /// Parse or read failed, error message persisted
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ItemStatus::Pending),
            "processing" => Some(ItemStatus::Processing),
            "completed" => Some(ItemStatus::Completed),
            "failed" => Some(ItemStatus::Failed),
            _ => None,
        }
    }
}

/// One uploaded file's processing record
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub guid: Uuid,
    pub batch_guid: Uuid,
    /// Stored filename in the upload directory (unique per upload)
    pub filename: String,
    /// Filename as submitted by the client
    pub original_name: String,
    pub media_type: String,
    pub size_bytes: i64,
    pub status: ItemStatus,
    /// 0 until the item completes
    pub records_count: i64,
    /// Parsed payload; present only when status is completed
    pub payload: Option<Value>,
    /// Present only when status is failed
    pub error_message: Option<String>,
    pub processing_time_ms: i64,
    pub received_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Create a new pending item record
    pub fn new(
        batch_guid: Uuid,
        filename: String,
        original_name: String,
        media_type: String,
        size_bytes: i64,
    ) -> Self {
        Self {
            guid: Uuid::new_v4(),
            batch_guid,
            filename,
            original_name,
            media_type,
            size_bytes,
            status: ItemStatus::Pending,
            records_count: 0,
            payload: None,
            error_message: None,
            processing_time_ms: 0,
            received_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Per-file error summary kept on the batch record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchErrorDetail {
    pub filename: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// One ingestion request spanning one or more items
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub guid: Uuid,
    pub files_declared: i64,
    pub files_succeeded: i64,
    pub files_failed: i64,
    pub error_details: Vec<BatchErrorDetail>,
    pub total_time_ms: i64,
    pub started_at: DateTime<Utc>,
    /// NULL while any item is still in flight
    pub completed_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// Create a new open batch record
    pub fn new(files_declared: i64) -> Self {
        Self {
            guid: Uuid::new_v4(),
            files_declared,
            files_succeeded: 0,
            files_failed: 0,
            error_details: Vec::new(),
            total_time_ms: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// What the upload boundary hands to the core for each accepted file
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Temp storage location of the raw bytes
    pub temp_path: PathBuf,
    /// Unique stored filename inside the upload directory
    pub stored_name: String,
    /// Filename as submitted by the client
    pub original_name: String,
    /// Declared media type from the multipart part
    pub media_type: String,
    pub size_bytes: i64,
}
