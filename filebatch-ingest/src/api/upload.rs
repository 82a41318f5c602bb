//! Upload boundary
//!
//! POST /api/upload accepts multipart form data (repeatable `files` field),
//! pre-filters media type and size, writes each accepted part to temp
//! storage, and hands the resulting file tuples to the batch coordinator.
//! The coordinator never sees network streams, only temp paths.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::UploadedFile;
use crate::parsers;
use crate::services::batch_coordinator::{self, BatchStats, ItemReport};
use crate::services::temp_store::TempStore;
use crate::AppState;

/// POST /api/upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<ItemReport>,
    pub stats: BatchStats,
    pub batch_id: Uuid,
}

/// POST /api/upload
///
/// Runs the whole batch synchronously and returns per-item rows plus
/// aggregate statistics. Boundary violations (unsupported type, oversized
/// file, too many files) reject the entire request with 400 before any
/// processing starts.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut uploads: Vec<UploadedFile> = Vec::new();
    let mut rejection: Option<ApiError> = None;

    // Every boundary failure goes through `rejection` rather than an early
    // return, so temp files already written get cleaned up below.
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                rejection = Some(ApiError::BadRequest(format!(
                    "Malformed multipart request: {}",
                    e
                )));
                break;
            }
        };

        if field.name() != Some("files") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "upload".to_string());
        let media_type = field
            .content_type()
            .map(|t| t.to_string())
            .unwrap_or_default();

        if uploads.len() >= state.config.max_batch_files {
            rejection = Some(ApiError::BadRequest(format!(
                "Too many files: at most {} per batch",
                state.config.max_batch_files
            )));
            break;
        }

        if !parsers::is_supported(&media_type) {
            rejection = Some(ApiError::BadRequest(format!(
                "Unsupported media type for {}: {}",
                original_name, media_type
            )));
            break;
        }

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                rejection = Some(ApiError::BadRequest(format!(
                    "Failed to read upload body: {}",
                    e
                )));
                break;
            }
        };

        if bytes.len() as u64 > state.config.max_file_size {
            rejection = Some(ApiError::BadRequest(format!(
                "File too large: {} ({} bytes, max {})",
                original_name,
                bytes.len(),
                state.config.max_file_size
            )));
            break;
        }

        let stored_name = TempStore::stored_name(&original_name);
        let temp_path = match state.temp_store.store(&stored_name, &bytes).await {
            Ok(path) => path,
            Err(e) => {
                rejection = Some(ApiError::Common(e));
                break;
            }
        };

        uploads.push(UploadedFile {
            temp_path,
            stored_name,
            original_name,
            media_type,
            size_bytes: bytes.len() as i64,
        });
    }

    if let Some(err) = rejection {
        // Nothing reached the core yet; drop any temp files already written
        for upload in &uploads {
            if let Err(e) = state.temp_store.release(&upload.temp_path).await {
                warn!(file = %upload.stored_name, error = %e, "Failed to remove temp file");
            }
        }
        return Err(err);
    }

    if uploads.is_empty() {
        return Err(ApiError::BadRequest("No files received".to_string()));
    }

    let outcome = batch_coordinator::run_batch(&state.db, &state.temp_store, uploads).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: "Processing complete".to_string(),
        data: outcome.results,
        stats: outcome.stats,
        batch_id: outcome.batch_guid,
    }))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/api/upload", post(upload_files))
}
