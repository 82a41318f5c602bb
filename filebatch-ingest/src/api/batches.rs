//! Batch status endpoint

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::Batch;
use crate::AppState;

/// GET /api/batch/{id} response
#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    pub success: bool,
    pub data: Batch,
    /// True while the batch has no completion timestamp. Callers must treat
    /// a long-missing completion as inconclusive, not as running forever.
    pub processing: bool,
}

/// GET /api/batch/{id}
pub async fn get_batch_status(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> ApiResult<Json<BatchStatusResponse>> {
    let batch = db::batches::find_batch(&state.db, batch_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Batch not found: {}", batch_id)))?;

    let processing = batch.completed_at.is_none();

    Ok(Json(BatchStatusResponse {
        success: true,
        data: batch,
        processing,
    }))
}

/// Build batch routes
pub fn batch_routes() -> Router<AppState> {
    Router::new().route("/api/batch/:batch_id", get(get_batch_status))
}
