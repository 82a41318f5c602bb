//! Processed-file record endpoints
//!
//! Read/update/delete access to item records. Listing excludes payloads
//! (they can be large); the download endpoint serves a single item's
//! payload as a JSON attachment.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{Item, ItemStatus};
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_files: i64,
    pub files_per_page: i64,
}

#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub success: bool,
    pub data: Vec<Item>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub success: bool,
    pub data: Item,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFileRequest {
    pub original_name: Option<String>,
    pub records_count: Option<i64>,
}

/// GET /api/files?page&limit
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListFilesResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);

    let (items, total) = db::items::list_items(&state.db, page, limit).await?;
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ListFilesResponse {
        success: true,
        data: items,
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_files: total,
            files_per_page: limit,
        },
    }))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ItemResponse>> {
    let item = db::items::load_item(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("File not found: {}", id)))?;

    Ok(Json(ItemResponse {
        success: true,
        data: item,
    }))
}

/// GET /api/files/{id}/download
///
/// Serves the parsed payload as a JSON attachment. Only completed items
/// have a payload to download.
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let item = db::items::load_item(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("File not found: {}", id)))?;

    if item.status != ItemStatus::Completed {
        return Err(ApiError::BadRequest(
            "File was not processed successfully".to_string(),
        ));
    }

    let payload = item
        .payload
        .ok_or_else(|| ApiError::Internal("Completed item has no payload".to_string()))?;

    let disposition = format!(
        "attachment; filename=\"{}_processed.json\"",
        item.original_name
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Json(payload),
    )
        .into_response())
}

/// PUT /api/files/{id}
pub async fn update_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFileRequest>,
) -> ApiResult<Json<ItemResponse>> {
    if request.original_name.is_none() && request.records_count.is_none() {
        return Err(ApiError::BadRequest(
            "Provide at least one field to update (original_name or records_count)".to_string(),
        ));
    }

    let item = db::items::update_item_fields(
        &state.db,
        id,
        request.original_name.as_deref(),
        request.records_count,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("File not found: {}", id)))?;

    Ok(Json(ItemResponse {
        success: true,
        data: item,
    }))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = db::items::delete_item(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("File not found: {}", id)));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "File deleted",
    })))
}

/// Build file record routes
pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/api/files", get(list_files))
        .route(
            "/api/files/:id",
            get(get_file).put(update_file).delete(delete_file),
        )
        .route("/api/files/:id/download", get(download_file))
}
