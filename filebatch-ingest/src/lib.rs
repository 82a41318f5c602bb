//! filebatch-ingest library interface
//!
//! Batch file-ingestion service: accepts a batch of uploaded files, parses
//! each according to its declared format concurrently, and records per-item
//! and per-batch outcomes. Exposed as a library for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod parsers;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use filebatch_common::config::ServiceConfig;
use services::temp_store::TempStore;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (the store collaborator's long-lived handle)
    pub db: SqlitePool,
    /// Temp storage for uploaded bytes
    pub temp_store: TempStore,
    /// Resolved service configuration
    pub config: ServiceConfig,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, temp_store: TempStore, config: ServiceConfig) -> Self {
        Self {
            db,
            temp_store,
            config,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    // The multipart body can span a full batch of files; size the request
    // body cap from the configured per-file and per-batch limits.
    let body_limit = state.config.max_file_size as usize
        * state.config.max_batch_files
        + 1024 * 1024;

    Router::new()
        .merge(api::upload_routes())
        .merge(api::file_routes())
        .merge(api::batch_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
