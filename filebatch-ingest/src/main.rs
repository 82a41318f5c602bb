//! filebatch-ingest - Batch File Ingestion Service
//!
//! Accepts multipart uploads of JSON/CSV/plain-text files, processes every
//! file in a batch concurrently, and records per-item and per-batch
//! outcomes in SQLite.

use anyhow::Result;
use filebatch_common::config::ServiceConfig;
use filebatch_ingest::services::temp_store::TempStore;
use filebatch_ingest::AppState;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting filebatch-ingest service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration (env -> TOML -> defaults)
    let config = ServiceConfig::resolve()?;
    info!("Database: {}", config.database_path.display());
    info!("Upload dir: {}", config.upload_dir.display());

    // Temp storage for uploaded bytes
    let temp_store = TempStore::new(config.upload_dir.clone());
    temp_store.ensure_dir().await?;

    // Initialize database connection pool and schema
    let db_pool = filebatch_common::db::init_database(&config.database_path).await?;
    info!("Database connection established");

    let addr = format!("{}:{}", config.host, config.port);

    // Create application state and router
    let state = AppState::new(db_pool, temp_store, config);
    let app = filebatch_ingest::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
