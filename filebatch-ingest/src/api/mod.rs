//! HTTP API handlers for filebatch-ingest

pub mod batches;
pub mod files;
pub mod health;
pub mod upload;

pub use batches::batch_routes;
pub use files::file_routes;
pub use health::health_routes;
pub use upload::upload_routes;
