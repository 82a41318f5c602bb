//! Ingestion services
//!
//! - `temp_store`: temp storage for uploaded bytes, released after processing
//! - `item_processor`: one file's lifecycle from intake row to outcome
//! - `batch_coordinator`: concurrent fan-out with settle-all aggregation

pub mod batch_coordinator;
pub mod item_processor;
pub mod temp_store;

pub use batch_coordinator::{run_batch, BatchOutcome, BatchStats, ItemReport};
pub use item_processor::ItemOutcome;
pub use temp_store::TempStore;
