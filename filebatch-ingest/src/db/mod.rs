//! Item/Batch store
//!
//! Durable persistence for per-item and per-batch records. The core calls
//! through this layer and never retries: a store failure propagates to the
//! caller as a batch-level error.

pub mod batches;
pub mod items;
