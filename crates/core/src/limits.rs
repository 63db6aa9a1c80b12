//! Ingestion batch limits.

/// Maximum events per reported batch.
pub const MAX_BATCH_EVENTS: usize = 1000;

/// Maximum raw payload size accepted by the report endpoint (1 MiB).
pub const MAX_BATCH_SIZE_BYTES: usize = 1024 * 1024;
