//! Ingestion statistics for the heatmap engine.

pub mod counters;

pub use counters::{create_shared_stats, IngestSnapshot, IngestStats, SharedIngestStats};
