//! Ingestion counters.
//!
//! Tracks how many events and batches the engine applied or dropped,
//! without keeping any of the events themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ingestion statistics for the current session.
#[derive(Debug)]
pub struct IngestStats {
    /// Events counted into a bucket
    events_ingested: AtomicU64,
    /// Events outside the active window
    events_discarded: AtomicU64,
    /// Batches applied to the bucket store
    batches_applied: AtomicU64,
    /// Batches dropped because they belonged to an older generation
    stale_batches: AtomicU64,
    /// Window rebuilds (year changes and resets)
    rebuilds: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl IngestStats {
    pub fn new() -> Self {
        Self {
            events_ingested: AtomicU64::new(0),
            events_discarded: AtomicU64::new(0),
            batches_applied: AtomicU64::new(0),
            stale_batches: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record an applied batch and its per-event outcome.
    pub fn record_batch(&self, ingested: u64, discarded: u64) {
        self.batches_applied.fetch_add(1, Ordering::Relaxed);
        self.events_ingested.fetch_add(ingested, Ordering::Relaxed);
        self.events_discarded.fetch_add(discarded, Ordering::Relaxed);
    }

    /// Record events rejected before reaching the bucket store.
    pub fn record_discarded(&self, count: u64) {
        self.events_discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a batch dropped for belonging to a superseded generation.
    pub fn record_stale_batch(&self) {
        self.stale_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a window rebuild.
    pub fn record_rebuild(&self) {
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> IngestSnapshot {
        IngestSnapshot {
            events_ingested: self.events_ingested.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            batches_applied: self.batches_applied.load(Ordering::Relaxed),
            stale_batches: self.stale_batches.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Events ingested: {}\n\
             - Events outside window: {}\n\
             - Batches applied: {}\n\
             - Stale batches dropped: {}\n\
             - Window rebuilds: {}\n\
             - Session duration: {} seconds",
            stats.events_ingested,
            stats.events_discarded,
            stats.batches_applied,
            stats.stale_batches,
            stats.rebuilds,
            stats.session_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.events_ingested.store(0, Ordering::Relaxed);
        self.events_discarded.store(0, Ordering::Relaxed);
        self.batches_applied.store(0, Ordering::Relaxed);
        self.stale_batches.store(0, Ordering::Relaxed);
        self.rebuilds.store(0, Ordering::Relaxed);
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSnapshot {
    pub events_ingested: u64,
    pub events_discarded: u64,
    pub batches_applied: u64,
    pub stale_batches: u64,
    pub rebuilds: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared statistics.
pub type SharedIngestStats = Arc<IngestStats>;

pub fn create_shared_stats() -> SharedIngestStats {
    Arc::new(IngestStats::new())
}
