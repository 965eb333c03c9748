//! Day-bucket storage for the active window.
//!
//! One bucket per calendar day, in ascending order, with
//! `index = days between window start and the event's local date`.

use crate::core::window::Window;
use crate::core::zone::Zone;
use crate::source::types::RawEvent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregated event count for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    /// Local calendar day this bucket represents
    pub date: NaiveDate,
    /// Number of events seen on that day
    pub count: u32,
}

/// Result of applying one batch to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Events counted into a bucket
    pub applied: u64,
    /// Events outside the window, silently dropped
    pub discarded: u64,
}

/// Fixed-size, gap-free sequence of day buckets spanning a window.
#[derive(Debug, Clone)]
pub struct BucketStore {
    window: Window,
    buckets: Vec<DayBucket>,
    max_count: u32,
}

impl BucketStore {
    /// Create a store sized for `window`.
    pub fn new(window: Window) -> Self {
        let mut store = Self {
            window,
            buckets: Vec::new(),
            max_count: 0,
        };
        store.rebuild(window);
        store
    }

    /// Discard all buckets and allocate zeroed ones for `window`.
    pub fn rebuild(&mut self, window: Window) {
        self.window = window;
        self.buckets = (0..window.bucket_count as usize)
            .map(|index| DayBucket {
                date: window.date_at(index),
                count: 0,
            })
            .collect();
        self.max_count = 0;
    }

    /// Count a batch of events into their day buckets.
    ///
    /// Events whose local date is outside the window are discarded.
    pub fn ingest(&mut self, events: &[RawEvent], zone: &Zone) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();
        for event in events {
            if self.record(zone.date_of(event.timestamp)) {
                outcome.applied += 1;
            } else {
                outcome.discarded += 1;
            }
        }
        outcome
    }

    /// Count one event on `date`. Returns `false` if the date is out of window.
    pub fn record(&mut self, date: NaiveDate) -> bool {
        let Some(index) = self.window.index_of(date) else {
            return false;
        };
        let bucket = &mut self.buckets[index];
        bucket.count = bucket.count.saturating_add(1);
        if bucket.count > self.max_count {
            self.max_count = bucket.count;
        }
        true
    }

    /// Owned copy of the buckets in ascending date order.
    pub fn snapshot(&self) -> Vec<DayBucket> {
        self.buckets.clone()
    }

    /// Read-only view of the buckets.
    pub fn buckets(&self) -> &[DayBucket] {
        &self.buckets
    }

    /// Bucket at `index`.
    pub fn get(&self, index: usize) -> Option<&DayBucket> {
        self.buckets.get(index)
    }

    /// Point lookup by calendar day.
    pub fn bucket_for(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.window
            .index_of(date)
            .and_then(|index| self.buckets.get(index))
    }

    /// Highest bucket count seen since the last rebuild.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Total number of events counted since the last rebuild.
    pub fn total_events(&self) -> u64 {
        self.buckets.iter().map(|b| u64::from(b.count)).sum()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
