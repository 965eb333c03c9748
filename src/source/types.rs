//! Event types exchanged between an event source and the heatmap engine.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single raw event as received from the event source.
///
/// Only the instant matters; it may fall outside the active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: DateTime<Utc>,
}

impl RawEvent {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }

    /// Build an event from unix milliseconds, if the instant is representable.
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self::new)
    }

    /// Parse an RFC 3339 timestamp. Unparseable text yields `None`.
    pub fn parse_rfc3339(text: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|dt| Self::new(dt.with_timezone(&Utc)))
    }
}

/// Tag distinguishing successive window lifetimes.
///
/// Every window rebuild advances the generation; batches tagged with an
/// older generation are dropped on delivery.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// A batch of events produced for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBatch {
    pub generation: Generation,
    pub events: Vec<RawEvent>,
}

impl EventBatch {
    pub fn new(generation: Generation, events: Vec<RawEvent>) -> Self {
        Self { generation, events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
