//! Event Heatmap - calendar heatmap engine.
//!
//! Aggregates timestamped events into one bucket per calendar day and
//! classifies each day into one of five intensity bands relative to the
//! busiest day, GitHub contribution-graph style.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Event Heatmap                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ EventSource │──▶│ BucketStore │──▶│ Classifier  │       │
//! │  │ (synthetic) │   │ (day bins)  │   │  (bands)    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                 ▲                  │              │
//! │         │                 │                  ▼              │
//! │  ┌──────┴─────────────────┴──────┐   ┌─────────────┐       │
//! │  │       FilterController        │──▶│ HeatmapView │       │
//! │  │ (year / range / band, resets) │   │ (cells)     │       │
//! │  └───────────────────────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use event_heatmap::{FilterController, IntensityBand, SyntheticConfig, SyntheticSource, Zone};
//!
//! let source = SyntheticSource::new(SyntheticConfig::default(), Zone::Local);
//! let mut controller = FilterController::new(source, Zone::Local, 5).expect("start ingestion");
//!
//! std::thread::sleep(std::time::Duration::from_millis(100));
//! controller.pump();
//! controller.apply_intensity_filter(IntensityBand::Peak);
//!
//! for cell in controller.cells().iter().filter(|c| c.visible) {
//!     println!("{}", cell.tooltip);
//! }
//! ```

pub mod config;
pub mod controller;
pub mod core;
pub mod render;
pub mod source;
pub mod stats;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use controller::{ControllerError, ControllerState, FilterController, HeatmapView};
pub use core::{
    BucketStore, DayBucket, DayCell, FilterState, IntensityBand, ValidationError, Window,
    YearFilterOption, Zone,
};
pub use source::{
    EventBatch, EventSource, Generation, RawEvent, SourceError, SyntheticConfig, SyntheticSource,
};
pub use stats::{IngestSnapshot, IngestStats, SharedIngestStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
