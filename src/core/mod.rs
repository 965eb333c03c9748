//! Core of the heatmap engine.
//!
//! This module contains:
//! - Window computation (trailing year or a selected calendar year)
//! - The day-bucket store events are counted into
//! - Intensity classification, tooltips and grid labels

pub mod buckets;
pub mod calendar;
pub mod classify;
pub mod filters;
pub mod window;
pub mod zone;

// Re-export commonly used types
pub use buckets::{BucketStore, DayBucket, IngestOutcome};
pub use calendar::{leading_days, month_labels, WEEKDAY_LABELS, WEEKS_IN_GRID};
pub use classify::{
    classify, legend, render_cell, tooltip, Classification, ColorToken, DayCell, IntensityBand,
    LegendEntry,
};
pub use filters::{Bound, DateRange, FilterState, ValidationError};
pub use window::{
    compute_window, compute_window_for_year, days_in_year, year_options, Window,
    YearFilterOption,
};
pub use zone::{Zone, ZoneError};
