//! Filter controller: owns the active window, the bucket store and the
//! filter state, and drives the event source through resets.
//!
//! ```text
//!   Idle ──(year filter / full reset)──▶ Resetting ──(rebuilt, restarted)──▶ Idle
//! ```
//!
//! While `Resetting`, ingestion is stopped and no batch is applied. Every
//! rebuild advances the generation token; batches tagged with an older
//! generation are dropped on delivery, even when they arrive afterwards.

use crate::core::buckets::{BucketStore, DayBucket};
use crate::core::calendar::{leading_days, month_labels, WEEKDAY_LABELS, WEEKS_IN_GRID};
use crate::core::classify::{legend, render_cell, DayCell, IntensityBand, LegendEntry};
use crate::core::filters::{Bound, DateRange, FilterState, ValidationError};
use crate::core::window::{
    compute_window, compute_window_for_year, year_options, Window, YearFilterOption,
};
use crate::core::zone::Zone;
use crate::source::{EventBatch, EventSource, Generation, RawEvent, SourceError};
use crate::stats::{create_shared_stats, SharedIngestStats};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Ingesting normally
    Idle,
    /// Ingestion stopped while the window is rebuilt
    Resetting,
}

/// Errors surfaced by controller actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    Validation(ValidationError),
    Source(SourceError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Validation(e) => write!(f, "{e}"),
            ControllerError::Source(e) => write!(f, "Event source error: {e}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ValidationError> for ControllerError {
    fn from(e: ValidationError) -> Self {
        ControllerError::Validation(e)
    }
}

impl From<SourceError> for ControllerError {
    fn from(e: SourceError) -> Self {
        ControllerError::Source(e)
    }
}

/// Everything the presentation layer needs to draw the heatmap.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub window: Window,
    pub generation: Generation,
    pub max_count: u32,
    pub filters: FilterState,
    pub cells: Vec<DayCell>,
    pub legend: Vec<LegendEntry>,
    pub month_labels: Vec<Option<String>>,
    pub weekday_labels: Vec<&'static str>,
    /// Blank cells before the first day so rows match `weekday_labels`
    pub leading_days: usize,
    pub year_options: Vec<YearFilterOption>,
    /// Earliest selectable date, `YYYY-MM-DD`
    pub min_date: String,
    /// Latest selectable date, `YYYY-MM-DD`
    pub max_date: String,
}

/// Single writer over window, buckets and filters.
pub struct FilterController<S: EventSource> {
    source: S,
    zone: Zone,
    pinned_today: Option<NaiveDate>,
    year_options: Vec<YearFilterOption>,
    window: Window,
    store: BucketStore,
    filters: FilterState,
    cells: Vec<DayCell>,
    generation: Generation,
    state: ControllerState,
    stats: SharedIngestStats,
}

impl<S: EventSource> FilterController<S> {
    /// Build the startup view (trailing window ending today) and start ingestion.
    pub fn new(source: S, zone: Zone, year_option_count: usize) -> Result<Self, ControllerError> {
        Self::build(source, zone, year_option_count, None)
    }

    /// Like [`FilterController::new`], with "today" fixed to `today`.
    pub fn with_today(
        source: S,
        zone: Zone,
        year_option_count: usize,
        today: NaiveDate,
    ) -> Result<Self, ControllerError> {
        Self::build(source, zone, year_option_count, Some(today))
    }

    fn build(
        source: S,
        zone: Zone,
        year_option_count: usize,
        pinned_today: Option<NaiveDate>,
    ) -> Result<Self, ControllerError> {
        let today = pinned_today.unwrap_or_else(|| zone.today());
        let window = compute_window(today);

        let mut controller = Self {
            source,
            zone,
            pinned_today,
            year_options: year_options(today, year_option_count),
            window,
            store: BucketStore::new(window),
            filters: FilterState::new(today.year()),
            cells: Vec::new(),
            generation: Generation::default(),
            state: ControllerState::Idle,
            stats: create_shared_stats(),
        };
        controller.rebuild(window, today.year())?;
        Ok(controller)
    }

    fn today(&self) -> NaiveDate {
        self.pinned_today.unwrap_or_else(|| self.zone.today())
    }

    /// Select one of the offered years.
    pub fn apply_year_filter(&mut self, option: &YearFilterOption) -> Result<(), ControllerError> {
        self.rebuild(compute_window_for_year(option), option.year)
    }

    /// Select a year by number; it must be one of the year options.
    pub fn select_year(&mut self, year: i32) -> Result<(), ControllerError> {
        let option = self
            .year_options
            .iter()
            .find(|o| o.year == year)
            .copied()
            .ok_or(ValidationError::UnknownYear(year))?;
        self.apply_year_filter(&option)
    }

    /// Return to the startup view: trailing window ending today, no filters.
    pub fn full_reset(&mut self) -> Result<(), ControllerError> {
        let today = self.today();
        self.rebuild(compute_window(today), today.year())
    }

    fn rebuild(&mut self, window: Window, active_year: i32) -> Result<(), ControllerError> {
        self.state = ControllerState::Resetting;
        self.source.stop();

        self.generation = self.generation.next();
        self.filters = FilterState::new(active_year);
        self.window = window;
        self.store.rebuild(window);
        self.stats.record_rebuild();

        tracing::info!(
            generation = %self.generation,
            start = %window.start,
            end = %window.end,
            buckets = window.bucket_count,
            "window rebuilt"
        );

        self.source.set_window(window, self.generation);
        let restarted = self.restart_ingestion();
        self.reclassify();
        self.state = ControllerState::Idle;
        restarted
    }

    /// Windows that include today get a live feed; past years get one batch.
    fn restart_ingestion(&mut self) -> Result<(), ControllerError> {
        if self.window.covers(self.today()) {
            self.source.start()?;
        } else {
            self.source.emit_once()?;
        }
        Ok(())
    }

    /// Apply a date-range filter. Both bounds are required.
    pub fn apply_date_range_filter(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), ValidationError> {
        let start = start.ok_or(ValidationError::MissingBound(Bound::Start))?;
        let end = end.ok_or(ValidationError::MissingBound(Bound::End))?;

        self.filters = self
            .filters
            .clone()
            .with_date_range(Some(DateRange::new(start, end)));
        self.reclassify();
        Ok(())
    }

    /// Apply a date-range filter from `YYYY-MM-DD` input. Empty text counts
    /// as a missing bound.
    pub fn apply_date_range_str(
        &mut self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<(), ValidationError> {
        let start = parse_bound(start, Bound::Start)?;
        let end = parse_bound(end, Bound::End)?;
        self.apply_date_range_filter(start, end)
    }

    pub fn clear_date_range_filter(&mut self) {
        self.filters = self.filters.clone().with_date_range(None);
        self.reclassify();
    }

    /// Show only cells in `band`. Returns `false` if it was already selected.
    pub fn apply_intensity_filter(&mut self, band: IntensityBand) -> bool {
        if self.filters.intensity == Some(band) {
            return false;
        }
        self.filters = self.filters.clone().with_intensity(Some(band));
        self.reclassify();
        true
    }

    pub fn clear_intensity_filter(&mut self) {
        self.filters = self.filters.clone().with_intensity(None);
        self.reclassify();
    }

    /// Apply a batch from the event source.
    ///
    /// Returns `false` when the batch was dropped as stale.
    pub fn deliver(&mut self, batch: EventBatch) -> bool {
        if self.state == ControllerState::Resetting || batch.generation != self.generation {
            tracing::debug!(
                batch_generation = %batch.generation,
                current = %self.generation,
                events = batch.len(),
                "dropping stale batch"
            );
            self.stats.record_stale_batch();
            return false;
        }

        let outcome = self.store.ingest(&batch.events, &self.zone);
        self.stats.record_batch(outcome.applied, outcome.discarded);
        if outcome.discarded > 0 {
            tracing::debug!(
                discarded = outcome.discarded,
                "events outside the window discarded"
            );
        }
        self.reclassify();
        true
    }

    /// Apply events from an external feed to the current generation.
    pub fn ingest_external(&mut self, events: Vec<RawEvent>) -> bool {
        let batch = EventBatch::new(self.generation, events);
        self.deliver(batch)
    }

    /// Deliver every batch currently queued on the source, in order.
    ///
    /// Returns how many batches were applied.
    pub fn pump(&mut self) -> usize {
        let queued: Vec<EventBatch> = self.source.receiver().try_iter().collect();
        let mut applied = 0;
        for batch in queued {
            if self.deliver(batch) {
                applied += 1;
            }
        }
        applied
    }

    /// Stop the event source without touching buckets or filters.
    pub fn stop_ingestion(&mut self) {
        self.source.stop();
    }

    fn reclassify(&mut self) {
        let max_count = self.store.max_count();
        self.cells = self
            .store
            .buckets()
            .iter()
            .map(|bucket| render_cell(bucket, max_count, &self.filters))
            .collect();
    }

    pub fn view(&self) -> HeatmapView {
        HeatmapView {
            window: self.window,
            generation: self.generation,
            max_count: self.store.max_count(),
            filters: self.filters.clone(),
            cells: self.cells.clone(),
            legend: legend(),
            month_labels: month_labels(self.window.start, WEEKS_IN_GRID),
            weekday_labels: WEEKDAY_LABELS.to_vec(),
            leading_days: leading_days(self.window.start),
            year_options: self.year_options.clone(),
            min_date: self.window.min_date_iso(),
            max_date: self.window.max_date_iso(),
        }
    }

    pub fn cells(&self) -> &[DayCell] {
        &self.cells
    }

    pub fn snapshot(&self) -> Vec<DayBucket> {
        self.store.snapshot()
    }

    pub fn max_count(&self) -> u32 {
        self.store.max_count()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn year_options(&self) -> &[YearFilterOption] {
        &self.year_options
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn stats(&self) -> &SharedIngestStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

fn parse_bound(input: Option<&str>, bound: Bound) -> Result<Option<NaiveDate>, ValidationError> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::InvalidDate {
                bound,
                input: text.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::ColorToken;
    use chrono::{TimeZone, Utc};
    use crossbeam_channel::{unbounded, Receiver, Sender};

    /// Source that only records calls; tests push batches by hand.
    struct ManualSource {
        sender: Sender<EventBatch>,
        receiver: Receiver<EventBatch>,
        target: Option<(Window, Generation)>,
        running: bool,
        starts: usize,
        stops: usize,
        one_shots: usize,
    }

    impl ManualSource {
        fn new() -> Self {
            let (sender, receiver) = unbounded();
            Self {
                sender,
                receiver,
                target: None,
                running: false,
                starts: 0,
                stops: 0,
                one_shots: 0,
            }
        }

        fn push(&self, generation: Generation, events: Vec<RawEvent>) {
            self.sender
                .send(EventBatch::new(generation, events))
                .unwrap();
        }
    }

    impl EventSource for ManualSource {
        fn set_window(&mut self, window: Window, generation: Generation) {
            self.target = Some((window, generation));
        }

        fn start(&mut self) -> Result<(), SourceError> {
            if self.running {
                return Err(SourceError::AlreadyRunning);
            }
            self.running = true;
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.running = false;
            self.stops += 1;
        }

        fn emit_once(&mut self) -> Result<(), SourceError> {
            self.target.ok_or(SourceError::NoWindow)?;
            self.one_shots += 1;
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn receiver(&self) -> &Receiver<EventBatch> {
            &self.receiver
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn controller() -> FilterController<ManualSource> {
        FilterController::with_today(ManualSource::new(), Zone::Named(chrono_tz::UTC), 5, today())
            .unwrap()
    }

    fn event(y: i32, m: u32, d: u32) -> RawEvent {
        RawEvent::new(Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap())
    }

    #[test]
    fn test_startup_builds_trailing_window_and_starts_feed() {
        let controller = controller();

        assert_eq!(controller.generation(), Generation(1));
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.window().bucket_count, 365);
        assert_eq!(controller.window().end, today());
        assert_eq!(controller.filters(), &FilterState::new(2026));
        assert_eq!(controller.cells().len(), 365);
        assert_eq!(controller.max_count(), 0);

        let source = controller.source();
        assert!(source.running);
        assert_eq!(source.starts, 1);
        assert_eq!(source.target.unwrap().1, Generation(1));

        let years: Vec<i32> = controller.year_options().iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2026, 2025, 2024, 2023, 2022]);
    }

    #[test]
    fn test_year_filter_single_event_scenario() {
        let mut controller = controller();
        controller.select_year(2023).unwrap();

        assert_eq!(controller.generation(), Generation(2));
        assert_eq!(controller.filters().active_year, 2023);
        assert_eq!(controller.window().bucket_count, 365);
        // A past year gets a single batch instead of a live feed
        assert!(!controller.source().running);
        assert_eq!(controller.source().one_shots, 1);

        controller
            .source()
            .push(Generation(2), vec![event(2023, 6, 15)]);
        assert_eq!(controller.pump(), 1);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot[165].count, 1);
        assert_eq!(controller.max_count(), 1);

        let cell = &controller.cells()[165];
        assert_eq!(cell.band, IntensityBand::Peak);
        assert!(cell.visible);
        assert_eq!(cell.tooltip, "1 event occurred on June 15th, 2023");

        let view = controller.view();
        assert_eq!(view.min_date, "2023-01-01");
        assert_eq!(view.max_date, "2023-12-31");
        assert_eq!(view.month_labels.len(), 52);
        // 2023-01-01 is a Sunday, so the grid needs no padding
        assert_eq!(view.leading_days, 0);
    }

    #[test]
    fn test_stale_batches_are_dropped() {
        let mut controller = controller();
        controller.select_year(2024).unwrap();
        assert_eq!(controller.window().bucket_count, 366);
        // 2024-01-01 is a Monday
        assert_eq!(controller.view().leading_days, 1);

        // Produced for the startup window, delivered after the rebuild
        controller
            .source()
            .push(Generation(1), vec![event(2024, 3, 1), event(2024, 3, 2)]);
        assert_eq!(controller.pump(), 0);

        assert!(controller.snapshot().iter().all(|b| b.count == 0));
        assert_eq!(controller.max_count(), 0);
        let stats = controller.stats().stats();
        assert_eq!(stats.stale_batches, 1);
        assert_eq!(stats.events_ingested, 0);
    }

    #[test]
    fn test_full_reset_after_year_change_leaves_nothing_behind() {
        let mut controller = controller();
        controller.ingest_external(vec![event(2026, 5, 1), event(2026, 5, 1)]);
        assert_eq!(controller.max_count(), 2);

        controller.select_year(2025).unwrap();
        controller
            .source()
            .push(Generation(2), vec![event(2025, 2, 2)]);
        controller.pump();
        assert_eq!(controller.max_count(), 1);
        controller.apply_intensity_filter(IntensityBand::Peak);

        controller.full_reset().unwrap();
        // A late batch from the year window
        controller
            .source()
            .push(Generation(2), vec![event(2026, 1, 10)]);
        controller.pump();

        assert_eq!(controller.generation(), Generation(3));
        assert_eq!(controller.max_count(), 0);
        assert!(controller.snapshot().iter().all(|b| b.count == 0));
        assert_eq!(controller.filters(), &FilterState::new(2026));
        assert_eq!(controller.window().end, today());
        assert!(controller.source().running);
        assert_eq!(controller.source().starts, 2);
    }

    #[test]
    fn test_date_range_requires_both_bounds() {
        let mut controller = controller();

        let err = controller
            .apply_date_range_str(Some("2026-01-01"), None)
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingBound(Bound::End));

        let err = controller
            .apply_date_range_str(Some(""), Some("2026-02-01"))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingBound(Bound::Start));

        let err = controller
            .apply_date_range_str(Some("2026-01-01"), Some("Feb 1"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { bound: Bound::End, .. }));

        assert!(!controller.filters().date_range_applied());
    }

    #[test]
    fn test_date_range_filter_reclassifies_without_ingest() {
        let mut controller = controller();
        controller.ingest_external(vec![event(2026, 3, 10), event(2026, 4, 10)]);
        let before = controller.snapshot();

        // Given backwards on purpose
        controller
            .apply_date_range_str(Some("2026-03-31"), Some("2026-03-01"))
            .unwrap();
        assert!(controller.filters().date_range_applied());
        assert_eq!(controller.snapshot(), before);

        let march = controller
            .cells()
            .iter()
            .find(|c| c.date == NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
            .unwrap();
        assert!(march.visible);

        let april = controller
            .cells()
            .iter()
            .find(|c| c.date == NaiveDate::from_ymd_opt(2026, 4, 10).unwrap())
            .unwrap();
        assert!(!april.visible);
        assert_eq!(april.color, ColorToken::Neutral);
        assert!(april.tooltip.is_empty());

        controller.clear_date_range_filter();
        assert!(!controller.filters().date_range_applied());
        assert!(controller.cells().iter().all(|c| c.visible));
    }

    #[test]
    fn test_intensity_filter_hides_lower_band() {
        let mut controller = controller();
        let busy = vec![event(2026, 6, 1); 4];
        controller.ingest_external(busy);
        controller.ingest_external(vec![event(2026, 6, 2)]);

        let quiet_day = NaiveDate::from_ymd_opt(2026, 6, 2).unwrap();
        let quiet = |c: &FilterController<ManualSource>| {
            c.cells().iter().find(|cell| cell.date == quiet_day).cloned().unwrap()
        };
        assert_eq!(quiet(&controller).band, IntensityBand::Low);

        assert!(controller.apply_intensity_filter(IntensityBand::Medium));
        assert!(!quiet(&controller).visible);
        assert!(!controller.apply_intensity_filter(IntensityBand::Medium));

        assert!(controller.apply_intensity_filter(IntensityBand::Low));
        let cell = quiet(&controller);
        assert!(cell.visible);
        assert_eq!(cell.color, ColorToken::Highlight);

        controller.clear_intensity_filter();
        assert_eq!(controller.filters().intensity, None);
        assert_eq!(
            quiet(&controller).color,
            ColorToken::Graded(IntensityBand::Low)
        );
    }

    #[test]
    fn test_year_filter_clears_other_filters() {
        let mut controller = controller();
        controller.apply_intensity_filter(IntensityBand::High);
        controller
            .apply_date_range_filter(
                NaiveDate::from_ymd_opt(2026, 1, 1),
                NaiveDate::from_ymd_opt(2026, 2, 1),
            )
            .unwrap();

        controller.select_year(2026).unwrap();
        assert_eq!(controller.filters(), &FilterState::new(2026));
        // Current year keeps the live feed
        assert!(controller.source().running);
        assert_eq!(controller.window().start, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_unknown_year_rejected() {
        let mut controller = controller();
        let err = controller.select_year(1999).unwrap_err();
        assert_eq!(
            err,
            ControllerError::Validation(ValidationError::UnknownYear(1999))
        );
        assert_eq!(controller.generation(), Generation(1));
    }

    #[test]
    fn test_out_of_window_events_counted_not_applied() {
        let mut controller = controller();
        controller.ingest_external(vec![event(2019, 1, 1), event(2026, 7, 7)]);

        let stats = controller.stats().stats();
        assert_eq!(stats.events_ingested, 1);
        assert_eq!(stats.events_discarded, 1);
        assert_eq!(controller.snapshot().len(), 365);
    }
}
