//! Filter state shared by the classifier and the filter controller.
//!
//! `FilterState` is a plain value: every user action produces a new one.

use crate::core::classify::IntensityBand;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An applied date-range filter. Both bounds are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive containment, whichever way round the bounds were given.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let (low, high) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        date >= low && date <= high
    }
}

/// Active filters for the heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Year currently selected in the year filter list
    pub active_year: i32,
    /// Selected intensity band; `None` shows every band
    pub intensity: Option<IntensityBand>,
    /// Applied date range; `None` when no range filter is active
    pub date_range: Option<DateRange>,
}

impl FilterState {
    pub fn new(active_year: i32) -> Self {
        Self {
            active_year,
            intensity: None,
            date_range: None,
        }
    }

    pub fn date_range_applied(&self) -> bool {
        self.date_range.is_some()
    }

    pub fn with_year(self, active_year: i32) -> Self {
        Self {
            active_year,
            ..self
        }
    }

    pub fn with_intensity(self, intensity: Option<IntensityBand>) -> Self {
        Self { intensity, ..self }
    }

    pub fn with_date_range(self, date_range: Option<DateRange>) -> Self {
        Self { date_range, ..self }
    }

    /// Same year, no intensity or date-range filter.
    pub fn cleared(self) -> Self {
        Self::new(self.active_year)
    }
}

/// Which end of a date range a validation problem refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Start,
    End,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Start => write!(f, "start"),
            Bound::End => write!(f, "end"),
        }
    }
}

/// User-supplied filter input that cannot be applied.
///
/// Reported back to the user; no state is changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A date-range bound was not supplied
    MissingBound(Bound),
    /// A date-range bound is not a `YYYY-MM-DD` date
    InvalidDate { bound: Bound, input: String },
    /// The year is not one of the offered year filter options
    UnknownYear(i32),
    /// The intensity band ordinal is outside 0..=4
    UnknownBand(u8),
}

impl ValidationError {
    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingBound(_) => "MISSING_BOUND",
            ValidationError::InvalidDate { .. } => "INVALID_DATE",
            ValidationError::UnknownYear(_) => "UNKNOWN_YEAR",
            ValidationError::UnknownBand(_) => "UNKNOWN_BAND",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingBound(_) => write!(
                f,
                "Both start and end date are mandatory for applying the date range filter"
            ),
            ValidationError::InvalidDate { bound, input } => {
                write!(f, "Invalid {bound} date '{input}', expected YYYY-MM-DD")
            }
            ValidationError::UnknownYear(year) => {
                write!(f, "Year {year} is not available in the year filter")
            }
            ValidationError::UnknownBand(band) => {
                write!(f, "Intensity band {band} does not exist (expected 0-4)")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_inclusive_either_order() {
        let forward = DateRange::new(date(2023, 3, 1), date(2023, 3, 31));
        let backward = DateRange::new(date(2023, 3, 31), date(2023, 3, 1));

        for range in [forward, backward] {
            assert!(range.contains(date(2023, 3, 1)));
            assert!(range.contains(date(2023, 3, 15)));
            assert!(range.contains(date(2023, 3, 31)));
            assert!(!range.contains(date(2023, 2, 28)));
            assert!(!range.contains(date(2023, 4, 1)));
        }
    }

    #[test]
    fn test_cleared_keeps_year_only() {
        let state = FilterState::new(2024)
            .with_intensity(Some(IntensityBand::High))
            .with_date_range(Some(DateRange::new(date(2024, 1, 1), date(2024, 2, 1))));
        assert!(state.date_range_applied());

        let cleared = state.cleared();
        assert_eq!(cleared, FilterState::new(2024));
        assert!(!cleared.date_range_applied());
    }

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::MissingBound(Bound::End);
        assert!(err.to_string().contains("mandatory"));
        assert_eq!(err.code(), "MISSING_BOUND");

        let err = ValidationError::InvalidDate {
            bound: Bound::Start,
            input: "03/01/2023".to_string(),
        };
        assert!(err.to_string().contains("start"));
        assert!(err.to_string().contains("03/01/2023"));
    }
}
