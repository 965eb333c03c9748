//! Window management: which calendar days the heatmap displays.
//!
//! A window is either the trailing year ending today (the startup view) or
//! one calendar year picked from the year filter list.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of year filter options offered by default.
pub const DEFAULT_YEAR_OPTIONS: usize = 5;

/// A contiguous range of calendar days backing one bucket store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// First day of the window (bucket 0)
    pub start: NaiveDate,
    /// Last displayed day of the window
    pub end: NaiveDate,
    /// Number of day buckets allocated for the window
    pub bucket_count: u32,
}

impl Window {
    /// Bucket index for a calendar day, if the day falls inside the buckets.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        if offset >= 0 && offset < i64::from(self.bucket_count) {
            Some(offset as usize)
        } else {
            None
        }
    }

    /// Calendar day backing the bucket at `index`.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// Whether `date` lies between `start` and `end`, both inclusive.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Earliest selectable date as `YYYY-MM-DD`.
    pub fn min_date_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// Latest selectable date as `YYYY-MM-DD`.
    pub fn max_date_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// One entry of the year filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearFilterOption {
    pub year: i32,
    /// January 1st of `year`
    pub window_start: NaiveDate,
    /// December 31st of `year`, or the startup date for the current year
    pub window_end: NaiveDate,
}

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Number of days in `year`.
pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Trailing window ending at `reference`.
///
/// The bucket count follows the reference year: the year of `reference`
/// from February on, the previous year in January.
pub fn compute_window(reference: NaiveDate) -> Window {
    let reference_year = if reference.month() > 1 {
        reference.year()
    } else {
        reference.year() - 1
    };
    let bucket_count = days_in_year(reference_year);

    Window {
        start: reference - Duration::days(i64::from(bucket_count)),
        end: reference,
        bucket_count,
    }
}

/// Window for a single calendar year picked from the filter list.
pub fn compute_window_for_year(option: &YearFilterOption) -> Window {
    Window {
        start: option.window_start,
        end: option.window_end,
        bucket_count: days_in_year(option.year),
    }
}

/// Build the `count` most recent year options, most recent first.
///
/// The current year's entry ends at `today`; earlier years end on Dec 31.
pub fn year_options(today: NaiveDate, count: usize) -> Vec<YearFilterOption> {
    (0..count as i32)
        .filter_map(|offset| {
            let year = today.year() - offset;
            let window_start = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let window_end = if offset == 0 {
                today
            } else {
                NaiveDate::from_ymd_opt(year, 12, 31)?
            };
            Some(YearFilterOption {
                year,
                window_start,
                window_end,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_year_matches_gregorian_rule() {
        for year in 1580..2500 {
            let expected = year % 400 == 0 || (year % 4 == 0 && year % 100 != 0);
            assert_eq!(days_in_year(year) == 366, expected, "year {year}");
        }
        assert_eq!(days_in_year(1900), 365);
        assert_eq!(days_in_year(2000), 366);
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2023), 365);
    }

    #[test]
    fn test_trailing_window_uses_reference_year() {
        // March 2024: reference year 2024 is leap
        let window = compute_window(date(2024, 3, 10));
        assert_eq!(window.bucket_count, 366);
        assert_eq!(window.end - window.start, Duration::days(366));

        // January 2025: reference year falls back to 2024
        let window = compute_window(date(2025, 1, 20));
        assert_eq!(window.bucket_count, 366);
        assert_eq!(window.start, date(2024, 1, 20));

        // January 2024: reference year 2023 is not leap
        let window = compute_window(date(2024, 1, 5));
        assert_eq!(window.bucket_count, 365);
        assert_eq!(window.start, date(2023, 1, 5));
    }

    #[test]
    fn test_window_for_year() {
        let option = YearFilterOption {
            year: 2023,
            window_start: date(2023, 1, 1),
            window_end: date(2023, 12, 31),
        };
        let window = compute_window_for_year(&option);
        assert_eq!(window.bucket_count, 365);
        assert_eq!(window.index_of(date(2023, 6, 15)), Some(165));
        assert_eq!(window.index_of(date(2023, 12, 31)), Some(364));
        assert_eq!(window.index_of(date(2024, 1, 1)), None);
        assert_eq!(window.index_of(date(2022, 12, 31)), None);
        assert_eq!(window.min_date_iso(), "2023-01-01");
        assert_eq!(window.max_date_iso(), "2023-12-31");
    }

    #[test]
    fn test_trailing_window_excludes_end_bucket() {
        let window = compute_window(date(2023, 8, 1));
        assert_eq!(window.index_of(window.start), Some(0));
        assert_eq!(
            window.index_of(window.start + Duration::days(364)),
            Some(364)
        );
        assert_eq!(window.index_of(window.end), None);
        assert_eq!(window.date_at(364), date(2023, 7, 31));
    }

    #[test]
    fn test_year_options_most_recent_first() {
        let today = date(2026, 10, 19);
        let options = year_options(today, DEFAULT_YEAR_OPTIONS);

        assert_eq!(options.len(), 5);
        let years: Vec<i32> = options.iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2026, 2025, 2024, 2023, 2022]);

        assert_eq!(options[0].window_start, date(2026, 1, 1));
        assert_eq!(options[0].window_end, today);
        assert_eq!(options[3].window_end, date(2023, 12, 31));
    }
}
