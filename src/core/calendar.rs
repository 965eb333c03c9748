//! Axis labels for the week-column grid.

use chrono::{Datelike, Duration, NaiveDate};

/// Days per grid column.
pub const DAYS_IN_WEEK: usize = 7;

/// Week columns labelled along the top of the grid.
pub const WEEKS_IN_GRID: usize = 52;

/// Row labels; only every other weekday is named to keep the axis readable.
pub const WEEKDAY_LABELS: [&str; DAYS_IN_WEEK] = ["", "Mon", "", "Wed", "", "Fri", ""];

/// Blank cells before `window_start` in the first column, so that each row
/// holds one weekday (Sunday first) and lines up with [`WEEKDAY_LABELS`].
pub fn leading_days(window_start: NaiveDate) -> usize {
    window_start.weekday().num_days_from_sunday() as usize
}

/// Short month label for each week column, or `None` when the column
/// continues the month of the previous column.
///
/// Column `c` starts on `window_start + 7c days`. The first column is always
/// labelled.
pub fn month_labels(window_start: NaiveDate, weeks: usize) -> Vec<Option<String>> {
    let mut previous_month = None;
    (0..weeks)
        .map(|column| {
            let first_day = window_start + Duration::days((column * DAYS_IN_WEEK) as i64);
            let month = (first_day.year(), first_day.month());
            let label = if previous_month != Some(month) {
                Some(first_day.format("%b").to_string())
            } else {
                None
            };
            previous_month = Some(month);
            label
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_year_labels_each_month_once() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let labels = month_labels(start, WEEKS_IN_GRID);

        assert_eq!(labels.len(), 52);
        assert_eq!(labels[0].as_deref(), Some("Jan"));
        // Jan 1 + 5 weeks = Feb 5
        assert_eq!(labels[5].as_deref(), Some("Feb"));
        assert_eq!(labels[4], None);

        let named: Vec<&str> = labels.iter().flatten().map(String::as_str).collect();
        assert_eq!(
            named,
            vec!["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
        );
    }

    #[test]
    fn test_trailing_window_repeats_start_month_at_the_end() {
        // Oct 19 2025 + 51 weeks = Oct 11 2026: October appears twice
        let start = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        let labels = month_labels(start, WEEKS_IN_GRID);

        assert_eq!(labels[0].as_deref(), Some("Oct"));
        assert_eq!(labels.iter().flatten().filter(|m| *m == "Oct").count(), 2);
        for pair in labels.windows(2) {
            if let (Some(a), Some(b)) = (&pair[0], &pair[1]) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_leading_days_align_rows_to_weekdays() {
        // 2023-01-01 is a Sunday, 2025-10-21 a Tuesday
        assert_eq!(leading_days(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()), 0);
        assert_eq!(leading_days(NaiveDate::from_ymd_opt(2025, 10, 21).unwrap()), 2);
        assert_eq!(leading_days(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()), 6);
    }

    #[test]
    fn test_weekday_labels() {
        assert_eq!(WEEKDAY_LABELS.iter().filter(|l| !l.is_empty()).count(), 3);
        assert_eq!(WEEKDAY_LABELS[1], "Mon");
    }
}
