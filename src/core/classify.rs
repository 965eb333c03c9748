//! Intensity classification of day buckets.
//!
//! Each bucket's count is expressed as a percentage of the window's maximum
//! count and split into five bands:
//!
//! | band | level              |
//! |------|--------------------|
//! | 0    | exactly 0 %        |
//! | 1    | (0 %, 25 %]        |
//! | 2    | (25 %, 50 %]       |
//! | 3    | (50 %, 75 %]       |
//! | 4    | (75 %, 100 %]      |
//!
//! Classification is a pure function of the bucket, the maximum count and
//! the active filters, so cells can be re-derived on every filter change
//! without touching bucket data.

use crate::core::buckets::DayBucket;
use crate::core::filters::{FilterState, ValidationError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Maximum count used by the legend sample (one count per band).
pub const LEGEND_MAX: u32 = 4;

/// Ordered intensity band of a day relative to the busiest day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum IntensityBand {
    Empty = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Peak = 4,
}

impl IntensityBand {
    pub const ALL: [IntensityBand; 5] = [
        IntensityBand::Empty,
        IntensityBand::Low,
        IntensityBand::Medium,
        IntensityBand::High,
        IntensityBand::Peak,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Band for `count` out of `max_count`.
    ///
    /// Compared in integers (`count * 100` against `threshold * max_count`)
    /// so band edges are exact. A zero maximum always yields `Empty`.
    pub fn from_counts(count: u32, max_count: u32) -> Self {
        if count == 0 || max_count == 0 {
            return IntensityBand::Empty;
        }
        let scaled = u64::from(count) * 100;
        let max = u64::from(max_count);
        if scaled <= 25 * max {
            IntensityBand::Low
        } else if scaled <= 50 * max {
            IntensityBand::Medium
        } else if scaled <= 75 * max {
            IntensityBand::High
        } else {
            IntensityBand::Peak
        }
    }

    /// Fill opacity of the band's graded color.
    pub fn alpha(self) -> &'static str {
        match self {
            IntensityBand::Empty => "0",
            IntensityBand::Low => "0.25",
            IntensityBand::Medium => "0.5",
            IntensityBand::High => "0.75",
            IntensityBand::Peak => "1",
        }
    }
}

impl From<IntensityBand> for u8 {
    fn from(band: IntensityBand) -> u8 {
        band.ordinal()
    }
}

impl TryFrom<u8> for IntensityBand {
    type Error = ValidationError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal).ok_or(ValidationError::UnknownBand(ordinal))
    }
}

impl fmt::Display for IntensityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ordinal())
    }
}

/// Outcome of classifying one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub band: IntensityBand,
    /// `false` when a filter suppresses the cell (rendered neutral)
    pub visible: bool,
}

/// Color the presentation layer should paint a cell with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorToken {
    /// Suppressed by a filter
    Neutral,
    /// Ordinary intensity-graded fill
    Graded(IntensityBand),
    /// Cell matching the selected intensity band
    Highlight,
}

impl ColorToken {
    pub fn css(self) -> &'static str {
        match self {
            ColorToken::Neutral => "white",
            ColorToken::Highlight => "rgba(5, 5, 200, 0.25)",
            ColorToken::Graded(band) => match band {
                IntensityBand::Empty => "rgba(3, 160, 3, 0)",
                IntensityBand::Low => "rgba(3, 160, 3, 0.25)",
                IntensityBand::Medium => "rgba(3, 160, 3, 0.5)",
                IntensityBand::High => "rgba(3, 160, 3, 0.75)",
                IntensityBand::Peak => "rgba(3, 160, 3, 1)",
            },
        }
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css())
    }
}

impl Serialize for ColorToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.css())
    }
}

/// Classify a bucket against the running maximum and the active filters.
///
/// A notes sample (legend cell) is never filtered.
pub fn classify(
    bucket: &DayBucket,
    max_count: u32,
    filters: &FilterState,
    is_notes_sample: bool,
) -> Classification {
    let band = IntensityBand::from_counts(bucket.count, max_count);

    if is_notes_sample {
        return Classification {
            band,
            visible: true,
        };
    }

    if let Some(range) = filters.date_range {
        if !range.contains(bucket.date) {
            return Classification {
                band,
                visible: false,
            };
        }
    }

    let visible = match filters.intensity {
        Some(selected) => band == selected,
        None => true,
    };

    Classification { band, visible }
}

/// Color token for an already computed classification.
pub fn color_for(
    classification: Classification,
    filters: &FilterState,
    is_notes_sample: bool,
) -> ColorToken {
    if !classification.visible {
        ColorToken::Neutral
    } else if filters.intensity.is_some() && !is_notes_sample {
        ColorToken::Highlight
    } else {
        ColorToken::Graded(classification.band)
    }
}

/// Per-day view model handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub count: u32,
    pub band: IntensityBand,
    pub visible: bool,
    pub color: ColorToken,
    /// Empty when the cell is suppressed
    pub tooltip: String,
}

/// Classify a bucket and derive its color and tooltip.
pub fn render_cell(bucket: &DayBucket, max_count: u32, filters: &FilterState) -> DayCell {
    let classification = classify(bucket, max_count, filters, false);
    let tooltip = if classification.visible {
        tooltip(bucket.count, bucket.date)
    } else {
        String::new()
    };

    DayCell {
        date: bucket.date,
        count: bucket.count,
        band: classification.band,
        visible: classification.visible,
        color: color_for(classification, filters, false),
        tooltip,
    }
}

/// One cell of the static legend strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub band: IntensityBand,
    pub color: ColorToken,
}

/// The five legend cells, least to most intense.
pub fn legend() -> Vec<LegendEntry> {
    let filters = FilterState::new(0);
    (0..=LEGEND_MAX)
        .map(|count| {
            let sample = DayBucket {
                date: NaiveDate::MIN,
                count,
            };
            let classification = classify(&sample, LEGEND_MAX, &filters, true);
            LegendEntry {
                band: classification.band,
                color: color_for(classification, &filters, true),
            }
        })
        .collect()
}

/// Hover text for a day.
pub fn tooltip(count: u32, date: NaiveDate) -> String {
    let day = format_day(date);
    match count {
        0 => format!("No Events Occurred on {day}"),
        1 => format!("1 event occurred on {day}"),
        n => format!("{n} events occurred on {day}"),
    }
}

/// `June 15th, 2023`
pub fn format_day(date: NaiveDate) -> String {
    format!(
        "{} {}{}, {}",
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day()),
        date.year()
    )
}

/// English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (4..=20).contains(&day) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
