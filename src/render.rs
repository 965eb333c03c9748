//! Plain-text rendering of a heatmap view for the terminal.
//!
//! Days run top to bottom in columns of seven, one glyph per day.

use crate::controller::HeatmapView;
use crate::core::calendar::DAYS_IN_WEEK;
use crate::core::classify::{ColorToken, DayCell, IntensityBand};
use crate::core::filters::FilterState;

const LABEL_WIDTH: usize = 4;

/// Glyph drawn for a cell.
pub fn glyph(cell: &DayCell) -> char {
    match cell.color {
        ColorToken::Neutral => ' ',
        ColorToken::Highlight => '◆',
        ColorToken::Graded(band) => band_glyph(band),
    }
}

fn band_glyph(band: IntensityBand) -> char {
    match band {
        IntensityBand::Empty => '·',
        IntensityBand::Low => '░',
        IntensityBand::Medium => '▒',
        IntensityBand::High => '▓',
        IntensityBand::Peak => '█',
    }
}

/// Render the full grid with axis labels, legend and filter summary.
pub fn render(view: &HeatmapView) -> String {
    let rows = grid_rows(&view.cells, view.leading_days);
    let columns = rows.first().map_or(0, |row| row.chars().count());
    let mut out = String::new();

    out.push_str(&" ".repeat(LABEL_WIDTH));
    out.push_str(&month_axis(&view.month_labels, columns));
    out.push('\n');

    for (row, glyphs) in rows.iter().enumerate() {
        let label = view.weekday_labels.get(row).copied().unwrap_or("");
        out.push_str(&format!("{label:<width$}", width = LABEL_WIDTH));
        out.push_str(glyphs);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&legend_line(view));
    out.push('\n');
    out.push_str(&filter_line(view));
    out.push('\n');
    out
}

/// One string of glyphs per weekday row. The first `leading` slots of the
/// first column are blank so the first day sits in its weekday's row.
fn grid_rows(cells: &[DayCell], leading: usize) -> Vec<String> {
    let slots = leading + cells.len();
    let columns = (slots + DAYS_IN_WEEK - 1) / DAYS_IN_WEEK;
    (0..DAYS_IN_WEEK)
        .map(|row| {
            (0..columns)
                .map(|column| {
                    (column * DAYS_IN_WEEK + row)
                        .checked_sub(leading)
                        .and_then(|index| cells.get(index))
                        .map_or(' ', glyph)
                })
                .collect()
        })
        .collect()
}

/// Month names placed over their first column; a label that would overlap
/// the previous one is skipped.
fn month_axis(labels: &[Option<String>], columns: usize) -> String {
    let mut axis = vec![' '; columns];
    let mut next_free = 0;
    for (column, label) in labels.iter().enumerate() {
        let Some(label) = label else { continue };
        if column < next_free || column + label.chars().count() > columns {
            continue;
        }
        for (offset, ch) in label.chars().enumerate() {
            axis[column + offset] = ch;
        }
        next_free = column + label.chars().count() + 1;
    }
    axis.into_iter().collect::<String>().trim_end().to_string()
}

fn legend_line(view: &HeatmapView) -> String {
    let glyphs: String = view.legend.iter().map(|entry| band_glyph(entry.band)).collect();
    format!(
        "{:width$}Less {glyphs} More   (busiest day: {} events)",
        "",
        view.max_count,
        width = LABEL_WIDTH
    )
}

fn filter_line(view: &HeatmapView) -> String {
    format!(
        "{:width$}{} to {} | {}",
        "",
        view.min_date,
        view.max_date,
        describe_filters(&view.filters),
        width = LABEL_WIDTH
    )
}

/// One-line description of the active filters.
pub fn describe_filters(filters: &FilterState) -> String {
    let mut parts = vec![format!("year {}", filters.active_year)];
    if let Some(range) = filters.date_range {
        parts.push(format!("range {} .. {}", range.start, range.end));
    }
    if let Some(band) = filters.intensity {
        parts.push(format!("band {band}"));
    }
    parts.join(", ")
}
