//! Time-series aggregator: the same cell extracted across one snapshot per
//! reporting period, ordered by the date token embedded in each file name.

use crate::locate::{Located, locate};
use crate::model::{NormalizedValue, SeriesMetadata, TimeSeries, ValueKind};
use crate::normalize::normalize;
use crate::snapshot::SpreadsheetSnapshot;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// File-name date convention: `...-YYYY-MMM(-DD)?...` with an uppercase
/// English three-letter month. A missing day means mid-month for sorting and
/// labeling.
static PERIOD_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})-(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)(?:-(\d{1,2}))?")
        .expect("period regex is valid")
});

const DEFAULT_DAY_OF_MONTH: u32 = 15;

/// Reporting period decoded from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    date: NaiveDate,
}

impl Period {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Chart axis label, e.g. `JAN 2025`.
    pub fn label(&self) -> String {
        format!("{} {}", month_abbrev(self.date), self.date.format("%Y"))
    }
}

fn month_abbrev(date: NaiveDate) -> &'static str {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    MONTHS[date.month0() as usize]
}

/// Decode the period token of a file name. `None` when the name does not
/// follow the convention; such files are skipped, never treated as errors.
pub fn decode_period(file_name: &str) -> Option<Period> {
    let captures = PERIOD_TOKEN.captures(file_name)?;
    let year: i32 = captures.get(1)?.as_str().parse().ok()?;
    let month = match captures.get(2)?.as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    let day = captures
        .get(3)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(DEFAULT_DAY_OF_MONTH);
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, DEFAULT_DAY_OF_MONTH))
        .map(|date| Period { date })
}

/// Assemble a series from undated points: sort ascending by period, then
/// derive the summary statistics over the final numeric sequence.
pub fn assemble(mut points: Vec<(Period, f64)>) -> TimeSeries {
    points.sort_by_key(|(period, _)| *period);

    let data: Vec<f64> = points.iter().map(|(_, value)| *value).collect();
    let labels: Vec<String> = points.iter().map(|(period, _)| period.label()).collect();

    let total: f64 = data.iter().sum();
    let min = data.iter().copied().reduce(f64::min);
    let max = data.iter().copied().reduce(f64::max);
    let avg = if data.is_empty() {
        None
    } else {
        Some(total / data.len() as f64)
    };
    let is_placeholder = data.len() < 2;

    TimeSeries {
        labels,
        data,
        metadata: SeriesMetadata {
            min,
            max,
            avg,
            total,
            is_placeholder,
        },
    }
}

/// Extract one cell across many snapshots. Files without a decodable period
/// and files where the cell yields no numeric value are omitted from the
/// series; the output order depends only on decoded dates, never on input
/// order.
pub fn extract_series<'a, I>(
    files: I,
    sheet_pattern: &str,
    row_index: u32,
    column: &str,
    kind: ValueKind,
) -> TimeSeries
where
    I: IntoIterator<Item = (&'a str, &'a SpreadsheetSnapshot)>,
{
    let mut points = Vec::new();
    for (file_name, snapshot) in files {
        let Some(period) = decode_period(file_name) else {
            tracing::debug!(file = file_name, "no period token in file name, skipping");
            continue;
        };
        let normalized = match locate(snapshot, sheet_pattern, row_index, column) {
            Located::Value(value) => normalize(&value, kind),
            Located::Missing => NormalizedValue::missing(),
        };
        match normalized.numeric {
            Some(value) => points.push((period, value)),
            None => {
                tracing::debug!(file = file_name, "no numeric value for series, skipping");
            }
        }
    }
    assemble(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::snapshot::{SnapshotBuilder, SpreadsheetSnapshot};

    fn month_snapshot(name: &str, value: f64) -> SpreadsheetSnapshot {
        SnapshotBuilder::new(name)
            .cell("ED KPIs", "AC3", CellValue::Number(value))
            .build()
    }

    #[test]
    fn period_decodes_month_token() {
        let period = decode_period("ED-2025-JAN.xlsx").unwrap();
        assert_eq!(period.date(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(period.label(), "JAN 2025");
    }

    #[test]
    fn explicit_day_overrides_the_default() {
        let period = decode_period("ED-2025-MAR-03.xlsx").unwrap();
        assert_eq!(period.date(), NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    }

    #[test]
    fn lowercase_month_is_not_a_period() {
        assert!(decode_period("ED-2025-jan.xlsx").is_none());
        assert!(decode_period("summary.xlsx").is_none());
    }

    #[test]
    fn out_of_range_day_falls_back_to_mid_month() {
        let period = decode_period("ED-2025-FEB-31.xlsx").unwrap();
        assert_eq!(period.date(), NaiveDate::from_ymd_opt(2025, 2, 15).unwrap());
    }

    #[test]
    fn series_sorts_by_decoded_date_not_input_order() {
        let jan = month_snapshot("X-2025-JAN.xlsx", 10.0);
        let mar = month_snapshot("X-2025-MAR.xlsx", 30.0);
        let feb = month_snapshot("X-2025-FEB.xlsx", 20.0);
        let files = vec![
            ("X-2025-JAN.xlsx", &jan),
            ("X-2025-MAR.xlsx", &mar),
            ("X-2025-FEB.xlsx", &feb),
        ];
        let series = extract_series(files, "ED KPIs", 2, "AC", ValueKind::Count);
        assert_eq!(series.labels, vec!["JAN 2025", "FEB 2025", "MAR 2025"]);
        assert_eq!(series.data, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn undated_files_are_skipped_without_failing_the_batch() {
        let jan = month_snapshot("X-2025-JAN.xlsx", 10.0);
        let odd = month_snapshot("backup-copy.xlsx", 99.0);
        let feb = month_snapshot("X-2025-FEB.xlsx", 20.0);
        let files = vec![
            ("backup-copy.xlsx", &odd),
            ("X-2025-JAN.xlsx", &jan),
            ("X-2025-FEB.xlsx", &feb),
        ];
        let series = extract_series(files, "ED KPIs", 2, "AC", ValueKind::Count);
        assert_eq!(series.data, vec![10.0, 20.0]);
        assert!(!series.metadata.is_placeholder);
    }

    #[test]
    fn metadata_summarizes_the_final_sequence() {
        let points = vec![
            (decode_period("2025-FEB").unwrap(), 20.0),
            (decode_period("2025-JAN").unwrap(), 10.0),
            (decode_period("2025-MAR").unwrap(), 60.0),
        ];
        let series = assemble(points);
        assert_eq!(series.metadata.min, Some(10.0));
        assert_eq!(series.metadata.max, Some(60.0));
        assert_eq!(series.metadata.avg, Some(30.0));
        assert_eq!(series.metadata.total, 90.0);
        assert!(!series.metadata.is_placeholder);
    }

    #[test]
    fn short_series_is_flagged_as_placeholder() {
        let jan = month_snapshot("X-2025-JAN.xlsx", 10.0);
        let series = extract_series(
            vec![("X-2025-JAN.xlsx", &jan)],
            "ED KPIs",
            2,
            "AC",
            ValueKind::Count,
        );
        assert!(series.metadata.is_placeholder);
        assert_eq!(series.data.len(), 1);

        let empty = assemble(Vec::new());
        assert!(empty.metadata.is_placeholder);
        assert_eq!(empty.metadata.min, None);
        assert_eq!(empty.metadata.total, 0.0);
    }

    #[test]
    fn missing_cells_are_omitted_from_the_series() {
        let jan = month_snapshot("X-2025-JAN.xlsx", 10.0);
        let feb = SnapshotBuilder::new("X-2025-FEB.xlsx").sheet("ED KPIs").build();
        let mar = month_snapshot("X-2025-MAR.xlsx", 30.0);
        let files = vec![
            ("X-2025-JAN.xlsx", &jan),
            ("X-2025-FEB.xlsx", &feb),
            ("X-2025-MAR.xlsx", &mar),
        ];
        let series = extract_series(files, "ED KPIs", 2, "AC", ValueKind::Count);
        assert_eq!(series.labels, vec!["JAN 2025", "MAR 2025"]);
    }
}
