//! Value normalizer: turns heterogeneous raw cell encodings into a canonical
//! numeric measurement plus a canonical display string.
//!
//! The monthly exports mix encodings freely: times arrive as fractions of a
//! 24-hour day, percentages as fractions of 1 or as preformatted strings,
//! counts as floats. Already-formatted strings pass through unchanged so a
//! normalized value is a fixed point of normalization.

use crate::model::{CellValue, NormalizedValue, ValueKind};

const MINUTES_PER_DAY: f64 = 1440.0;

/// Normalize one raw cell value under the declared kind. Unparseable input
/// yields the `'-'` sentinel; this function never fails.
pub fn normalize(value: &CellValue, kind: ValueKind) -> NormalizedValue {
    match kind {
        ValueKind::Percentage => normalize_percentage(value),
        ValueKind::DurationHoursMinutes => normalize_duration(value),
        ValueKind::Count => normalize_count(value),
        ValueKind::Ratio => normalize_ratio(value),
    }
}

fn normalize_percentage(value: &CellValue) -> NormalizedValue {
    match value {
        CellValue::Number(n) | CellValue::DateTime(n) => percentage_from_number(*n),
        CellValue::Text(s) if s.contains('%') => match leading_number(s) {
            // Already a percentage string; keep the author's formatting.
            Some(n) => NormalizedValue {
                numeric: Some(round2(n)),
                display: s.clone(),
            },
            None => NormalizedValue::missing(),
        },
        CellValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) => percentage_from_number(n),
            Err(_) => NormalizedValue::missing(),
        },
        CellValue::Bool(_) | CellValue::Empty => NormalizedValue::missing(),
    }
}

fn percentage_from_number(n: f64) -> NormalizedValue {
    if !n.is_finite() {
        return NormalizedValue::missing();
    }
    // Values below 1 are stored as a fraction of 1; values at or above 1 are
    // already percentage points. Zero must render as "0%", never blank.
    let percent = if n < 1.0 { round2(n * 100.0) } else { round2(n) };
    NormalizedValue {
        numeric: Some(percent),
        display: format!("{}%", format_trimmed(percent)),
    }
}

fn normalize_duration(value: &CellValue) -> NormalizedValue {
    match value {
        CellValue::Number(n) | CellValue::DateTime(n) => {
            if !n.is_finite() || *n < 0.0 {
                return NormalizedValue::missing();
            }
            let total_minutes = (n * MINUTES_PER_DAY).round() as i64;
            let hours = total_minutes / 60;
            let minutes = total_minutes % 60;
            NormalizedValue {
                numeric: Some(total_minutes as f64),
                display: format!("{hours:02}:{minutes:02}"),
            }
        }
        CellValue::Text(s) if s.contains(':') => NormalizedValue {
            // Formatted upstream; pass through and recover minutes when the
            // shape is H:MM.
            numeric: parse_clock_minutes(s),
            display: s.clone(),
        },
        CellValue::Text(s) if !s.is_empty() => NormalizedValue {
            numeric: None,
            display: s.clone(),
        },
        _ => NormalizedValue::missing(),
    }
}

fn normalize_count(value: &CellValue) -> NormalizedValue {
    match value {
        CellValue::Number(n) | CellValue::DateTime(n) => {
            if !n.is_finite() {
                return NormalizedValue::missing();
            }
            let rounded = n.round();
            NormalizedValue {
                numeric: Some(rounded),
                display: format!("{}", rounded as i64),
            }
        }
        CellValue::Text(s) if !s.is_empty() => NormalizedValue {
            numeric: s.trim().parse::<f64>().ok().map(f64::round),
            display: s.clone(),
        },
        // A blank count renders as an empty grid cell, not the '-' sentinel.
        CellValue::Text(_) | CellValue::Empty => NormalizedValue {
            numeric: None,
            display: String::new(),
        },
        CellValue::Bool(_) => NormalizedValue::missing(),
    }
}

fn normalize_ratio(value: &CellValue) -> NormalizedValue {
    let numeric = match value {
        CellValue::Number(n) | CellValue::DateTime(n) => Some(*n),
        CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(n) if n.is_finite() => NormalizedValue {
            numeric: Some(n),
            display: format!("{n:.2}"),
        },
        _ => NormalizedValue::missing(),
    }
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Render a rounded number without trailing zeros: 45.6 stays "45.6",
/// 45.0 becomes "45".
pub fn format_trimmed(n: f64) -> String {
    let fixed = format!("{n:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

fn leading_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let end = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    trimmed[..end].parse::<f64>().ok()
}

fn parse_clock_minutes(s: &str) -> Option<f64> {
    let mut parts = s.trim().splitn(2, ':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.trim().parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }
    Some((hours * 60 + minutes) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn fraction_of_one_becomes_percent() {
        let out = normalize(&num(0.4567), ValueKind::Percentage);
        assert_eq!(out.display, "45.67%");
        assert_eq!(out.numeric, Some(45.67));
    }

    #[test]
    fn half_becomes_fifty_percent_without_trailing_zeros() {
        let out = normalize(&num(0.5), ValueKind::Percentage);
        assert_eq!(out.display, "50%");
    }

    #[test]
    fn zero_is_zero_percent_not_blank() {
        let out = normalize(&num(0.0), ValueKind::Percentage);
        assert_eq!(out.display, "0%");
        assert_eq!(out.numeric, Some(0.0));
    }

    #[test]
    fn values_at_or_above_one_are_already_percent() {
        let out = normalize(&num(98.6), ValueKind::Percentage);
        assert_eq!(out.display, "98.6%");
        assert_eq!(out.numeric, Some(98.6));
    }

    #[test]
    fn preformatted_percent_string_passes_through() {
        let out = normalize(&text("45%"), ValueKind::Percentage);
        assert_eq!(out.display, "45%");
        assert_eq!(out.numeric, Some(45.0));
    }

    #[test]
    fn percent_string_with_decimals_keeps_author_formatting() {
        let out = normalize(&text("45.50%"), ValueKind::Percentage);
        assert_eq!(out.display, "45.50%");
        assert_eq!(out.numeric, Some(45.5));
    }

    #[test]
    fn unparseable_percentage_is_the_sentinel() {
        assert_eq!(
            normalize(&text("NA"), ValueKind::Percentage),
            NormalizedValue::missing()
        );
        assert_eq!(
            normalize(&CellValue::Empty, ValueKind::Percentage),
            NormalizedValue::missing()
        );
    }

    #[test]
    fn fractional_day_renders_as_clock() {
        // 15 minutes of a 24-hour day.
        let out = normalize(&num(0.0104), ValueKind::DurationHoursMinutes);
        assert_eq!(out.display, "00:15");
        assert_eq!(out.numeric, Some(15.0));
    }

    #[test]
    fn half_day_is_noon() {
        let out = normalize(&num(0.5), ValueKind::DurationHoursMinutes);
        assert_eq!(out.display, "12:00");
        assert_eq!(out.numeric, Some(720.0));
    }

    #[test]
    fn duration_minutes_are_zero_padded() {
        let out = normalize(&num(2.0 / 1440.0), ValueKind::DurationHoursMinutes);
        assert_eq!(out.display, "00:02");
    }

    #[test]
    fn preformatted_clock_string_passes_through() {
        let out = normalize(&text("12:30"), ValueKind::DurationHoursMinutes);
        assert_eq!(out.display, "12:30");
        assert_eq!(out.numeric, Some(750.0));
    }

    #[test]
    fn non_clock_text_duration_passes_through_as_is() {
        let out = normalize(&text("same day"), ValueKind::DurationHoursMinutes);
        assert_eq!(out.display, "same day");
        assert_eq!(out.numeric, None);
    }

    #[test]
    fn counts_round_to_integers() {
        let out = normalize(&num(1532.6), ValueKind::Count);
        assert_eq!(out.display, "1533");
        assert_eq!(out.numeric, Some(1533.0));
    }

    #[test]
    fn blank_count_renders_empty() {
        let out = normalize(&CellValue::Empty, ValueKind::Count);
        assert_eq!(out.display, "");
        assert_eq!(out.numeric, None);
    }

    #[test]
    fn ratios_use_two_fixed_decimals() {
        let out = normalize(&num(1.35), ValueKind::Ratio);
        assert_eq!(out.display, "1.35");
        let out = normalize(&num(2.0), ValueKind::Ratio);
        assert_eq!(out.display, "2.00");
    }

    #[test]
    fn ratio_from_text_parses() {
        let out = normalize(&text("1.35"), ValueKind::Ratio);
        assert_eq!(out.display, "1.35");
        assert_eq!(out.numeric, Some(1.35));
    }

    #[test]
    fn normalization_is_idempotent_on_formatted_strings() {
        for (raw, kind) in [
            ("45%", ValueKind::Percentage),
            ("12:30", ValueKind::DurationHoursMinutes),
        ] {
            let first = normalize(&text(raw), kind);
            let second = normalize(&text(&first.display), kind);
            assert_eq!(first.display, second.display);
        }
    }
}
