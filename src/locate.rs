//! Cell locator: resolves a (sheet pattern, row index, column) triple against
//! a snapshot. Source files are produced by hand and sheet names drift
//! between monthly exports, so resolution is best-effort rather than strict.

use crate::model::CellValue;
use crate::snapshot::{Sheet, SpreadsheetSnapshot};

/// Outcome of a cell lookup. `Missing` is a legitimate result (blank
/// periods), not a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum Located {
    Value(CellValue),
    Missing,
}

impl Located {
    pub fn into_value(self) -> Option<CellValue> {
        match self {
            Located::Value(value) => Some(value),
            Located::Missing => None,
        }
    }
}

/// Resolve a sheet by pattern. The chain, in order: exact name match,
/// case-insensitive substring match, any sheet containing "kpi" when the
/// pattern itself carries that token, and finally the first sheet in the
/// workbook.
pub fn resolve_sheet<'a>(
    snapshot: &'a SpreadsheetSnapshot,
    pattern: &str,
) -> Option<(&'a str, &'a Sheet)> {
    for name in snapshot.sheet_names() {
        if name == pattern {
            if let Some(sheet) = snapshot.sheet(name) {
                return Some((name, sheet));
            }
        }
    }

    let pattern_lower = pattern.to_ascii_lowercase();
    for name in snapshot.sheet_names() {
        if name.to_ascii_lowercase().contains(&pattern_lower) {
            if let Some(sheet) = snapshot.sheet(name) {
                return Some((name, sheet));
            }
        }
    }

    if pattern_lower.contains("kpi") {
        for name in snapshot.sheet_names() {
            if name.to_ascii_lowercase().contains("kpi") {
                if let Some(sheet) = snapshot.sheet(name) {
                    return Some((name, sheet));
                }
            }
        }
    }

    snapshot.first_sheet()
}

/// Locate one cell. `row_index` is 0-based while the built address is
/// 1-based: `locate(_, _, 2, "AC")` reads `AC3`.
pub fn locate(
    snapshot: &SpreadsheetSnapshot,
    sheet_pattern: &str,
    row_index: u32,
    column: &str,
) -> Located {
    let Some((sheet_name, sheet)) = resolve_sheet(snapshot, sheet_pattern) else {
        tracing::debug!(pattern = sheet_pattern, "workbook has no sheets");
        return Located::Missing;
    };

    let address = format!("{}{}", column.to_ascii_uppercase(), row_index + 1);
    match sheet.cell(&address) {
        Some(value) => Located::Value(value.clone()),
        None => {
            tracing::trace!(sheet = sheet_name, address = %address, "cell missing");
            Located::Missing
        }
    }
}
