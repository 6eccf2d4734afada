use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum::{Display, EnumIter, EnumString};

/// Stable identity of one parsed spreadsheet snapshot, derived from the file
/// name and content digest. Two uploads of the same bytes share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hospital departments served by the dashboard. The lowercase code doubles
/// as the path segment of the file-listing collaborator (`/data/{code}`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Department {
    #[value(alias = "emergency")]
    Ed,
    #[value(alias = "laboratory")]
    Lab,
    #[value(alias = "blood-bank")]
    Bb,
    #[value(alias = "operating-room")]
    Or,
    #[value(alias = "radiology")]
    Rad,
}

impl Department {
    pub fn code(&self) -> &'static str {
        match self {
            Department::Ed => "ed",
            Department::Lab => "lab",
            Department::Bb => "bb",
            Department::Or => "or",
            Department::Rad => "rad",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Department::Ed => "Emergency",
            Department::Lab => "Laboratory",
            Department::Bb => "Blood Bank",
            Department::Or => "Operating Room",
            Department::Rad => "Radiology",
        }
    }
}

/// A raw cell as parsed from a workbook. `Empty` is a cell that exists with
/// an empty string value; an address with no cell at all is represented by
/// the locator's `Missing` outcome, not by a `CellValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Excel serial date: whole days since the epoch, time of day as a
    /// fraction of 24 hours.
    DateTime(f64),
    Empty,
}

impl CellValue {
    /// Raw text as the workbook carried it, for pass-through display.
    pub fn as_display(&self) -> String {
        match self {
            CellValue::Number(n) => format!("{n}"),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(d) => format!("{d}"),
            CellValue::Empty => String::new(),
        }
    }
}

/// How a KPI cell's raw encoding is interpreted for display and
/// classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    Percentage,
    DurationHoursMinutes,
    Count,
    Ratio,
}

/// Target cell of one KPI: sheet pattern plus 0-based row index and column
/// letters. The cell address is `column + (row_index + 1)`; department
/// definition sets encode 0-based rows, so the off-by-one lives here and
/// nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub sheet_pattern: String,
    pub row_index: u32,
    pub column: String,
}

impl CellRef {
    pub fn new(sheet_pattern: impl Into<String>, row_index: u32, column: impl Into<String>) -> Self {
        Self {
            sheet_pattern: sheet_pattern.into(),
            row_index,
            column: column.into(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}{}", self.column.to_ascii_uppercase(), self.row_index + 1)
    }
}

/// One severity tier of a benchmark table. Bounds are inclusive and at least
/// one is present; a tier with only an upper bound admits `value <= upper`,
/// only a lower bound admits `value >= lower`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub key: String,
    pub label: String,
    pub color: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

impl Tier {
    pub fn at_most(key: &str, label: &str, color: &str, upper: f64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            lower_bound: None,
            upper_bound: Some(upper),
        }
    }

    pub fn at_least(key: &str, label: &str, color: &str, lower: f64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            lower_bound: Some(lower),
            upper_bound: None,
        }
    }

    pub fn between(key: &str, label: &str, color: &str, lower: f64, upper: f64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            lower_bound: Some(lower),
            upper_bound: Some(upper),
        }
    }

    /// Whether this tier admits the value. Tiers with neither bound admit
    /// nothing.
    pub fn admits(&self, value: f64) -> bool {
        match (self.lower_bound, self.upper_bound) {
            (Some(lower), Some(upper)) => value >= lower && value <= upper,
            (Some(lower), None) => value >= lower,
            (None, Some(upper)) => value <= upper,
            (None, None) => false,
        }
    }
}

/// Ordered tiers checked first-to-last; declaration order is the tie-break
/// when ranges overlap at shared boundaries. Tables are not required to
/// partition the number line, so a value may match no tier at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BenchmarkTable {
    pub tiers: Vec<Tier>,
}

impl BenchmarkTable {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    /// A table with no tiers; every value stays unclassified.
    pub fn none() -> Self {
        Self { tiers: Vec::new() }
    }
}

/// Static definition of one KPI: where its cell lives, how the raw value is
/// read, and which benchmark table scores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub id: String,
    pub title: String,
    pub cell: CellRef,
    pub kind: ValueKind,
    pub benchmark: BenchmarkTable,
}

/// Normalizer output: the canonical numeric measurement (when one exists)
/// and the canonical display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedValue {
    pub numeric: Option<f64>,
    pub display: String,
}

impl NormalizedValue {
    pub fn missing() -> Self {
        Self {
            numeric: None,
            display: "-".to_string(),
        }
    }
}

/// Per-KPI extraction result, rebuilt on every refresh and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiResult {
    pub kpi_id: String,
    pub title: String,
    pub raw: Option<CellValue>,
    pub numeric: Option<f64>,
    pub display: String,
    pub tier: Option<String>,
    pub color: String,
    pub label: String,
}

/// One column of a tabular grid extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub column: String,
    pub fallback_label: String,
}

impl ColumnSpec {
    pub fn new(column: impl Into<String>, fallback_label: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            fallback_label: fallback_label.into(),
        }
    }
}

/// Grid handed to the table renderer: one header per column spec, one row of
/// formatted strings per extracted row index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Request shape for a grid extraction: which sheet, which columns, which
/// 0-based row indices (inclusive).
#[derive(Debug, Clone)]
pub struct TableRequest {
    pub sheet_pattern: String,
    pub columns: Vec<ColumnSpec>,
    pub row_range: RangeInclusive<u32>,
}

/// Summary statistics over the final numeric sequence of a series. Derived,
/// never stored independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub total: f64,
    /// Set when fewer than two real points exist; presentation substitutes
    /// illustrative data and must render it as an estimate.
    pub is_placeholder: bool,
}

/// Time series handed to the chart renderer, sorted ascending by decoded
/// period date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub metadata: SeriesMetadata,
}

/// One file advertised by the listing collaborator, with its decoded period
/// label when the name carries a date token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub period: Option<String>,
    pub bytes: Option<u64>,
}

/// Everything one department refresh hands to the rendering collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentDashboard {
    pub department: Department,
    pub file: FileDescriptor,
    pub snapshot_id: SnapshotId,
    pub kpis: indexmap::IndexMap<String, KpiResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_ref_address_is_one_based() {
        let cell = CellRef::new("ED KPIs", 2, "AC");
        assert_eq!(cell.address(), "AC3");
    }

    #[test]
    fn cell_ref_address_uppercases_column() {
        let cell = CellRef::new("LAB KPI", 0, "f");
        assert_eq!(cell.address(), "F1");
    }

    #[test]
    fn tier_with_no_bounds_admits_nothing() {
        let tier = Tier {
            key: "broken".into(),
            label: "Broken".into(),
            color: "#000000".into(),
            lower_bound: None,
            upper_bound: None,
        };
        assert!(!tier.admits(0.0));
        assert!(!tier.admits(f64::MAX));
    }

    #[test]
    fn tier_bounds_are_inclusive() {
        let tier = Tier::between("acceptable", "Acceptable", "#00B050", 10.0, 20.0);
        assert!(tier.admits(10.0));
        assert!(tier.admits(20.0));
        assert!(!tier.admits(9.99));
        assert!(!tier.admits(20.01));
    }

    #[test]
    fn department_codes_match_collaborator_paths() {
        assert_eq!(Department::Ed.code(), "ed");
        assert_eq!(Department::Bb.code(), "bb");
        assert_eq!(Department::Rad.code(), "rad");
    }
}
