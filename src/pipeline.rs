//! KPI extraction pipeline: locator, normalizer and classifier run per
//! definition, accumulating an ordered result map. A missing cell or an
//! unparseable value never aborts the batch; the affected entry carries the
//! `'-'` sentinel and an empty classification instead.

use crate::benchmark::classify_match;
use crate::locate::{Located, locate, resolve_sheet};
use crate::model::{
    CellValue, KpiDefinition, KpiResult, NormalizedValue, TableGrid, TableRequest, ValueKind,
};
use crate::normalize::normalize;
use crate::snapshot::SpreadsheetSnapshot;
use indexmap::IndexMap;

/// Run the full locate → normalize → classify chain for one definition.
pub fn extract_kpi(snapshot: &SpreadsheetSnapshot, def: &KpiDefinition) -> KpiResult {
    let located = locate(
        snapshot,
        &def.cell.sheet_pattern,
        def.cell.row_index,
        &def.cell.column,
    );
    let raw = located.into_value();
    let normalized = match &raw {
        Some(value) => normalize(value, def.kind),
        None => NormalizedValue::missing(),
    };
    let matched = classify_match(normalized.numeric, &def.benchmark);

    KpiResult {
        kpi_id: def.id.clone(),
        title: def.title.clone(),
        raw,
        numeric: normalized.numeric,
        display: normalized.display,
        tier: matched.tier,
        color: matched.color,
        label: matched.label,
    }
}

/// Extract every KPI of a definition set. The result map keeps definition
/// order and always contains one entry per definition.
pub fn extract_kpis(
    snapshot: &SpreadsheetSnapshot,
    definitions: &[KpiDefinition],
) -> IndexMap<String, KpiResult> {
    let mut results = IndexMap::with_capacity(definitions.len());
    for def in definitions {
        let result = extract_kpi(snapshot, def);
        if result.raw.is_none() {
            tracing::debug!(kpi = %def.id, cell = %def.cell.address(), "KPI cell missing");
        }
        results.insert(def.id.clone(), result);
    }
    results
}

/// Infer how a grid column's cells should be normalized from its header
/// label. Checked in order; the first matching rule wins.
pub fn infer_kind(label: &str) -> Option<ValueKind> {
    let lower = label.to_ascii_lowercase();
    if lower.contains("rate") || lower.contains('%') {
        return Some(ValueKind::Percentage);
    }
    if lower.contains("time")
        || lower.contains("door to")
        || lower.contains("decision to")
        || lower.contains("doc to")
    {
        return Some(ValueKind::DurationHoursMinutes);
    }
    if lower.contains("total") || lower.contains("volume") || lower.contains("patients") {
        return Some(ValueKind::Count);
    }
    None
}

/// Extract a rectangular grid for tabular display. Headers come from row 1
/// of each named column, falling back to the configured label when the
/// header cell is blank; data cells are normalized under the kind inferred
/// from the header text, or passed through raw when no rule matches.
pub fn extract_table(snapshot: &SpreadsheetSnapshot, request: &TableRequest) -> TableGrid {
    let resolved = resolve_sheet(snapshot, &request.sheet_pattern);
    let sheet = resolved.map(|(_, sheet)| sheet);

    let headers: Vec<String> = request
        .columns
        .iter()
        .map(|spec| {
            let header = sheet
                .and_then(|sheet| sheet.cell(&format!("{}1", spec.column.to_ascii_uppercase())))
                .map(CellValue::as_display)
                .unwrap_or_default();
            if header.trim().is_empty() {
                spec.fallback_label.clone()
            } else {
                header
            }
        })
        .collect();

    let kinds: Vec<Option<ValueKind>> = headers.iter().map(|label| infer_kind(label)).collect();

    let mut rows = Vec::new();
    for row_index in request.row_range.clone() {
        let mut row = Vec::with_capacity(request.columns.len());
        for (spec, kind) in request.columns.iter().zip(&kinds) {
            let located = locate(snapshot, &request.sheet_pattern, row_index, &spec.column);
            let rendered = match (located, kind) {
                (Located::Value(value), Some(kind)) => normalize(&value, *kind).display,
                (Located::Value(value), None) => value.as_display(),
                (Located::Missing, Some(_)) => "-".to_string(),
                (Located::Missing, None) => String::new(),
            };
            row.push(rendered);
        }
        rows.push(row);
    }

    TableGrid { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::model::{ColumnSpec, Department};
    use crate::snapshot::SnapshotBuilder;

    fn ed_snapshot() -> SpreadsheetSnapshot {
        SnapshotBuilder::new("ED-2025-JAN.xlsx")
            .cell("ED KPIs 1-6 - manual", "AC3", CellValue::Number(0.0104))
            .cell("ED KPIs 1-6 - manual", "AC4", CellValue::Number(0.0278))
            .cell("ED KPIs 1-6 - manual", "AC6", CellValue::Number(0.012))
            .cell("ED KPIs 1-6 - manual", "AC7", CellValue::Number(0.96))
            .cell("ED KPIs 1-6 - manual", "AC8", CellValue::Number(1532.0))
            .build()
    }

    #[test]
    fn full_map_is_returned_even_with_missing_cells() {
        let snapshot = ed_snapshot();
        let defs = catalog::definitions(Department::Ed);
        let results = extract_kpis(&snapshot, defs);

        assert_eq!(results.len(), defs.len());
        // AC5 (decision to admit) is absent in the fixture.
        let missing = &results["ed_decision_to_admit"];
        assert_eq!(missing.display, "-");
        assert!(missing.tier.is_none());
        assert_eq!(missing.color, "");
        // Its neighbors extracted normally.
        assert_eq!(results["ed_door_to_doctor"].display, "00:15");
        assert_eq!(results["ed_daily_census"].display, "1532");
    }

    #[test]
    fn result_map_keeps_definition_order() {
        let snapshot = ed_snapshot();
        let defs = catalog::definitions(Department::Ed);
        let results = extract_kpis(&snapshot, defs);
        let ids: Vec<&str> = results.keys().map(String::as_str).collect();
        let expected: Vec<&str> = defs.iter().map(|def| def.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn kind_inference_follows_label_substrings() {
        assert_eq!(infer_kind("LWBS Rate"), Some(ValueKind::Percentage));
        assert_eq!(infer_kind("Admit %"), Some(ValueKind::Percentage));
        assert_eq!(
            infer_kind("Door to Doc"),
            Some(ValueKind::DurationHoursMinutes)
        );
        assert_eq!(
            infer_kind("Decision to Admit"),
            Some(ValueKind::DurationHoursMinutes)
        );
        assert_eq!(infer_kind("Total Patients"), Some(ValueKind::Count));
        assert_eq!(infer_kind("Volume"), Some(ValueKind::Count));
        assert_eq!(infer_kind("Attending Physician"), None);
    }

    #[test]
    fn rate_rule_wins_over_time_rule() {
        // "Turnaround Time Rate" mentions both; rate is checked first.
        assert_eq!(infer_kind("Turnaround Time Rate"), Some(ValueKind::Percentage));
    }

    #[test]
    fn table_headers_fall_back_when_blank() {
        let snapshot = SnapshotBuilder::new("ED-2025-JAN.xlsx")
            .cell("ED KPIs", "A1", CellValue::Text("Shift".into()))
            .cell("ED KPIs", "A2", CellValue::Text("Night".into()))
            .cell("ED KPIs", "B2", CellValue::Number(0.25))
            .build();
        let request = TableRequest {
            sheet_pattern: "ED KPIs".into(),
            columns: vec![
                ColumnSpec::new("A", "Label"),
                ColumnSpec::new("B", "Wait Time"),
            ],
            row_range: 1..=1,
        };
        let grid = extract_table(&snapshot, &request);
        assert_eq!(grid.headers, vec!["Shift".to_string(), "Wait Time".to_string()]);
        // Fallback header "Wait Time" infers a duration column.
        assert_eq!(grid.rows, vec![vec!["Night".to_string(), "06:00".to_string()]]);
    }

    #[test]
    fn table_missing_cells_use_sentinels_per_kind() {
        let snapshot = SnapshotBuilder::new("ED-2025-JAN.xlsx")
            .cell("ED KPIs", "A1", CellValue::Text("LWBS Rate".into()))
            .cell("ED KPIs", "B1", CellValue::Text("Comment".into()))
            .build();
        let request = TableRequest {
            sheet_pattern: "ED KPIs".into(),
            columns: vec![ColumnSpec::new("A", "A"), ColumnSpec::new("B", "B")],
            row_range: 1..=2,
        };
        let grid = extract_table(&snapshot, &request);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0], vec!["-".to_string(), String::new()]);
    }
}
