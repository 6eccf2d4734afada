//! Per-department KPI catalog.
//!
//! Each department dashboard reads a fixed set of cells out of its monthly
//! export. The definitions here are configuration data: one declarative
//! record per KPI, loaded once and passed into the pipeline, instead of
//! being re-derived on every page.

use crate::model::{BenchmarkTable, CellRef, Department, KpiDefinition, Tier, ValueKind};
use once_cell::sync::Lazy;

pub const WORLD_CLASS: &str = "world_class";
pub const ACCEPTABLE: &str = "acceptable";
pub const NEEDS_IMPROVEMENT: &str = "needs_improvement";
pub const UNACCEPTABLE: &str = "unacceptable";

pub const WORLD_CLASS_COLOR: &str = "#00B0F0";
pub const ACCEPTABLE_COLOR: &str = "#00B050";
pub const NEEDS_IMPROVEMENT_COLOR: &str = "#FFC000";
pub const UNACCEPTABLE_COLOR: &str = "#FF0000";

/// Four-tier table for metrics where smaller is better (waits, rates of bad
/// outcomes). World class is open below, unacceptable open above.
pub fn lower_is_better(
    world_class_max: f64,
    acceptable: (f64, f64),
    needs_improvement: (f64, f64),
    unacceptable_min: f64,
) -> BenchmarkTable {
    BenchmarkTable::new(vec![
        Tier::at_most(WORLD_CLASS, "World Class", WORLD_CLASS_COLOR, world_class_max),
        Tier::between(
            ACCEPTABLE,
            "Acceptable",
            ACCEPTABLE_COLOR,
            acceptable.0,
            acceptable.1,
        ),
        Tier::between(
            NEEDS_IMPROVEMENT,
            "Needs Improvement",
            NEEDS_IMPROVEMENT_COLOR,
            needs_improvement.0,
            needs_improvement.1,
        ),
        Tier::at_least(
            UNACCEPTABLE,
            "Unacceptable",
            UNACCEPTABLE_COLOR,
            unacceptable_min,
        ),
    ])
}

/// Four-tier table for metrics where larger is better (compliance and
/// satisfaction rates).
pub fn higher_is_better(
    world_class_min: f64,
    acceptable: (f64, f64),
    needs_improvement: (f64, f64),
    unacceptable_max: f64,
) -> BenchmarkTable {
    BenchmarkTable::new(vec![
        Tier::at_least(WORLD_CLASS, "World Class", WORLD_CLASS_COLOR, world_class_min),
        Tier::between(
            ACCEPTABLE,
            "Acceptable",
            ACCEPTABLE_COLOR,
            acceptable.0,
            acceptable.1,
        ),
        Tier::between(
            NEEDS_IMPROVEMENT,
            "Needs Improvement",
            NEEDS_IMPROVEMENT_COLOR,
            needs_improvement.0,
            needs_improvement.1,
        ),
        Tier::at_most(
            UNACCEPTABLE,
            "Unacceptable",
            UNACCEPTABLE_COLOR,
            unacceptable_max,
        ),
    ])
}

fn kpi(
    id: &str,
    title: &str,
    cell: CellRef,
    kind: ValueKind,
    benchmark: BenchmarkTable,
) -> KpiDefinition {
    KpiDefinition {
        id: id.to_string(),
        title: title.to_string(),
        cell,
        kind,
        benchmark,
    }
}

static EMERGENCY: Lazy<Vec<KpiDefinition>> = Lazy::new(|| {
    let sheet = "ED KPIs";
    vec![
        kpi(
            "ed_door_to_doctor",
            "Door to Doctor Time",
            CellRef::new(sheet, 2, "AC"),
            ValueKind::DurationHoursMinutes,
            lower_is_better(10.0, (10.0, 20.0), (20.0, 30.0), 30.0),
        ),
        kpi(
            "ed_doc_to_decision",
            "Doc to Decision Time",
            CellRef::new(sheet, 3, "AC"),
            ValueKind::DurationHoursMinutes,
            lower_is_better(30.0, (30.0, 60.0), (60.0, 90.0), 90.0),
        ),
        kpi(
            "ed_decision_to_admit",
            "Decision to Admit Time",
            CellRef::new(sheet, 4, "AC"),
            ValueKind::DurationHoursMinutes,
            lower_is_better(60.0, (60.0, 120.0), (120.0, 180.0), 180.0),
        ),
        kpi(
            "ed_lwbs_rate",
            "Left Without Being Seen Rate",
            CellRef::new(sheet, 5, "AC"),
            ValueKind::Percentage,
            lower_is_better(1.0, (1.0, 2.0), (2.0, 4.0), 4.0),
        ),
        kpi(
            "ed_patient_satisfaction",
            "Patient Satisfaction Rate",
            CellRef::new(sheet, 6, "AC"),
            ValueKind::Percentage,
            higher_is_better(95.0, (75.0, 95.0), (50.0, 75.0), 50.0),
        ),
        kpi(
            "ed_daily_census",
            "Total ED Patients",
            CellRef::new(sheet, 7, "AC"),
            ValueKind::Count,
            BenchmarkTable::none(),
        ),
    ]
});

static LABORATORY: Lazy<Vec<KpiDefinition>> = Lazy::new(|| {
    let sheet = "LAB KPI";
    vec![
        kpi(
            "lab_stat_tat",
            "STAT Turnaround Time",
            CellRef::new(sheet, 2, "F"),
            ValueKind::DurationHoursMinutes,
            lower_is_better(45.0, (45.0, 60.0), (60.0, 90.0), 90.0),
        ),
        kpi(
            "lab_routine_tat",
            "Routine Turnaround Time",
            CellRef::new(sheet, 3, "F"),
            ValueKind::DurationHoursMinutes,
            lower_is_better(240.0, (240.0, 360.0), (360.0, 480.0), 480.0),
        ),
        kpi(
            "lab_critical_notification",
            "Critical Value Notification Rate",
            CellRef::new(sheet, 4, "F"),
            ValueKind::Percentage,
            higher_is_better(98.0, (90.0, 98.0), (80.0, 90.0), 80.0),
        ),
        kpi(
            "lab_rejection_rate",
            "Specimen Rejection Rate",
            CellRef::new(sheet, 5, "F"),
            ValueKind::Percentage,
            lower_is_better(1.0, (1.0, 2.0), (2.0, 3.0), 3.0),
        ),
        kpi(
            "lab_test_volume",
            "Total Tests Performed",
            CellRef::new(sheet, 6, "F"),
            ValueKind::Count,
            BenchmarkTable::none(),
        ),
    ]
});

static BLOOD_BANK: Lazy<Vec<KpiDefinition>> = Lazy::new(|| {
    let sheet = "BB KPI";
    vec![
        kpi(
            "bb_ct_ratio",
            "Crossmatch to Transfusion Ratio",
            CellRef::new(sheet, 2, "E"),
            ValueKind::Ratio,
            lower_is_better(1.5, (1.5, 2.0), (2.0, 2.5), 2.5),
        ),
        kpi(
            "bb_wastage_rate",
            "Blood Unit Wastage Rate",
            CellRef::new(sheet, 3, "E"),
            ValueKind::Percentage,
            lower_is_better(1.0, (1.0, 2.0), (2.0, 4.0), 4.0),
        ),
        kpi(
            "bb_units_issued",
            "Total Units Issued",
            CellRef::new(sheet, 4, "E"),
            ValueKind::Count,
            BenchmarkTable::none(),
        ),
    ]
});

static OPERATING_ROOM: Lazy<Vec<KpiDefinition>> = Lazy::new(|| {
    let sheet = "OR KPI";
    vec![
        kpi(
            "or_first_case_on_time",
            "First Case On-Time Start Rate",
            CellRef::new(sheet, 2, "G"),
            ValueKind::Percentage,
            higher_is_better(90.0, (80.0, 90.0), (70.0, 80.0), 70.0),
        ),
        kpi(
            "or_utilization",
            "OR Utilization Rate",
            CellRef::new(sheet, 3, "G"),
            ValueKind::Percentage,
            higher_is_better(75.0, (65.0, 75.0), (55.0, 65.0), 55.0),
        ),
        kpi(
            "or_turnover_time",
            "Room Turnover Time",
            CellRef::new(sheet, 4, "G"),
            ValueKind::DurationHoursMinutes,
            lower_is_better(25.0, (25.0, 35.0), (35.0, 45.0), 45.0),
        ),
        kpi(
            "or_cancellation_rate",
            "Day-of-Surgery Cancellation Rate",
            CellRef::new(sheet, 5, "G"),
            ValueKind::Percentage,
            lower_is_better(1.0, (1.0, 3.0), (3.0, 5.0), 5.0),
        ),
        kpi(
            "or_case_volume",
            "Total Cases",
            CellRef::new(sheet, 6, "G"),
            ValueKind::Count,
            BenchmarkTable::none(),
        ),
    ]
});

static RADIOLOGY: Lazy<Vec<KpiDefinition>> = Lazy::new(|| {
    let sheet = "RAD KPI";
    vec![
        kpi(
            "rad_report_tat",
            "Report Turnaround Time",
            CellRef::new(sheet, 2, "D"),
            ValueKind::DurationHoursMinutes,
            lower_is_better(120.0, (120.0, 240.0), (240.0, 480.0), 480.0),
        ),
        kpi(
            "rad_critical_findings",
            "Critical Findings Notification Rate",
            CellRef::new(sheet, 3, "D"),
            ValueKind::Percentage,
            higher_is_better(98.0, (90.0, 98.0), (80.0, 90.0), 80.0),
        ),
        kpi(
            "rad_repeat_rate",
            "Repeat Exam Rate",
            CellRef::new(sheet, 4, "D"),
            ValueKind::Percentage,
            lower_is_better(2.0, (2.0, 4.0), (4.0, 6.0), 6.0),
        ),
        kpi(
            "rad_exam_volume",
            "Total Exams",
            CellRef::new(sheet, 5, "D"),
            ValueKind::Count,
            BenchmarkTable::none(),
        ),
    ]
});

/// The KPI definition set of one department dashboard.
pub fn definitions(department: Department) -> &'static [KpiDefinition] {
    match department {
        Department::Ed => &EMERGENCY,
        Department::Lab => &LABORATORY,
        Department::Bb => &BLOOD_BANK,
        Department::Or => &OPERATING_ROOM,
        Department::Rad => &RADIOLOGY,
    }
}

/// Look up one definition by id within a department.
pub fn definition(department: Department, kpi_id: &str) -> Option<&'static KpiDefinition> {
    definitions(department).iter().find(|def| def.id == kpi_id)
}
