//! Benchmark classifier: maps a normalized numeric value onto the first
//! admitting tier of an ordered benchmark table.
//!
//! Tables in the wild have gaps and overlapping boundaries; the declaration
//! order is the tie-break, mirroring the if/else-if chains the dashboard
//! pages used. No attempt is made to repair a table into a strict partition.

use crate::model::{BenchmarkTable, Tier};

/// Classification outcome handed to the renderer. Empty color and label mean
/// "no data" or "no tier matched", both of which are normal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Default)]
pub struct TierMatch {
    pub tier: Option<String>,
    pub color: String,
    pub label: String,
}

impl TierMatch {
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_tier(tier: &Tier) -> Self {
        Self {
            tier: Some(tier.key.clone()),
            color: tier.color.clone(),
            label: tier.label.clone(),
        }
    }
}

/// First tier in declaration order that admits the value, or `None` when no
/// tier matches or the value is absent/NaN. Never fails.
pub fn classify<'a>(value: Option<f64>, table: &'a BenchmarkTable) -> Option<&'a Tier> {
    let value = value.filter(|v| !v.is_nan())?;
    table.tiers.iter().find(|tier| tier.admits(value))
}

/// Classification as the renderer consumes it.
pub fn classify_match(value: Option<f64>, table: &BenchmarkTable) -> TierMatch {
    classify(value, table)
        .map(TierMatch::from_tier)
        .unwrap_or_else(TierMatch::empty)
}
