use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::{in_range, DateRange};
use crate::config::DEFAULT_BONUS_RATE;
use crate::parser::types::{label_or_unspecified, DefectRepair};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectReport {
    pub total_count: usize,
    pub by_technician: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub bonus_by_technician: BTreeMap<String, f64>,
    pub total_bonus: f64,
    pub parts_usage: BTreeMap<String, usize>,
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(label_or_unspecified(key).to_string()).or_insert(0) += 1;
}

/// Defect-repair statistics over `[range.start, range.end]` inclusive on `date`.
///
/// Blank technician/type/part values land in the "unspecified" bucket, so every count map
/// sums to `total_count`. Unpriced repairs are counted but earn no bonus entry.
pub fn compute_defect_stats(
    records: &[DefectRepair],
    range: &DateRange,
    bonus_rate: f64,
) -> DefectReport {
    let mut report = DefectReport::default();

    for r in records.iter().filter(|r| in_range(r.date, Some(range))) {
        report.total_count += 1;
        bump(&mut report.by_technician, &r.technician);
        bump(&mut report.by_type, &r.equipment_type);
        bump(&mut report.parts_usage, &r.part_used);

        if let Some(bonus) = r.bonus(bonus_rate) {
            *report
                .bonus_by_technician
                .entry(label_or_unspecified(&r.technician).to_string())
                .or_insert(0.0) += bonus;
        }
    }

    report.total_bonus = report.bonus_by_technician.values().sum();
    report
}

pub fn compute_defect_stats_default_rate(records: &[DefectRepair], range: &DateRange) -> DefectReport {
    compute_defect_stats(records, range, DEFAULT_BONUS_RATE)
}
