/// Repair analytics over finished equipment items: period totals, per-technician
/// breakdown and the merged current/previous daily series.
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::filter::{active, matches_city, matches_technician, DateRange};
use super::period::day_key;
use crate::parser::types::{label_or_unspecified, EquipmentItem, Ticket};

// ─── Data Structures ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub date_range: DateRange,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub technician: Option<String>,
    /// Effective types to keep; empty means every type.
    #[serde(default)]
    pub equipment_types: Vec<String>,
    #[serde(default)]
    pub warranty_only: bool,
}

impl ReportConfig {
    pub fn new(date_range: DateRange) -> Self {
        ReportConfig {
            date_range,
            city: None,
            technician: None,
            equipment_types: Vec::new(),
            warranty_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub total: usize,
    pub warranty_count: usize,
    pub paid_count: usize,
    pub paid_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianStats {
    pub technician: String,
    pub total: usize,
    pub warranty_count: usize,
    pub paid_count: usize,
    pub paid_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub current: usize,
    pub previous: usize,
}

/// A finished item together with the ticket that owns it.
#[derive(Debug, Clone, Copy)]
pub struct DoneItem<'a> {
    pub ticket: &'a Ticket,
    pub item: &'a EquipmentItem,
}

impl DoneItem<'_> {
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.ticket.created_at
    }
}

// ─── Selection ───────────────────────────────────────────────────────────────

fn item_matches(item: &EquipmentItem, config: &ReportConfig) -> bool {
    let type_ok = config.equipment_types.is_empty()
        || config
            .equipment_types
            .iter()
            .any(|t| t == item.effective_type());
    let warranty_ok = !config.warranty_only || item.warranty;
    item.is_done() && type_ok && warranty_ok
}

/// Collects the finished items whose ticket passes the city/technician filters and whose
/// `createdAt` satisfies `in_window`. Ordered by ticket creation, oldest first.
pub fn select_done_items<'a>(
    tickets: &'a [Ticket],
    config: &ReportConfig,
    in_window: impl Fn(NaiveDateTime) -> bool,
) -> Vec<DoneItem<'a>> {
    let city = active(&config.city);
    let technician = active(&config.technician);

    let mut items: Vec<DoneItem<'a>> = tickets
        .iter()
        .filter(|t| t.created_at.map_or(false, &in_window))
        .filter(|t| matches_city(t, city) && matches_technician(t, technician))
        .flat_map(|ticket| {
            ticket
                .equipment
                .iter()
                .filter(move |item| item_matches(item, config))
                .map(move |item| DoneItem { ticket, item })
        })
        .collect();

    items.sort_by_key(|d| d.created_at());
    items
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

impl PeriodStats {
    fn add(&mut self, item: &EquipmentItem) {
        self.total += 1;
        if item.warranty {
            self.warranty_count += 1;
        } else {
            self.paid_count += 1;
            self.paid_sum += item.effective_cost();
        }
    }
}

pub fn compute_period_stats(items: &[DoneItem<'_>]) -> PeriodStats {
    let mut stats = PeriodStats::default();
    for d in items {
        stats.add(d.item);
    }
    stats
}

/// Same metrics grouped by the owning ticket's technician, ordered by label.
/// Tickets without a technician are grouped under "unspecified".
pub fn compute_technician_stats(items: &[DoneItem<'_>]) -> Vec<TechnicianStats> {
    let mut groups: BTreeMap<&str, PeriodStats> = BTreeMap::new();
    for d in items {
        groups
            .entry(label_or_unspecified(&d.ticket.technician))
            .or_default()
            .add(d.item);
    }

    groups
        .into_iter()
        .map(|(technician, s)| TechnicianStats {
            technician: technician.to_string(),
            total: s.total,
            warranty_count: s.warranty_count,
            paid_count: s.paid_count,
            paid_sum: s.paid_sum,
        })
        .collect()
}

fn count_by_day(items: &[DoneItem<'_>]) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for d in items {
        if let Some(ts) = d.created_at() {
            *counts.entry(day_key(ts)).or_insert(0) += 1;
        }
    }
    counts
}

/// Merges both periods' daily counts into one date-ordered series. A date present in only
/// one period reports 0 for the other; dates absent from both are not emitted.
pub fn compute_daily_series(
    current: &[DoneItem<'_>],
    previous: &[DoneItem<'_>],
) -> Vec<DailyPoint> {
    let current_map = count_by_day(current);
    let previous_map = count_by_day(previous);

    let mut merged: BTreeMap<NaiveDate, DailyPoint> = BTreeMap::new();
    for (&date, &count) in &current_map {
        merged
            .entry(date)
            .or_insert(DailyPoint {
                date,
                current: 0,
                previous: 0,
            })
            .current = count;
    }
    for (&date, &count) in &previous_map {
        merged
            .entry(date)
            .or_insert(DailyPoint {
                date,
                current: 0,
                previous: 0,
            })
            .previous = count;
    }

    merged.into_values().collect()
}
