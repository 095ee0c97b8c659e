use std::cmp::{Ordering, Reverse};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::parser::types::{DefectRepair, RepairStatus, Ticket, WarrantyCard};

/// Inclusive `[start, end]` window on a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortMode {
    #[default]
    CreatedDesc,
    CreatedAsc,
    /// Most urgent first: lowest item status rank, then newest.
    Urgency,
}

/// Ticket list filter. Every dimension is optional; `None` or an empty string means
/// "no constraint on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub city: Option<String>,
    pub technician: Option<String>,
    pub equipment_type: Option<String>,
    pub status: Option<RepairStatus>,
    pub client_phone: Option<String>,
    pub serial: Option<String>,
    pub date_range: Option<DateRange>,
    pub sort: SortMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefectFilterConfig {
    pub technician: Option<String>,
    pub equipment_type: Option<String>,
    pub serial: Option<String>,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarrantySearch {
    Serial,
    Phone,
}

// ─── Predicate primitives (shared with the aggregation engine) ───────────────

/// Returns the constraint value when the dimension is active.
pub(crate) fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn matches_exact(value: &str, wanted: Option<&str>) -> bool {
    wanted.map_or(true, |w| value == w)
}

pub(crate) fn matches_city(ticket: &Ticket, city: Option<&str>) -> bool {
    matches_exact(&ticket.city, city)
}

pub(crate) fn matches_technician(ticket: &Ticket, technician: Option<&str>) -> bool {
    matches_exact(&ticket.technician, technician)
}

/// A missing timestamp never falls inside a range.
pub(crate) fn in_range(ts: Option<NaiveDateTime>, range: Option<&DateRange>) -> bool {
    match range {
        None => true,
        Some(r) => ts.map_or(false, |t| r.contains(t)),
    }
}

fn has_equipment_type(ticket: &Ticket, equipment_type: Option<&str>) -> bool {
    equipment_type.map_or(true, |t| {
        ticket.equipment.iter().any(|eq| eq.effective_type() == t)
    })
}

fn has_status(ticket: &Ticket, status: Option<RepairStatus>) -> bool {
    status.map_or(true, |s| ticket.equipment.iter().any(|eq| eq.status == s))
}

fn has_serial(ticket: &Ticket, serial: Option<&str>) -> bool {
    serial.map_or(true, |s| {
        ticket.equipment.iter().any(|eq| contains_ci(&eq.serial, s))
    })
}

fn matches_phone(ticket: &Ticket, phone: Option<&str>) -> bool {
    phone.map_or(true, |p| contains_ci(&ticket.client_phone, p))
}

pub fn ticket_matches(ticket: &Ticket, config: &FilterConfig) -> bool {
    matches_city(ticket, active(&config.city))
        && matches_technician(ticket, active(&config.technician))
        && has_equipment_type(ticket, active(&config.equipment_type))
        && has_status(ticket, config.status)
        && matches_phone(ticket, active(&config.client_phone))
        && has_serial(ticket, active(&config.serial))
        && in_range(ticket.created_at, config.date_range.as_ref())
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

/// Newest first; tickets without a timestamp count as the oldest.
fn cmp_created_desc(a: &Ticket, b: &Ticket) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

pub fn sort_tickets(tickets: &mut [Ticket], mode: SortMode) {
    match mode {
        SortMode::CreatedDesc => tickets.sort_by(cmp_created_desc),
        SortMode::CreatedAsc => tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortMode::Urgency => tickets.sort_by(|a, b| {
            a.urgency_rank()
                .cmp(&b.urgency_rank())
                .then_with(|| cmp_created_desc(a, b))
        }),
    }
}

/// Returns the tickets matching every active dimension, ordered per `config.sort`.
/// When a status filter is active, each returned ticket only carries its matching items.
/// The input is never modified.
pub fn filter_tickets(tickets: &[Ticket], config: &FilterConfig) -> Vec<Ticket> {
    let mut result: Vec<Ticket> = tickets
        .iter()
        .filter(|t| ticket_matches(t, config))
        .cloned()
        .map(|mut t| {
            if let Some(status) = config.status {
                t.equipment.retain(|eq| eq.status == status);
            }
            t
        })
        .collect();

    sort_tickets(&mut result, config.sort);
    result
}

pub fn filter_defect_repairs(
    records: &[DefectRepair],
    config: &DefectFilterConfig,
) -> Vec<DefectRepair> {
    let technician = active(&config.technician);
    let equipment_type = active(&config.equipment_type);
    let serial = active(&config.serial);

    let mut result: Vec<DefectRepair> = records
        .iter()
        .filter(|r| matches_exact(&r.technician, technician))
        .filter(|r| matches_exact(&r.equipment_type, equipment_type))
        .filter(|r| serial.map_or(true, |s| contains_ci(&r.serial, s)))
        .filter(|r| in_range(r.date, config.date_range.as_ref()))
        .cloned()
        .collect();

    result.sort_by_key(|r| Reverse(r.date));
    result
}

/// Substring search over issued warranty cards, case-sensitive. An empty query finds nothing.
pub fn search_warranty_cards(
    cards: &[WarrantyCard],
    query: &str,
    by: WarrantySearch,
) -> Vec<WarrantyCard> {
    if query.is_empty() {
        return Vec::new();
    }
    cards
        .iter()
        .filter(|c| match by {
            WarrantySearch::Serial => c.serials.iter().any(|s| s.contains(query)),
            WarrantySearch::Phone => c.phone.contains(query),
        })
        .cloned()
        .collect()
}
