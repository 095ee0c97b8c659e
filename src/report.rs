/// Reporting facade: the three entry points the CLI and export layers call.
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analyzer::defects::{compute_defect_stats, compute_defect_stats_default_rate, DefectReport};
use crate::analyzer::filter::{self, DateRange, FilterConfig};
use crate::analyzer::period::{previous_period, HalfOpenRange};
use crate::analyzer::repairs::{
    compute_daily_series, compute_period_stats, compute_technician_stats, select_done_items,
    DailyPoint, DoneItem, PeriodStats, ReportConfig, TechnicianStats,
};
use crate::parser::types::{DefectRepair, RepairStatus, Ticket};

/// One finished item flattened with its ticket context, as exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub ticket_id: String,
    pub client_name: String,
    pub technician: String,
    pub city: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub name: String,
    pub serial: String,
    pub status: RepairStatus,
    pub cost: f64,
    pub warranty: bool,
    pub repair_details: String,
    pub created_at: Option<NaiveDateTime>,
}

impl From<&DoneItem<'_>> for ReportRow {
    fn from(d: &DoneItem<'_>) -> Self {
        ReportRow {
            ticket_id: d.ticket.id.clone(),
            client_name: d.ticket.client_name.clone(),
            technician: d.ticket.technician.clone(),
            city: d.ticket.city.clone(),
            equipment_type: d.item.effective_type().to_string(),
            name: d.item.name.clone(),
            serial: d.item.serial.clone(),
            status: d.item.status,
            cost: d.item.effective_cost(),
            warranty: d.item.warranty,
            repair_details: d.item.repair_details.clone(),
            created_at: d.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub period: DateRange,
    pub previous_period: HalfOpenRange,
    pub current: PeriodStats,
    pub previous: PeriodStats,
    pub by_technician: Vec<TechnicianStats>,
    pub daily_series: Vec<DailyPoint>,
    pub rows: Vec<ReportRow>,
}

pub fn filter_tickets(tickets: &[Ticket], config: &FilterConfig) -> Vec<Ticket> {
    filter::filter_tickets(tickets, config)
}

/// Repair statistics for the configured window and the equal-length window before it.
/// The per-technician breakdown and the rows cover the current window only.
pub fn compute_report(tickets: &[Ticket], config: &ReportConfig) -> RepairReport {
    let period = config.date_range;
    let prev = previous_period(&period);

    let current_items = select_done_items(tickets, config, |ts| period.contains(ts));
    let previous_items = select_done_items(tickets, config, |ts| prev.contains(ts));

    log::debug!(
        "Report {} .. {}: {} current items, {} previous items",
        period.start,
        period.end,
        current_items.len(),
        previous_items.len()
    );

    RepairReport {
        period,
        previous_period: prev,
        current: compute_period_stats(&current_items),
        previous: compute_period_stats(&previous_items),
        by_technician: compute_technician_stats(&current_items),
        daily_series: compute_daily_series(&current_items, &previous_items),
        rows: current_items.iter().map(ReportRow::from).collect(),
    }
}

pub fn compute_defect_report(
    defects: &[DefectRepair],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> DefectReport {
    compute_defect_stats_default_rate(defects, &DateRange::new(start, end))
}

pub fn compute_defect_report_with_rate(
    defects: &[DefectRepair],
    start: NaiveDateTime,
    end: NaiveDateTime,
    bonus_rate: f64,
) -> DefectReport {
    compute_defect_stats(defects, &DateRange::new(start, end), bonus_rate)
}
