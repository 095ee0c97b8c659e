use crate::analyzer::defects::DefectReport;
use crate::analyzer::filter::{filter_defect_repairs, DateRange, DefectFilterConfig};
use crate::analyzer::repairs::ReportConfig;
use crate::config::get_config_from_db;
use crate::db::queries;
use crate::error::AppError;
use crate::export::defect_report::generate_defect_report;
use crate::export::repair_report::generate_repair_report;
use crate::parser::types::DefectRepair;
use crate::report::{compute_defect_report_with_rate, compute_report, RepairReport};
use crate::state::{AppState, DbAccess};

pub fn get_repair_report(state: &AppState, config: &ReportConfig) -> Result<RepairReport, AppError> {
    let tickets = state.db(queries::load_tickets)?;
    let report = compute_report(&tickets, config);
    log::info!(
        "Repair report: {} done now, {} before, paid sum {:.2}",
        report.current.total,
        report.previous.total,
        report.current.paid_sum
    );
    Ok(report)
}

pub fn export_repair_report(state: &AppState, config: &ReportConfig) -> Result<Vec<u8>, AppError> {
    let report = get_repair_report(state, config)?;
    generate_repair_report(&report)
}

/// Defect statistics using the configured bonus rate.
pub fn get_defect_report(state: &AppState, range: &DateRange) -> Result<DefectReport, AppError> {
    let (records, bonus_rate) = state.db(|conn| {
        let config = get_config_from_db(conn)?;
        Ok((queries::load_defect_repairs(conn)?, config.bonus_rate))
    })?;
    let report = compute_defect_report_with_rate(&records, range.start, range.end, bonus_rate);
    log::info!(
        "Defect report: {} repairs, total bonus {:.2}",
        report.total_count,
        report.total_bonus
    );
    Ok(report)
}

pub fn export_defect_report(state: &AppState, range: &DateRange) -> Result<Vec<u8>, AppError> {
    let report = get_defect_report(state, range)?;
    generate_defect_report(&report, range)
}

pub fn list_defect_repairs(
    state: &AppState,
    filters: &DefectFilterConfig,
) -> Result<Vec<DefectRepair>, AppError> {
    let records = state.db(queries::load_defect_repairs)?;
    Ok(filter_defect_repairs(&records, filters))
}
