use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use crate::analyzer::repairs::{DailyPoint, TechnicianStats};
use crate::error::AppError;
use crate::export::{
    create_date_format, create_header_format, create_integer_format, create_number_format,
    create_percent_format, finish_table, relative_delta, write_headers,
};
use crate::report::{RepairReport, ReportRow};

/// Four-sheet repair workbook: Rows, Summary, Technicians, Daily. Returns the xlsx bytes.
pub fn generate_repair_report(report: &RepairReport) -> Result<Vec<u8>, AppError> {
    let mut wb = Workbook::new();
    write_rows(wb.add_worksheet(), &report.rows)?;
    write_summary(wb.add_worksheet(), report)?;
    write_technicians(wb.add_worksheet(), &report.by_technician)?;
    write_daily(wb.add_worksheet(), &report.daily_series)?;
    Ok(wb.save_to_buffer()?)
}

// ── Rows ─────────────────────────────────────────────────────────────────────

fn write_rows(ws: &mut Worksheet, rows: &[ReportRow]) -> Result<(), XlsxError> {
    ws.set_name("Rows")?;

    let hdr = create_header_format();
    let num = create_number_format();
    let date = create_date_format();

    let headers = [
        "Date",
        "Ticket",
        "Client",
        "City",
        "Technician",
        "Type",
        "Name",
        "Serial",
        "Status",
        "Warranty",
        "Cost",
        "Repair details",
    ];
    write_headers(ws, 0, &headers, &hdr)?;

    for (i, r) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        if let Some(ts) = &r.created_at {
            ws.write_datetime_with_format(row, 0, ts, &date)?;
        }
        ws.write(row, 1, r.ticket_id.as_str())?;
        ws.write(row, 2, r.client_name.as_str())?;
        ws.write(row, 3, r.city.as_str())?;
        ws.write(row, 4, r.technician.as_str())?;
        ws.write(row, 5, r.equipment_type.as_str())?;
        ws.write(row, 6, r.name.as_str())?;
        ws.write(row, 7, r.serial.as_str())?;
        ws.write(row, 8, r.status.as_str())?;
        ws.write(row, 9, if r.warranty { "yes" } else { "no" })?;
        ws.write_with_format(row, 10, r.cost, &num)?;
        ws.write(row, 11, r.repair_details.as_str())?;
    }

    finish_table(ws, rows.len(), headers.len())?;

    ws.set_column_width(0, 12)?;
    for col in 1..=8 {
        ws.set_column_width(col, 16)?;
    }
    ws.set_column_width(10, 14)?;
    ws.set_column_width(11, 40)?;
    Ok(())
}

// ── Summary ──────────────────────────────────────────────────────────────────

fn write_summary(ws: &mut Worksheet, report: &RepairReport) -> Result<(), XlsxError> {
    ws.set_name("Summary")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let num = create_number_format();
    let pct = create_percent_format();
    let date = create_date_format();

    write_headers(ws, 0, &["Period", "From", "To"], &hdr)?;
    ws.write(1, 0, "Current")?;
    ws.write_datetime_with_format(1, 1, &report.period.start, &date)?;
    ws.write_datetime_with_format(1, 2, &report.period.end, &date)?;
    ws.write(2, 0, "Previous")?;
    ws.write_datetime_with_format(2, 1, &report.previous_period.start, &date)?;
    ws.write_datetime_with_format(2, 2, &report.previous_period.end, &date)?;

    write_headers(ws, 4, &["Indicator", "Current", "Previous", "Delta"], &hdr)?;

    let cur = &report.current;
    let prev = &report.previous;
    let lines: [(&str, f64, f64, bool); 4] = [
        ("Repairs done", cur.total as f64, prev.total as f64, false),
        ("Warranty", cur.warranty_count as f64, prev.warranty_count as f64, false),
        ("Paid", cur.paid_count as f64, prev.paid_count as f64, false),
        ("Paid sum", cur.paid_sum, prev.paid_sum, true),
    ];
    for (i, (label, c, p, money)) in lines.iter().enumerate() {
        let row = (i + 5) as u32;
        let fmt = if *money { &num } else { &int };
        ws.write(row, 0, *label)?;
        ws.write_with_format(row, 1, *c, fmt)?;
        ws.write_with_format(row, 2, *p, fmt)?;
        if let Some(delta) = relative_delta(*c, *p) {
            ws.write_with_format(row, 3, delta, &pct)?;
        }
    }

    ws.set_column_width(0, 18)?;
    ws.set_column_width(1, 14)?;
    ws.set_column_width(2, 14)?;
    ws.set_column_width(3, 10)?;
    Ok(())
}

// ── Technicians ──────────────────────────────────────────────────────────────

fn write_technicians(ws: &mut Worksheet, stats: &[TechnicianStats]) -> Result<(), XlsxError> {
    ws.set_name("Technicians")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let num = create_number_format();

    let headers = ["Technician", "Repairs", "Warranty", "Paid", "Paid sum"];
    write_headers(ws, 0, &headers, &hdr)?;

    for (i, t) in stats.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, t.technician.as_str())?;
        ws.write_with_format(row, 1, t.total as f64, &int)?;
        ws.write_with_format(row, 2, t.warranty_count as f64, &int)?;
        ws.write_with_format(row, 3, t.paid_count as f64, &int)?;
        ws.write_with_format(row, 4, t.paid_sum, &num)?;
    }

    finish_table(ws, stats.len(), headers.len())?;
    ws.set_column_width(0, 22)?;
    ws.set_column_width(4, 14)?;
    Ok(())
}

// ── Daily ────────────────────────────────────────────────────────────────────

fn write_daily(ws: &mut Worksheet, series: &[DailyPoint]) -> Result<(), XlsxError> {
    ws.set_name("Daily")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let date = create_date_format();

    write_headers(ws, 0, &["Date", "Current", "Previous"], &hdr)?;

    for (i, p) in series.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write_datetime_with_format(row, 0, &p.date, &date)?;
        ws.write_with_format(row, 1, p.current as f64, &int)?;
        ws.write_with_format(row, 2, p.previous as f64, &int)?;
    }

    ws.set_column_width(0, 12)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::filter::DateRange;
    use crate::analyzer::repairs::ReportConfig;
    use crate::parser::types::{EquipmentItem, RepairStatus, Ticket};
    use crate::report::compute_report;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_report(with_data: bool) -> RepairReport {
        let tickets = if with_data {
            vec![Ticket {
                id: "A".into(),
                technician: "Мади".into(),
                city: "Алматы".into(),
                created_at: Some(dt("2024-03-02 10:00:00")),
                equipment: vec![EquipmentItem {
                    equipment_type: "ТСД".into(),
                    status: RepairStatus::Done,
                    repair_cost: "1500".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }]
        } else {
            Vec::new()
        };
        let config = ReportConfig::new(DateRange::new(
            dt("2024-03-01 00:00:00"),
            dt("2024-03-10 00:00:00"),
        ));
        compute_report(&tickets, &config)
    }

    #[test]
    fn test_generate_repair_report_xlsx_signature() {
        let result = generate_repair_report(&make_report(true));
        assert!(result.is_ok(), "generate_repair_report failed: {:?}", result.err());
        let bytes = result.unwrap();
        // ZIP magic bytes PK
        assert_eq!(bytes[0], 0x50);
        assert_eq!(bytes[1], 0x4B);
    }

    #[test]
    fn test_generate_repair_report_empty() {
        let bytes = generate_repair_report(&make_report(false)).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
