use std::collections::BTreeMap;

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use crate::analyzer::defects::DefectReport;
use crate::analyzer::filter::DateRange;
use crate::error::AppError;
use crate::export::{
    create_date_format, create_header_format, create_integer_format, create_number_format,
    finish_table, write_headers,
};

/// Three-sheet defect workbook: Summary, Technicians, Breakdown.
pub fn generate_defect_report(report: &DefectReport, range: &DateRange) -> Result<Vec<u8>, AppError> {
    let mut wb = Workbook::new();
    write_summary(wb.add_worksheet(), report, range)?;
    write_technicians(wb.add_worksheet(), report)?;
    write_breakdown(wb.add_worksheet(), report)?;
    Ok(wb.save_to_buffer()?)
}

fn write_summary(ws: &mut Worksheet, report: &DefectReport, range: &DateRange) -> Result<(), XlsxError> {
    ws.set_name("Summary")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let num = create_number_format();
    let date = create_date_format();

    write_headers(ws, 0, &["Indicator", "Value"], &hdr)?;
    ws.write(1, 0, "From")?;
    ws.write_datetime_with_format(1, 1, &range.start, &date)?;
    ws.write(2, 0, "To")?;
    ws.write_datetime_with_format(2, 1, &range.end, &date)?;
    ws.write(3, 0, "Repairs")?;
    ws.write_with_format(3, 1, report.total_count as f64, &int)?;
    ws.write(4, 0, "Total bonus")?;
    ws.write_with_format(4, 1, report.total_bonus, &num)?;

    ws.set_column_width(0, 18)?;
    ws.set_column_width(1, 16)?;
    Ok(())
}

fn write_technicians(ws: &mut Worksheet, report: &DefectReport) -> Result<(), XlsxError> {
    ws.set_name("Technicians")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let num = create_number_format();

    let headers = ["Technician", "Repairs", "Bonus"];
    write_headers(ws, 0, &headers, &hdr)?;

    for (i, (tech, count)) in report.by_technician.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, tech.as_str())?;
        ws.write_with_format(row, 1, *count as f64, &int)?;
        let bonus = report.bonus_by_technician.get(tech).copied().unwrap_or(0.0);
        ws.write_with_format(row, 2, bonus, &num)?;
    }

    finish_table(ws, report.by_technician.len(), headers.len())?;
    ws.set_column_width(0, 22)?;
    ws.set_column_width(2, 14)?;
    Ok(())
}

fn write_counts(
    ws: &mut Worksheet,
    col: u16,
    counts: &BTreeMap<String, usize>,
) -> Result<(), XlsxError> {
    let int = create_integer_format();
    for (i, (label, count)) in counts.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, col, label.as_str())?;
        ws.write_with_format(row, col + 1, *count as f64, &int)?;
    }
    Ok(())
}

/// Types in columns A:B, parts in D:E.
fn write_breakdown(ws: &mut Worksheet, report: &DefectReport) -> Result<(), XlsxError> {
    ws.set_name("Breakdown")?;

    let hdr = create_header_format();
    ws.write_with_format(0, 0, "Type", &hdr)?;
    ws.write_with_format(0, 1, "Repairs", &hdr)?;
    ws.write_with_format(0, 3, "Part", &hdr)?;
    ws.write_with_format(0, 4, "Used", &hdr)?;

    write_counts(ws, 0, &report.by_type)?;
    write_counts(ws, 3, &report.parts_usage)?;

    ws.set_column_width(0, 20)?;
    ws.set_column_width(3, 24)?;
    Ok(())
}
