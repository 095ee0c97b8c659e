pub mod defect_report;
pub mod repair_report;

use rust_xlsxwriter::{Format, FormatBorder, Worksheet, XlsxError};

/// Blue #2C5F8A header, white bold text, thin border.
pub fn create_header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color("2C5F8A")
        .set_font_color("FFFFFF")
        .set_font_size(11)
        .set_border(FormatBorder::Thin)
        .set_text_wrap()
}

pub fn create_date_format() -> Format {
    Format::new().set_num_format("dd/mm/yyyy")
}

/// Money, #,##0.00
pub fn create_number_format() -> Format {
    Format::new().set_num_format("#,##0.00")
}

pub fn create_integer_format() -> Format {
    Format::new().set_num_format("#,##0")
}

pub fn create_percent_format() -> Format {
    Format::new().set_num_format("0.0%")
}

/// Writes `headers` on row `row`, starting at column 0.
pub fn write_headers(
    ws: &mut Worksheet,
    row: u32,
    headers: &[&str],
    format: &Format,
) -> Result<(), XlsxError> {
    for (col, h) in headers.iter().enumerate() {
        ws.write_with_format(row, col as u16, *h, format)?;
    }
    Ok(())
}

/// Frozen header row plus autofilter over the data block; no-op without data rows.
pub fn finish_table(
    ws: &mut Worksheet,
    data_rows: usize,
    columns: usize,
) -> Result<(), XlsxError> {
    if data_rows == 0 || columns == 0 {
        return Ok(());
    }
    ws.set_freeze_panes(1, 0)?;
    ws.autofilter(0, 0, data_rows as u32, (columns - 1) as u16)?;
    Ok(())
}

/// Relative change, or None when there is no previous value to compare with.
pub fn relative_delta(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous)
    }
}
