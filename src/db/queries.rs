use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::analyzer::prices::PriceTable;
use crate::error::AppError;
use crate::parser::pipeline::{
    normalize_defect_repair, normalize_ticket, normalize_warranty_card, parse_documents,
};
use crate::parser::types::{DefectRepair, Ticket, TicketRaw, WarrantyCard};

/// Reads the `document` column of every row of `sql` and normalizes each one.
/// Rows whose JSON no longer parses are skipped with a warning.
fn load_documents<Raw, T>(
    conn: &Connection,
    sql: &str,
    what: &str,
    normalize: impl Fn(&Raw) -> Result<T, String>,
) -> Result<Vec<T>, AppError>
where
    Raw: DeserializeOwned,
{
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut docs = Vec::new();
    for row in rows {
        let text = row?;
        match serde_json::from_str::<Value>(&text) {
            Ok(doc) => docs.push(doc),
            Err(e) => log::warn!("Unreadable stored {} document: {}", what, e),
        }
    }

    let output = parse_documents(docs, normalize);
    if output.skipped > 0 {
        log::warn!("Skipped {} stored {} documents", output.skipped, what);
    }
    Ok(output.records)
}

/// Every stored ticket, newest first.
pub fn load_tickets(conn: &Connection) -> Result<Vec<Ticket>, AppError> {
    load_documents(
        conn,
        "SELECT document FROM tickets ORDER BY created_at DESC, id",
        "ticket",
        normalize_ticket,
    )
}

pub fn get_ticket(conn: &Connection, id: &str) -> Result<Ticket, AppError> {
    let document: Option<String> = conn
        .query_row("SELECT document FROM tickets WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    let document = document.ok_or_else(|| AppError::TicketNotFound(id.to_string()))?;
    let raw: TicketRaw = serde_json::from_str(&document)?;
    normalize_ticket(&raw).map_err(AppError::Custom)
}

pub fn load_defect_repairs(conn: &Connection) -> Result<Vec<DefectRepair>, AppError> {
    load_documents(
        conn,
        "SELECT document FROM defect_repairs ORDER BY date DESC, id",
        "defect repair",
        normalize_defect_repair,
    )
}

pub fn load_warranty_cards(conn: &Connection) -> Result<Vec<WarrantyCard>, AppError> {
    load_documents(
        conn,
        "SELECT document FROM warranty_cards ORDER BY issued_at DESC, id",
        "warranty card",
        normalize_warranty_card,
    )
}

pub fn load_price_table(conn: &Connection) -> Result<PriceTable, AppError> {
    let mut stmt = conn.prepare_cached("SELECT equipment_type, model, prices FROM prices")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut table = PriceTable::default();
    for row in rows {
        let (equipment_type, model, prices) = row?;
        match serde_json::from_str::<Vec<f64>>(&prices) {
            Ok(prices) => {
                table
                    .0
                    .entry(equipment_type)
                    .or_default()
                    .insert(model, prices);
            }
            Err(e) => log::warn!("Bad price list for {} / {}: {}", equipment_type, model, e),
        }
    }
    Ok(table)
}
