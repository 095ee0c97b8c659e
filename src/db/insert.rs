use rusqlite::{Connection, Transaction};
use serde::Serialize;

use crate::analyzer::prices::PriceTable;
use crate::error::AppError;
use crate::parser::types::{DefectRepair, Ticket, WarrantyCard};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub tickets: usize,
    pub defect_repairs: usize,
    pub warranty_cards: usize,
    pub price_rows: usize,
}

/// Records to persist in one go; every part may be empty.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub tickets: Vec<Ticket>,
    pub defect_repairs: Vec<DefectRepair>,
    pub warranty_cards: Vec<WarrantyCard>,
    pub prices: Option<PriceTable>,
}

pub(crate) fn ts_column(ts: Option<chrono::NaiveDateTime>) -> Option<String> {
    ts.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn write_ticket(conn: &Connection, ticket: &Ticket) -> Result<(), AppError> {
    conn.prepare_cached(
        "INSERT INTO tickets (id, created_at, document, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
            created_at = excluded.created_at,
            document = excluded.document,
            updated_at = excluded.updated_at",
    )?
    .execute(rusqlite::params![
        ticket.id,
        ts_column(ticket.created_at),
        serde_json::to_string(ticket)?,
    ])?;
    Ok(())
}

fn write_defect_repair(conn: &Connection, record: &DefectRepair) -> Result<(), AppError> {
    conn.prepare_cached(
        "INSERT OR REPLACE INTO defect_repairs (id, date, document) VALUES (?1, ?2, ?3)",
    )?
    .execute(rusqlite::params![
        record.id,
        ts_column(record.date),
        serde_json::to_string(record)?,
    ])?;
    Ok(())
}

fn write_warranty_card(conn: &Connection, card: &WarrantyCard) -> Result<(), AppError> {
    conn.prepare_cached(
        "INSERT OR REPLACE INTO warranty_cards (id, issued_at, document) VALUES (?1, ?2, ?3)",
    )?
    .execute(rusqlite::params![
        card.id,
        ts_column(card.issued_at),
        serde_json::to_string(card)?,
    ])?;
    Ok(())
}

fn write_price_table(tx: &Transaction<'_>, table: &PriceTable) -> Result<usize, AppError> {
    tx.execute("DELETE FROM prices", [])?;
    let mut stmt = tx.prepare_cached(
        "INSERT INTO prices (equipment_type, model, prices) VALUES (?1, ?2, ?3)",
    )?;
    let mut rows = 0;
    for (equipment_type, models) in &table.0 {
        for (model, prices) in models {
            stmt.execute(rusqlite::params![
                equipment_type,
                model,
                serde_json::to_string(prices)?
            ])?;
            rows += 1;
        }
    }
    Ok(rows)
}

/// Saves a ticket, replacing any stored ticket with the same id.
pub fn upsert_ticket(conn: &Connection, ticket: &Ticket) -> Result<(), AppError> {
    write_ticket(conn, ticket)?;
    log::debug!("Saved ticket {}", ticket.id);
    Ok(())
}

pub fn delete_ticket(conn: &Connection, id: &str) -> Result<(), AppError> {
    let deleted = conn.execute("DELETE FROM tickets WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(AppError::TicketNotFound(id.to_string()));
    }
    log::info!("Deleted ticket {}", id);
    Ok(())
}

pub fn insert_defect_repair(conn: &Connection, record: &DefectRepair) -> Result<(), AppError> {
    write_defect_repair(conn, record)
}

pub fn insert_warranty_card(conn: &Connection, card: &WarrantyCard) -> Result<(), AppError> {
    write_warranty_card(conn, card)
}

/// Replaces the whole stored price table.
pub fn save_price_table(conn: &mut Connection, table: &PriceTable) -> Result<usize, AppError> {
    let tx = conn.transaction()?;
    let rows = write_price_table(&tx, table)?;
    tx.commit()?;
    Ok(rows)
}

/// Writes the batch in a single transaction: either everything lands or nothing does.
pub fn bulk_import(conn: &mut Connection, batch: &ImportBatch) -> Result<ImportCounts, AppError> {
    let tx = conn.transaction()?;

    for ticket in &batch.tickets {
        write_ticket(&tx, ticket)?;
    }
    for record in &batch.defect_repairs {
        write_defect_repair(&tx, record)?;
    }
    for card in &batch.warranty_cards {
        write_warranty_card(&tx, card)?;
    }
    let price_rows = match &batch.prices {
        Some(table) => write_price_table(&tx, table)?,
        None => 0,
    };

    tx.commit()?;

    let counts = ImportCounts {
        tickets: batch.tickets.len(),
        defect_repairs: batch.defect_repairs.len(),
        warranty_cards: batch.warranty_cards.len(),
        price_rows,
    };
    log::info!(
        "Imported {} tickets, {} defect repairs, {} warranty cards, {} price rows",
        counts.tickets,
        counts.defect_repairs,
        counts.warranty_cards,
        counts.price_rows
    );
    Ok(counts)
}
