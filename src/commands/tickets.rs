use serde::Deserialize;

use crate::analyzer::filter::FilterConfig;
use crate::db::{insert, queries};
use crate::error::AppError;
use crate::parser::types::{RepairOutcome, RepairStatus, Ticket};
use crate::report;
use crate::state::{AppState, DbAccess};

/// Change applied to one equipment item of a stored ticket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ItemUpdate {
    Status { status: RepairStatus },
    #[serde(rename_all = "camelCase")]
    Complete {
        warranty: bool,
        #[serde(default)]
        repair_details: String,
        #[serde(default)]
        repair_cost: String,
    },
}

pub fn list_tickets(state: &AppState, filters: &FilterConfig) -> Result<Vec<Ticket>, AppError> {
    let tickets = state.db(queries::load_tickets)?;
    let result = report::filter_tickets(&tickets, filters);
    log::debug!("{} of {} tickets match", result.len(), tickets.len());
    Ok(result)
}

pub fn get_ticket(state: &AppState, id: &str) -> Result<Ticket, AppError> {
    state.db(|conn| queries::get_ticket(conn, id))
}

pub fn save_ticket(state: &AppState, ticket: &Ticket) -> Result<(), AppError> {
    if ticket.id.trim().is_empty() {
        return Err(AppError::Custom("Ticket id must not be empty".to_string()));
    }
    state.db(|conn| insert::upsert_ticket(conn, ticket))
}

pub fn delete_ticket(state: &AppState, id: &str) -> Result<(), AppError> {
    state.db(|conn| insert::delete_ticket(conn, id))
}

/// Applies `update` to item `index` of ticket `id` and stores the ticket. Returns the saved ticket.
pub fn update_item(
    state: &AppState,
    id: &str,
    index: usize,
    update: ItemUpdate,
) -> Result<Ticket, AppError> {
    state.db_mut(|conn| {
        let tx = conn.transaction()?;
        let mut ticket = queries::get_ticket(&tx, id)?;
        let item = ticket
            .equipment
            .get_mut(index)
            .ok_or_else(|| AppError::ItemNotFound {
                ticket: id.to_string(),
                index,
            })?;

        match update {
            ItemUpdate::Status { status } => item.set_status(status),
            ItemUpdate::Complete {
                warranty,
                repair_details,
                repair_cost,
            } => item.complete(RepairOutcome {
                warranty,
                repair_details,
                repair_cost,
            }),
        }
        log::info!(
            "Ticket {} item #{} is now {}",
            id,
            index,
            ticket.equipment[index].status
        );

        insert::upsert_ticket(&tx, &ticket)?;
        tx.commit()?;
        Ok(ticket)
    })
}
