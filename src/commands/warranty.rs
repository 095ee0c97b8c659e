use crate::analyzer::filter::{search_warranty_cards, WarrantySearch};
use crate::db::{insert, queries};
use crate::error::AppError;
use crate::parser::types::WarrantyCard;
use crate::state::{AppState, DbAccess};

pub fn search_warranty(
    state: &AppState,
    query: &str,
    by: WarrantySearch,
) -> Result<Vec<WarrantyCard>, AppError> {
    let cards = state.db(queries::load_warranty_cards)?;
    Ok(search_warranty_cards(&cards, query, by))
}

pub fn issue_warranty_card(state: &AppState, card: &WarrantyCard) -> Result<(), AppError> {
    if card.serials.is_empty() {
        return Err(AppError::Custom(format!(
            "Warranty card {} lists no serials",
            card.id
        )));
    }
    state.db(|conn| insert::insert_warranty_card(conn, card))?;
    log::info!("Issued warranty card {} for {}", card.id, card.phone);
    Ok(())
}
