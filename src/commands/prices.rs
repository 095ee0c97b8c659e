use crate::analyzer::prices::{PriceRow, PriceTable};
use crate::db::{insert, queries};
use crate::error::AppError;
use crate::state::{AppState, DbAccess};

pub fn list_prices(state: &AppState) -> Result<Vec<PriceRow>, AppError> {
    Ok(state.db(queries::load_price_table)?.rows())
}

pub fn get_price_table(state: &AppState) -> Result<PriceTable, AppError> {
    state.db(queries::load_price_table)
}

pub fn set_price(
    state: &AppState,
    equipment_type: &str,
    model: &str,
    price: f64,
) -> Result<(), AppError> {
    if equipment_type.trim().is_empty() || model.trim().is_empty() {
        return Err(AppError::Custom("Type and model are required".to_string()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Custom(format!("Invalid price: {}", price)));
    }
    state.db_mut(|conn| {
        let mut table = queries::load_price_table(conn)?;
        table.set_price(equipment_type, model, price);
        insert::save_price_table(conn, &table)?;
        Ok(())
    })?;
    log::info!("Price of {} / {} set to {}", equipment_type, model, price);
    Ok(())
}

/// Returns false when the model was not in the table.
pub fn remove_price(state: &AppState, equipment_type: &str, model: &str) -> Result<bool, AppError> {
    state.db_mut(|conn| {
        let mut table = queries::load_price_table(conn)?;
        if !table.remove_model(equipment_type, model) {
            log::warn!("No price entry for {} / {}", equipment_type, model);
            return Ok(false);
        }
        insert::save_price_table(conn, &table)?;
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup::init_db_in_memory;

    #[test]
    fn test_set_list_remove() {
        let state = AppState::new(init_db_in_memory().unwrap());
        set_price(&state, "Принт чеков", "XP58", 18000.0).unwrap();
        set_price(&state, "Моноблок", "AT810", 120000.0).unwrap();
        set_price(&state, "Моноблок", "AT810", 125000.0).unwrap();

        let rows = list_prices(&state).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].equipment_type, "Моноблок");
        assert_eq!(rows[0].price, Some(125000.0));

        assert!(remove_price(&state, "Принт чеков", "XP58").unwrap());
        assert!(!remove_price(&state, "Принт чеков", "XP58").unwrap());
        assert!(!get_price_table(&state).unwrap().0.contains_key("Принт чеков"));
    }

    #[test]
    fn test_set_price_validation() {
        let state = AppState::new(init_db_in_memory().unwrap());
        assert!(set_price(&state, "", "X", 1.0).is_err());
        assert!(set_price(&state, "T", "X", -5.0).is_err());
        assert!(set_price(&state, "T", "X", f64::NAN).is_err());
        assert!(list_prices(&state).unwrap().is_empty());
    }
}
