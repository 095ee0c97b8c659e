use crate::config::{get_config_from_db, update_config_in_db, AppConfig};
use crate::error::AppError;
use crate::state::{AppState, DbAccess};

pub fn get_config(state: &AppState) -> Result<AppConfig, AppError> {
    state.db(|conn| Ok(get_config_from_db(conn)?))
}

pub fn update_config(state: &AppState, config: &AppConfig) -> Result<(), AppError> {
    state.db(|conn| Ok(update_config_in_db(conn, config)?))?;
    log::info!("Configuration updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup::init_db_in_memory;

    #[test]
    fn test_config_defaults_then_update() {
        let state = AppState::new(init_db_in_memory().unwrap());
        assert_eq!(get_config(&state).unwrap(), AppConfig::default());

        let mut config = AppConfig::default();
        config.bonus_rate = 0.05;
        config.cities.push("Шымкент".into());
        update_config(&state, &config).unwrap();
        assert_eq!(get_config(&state).unwrap(), config);
    }
}
