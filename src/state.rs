use rusqlite::Connection;
use std::sync::Mutex;

use crate::error::AppError;

pub struct AppState {
    pub db: Mutex<Option<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            db: Mutex::new(Some(conn)),
        }
    }
}

/// Closure access to the shared connection; the lock is held for the closure's duration.
pub trait DbAccess {
    fn db<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, AppError>;

    fn db_mut<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError>;
}

impl DbAccess for AppState {
    fn db<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, AppError>,
    {
        let guard = self
            .db
            .lock()
            .map_err(|e| AppError::Custom(format!("Mutex poisoned: {}", e)))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| AppError::Custom("Store not initialized".to_string()))?;
        f(conn)
    }

    fn db_mut<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError>,
    {
        let mut guard = self
            .db
            .lock()
            .map_err(|e| AppError::Custom(format!("Mutex poisoned: {}", e)))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| AppError::Custom("Store not initialized".to_string()))?;
        f(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup::init_db_in_memory;

    #[test]
    fn test_uninitialized_store_errors() {
        let state = AppState { db: Mutex::new(None) };
        let result = state.db(|_| Ok(()));
        assert!(matches!(result, Err(AppError::Custom(msg)) if msg.contains("not initialized")));
    }

    #[test]
    fn test_db_runs_closure() {
        let state = AppState::new(init_db_in_memory().unwrap());
        let version: u32 = state
            .db(|conn| Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?))
            .unwrap();
        assert_eq!(version, 1);
    }
}
