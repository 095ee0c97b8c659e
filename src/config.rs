use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BONUS_RATE: f64 = 0.04;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub cities: Vec<String>,
    pub technicians: Vec<String>,
    pub equipment_types: Vec<String>,
    pub bonus_rate: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cities: vec!["Астана".into(), "Алматы".into()],
            technicians: vec!["Мади".into(), "Ермахан".into()],
            equipment_types: vec![
                "Моноблок".into(),
                "Принт чеков".into(),
                "Принт этикеток".into(),
                "Сканер ШК".into(),
                "ТСД".into(),
                "Прочее".into(),
            ],
            bonus_rate: DEFAULT_BONUS_RATE,
        }
    }
}

impl AppConfig {
    pub fn is_known_city(&self, city: &str) -> bool {
        self.cities.is_empty() || self.cities.iter().any(|c| c == city)
    }

    pub fn is_known_technician(&self, technician: &str) -> bool {
        self.technicians.is_empty() || self.technicians.iter().any(|t| t == technician)
    }

    /// Closed-set check on the base type; `customType` overrides are free text.
    pub fn is_known_equipment_type(&self, equipment_type: &str) -> bool {
        self.equipment_types.is_empty() || self.equipment_types.iter().any(|t| t == equipment_type)
    }
}

pub fn get_config_from_db(conn: &Connection) -> Result<AppConfig, rusqlite::Error> {
    let mut stmt = conn.prepare_cached("SELECT key, value FROM config")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut config = AppConfig::default();

    for row in rows {
        let (key, value) = row?;
        match key.as_str() {
            "cities" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    config.cities = v;
                }
            }
            "technicians" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    config.technicians = v;
                }
            }
            "equipment_types" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    config.equipment_types = v;
                }
            }
            "bonus_rate" => config.bonus_rate = value.parse().unwrap_or(DEFAULT_BONUS_RATE),
            _ => {}
        }
    }

    Ok(config)
}

pub fn update_config_in_db(conn: &Connection, config: &AppConfig) -> Result<(), rusqlite::Error> {
    let pairs: Vec<(&str, String)> = vec![
        (
            "cities",
            serde_json::to_string(&config.cities).unwrap_or_default(),
        ),
        (
            "technicians",
            serde_json::to_string(&config.technicians).unwrap_or_default(),
        ),
        (
            "equipment_types",
            serde_json::to_string(&config.equipment_types).unwrap_or_default(),
        ),
        ("bonus_rate", config.bonus_rate.to_string()),
    ];

    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO config (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
    )?;

    for (key, value) in pairs {
        stmt.execute(rusqlite::params![key, value])?;
    }

    Ok(())
}
