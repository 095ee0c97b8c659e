use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::analyzer::prices::PriceTable;
use crate::config::get_config_from_db;
use crate::db::insert::{bulk_import, ImportBatch, ImportCounts};
use crate::error::AppError;
use crate::parser::pipeline::{
    parse_defect_repairs_reader, parse_tickets_reader, parse_warranty_cards_reader,
};
use crate::parser::types::ParseWarning;
use crate::state::{AppState, DbAccess};

/// JSON files to load; any of them may be omitted.
#[derive(Debug, Clone, Default)]
pub struct ImportSources {
    pub tickets: Option<PathBuf>,
    pub defect_repairs: Option<PathBuf>,
    pub warranty_cards: Option<PathBuf>,
    pub prices: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub stored: ImportCounts,
    pub skipped: usize,
    pub outside_closed_sets: usize,
    pub unique_types: Vec<String>,
    pub warnings: Vec<SourceWarning>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceWarning {
    pub source: String,
    #[serde(flatten)]
    pub warning: ParseWarning,
}

fn open(path: &Path) -> Result<BufReader<File>, AppError> {
    log::info!("Reading {}", path.display());
    Ok(BufReader::new(File::open(path)?))
}

fn tag(source: &Path, warnings: Vec<ParseWarning>) -> impl Iterator<Item = SourceWarning> + '_ {
    warnings.into_iter().map(move |warning| SourceWarning {
        source: source.display().to_string(),
        warning,
    })
}

/// Parses every given file, then stores all records in one transaction. A file that is
/// not valid JSON fails the whole import before anything is written.
pub fn import_files(state: &AppState, sources: &ImportSources) -> Result<ImportResult, AppError> {
    let start = Instant::now();
    let config = state.db(|conn| Ok(get_config_from_db(conn)?))?;

    let mut batch = ImportBatch::default();
    let mut warnings = Vec::new();
    let mut skipped = 0;
    let mut outside_closed_sets = 0;
    let mut unique_types = Vec::new();

    if let Some(path) = &sources.tickets {
        let import = parse_tickets_reader(open(path)?, &config)?;
        skipped += import.output.skipped;
        outside_closed_sets = import.outside_closed_sets;
        unique_types = import.unique_types;
        warnings.extend(tag(path, import.output.warnings));
        batch.tickets = import.output.records;
    }
    if let Some(path) = &sources.defect_repairs {
        let output = parse_defect_repairs_reader(open(path)?)?;
        skipped += output.skipped;
        warnings.extend(tag(path, output.warnings));
        batch.defect_repairs = output.records;
    }
    if let Some(path) = &sources.warranty_cards {
        let output = parse_warranty_cards_reader(open(path)?)?;
        skipped += output.skipped;
        warnings.extend(tag(path, output.warnings));
        batch.warranty_cards = output.records;
    }
    if let Some(path) = &sources.prices {
        let table: PriceTable = serde_json::from_reader(open(path)?)?;
        batch.prices = Some(table);
    }

    let stored = state.db_mut(|conn| bulk_import(conn, &batch))?;

    Ok(ImportResult {
        stored,
        skipped,
        outside_closed_sets,
        unique_types,
        warnings,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::{load_defect_repairs, load_price_table, load_tickets};
    use crate::db::setup::init_db_in_memory;
    use std::io::Write;

    fn write_json(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    /// GIVEN a ticket file keyed by id with one document lacking data and one unknown city
    /// WHEN importing it together with defects and prices
    /// THEN records land in the store and the warnings are reported per file
    #[test]
    fn test_import_files() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = write_json(
            &dir,
            "tickets.json",
            r#"{
                "t1": {"city": "Алматы", "technician": "Мади", "date": "2024-03-02 10:00",
                       "equipment": [{"type": "ТСД", "status": "Готово", "price": "1 500"}]},
                "t2": {"city": "Караганда", "technician": "Мади", "createdAt": "2024-03-03T09:00:00"},
                "t3": "garbage"
            }"#,
        );
        let defects = write_json(
            &dir,
            "defects.json",
            r#"[{"id": "d1", "type": "Моноблок", "technician": "Ермахан",
                 "date": "2024-03-05", "retailPrice": "1000"}, {"type": "no id"}]"#,
        );
        let prices = write_json(&dir, "prices.json", r#"{"ТСД": {"Urovo DT40": [90000]}}"#);

        let state = AppState::new(init_db_in_memory().unwrap());
        let result = import_files(
            &state,
            &ImportSources {
                tickets: Some(tickets),
                defect_repairs: Some(defects),
                prices: Some(prices),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(result.stored.tickets, 2);
        assert_eq!(result.stored.defect_repairs, 1);
        assert_eq!(result.stored.price_rows, 1);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.outside_closed_sets, 1);
        assert_eq!(result.unique_types, vec!["ТСД"]);
        assert!(result.warnings.iter().any(|w| w.source.ends_with("defects.json")));

        let stored = state.db(load_tickets).unwrap();
        let t1 = stored.iter().find(|t| t.id == "t1").unwrap();
        assert!(t1.equipment[0].is_done());
        assert_eq!(t1.equipment[0].effective_cost(), 1500.0);

        let defects = state.db(load_defect_repairs).unwrap();
        assert_eq!(defects[0].retail_price, Some(1000.0));
        assert_eq!(state.db(load_price_table).unwrap().price("ТСД", "Urovo DT40"), Some(90000.0));
    }

    #[test]
    fn test_invalid_json_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let tickets = write_json(&dir, "tickets.json", r#"[{"id": "t1"}]"#);
        let broken = write_json(&dir, "defects.json", "{not json");

        let state = AppState::new(init_db_in_memory().unwrap());
        let result = import_files(
            &state,
            &ImportSources {
                tickets: Some(tickets),
                defect_repairs: Some(broken),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::Serde(_))));
        assert!(state.db(load_tickets).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let state = AppState::new(init_db_in_memory().unwrap());
        let result = import_files(
            &state,
            &ImportSources {
                tickets: Some(PathBuf::from("/nonexistent/tickets.json")),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
