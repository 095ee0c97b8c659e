pub mod analyzer;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod parser;
pub mod report;
pub mod state;

pub use error::AppError;
pub use report::{
    compute_defect_report, compute_defect_report_with_rate, compute_report, filter_tickets,
    RepairReport, ReportRow,
};

#[cfg(test)]
mod e2e_tests {
    use chrono::NaiveDateTime;

    use crate::analyzer::filter::{DateRange, FilterConfig, SortMode};
    use crate::analyzer::repairs::ReportConfig;
    use crate::commands::import::{import_files, ImportSources};
    use crate::commands::report::{export_repair_report, get_defect_report, get_repair_report};
    use crate::commands::tickets::{list_tickets, update_item, ItemUpdate};
    use crate::config::AppConfig;
    use crate::db::setup::init_db_in_memory;
    use crate::parser::pipeline::parse_tickets_reader;
    use crate::parser::types::{RepairStatus, UNSPECIFIED};
    use crate::state::AppState;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    const TICKETS: &str = r#"[
        {"id": "A", "clientName": "ТОО Альфа", "clientPhone": "+77010000001",
         "city": "Алматы", "technician": "Мади", "createdAt": "2024-03-02T10:00:00",
         "equipment": [
            {"type": "Моноблок", "name": "AT810", "serial": "M-100", "status": "Done",
             "repairCost": "1500", "repairDetails": "чистка"},
            {"type": "Прочее", "customType": "Весы", "serial": "W-7", "status": "Done",
             "repairCost": ""}
         ]},
        {"id": "B", "clientName": "ИП Бета", "phone": "+77010000002",
         "city": "Астана", "technician": "Ермахан", "date": "2024-03-05 15:30",
         "equipment": [
            {"type": "ТСД", "serial": "T-1", "status": "Ремонт"},
            {"type": "Принт чеков", "serial": "P-3", "status": "Done", "guarantee": "да",
             "price": "7000"}
         ]},
        {"id": "C", "city": "Алматы", "createdAt": "2024-02-25T09:00:00",
         "equipment": [{"type": "Сканер ШК", "serial": "S-5", "status": "Done", "price": "300"}]},
        {"clientName": "no id, dropped"}
    ]"#;

    fn import_json(state: &AppState, tickets: &str, defects: Option<&str>) {
        let dir = tempfile::tempdir().unwrap();
        let tickets_path = dir.path().join("tickets.json");
        std::fs::write(&tickets_path, tickets).unwrap();
        let defects_path = defects.map(|body| {
            let p = dir.path().join("defects.json");
            std::fs::write(&p, body).unwrap();
            p
        });
        import_files(
            state,
            &ImportSources {
                tickets: Some(tickets_path),
                defect_repairs: defects_path,
                ..Default::default()
            },
        )
        .unwrap();
    }

    fn march_1_to_10() -> ReportConfig {
        ReportConfig::new(DateRange::new(
            dt("2024-03-01 00:00:00"),
            dt("2024-03-10 00:00:00"),
        ))
    }

    /// Import, then report: paid sum ignores the warranty cost and counts the blank cost as paid.
    #[test]
    fn test_import_then_report() {
        let state = AppState::new(init_db_in_memory().unwrap());
        import_json(&state, TICKETS, None);

        let report = get_repair_report(&state, &march_1_to_10()).unwrap();
        assert_eq!(report.current.total, 3);
        assert_eq!(report.current.warranty_count, 1);
        assert_eq!(report.current.paid_count, 2);
        assert!((report.current.paid_sum - 1500.0).abs() < 1e-9);

        assert_eq!(report.previous.total, 1);
        assert_eq!(report.previous_period.start, dt("2024-02-21 00:00:00"));

        let by_tech: usize = report.by_technician.iter().map(|t| t.total).sum();
        assert_eq!(by_tech, report.current.total);

        let types: Vec<&str> = report.rows.iter().map(|r| r.equipment_type.as_str()).collect();
        assert_eq!(types, vec!["Моноблок", "Весы", "Принт чеков"]);

        let dates: Vec<String> = report
            .daily_series
            .iter()
            .map(|p| p.date.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, vec!["2024-02-25", "2024-03-02", "2024-03-05"]);
    }

    #[test]
    fn test_filter_and_status_lifecycle() {
        let state = AppState::new(init_db_in_memory().unwrap());
        import_json(&state, TICKETS, None);

        let almaty = list_tickets(
            &state,
            &FilterConfig {
                city: Some("Алматы".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let ids: Vec<&str> = almaty.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);

        let urgent = list_tickets(
            &state,
            &FilterConfig {
                sort: SortMode::Urgency,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(urgent[0].id, "B");

        update_item(
            &state,
            "B",
            0,
            ItemUpdate::Complete {
                warranty: false,
                repair_details: "замена АКБ".into(),
                repair_cost: "4 000,50".into(),
            },
        )
        .unwrap();

        let in_repair = list_tickets(
            &state,
            &FilterConfig {
                status: Some(RepairStatus::InRepair),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(in_repair.is_empty());

        let report = get_repair_report(&state, &march_1_to_10()).unwrap();
        assert_eq!(report.current.total, 4);
        assert!((report.current.paid_sum - 5500.5).abs() < 1e-9);
    }

    #[test]
    fn test_defect_bonus_end_to_end() {
        let state = AppState::new(init_db_in_memory().unwrap());
        let defects = r#"{
            "d1": {"type": "Моноблок", "model": "AT810 i3", "serial": "M-1",
                   "partUsed": "Матрица", "technician": "Мади", "date": "2024-03-05",
                   "retailPrice": 1000},
            "d2": {"type": "ТСД", "serial": "T-9", "partUsed": "",
                   "technician": "", "date": "2024-03-06"}
        }"#;
        import_json(&state, "[]", Some(defects));

        let range = DateRange::new(dt("2024-03-01 00:00:00"), dt("2024-03-31 23:59:59"));
        let report = get_defect_report(&state, &range).unwrap();
        assert_eq!(report.total_count, 2);
        assert!((report.bonus_by_technician["Мади"] - 40.0).abs() < 1e-9);
        assert_eq!(report.by_technician[UNSPECIFIED], 1);
        assert_eq!(report.parts_usage[UNSPECIFIED], 1);
        assert!((report.total_bonus - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_export_to_file() {
        let state = AppState::new(init_db_in_memory().unwrap());
        import_json(&state, TICKETS, None);

        let bytes = export_repair_report(&state, &march_1_to_10()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        std::fs::write(&path, &bytes).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(&written[..2], b"PK");
    }

    #[test]
    fn test_report_json_shape() {
        let import = parse_tickets_reader(TICKETS.as_bytes(), &AppConfig::default()).unwrap();
        let report = crate::compute_report(&import.output.records, &march_1_to_10());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["current"]["paidSum"].is_number());
        assert!(json["previousPeriod"]["end"].is_string());
        assert_eq!(json["rows"][0]["type"], "Моноблок");
        assert_eq!(json["byTechnician"][0]["technician"], "Ермахан");
    }
}
