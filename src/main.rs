use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use repair_desk::analyzer::filter::{DefectFilterConfig, FilterConfig, SortMode, WarrantySearch};
use repair_desk::analyzer::repairs::ReportConfig;
use repair_desk::commands::{self, import::ImportSources, tickets::ItemUpdate};
use repair_desk::db::setup::init_db;
use repair_desk::error::AppError;
use repair_desk::parser::types::RepairStatus;
use repair_desk::state::AppState;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Newest,
    Oldest,
    Urgency,
}

impl From<SortArg> for SortMode {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Newest => SortMode::CreatedDesc,
            SortArg::Oldest => SortMode::CreatedAsc,
            SortArg::Urgency => SortMode::Urgency,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SearchBy {
    Serial,
    Phone,
}

impl From<SearchBy> for WarrantySearch {
    fn from(s: SearchBy) -> Self {
        match s {
            SearchBy::Serial => WarrantySearch::Serial,
            SearchBy::Phone => WarrantySearch::Phone,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "repair-desk",
    version,
    about = "Repair-shop ticket store and reporting",
    after_long_help = "Examples:\n  repair-desk import --tickets tickets.json --prices prices.json\n  repair-desk tickets --city Алматы --sort urgency\n  repair-desk report --from 2024-03-01 --to 2024-03-31 --xlsx march.xlsx\n  repair-desk defects --from 2024-03-01 --to 2024-03-31"
)]
struct Cli {
    /// SQLite store path
    #[arg(long, env = "REPAIR_DESK_DB", default_value = "repair_desk.db")]
    db: PathBuf,
    /// -v info, -vv debug, -vvv trace; RUST_LOG applies otherwise
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load JSON files into the store
    Import {
        #[arg(long)]
        tickets: Option<PathBuf>,
        #[arg(long)]
        defects: Option<PathBuf>,
        #[arg(long)]
        warranty: Option<PathBuf>,
        #[arg(long)]
        prices: Option<PathBuf>,
    },
    /// Filter and list tickets
    Tickets {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        technician: Option<String>,
        #[arg(long = "type")]
        equipment_type: Option<String>,
        #[arg(long)]
        status: Option<RepairStatus>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        serial: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long, value_enum, default_value = "newest")]
        sort: SortArg,
    },
    /// Show one ticket
    Show { id: String },
    /// Repair report for a period, compared with the period before it
    Report {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        technician: Option<String>,
        #[arg(long = "type")]
        types: Vec<String>,
        #[arg(long)]
        warranty_only: bool,
        /// Also write the workbook here
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
    /// Defect-repair statistics and bonuses
    Defects {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Print the matching records instead of statistics
        #[arg(long)]
        list: bool,
        #[arg(long)]
        technician: Option<String>,
        #[arg(long = "type")]
        equipment_type: Option<String>,
        #[arg(long)]
        serial: Option<String>,
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
    /// Change the status of an item, or complete it
    UpdateItem {
        ticket: String,
        index: usize,
        #[arg(long, conflicts_with = "done")]
        status: Option<RepairStatus>,
        #[arg(long)]
        done: bool,
        #[arg(long, requires = "done")]
        warranty: bool,
        #[arg(long, requires = "done")]
        cost: Option<String>,
        #[arg(long, requires = "done")]
        details: Option<String>,
    },
    /// Delete a ticket
    Delete { id: String },
    /// Price table
    Prices {
        #[command(subcommand)]
        action: PriceAction,
    },
    /// Search issued warranty cards
    Warranty {
        query: String,
        #[arg(long, value_enum, default_value = "serial")]
        by: SearchBy,
    },
    /// Show the configuration, optionally changing the bonus rate
    Config {
        #[arg(long)]
        bonus_rate: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
enum PriceAction {
    List,
    Set {
        #[arg(long = "type")]
        equipment_type: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        price: f64,
    },
    Remove {
        #[arg(long = "type")]
        equipment_type: String,
        #[arg(long)]
        model: String,
    },
}

fn init_logger(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    fs::write(path, bytes)?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let db_path = cli
        .db
        .to_str()
        .ok_or_else(|| AppError::Custom(format!("Invalid store path: {}", cli.db.display())))?;
    let state = AppState::new(init_db(db_path)?);

    match cli.command {
        Command::Import {
            tickets,
            defects,
            warranty,
            prices,
        } => {
            let sources = ImportSources {
                tickets,
                defect_repairs: defects,
                warranty_cards: warranty,
                prices,
            };
            print_json(&commands::import::import_files(&state, &sources)?)
        }
        Command::Tickets {
            city,
            technician,
            equipment_type,
            status,
            phone,
            serial,
            from,
            to,
            sort,
        } => {
            let date_range = if from.is_some() || to.is_some() {
                Some(commands::parse_range(from.as_deref(), to.as_deref(), commands::utc_now())?)
            } else {
                None
            };
            let filters = FilterConfig {
                city,
                technician,
                equipment_type,
                status,
                client_phone: phone,
                serial,
                date_range,
                sort: sort.into(),
            };
            print_json(&commands::tickets::list_tickets(&state, &filters)?)
        }
        Command::Show { id } => print_json(&commands::tickets::get_ticket(&state, &id)?),
        Command::Report {
            from,
            to,
            city,
            technician,
            types,
            warranty_only,
            xlsx,
        } => {
            let mut config =
                ReportConfig::new(commands::parse_range(from.as_deref(), to.as_deref(), commands::utc_now())?);
            config.city = city;
            config.technician = technician;
            config.equipment_types = types;
            config.warranty_only = warranty_only;

            let report = commands::report::get_repair_report(&state, &config)?;
            if let Some(path) = xlsx {
                let bytes = repair_desk::export::repair_report::generate_repair_report(&report)?;
                write_file(&path, &bytes)?;
            }
            print_json(&report)
        }
        Command::Defects {
            from,
            to,
            list,
            technician,
            equipment_type,
            serial,
            xlsx,
        } => {
            let range = commands::parse_range(from.as_deref(), to.as_deref(), commands::utc_now())?;
            if list {
                let filters = DefectFilterConfig {
                    technician,
                    equipment_type,
                    serial,
                    date_range: Some(range),
                };
                return print_json(&commands::report::list_defect_repairs(&state, &filters)?);
            }
            let report = commands::report::get_defect_report(&state, &range)?;
            if let Some(path) = xlsx {
                let bytes =
                    repair_desk::export::defect_report::generate_defect_report(&report, &range)?;
                write_file(&path, &bytes)?;
            }
            print_json(&report)
        }
        Command::UpdateItem {
            ticket,
            index,
            status,
            done,
            warranty,
            cost,
            details,
        } => {
            let update = match (status, done) {
                (_, true) => ItemUpdate::Complete {
                    warranty,
                    repair_details: details.unwrap_or_default(),
                    repair_cost: cost.unwrap_or_default(),
                },
                (Some(status), false) => ItemUpdate::Status { status },
                (None, false) => {
                    return Err(AppError::Custom(
                        "Either --status or --done is required".to_string(),
                    ))
                }
            };
            print_json(&commands::tickets::update_item(&state, &ticket, index, update)?)
        }
        Command::Delete { id } => {
            commands::tickets::delete_ticket(&state, &id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        Command::Prices { action } => match action {
            PriceAction::List => print_json(&commands::prices::list_prices(&state)?),
            PriceAction::Set {
                equipment_type,
                model,
                price,
            } => {
                commands::prices::set_price(&state, &equipment_type, &model, price)?;
                print_json(&commands::prices::list_prices(&state)?)
            }
            PriceAction::Remove {
                equipment_type,
                model,
            } => {
                let removed = commands::prices::remove_price(&state, &equipment_type, &model)?;
                print_json(&serde_json::json!({ "removed": removed }))
            }
        },
        Command::Warranty { query, by } => {
            print_json(&commands::warranty::search_warranty(&state, &query, by.into())?)
        }
        Command::Config { bonus_rate } => {
            let mut config = commands::config::get_config(&state)?;
            if let Some(rate) = bonus_rate {
                if !(0.0..=1.0).contains(&rate) {
                    return Err(AppError::Custom(format!("Bonus rate out of range: {}", rate)));
                }
                config.bonus_rate = rate;
                commands::config::update_config(&state, &config)?;
            }
            print_json(&config)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
