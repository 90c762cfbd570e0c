//! credit-sim: headless runner for the credit simulator.
//!
//! Usage:
//!   credit-sim --data-dir ./data seed
//!   credit-sim simulate --amount 1000.00 --term 12
//!   credit-sim history --page 1 --page-size 20
//!   credit-sim report --date 2025-07-30
//!   credit-sim --ipc-mode

use anyhow::{Context, Result};
use credit_sim_core::{
    config::{load_product_catalog, AppConfig},
    orchestrator::SimulationOrchestrator,
    service::{ServiceError, SimulationService},
    store::{SqliteProductCatalog, SqliteSimulationStore},
    types::SimulationRequest,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

type Service = SimulationService<SqliteProductCatalog, SqliteSimulationStore>;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Simulate {
        principal: Decimal,
        term_months: i64,
    },
    History {
        #[serde(default)]
        page: i64,
        #[serde(default)]
        page_size: i64,
    },
    Report {
        date: String,
    },
    Quit,
}

const COMMANDS: [&str; 4] = ["seed", "simulate", "history", "report"];

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let command = args.iter().skip(1).find(|a| COMMANDS.contains(&a.as_str()));

    let config = AppConfig::load(data_dir)?;
    log::info!(
        "credit-sim: catalog_db={} history_db={}",
        config.catalog_db,
        config.history_db
    );

    let catalog = SqliteProductCatalog::open(&config.catalog_db)
        .with_context(|| format!("opening catalog {}", config.catalog_db))?;

    if command.map(String::as_str) == Some("seed") {
        let path = catalog_seed_path(&config, data_dir);
        let products = load_product_catalog(&path)?;
        let written = catalog.seed(&products)?;
        println!("seeded {written} products from {path} into {}", config.catalog_db);
        return Ok(());
    }

    // An empty catalog (e.g. :memory:) is seeded from the reference file.
    if catalog.product_count()? == 0 {
        let path = catalog_seed_path(&config, data_dir);
        match load_product_catalog(&path) {
            Ok(products) => {
                catalog.seed(&products)?;
            }
            Err(e) => log::warn!("catalog is empty and could not be seeded: {e}"),
        }
    }

    let history = SqliteSimulationStore::open(&config.history_db)
        .with_context(|| format!("opening history {}", config.history_db))?;
    let service = SimulationService::new(SimulationOrchestrator::with_pagination(
        catalog,
        history,
        config.pagination,
    ));

    if ipc_mode {
        return run_ipc_loop(&service).await;
    }

    match command.map(String::as_str) {
        Some("simulate") => {
            let amount = arg_value(&args, "--amount").context("--amount is required")?;
            let principal = Decimal::from_str(amount)
                .with_context(|| format!("--amount '{amount}' is not a decimal"))?;
            let term = parse_arg(&args, "--term", 0i64);
            let request = SimulationRequest::new(principal, term);
            print_outcome(service.submit_simulation(&request).await)
        }
        Some("history") => {
            let page = parse_arg(&args, "--page", 1i64);
            let page_size = parse_arg(&args, "--page-size", 20i64);
            print_outcome(service.list_history(page, page_size).await)
        }
        Some("report") => {
            let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
            let date = arg_value(&args, "--date").unwrap_or(&today);
            print_outcome(service.daily_report(date).await)
        }
        _ => {
            println!("usage: credit-sim [--data-dir DIR] (seed | simulate --amount X --term N | history [--page N] [--page-size N] | report --date YYYY-MM-DD | --ipc-mode)");
            Ok(())
        }
    }
}

async fn run_ipc_loop(service: &Service) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({
                    "error": { "status": "bad_request", "message": e.to_string() }
                });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Simulate { principal, term_months } => {
                let request = SimulationRequest::new(principal, term_months);
                envelope(service.submit_simulation(&request).await)?
            }
            IpcCommand::History { page, page_size } => {
                envelope(service.list_history(page, page_size).await)?
            }
            IpcCommand::Report { date } => envelope(service.daily_report(&date).await)?,
        };
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    Ok(())
}

fn envelope<T: Serialize>(outcome: Result<T, ServiceError>) -> Result<serde_json::Value> {
    Ok(match outcome {
        Ok(value) => serde_json::json!({ "ok": value }),
        Err(err) => serde_json::json!({ "error": err }),
    })
}

fn print_outcome<T: Serialize>(outcome: Result<T, ServiceError>) -> Result<()> {
    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{:?}: {}", err.status, err.message);
            std::process::exit(match err.status {
                credit_sim_core::service::ServiceStatus::BadRequest => 2,
                credit_sim_core::service::ServiceStatus::NotFound => 3,
                credit_sim_core::service::ServiceStatus::ServerError => 1,
            });
        }
    }
}

fn catalog_seed_path(config: &AppConfig, data_dir: &str) -> String {
    config
        .catalog_seed
        .clone()
        .unwrap_or_else(|| format!("{data_dir}/products/product_catalog.json"))
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
