//! # Wireline CLI
//!
//! Runs calc_core calculators from the terminal and prints JSON reports.
//!
//! ```text
//! calc_cli run --input job.json          # one CalculationItem or an array
//! calc_cli form motor horsepower=10 voltage=460 phase=3 device=td
//! calc_cli tables                        # row counts of the loaded tables
//! calc_cli settings                      # effective settings as TOML
//! ```
//!
//! Logs go to stderr (`RUST_LOG` or `-v`), JSON to stdout. The exit code is
//! 1 when any calculation reports an error and 2 when the command itself
//! fails.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use calc_core::calculations::{parse_form, CalculationItem, CalculationReport};
use calc_core::reference::{MemoryReferenceStore, ReferenceBundle, ReferenceLookup};
use calc_core::{CalcError, CalcResult, Engine, EngineSettings};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Wireline - electrical field calculations", long_about = None)]
struct Args {
    /// Engine settings file (TOML). Defaults apply when absent.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Reference tables file (TOML) to use instead of the bundled tables.
    #[arg(long, value_name = "FILE", global = true)]
    tables: Option<PathBuf>,
    /// More logging (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run calculations from a JSON document.
    Run {
        /// JSON file, or `-` for stdin.
        #[arg(long, short, default_value = "-")]
        input: String,
    },
    /// Run one calculator from text fields.
    Form {
        /// Calculator name, e.g. `voltage_drop`.
        calculator: String,
        /// Fields as `key=value`.
        #[arg(value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Show the loaded reference tables.
    Tables,
    /// Print the effective settings.
    Settings,
}

fn parse_field(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{value}`"))?;
    Ok((key.trim().to_string(), val.to_string()))
}

#[derive(Serialize)]
struct TablesReport {
    summary: calc_core::reference::TableSummary,
    coefficient_of_utilization: Vec<String>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn load_store(tables: Option<&Path>) -> CalcResult<MemoryReferenceStore> {
    match tables {
        None => MemoryReferenceStore::bundled(),
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| CalcError::serialization(format!("{}: {}", path.display(), e)))?;
            let bundle = ReferenceBundle::from_toml_str(&text)?;
            let mut store = MemoryReferenceStore::new();
            store.populate(&bundle)?;
            Ok(store)
        }
    }
}

fn read_input(input: &str) -> CalcResult<String> {
    let result = if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map(|_| text)
    } else {
        fs::read_to_string(input)
    };
    result.map_err(|e| CalcError::serialization(format!("{}: {}", input, e)))
}

/// One item or an array of items.
fn parse_items(text: &str) -> CalcResult<Vec<CalculationItem>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}

fn print_json<T: Serialize>(value: &T) -> CalcResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: Args) -> CalcResult<bool> {
    let settings = match &args.config {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::default(),
    };
    let store = load_store(args.tables.as_deref())?;
    let engine = Engine::new(ReferenceLookup::new(store), settings);

    match args.command {
        Command::Run { input } => {
            let items = parse_items(&read_input(&input)?)?;
            tracing::info!(count = items.len(), "running calculations");
            let mut reports: Vec<CalculationReport> = Vec::with_capacity(items.len());
            for item in &items {
                reports.push(engine.report(item).await);
            }
            let ok = reports.iter().all(CalculationReport::is_ok);
            if reports.len() == 1 {
                print_json(&reports[0])?;
            } else {
                print_json(&reports)?;
            }
            Ok(ok)
        }
        Command::Form { calculator, fields } => {
            let fields: BTreeMap<String, String> = fields.into_iter().collect();
            let report = match parse_form(&calculator, &fields) {
                Ok(item) => engine.report(&item).await,
                // A form that does not parse still gets a report.
                Err(e) => CalculationReport {
                    label: fields.get("label").cloned().unwrap_or_default(),
                    calc_type: calculator,
                    code_edition: engine.settings().code_edition.clone(),
                    output: None,
                    error: Some(e),
                },
            };
            print_json(&report)?;
            Ok(report.is_ok())
        }
        Command::Tables => {
            let store = engine.lookup().store();
            let report = TablesReport {
                summary: store.summary(),
                coefficient_of_utilization: store
                    .cu_selectors()
                    .into_iter()
                    .map(|(c, w, f)| format!("{}/{}/{}", c, w, f))
                    .collect(),
            };
            print_json(&report)?;
            Ok(true)
        }
        Command::Settings => {
            print!("{}", engine.settings().to_toml_string()?);
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
