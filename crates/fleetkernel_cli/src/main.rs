//! Headless rental host.
//!
//! # Responsibility
//! - Load host configuration and initialize logging.
//! - Open the fleet store, bootstrap the core and discover built-in plugins.
//! - Trigger one menu action and print the resulting UI state as JSON.
//!
//! # Invariants
//! - A bootstrapped core is always shut down, so the worker thread is joined
//!   on error paths too.

use clap::{Parser, Subcommand};
use fleetkernel_core::db::{open_db, open_db_in_memory};
use fleetkernel_core::repo::vehicle_repo::{VehicleListQuery, VehicleRepository};
use fleetkernel_core::{
    init_logging, ActionRequest, Core, HeadlessUi, HostConfig, KernelError, SqliteFleetStore,
    TaskWorker, VehicleDraft,
};
use fleetkernel_plugins::builtin_catalog;
use log::{info, warn};
use serde_json::{json, Value};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "fleetkernel")]
#[command(about = "Headless host for the vehicle rental microkernel", version)]
struct Args {
    /// JSON host configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database file; overrides `database_path` from the config
    #[arg(long)]
    database: Option<PathBuf>,

    /// Insert a small demo fleet when the store is empty
    #[arg(long)]
    seed_demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover plugins and print their descriptors
    Plugins,
    /// Discover plugins and print the contributed menus
    Menu,
    /// Print the vehicles in the store
    Vehicles,
    /// Trigger a menu action and print the resulting UI state
    Run {
        /// Menu group, e.g. `Rentals`
        group: String,
        /// Menu item label, e.g. `Confirm rental`
        label: String,
        /// Request field as `key=value`; repeatable
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// How long to wait for the action to finish
        #[arg(long, default_value_t = 10_000)]
        wait_ms: u64,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("field name is empty in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = match &config.database_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteFleetStore::new(conn, config.report_catalog())?;
    if args.seed_demo {
        seed_demo_fleet(&store)?;
    }

    let core = Core::instance();
    let output = match args.command {
        Command::Vehicles => {
            let vehicles = store.vehicles().list_vehicles(&VehicleListQuery::default())?;
            serde_json::to_value(vehicles)?
        }
        Command::Plugins => with_core(core, store, &config, |core| {
            Ok(serde_json::to_value(core.plugins())?)
        })?,
        Command::Menu => with_core(core, store, &config, |core| {
            Ok(serde_json::to_value(core.ui_controller()?.snapshot().menus)?)
        })?,
        Command::Run {
            group,
            label,
            fields,
            wait_ms,
        } => with_core(core, store, &config, |core| {
            run_action(core, &group, &label, fields, Duration::from_millis(wait_ms))
        })?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Bootstraps `core` around `store`, discovers the built-in plugins and runs
/// `body`. The core is shut down whether or not `body` succeeds.
fn with_core<T>(
    core: &Core,
    store: SqliteFleetStore,
    config: &HostConfig,
    body: impl FnOnce(&Core) -> CliResult<T>,
) -> CliResult<T> {
    core.bootstrap_with(
        Box::new(HeadlessUi::new()),
        TaskWorker::spawn(Box::new(store))?,
        config.dispatch_settings(),
    )?;
    let result = discover_builtins(core, config).and_then(|()| body(core));
    core.shutdown();
    result
}

fn discover_builtins(core: &Core, config: &HostConfig) -> CliResult<()> {
    let summary = core.discover_with(&builtin_catalog()?, &config.discovery_options())?;
    for failure in &summary.failed {
        warn!("event=host_discovery module=cli status=error reason={failure}");
    }
    Ok(())
}

fn run_action(
    core: &Core,
    group: &str,
    label: &str,
    fields: Vec<(String, String)>,
    wait: Duration,
) -> CliResult<Value> {
    let request: ActionRequest = fields.into_iter().collect();
    let job = core.trigger_menu(group, label, &request)?;
    info!(
        "event=host_run module=cli status=start group={group} label={label} job_id={}",
        job.id()
    );
    let pumped = core.wait_for_idle(wait)?;
    if core.has_pending() {
        core.cancel_job(job.id());
        return Err(Box::new(KernelError::TimedOut {
            elapsed_ms: wait.as_millis(),
        }));
    }
    let snapshot = core.ui_controller()?.snapshot();
    Ok(json!({
        "job_id": job.id(),
        "applied": pumped.applied,
        "failed": pumped.failed,
        "content": snapshot.content,
        "tabs": snapshot.tabs,
        "notifications": snapshot.notifications,
    }))
}

fn seed_demo_fleet(store: &SqliteFleetStore) -> CliResult<()> {
    let vehicles = store.vehicles();
    if !vehicles.list_vehicles(&VehicleListQuery::default())?.is_empty() {
        return Ok(());
    }
    for (make, model, year, fuel, vehicle_type) in [
        ("Fiat", "Mobi", 2021, "gasoline", "economy"),
        ("Chevrolet", "Onix", 2022, "flex", "compact"),
        ("Toyota", "Corolla Cross", 2023, "hybrid", "suv"),
        ("Jeep", "Compass", 2022, "diesel", "suv"),
        ("BYD", "Seal", 2024, "electric", "luxury"),
        ("Volkswagen", "Gol", 2020, "flex", "economy"),
    ] {
        vehicles.create_vehicle(&VehicleDraft::new(make, model, year, fuel, vehicle_type))?;
    }
    info!("event=demo_seed module=cli status=ok vehicles=6");
    Ok(())
}
