//! `droneloop` – command line entry point.
//!
//! 1. Loads (and refreshes) `droneloop.toml` from the data directory.
//! 2. Connects to the drone bridge, or a simulator with `--simulate`.
//! 3. Applies the startup flight settings.
//! 4. Hands control to the [`ConversationDriver`], which runs until the
//!    operator closes input or a fatal error occurs.

mod config;
mod console;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use droneloop_hal::{Drone, HttpDrone, SimDrone};
use droneloop_runtime::telemetry;
use droneloop_runtime::{
    ConversationDriver, DEFAULT_INSTRUCTIONS, DeviceExecutor, DriverConfig, ResponsesClient,
    SnapshotBuilder, StaticWeather, WeatherSource, WeatherStationClient,
};
use droneloop_types::DroneError;
use tracing::{info, warn};

use crate::console::TerminalConsole;

/// LLM pilot for a remotely controlled drone.  Every proposed command waits
/// for operator approval.
#[derive(Parser, Debug)]
#[command(name = "droneloop")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding droneloop.toml (default: $DRONELOOP_DATA_DIR or ~/.droneloop)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Fly a simulated drone with canned weather instead of the configured bridge
    #[arg(long)]
    simulate: bool,

    /// Reject tool payloads with fields outside the schema (default)
    #[arg(long, overrides_with = "no_strict_tools")]
    strict_tools: bool,

    /// Drop unknown tool payload fields instead of rejecting the call
    #[arg(long, overrides_with = "strict_tools")]
    no_strict_tools: bool,
}

const SIMULATED_WEATHER: &str = "Time Observed (UTC): simulated\n\
Wind Direction: 0\n\
Wind Speed (MPH): 0\n\
Wind Gust (MPH): 0\n\
Humidity: 50\n\
Precipitation Rate: 0\n\
Precipitation Total: 0";

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Drone(#[from] DroneError),
}

fn main() -> ExitCode {
    let args = Args::parse();
    // Tracing goes up before the runtime exists; see `telemetry`.
    let _guard = telemetry::init_tracing("droneloop");

    print_banner();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: failed to start async runtime: {e}", "Error".red().bold());
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}: {e}", "Error".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    // ── Configuration ─────────────────────────────────────────────────────
    let data_dir = args.data_dir.clone().unwrap_or_else(config::default_data_dir);
    let path = config::config_path_for(&data_dir);
    let cfg = config::load_and_refresh(&path)?;
    println!("  Config loaded from {}", path.display().to_string().bold());
    info!(config = ?cfg, "configuration loaded");

    if cfg.keys.openai_api_key.is_empty() {
        warn!("no OpenAI API key configured; set OPENAI_API_KEY or keys.openai_api_key");
    }

    // ── Drone and weather ─────────────────────────────────────────────────
    let (drone, weather): (Arc<dyn Drone>, Arc<dyn WeatherSource>) = if args.simulate {
        println!("  Drone: {}", "simulator".yellow());
        (
            Arc::new(SimDrone::new()),
            Arc::new(StaticWeather(SIMULATED_WEATHER.to_string())),
        )
    } else {
        println!("  Drone: {}", cfg.drone.endpoint.bold());
        (
            Arc::new(HttpDrone::new(cfg.drone.endpoint.as_str())),
            Arc::new(WeatherStationClient::new(
                cfg.keys.weather_api_key.as_str(),
                cfg.weather.station_id.as_str(),
            )),
        )
    };

    // ── Startup flight settings ───────────────────────────────────────────
    drone
        .set_landing_protection(cfg.drone.landing_protection)
        .await?;
    drone.set_max_speed(cfg.drone.max_speed).await?;
    println!(
        "  {} landing protection {}, max speed {} m/s",
        "✓".green().bold(),
        if cfg.drone.landing_protection { "on" } else { "off" },
        cfg.drone.max_speed
    );

    // ── Driver ────────────────────────────────────────────────────────────
    let strict_tools = args.strict_tools || !args.no_strict_tools;
    let driver_config = DriverConfig {
        instructions: cfg
            .model
            .instructions
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        max_move_distance_m: cfg.drone.max_move_distance_m,
        strict_tools,
    };
    let completion = Arc::new(ResponsesClient::new(
        cfg.model.api_base_url.as_str(),
        cfg.model.name.as_str(),
        cfg.keys.openai_api_key.as_str(),
    ));
    let snapshots = SnapshotBuilder::new(drone.clone(), weather.clone())
        .with_settle_delay(Duration::from_millis(cfg.drone.settle_delay_ms));
    let executor = Arc::new(DeviceExecutor::new(drone, weather));

    println!(
        "  Model: {}  tools: {}\n",
        cfg.model.name.bold(),
        if strict_tools { "strict" } else { "lenient" }
    );
    drop(cfg);

    let mut driver = ConversationDriver::new(
        driver_config,
        completion,
        snapshots,
        executor,
        Box::new(TerminalConsole::stdin()),
    );

    match driver.run().await {
        Err(DroneError::OperatorInputClosed) => {
            println!("\n  {}", "Operator input closed. Exiting.".dimmed());
            Ok(())
        }
        other => other.map_err(AppError::from),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"      __                      __                "#.bold().cyan());
    println!("{}", r#"  ___/ /______  ___  ___ ___ / /__  ___  ___    "#.bold().cyan());
    println!("{}", r#" / _  / __/ _ \/ _ \/ -_)___/ / _ \/ _ \/ _ \   "#.bold().cyan());
    println!("{}", r#" \_,_/_/  \___/_//_/\__/   /_/\___/\___/ .__/   "#.bold().cyan());
    println!("{}", r#"                                      /_/       "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "droneloop".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Human-approved LLM drone pilot");
    println!();
}
