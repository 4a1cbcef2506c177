//! Drinkmaker — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  rppal GPIO IRQs / console ──▶ InputHandler ──▶ SharedMachine   │
//! │  Lcd1602 / SimDisplay (DisplayPort)   LogEventSink (EventSink) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Controller (poll loop)  ──▶  Dispenser (pour threads) │    │
//! │  │  FSM · recipes                  PumpBank               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use tracing_subscriber::filter::LevelFilter;

use drinkmaker::app::controller::run_machine;
use drinkmaker::app::shared::SharedMachine;
use drinkmaker::config::MachineConfig;
use drinkmaker::drivers::button::InputHandler;
use drinkmaker::error::InitError;
use drinkmaker::logging::{self, ErrorTarget};
use drinkmaker::recipes::{DRINKS, validate_table};

/// Mocktail dispenser: button menu, 16x2 LCD and five pumps.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Append warnings and errors to a log file instead of stderr
    #[arg(short = 'E', long)]
    error_log: bool,

    /// Log file used with --error-log
    #[arg(long, default_value = "error.log")]
    error_log_path: PathBuf,

    /// Log pump and display activity
    #[arg(short, long)]
    verbose: bool,

    /// JSON file overriding the machine configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Logging ────────────────────────────────────────────
    let target = if cli.error_log {
        ErrorTarget::File(cli.error_log_path.clone())
    } else {
        ErrorTarget::Stderr
    };
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    logging::init(&target, level)
        .with_context(|| format!("cannot log to {:?}", target))?;

    info!("Drinkmaker v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration, checked before any hardware ─────────
    let config =
        MachineConfig::load_or_default(cli.config.as_deref()).context("loading configuration")?;
    if let Err(e) = validate_table(&DRINKS, &config) {
        error!("{}", e);
        return Err(e).context("recipe table rejected");
    }

    // ── 3. Shared state and shutdown signal ───────────────────
    let machine = Arc::new(SharedMachine::new());
    {
        let machine = Arc::clone(&machine);
        ctrlc::set_handler(move || machine.request_shutdown())
            .map_err(|_| InitError::SignalHandler)?;
    }
    let input = Arc::new(InputHandler::new(config.debounce_us(), Arc::clone(&machine)));

    // ── 4. Hardware + run ─────────────────────────────────────
    run(&config, machine, &input)?;

    info!("Drinkmaker stopped");
    Ok(())
}

#[cfg(feature = "rpi")]
fn run(config: &MachineConfig, machine: Arc<SharedMachine>, input: &Arc<InputHandler>) -> Result<()> {
    use drinkmaker::adapters::rpi;

    let hw = rpi::init(input).inspect_err(|e| error!("{}", e))?;
    let rpi::RpiHardware {
        display,
        pumps,
        buttons,
    } = hw;

    let display = run_machine(config, machine, display, pumps)?;

    // Release the bus, then the button interrupts.
    drop(display.release());
    drop(buttons);
    Ok(())
}

#[cfg(not(feature = "rpi"))]
fn run(config: &MachineConfig, machine: Arc<SharedMachine>, input: &Arc<InputHandler>) -> Result<()> {
    use drinkmaker::adapters::console;
    use drinkmaker::drivers::sim::{SimDisplay, SimOutputPin};
    use drinkmaker::pins::PUMP_GPIOS;

    info!("No hardware back-end built in, running simulated");
    console::spawn(Arc::clone(input), Arc::clone(&machine)).context("starting console input")?;

    let pumps = PUMP_GPIOS.map(SimOutputPin::new);
    run_machine(config, machine, SimDisplay::new(), pumps)?;
    Ok(())
}
