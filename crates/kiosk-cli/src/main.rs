//! # kiosk CLI entry point
//!
//! Parses command-line arguments, initialises logging, and dispatches to the
//! subcommand handlers on a tokio runtime.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kiosk_cli::status::{run_ping, run_status, StatusArgs};
use kiosk_cli::transaction::{run_deposit, run_withdraw, DepositArgs, WithdrawArgs};

/// Parcel-locker kiosk driver.
///
/// Talks to the locker backend exactly as the touchscreen does: status
/// polling, door-closure detection, and automatic return home.
#[derive(Parser, Debug)]
#[command(name = "kiosk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Backend base URL (overrides KIOSK_BACKEND_URL).
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Number of installed lockers (overrides KIOSK_LOCKER_COUNT).
    #[arg(long, global = true)]
    lockers: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch locker statuses once and print the grid.
    Status(StatusArgs),

    /// Check that the backend is reachable and healthy.
    Ping,

    /// Store a parcel and print its retrieval password.
    Deposit(DepositArgs),

    /// Retrieve a parcel with its password.
    Withdraw(WithdrawArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(run(cli));
    // A pending stdin read must not hold the process open.
    runtime.shutdown_background();

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = kiosk_cli::build_config(cli.backend_url.as_deref(), cli.lockers)?;
    tracing::debug!(backend = %config.api.base_url, lockers = config.locker_count, "configuration loaded");

    match cli.command {
        Commands::Status(args) => run_status(&args, config).await,
        Commands::Ping => run_ping(config).await,
        Commands::Deposit(args) => run_deposit(&args, config).await,
        Commands::Withdraw(args) => run_withdraw(&args, config).await,
    }
}
