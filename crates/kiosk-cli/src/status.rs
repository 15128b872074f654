//! # Status and Ping Subcommands
//!
//! - `status` performs a single status fetch through the controller and
//!   prints the grid as the chosen flow screen would present it.
//! - `ping` calls the backend health endpoint.

use anyhow::{Context, Result};
use clap::Args;

use kiosk_app::{Kiosk, KioskConfig};
use kiosk_client::{LockerBackend, LockerClient};
use kiosk_core::FlowKind;

use crate::render::render_grid;
use crate::FlowArg;

/// Arguments for the `kiosk status` subcommand.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Flow screen whose enablement rules apply to the grid.
    #[arg(long, value_enum, default_value = "deposit")]
    pub flow: FlowArg,
}

/// Fetch statuses once and print the grid.
pub async fn run_status(args: &StatusArgs, config: KioskConfig) -> Result<u8> {
    let kiosk = Kiosk::connect(config).context("building backend client")?;
    print_status(&kiosk, args.flow.into()).await
}

/// Refresh `kiosk` and print `flow`'s grid.
pub async fn print_status<B: LockerBackend>(kiosk: &Kiosk<B>, flow: FlowKind) -> Result<u8> {
    if let Err(e) = kiosk.refresh().await {
        tracing::debug!(error = %e, "status fetch failed");
        eprintln!("FAIL: {}", e.user_message());
        return Ok(1);
    }
    println!("{}", render_grid(&kiosk.grid(flow)));
    Ok(0)
}

/// Check the backend health endpoint.
pub async fn run_ping(config: KioskConfig) -> Result<u8> {
    let client = LockerClient::new(config.api).context("building backend client")?;
    let url = client.base_url().clone();
    match client.health_check().await {
        Ok(health) if health.is_ok() => {
            println!("OK: backend at {url} is healthy");
            Ok(0)
        }
        Ok(health) => {
            eprintln!("FAIL: backend at {url} reported status {:?}", health.status);
            Ok(1)
        }
        Err(e) => {
            tracing::debug!(error = %e, "health check failed");
            eprintln!("FAIL: {}", e.user_message());
            Ok(1)
        }
    }
}
