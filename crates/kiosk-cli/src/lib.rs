//! # kiosk-cli — Terminal Driver for the Parcel-Locker Kiosk
//!
//! Provides the `kiosk` command-line interface. Every command runs the same
//! [`kiosk_app::Kiosk`] controller the touchscreen uses, so a transaction
//! started here goes through the same validation, polling and auto-close
//! logic.
//!
//! ## Subcommands
//!
//! - `kiosk status`: Fetch locker statuses once and print the grid.
//! - `kiosk ping`: Check the backend health endpoint.
//! - `kiosk deposit`: Store a parcel and print its retrieval password.
//! - `kiosk withdraw`: Retrieve a parcel with its password.
//!
//! ```bash
//! kiosk status --flow withdrawal
//! kiosk deposit --tracking-code PKG123 --locker 4
//! kiosk --backend-url http://10.0.0.5:8000 withdraw --password 482913 --locker 4
//! ```

pub mod render;
pub mod status;
pub mod transaction;

use anyhow::{Context, Result};
use clap::ValueEnum;

use kiosk_app::KioskConfig;
use kiosk_client::LockerApiConfig;
use kiosk_core::FlowKind;

/// Flow selector for commands that show a flow screen.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowArg {
    /// Courier stores a parcel.
    Deposit,
    /// Recipient retrieves a parcel.
    Withdrawal,
}

impl From<FlowArg> for FlowKind {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::Deposit => FlowKind::Deposit,
            FlowArg::Withdrawal => FlowKind::Withdrawal,
        }
    }
}

/// Build the runtime configuration from the environment, then apply the
/// global command-line overrides.
pub fn build_config(backend_url: Option<&str>, lockers: Option<u32>) -> Result<KioskConfig> {
    let mut config = KioskConfig::from_env().context("reading KIOSK_* environment")?;
    if let Some(raw) = backend_url {
        let timeout = config.api.timeout_secs;
        config.api = LockerApiConfig::with_base_url(raw)
            .with_context(|| format!("invalid --backend-url {raw:?}"))?;
        config.api.timeout_secs = timeout;
    }
    if let Some(count) = lockers {
        anyhow::ensure!(count > 0, "--lockers must be at least 1");
        config.locker_count = count;
    }
    Ok(config)
}
