//! # Deposit and Withdraw Subcommands
//!
//! Runs one complete transaction through the controller:
//!
//! 1. enter the flow screen and wait for the first status poll to land;
//! 2. select the locker and submit the tracking code or password;
//! 3. once the door is open, wait for either the door-closure detector or
//!    the user pressing Enter, whichever comes first;
//! 4. print the outcome and wait for the automatic return home.
//!
//! A failed close is reported and the user may press Enter to try again.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::broadcast::{self, error::RecvError};

use kiosk_app::{CloseOutcome, Kiosk, KioskConfig, KioskError, KioskEvent, OpenOutcome};
use kiosk_client::LockerBackend;
use kiosk_core::FlowKind;
use kiosk_state::{Completion, Screen};

/// Longest wait for the first status poll before selecting anyway. A failed
/// poll emits nothing, so an unreachable backend would otherwise stall here.
const FIRST_STATUS_WAIT: Duration = Duration::from_secs(5);

/// Arguments for the `kiosk deposit` subcommand.
#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Parcel tracking code.
    #[arg(long)]
    pub tracking_code: String,
    /// Locker to store the parcel in.
    #[arg(long)]
    pub locker: u32,
}

/// Arguments for the `kiosk withdraw` subcommand.
#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Retrieval password received at deposit.
    #[arg(long)]
    pub password: String,
    /// Locker holding the parcel.
    #[arg(long)]
    pub locker: u32,
}

/// How a terminal transaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResult {
    /// The locker was closed and the transaction recorded.
    Completed(Completion),
    /// Local validation or the backend refused; nothing was opened.
    Refused(String),
}

/// Store a parcel.
pub async fn run_deposit(args: &DepositArgs, config: KioskConfig) -> Result<u8> {
    let kiosk = Kiosk::connect(config).context("building backend client")?;
    let mut enter = stdin_lines();
    let result = run_transaction(
        &kiosk,
        FlowKind::Deposit,
        &args.tracking_code,
        args.locker,
        &mut enter,
    )
    .await?;
    Ok(report(&result))
}

/// Retrieve a parcel.
pub async fn run_withdraw(args: &WithdrawArgs, config: KioskConfig) -> Result<u8> {
    let kiosk = Kiosk::connect(config).context("building backend client")?;
    let mut enter = stdin_lines();
    let result = run_transaction(
        &kiosk,
        FlowKind::Withdrawal,
        &args.password,
        args.locker,
        &mut enter,
    )
    .await?;
    Ok(report(&result))
}

fn stdin_lines() -> Lines<BufReader<tokio::io::Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

fn report(result: &TransactionResult) -> u8 {
    match result {
        TransactionResult::Completed(completion) => {
            match &completion.password {
                Some(password) => {
                    println!("OK: parcel stored in locker {}", completion.locker_id);
                    println!("Retrieval password: {}", password.expose());
                }
                None => println!(
                    "OK: {} at locker {} completed",
                    completion.flow, completion.locker_id
                ),
            }
            0
        }
        TransactionResult::Refused(message) => {
            eprintln!("FAIL: {message}");
            1
        }
    }
}

/// Drive one transaction on `kiosk`. Each line read from `enter` requests a
/// manual close while the locker is open; end of input just stops listening.
///
/// Returns once the kiosk is back on the home screen.
pub async fn run_transaction<B, R>(
    kiosk: &Kiosk<B>,
    flow: FlowKind,
    input: &str,
    locker: u32,
    enter: &mut Lines<R>,
) -> Result<TransactionResult>
where
    B: LockerBackend,
    R: AsyncBufRead + Unpin,
{
    let mut events = kiosk.subscribe();
    kiosk.enter_flow(flow).await?;
    if kiosk.grid(flow).updated_at.is_none() {
        let limit = FIRST_STATUS_WAIT + kiosk.config().poll_interval;
        if tokio::time::timeout(limit, wait_for_status(&mut events)).await.is_err() {
            tracing::warn!(?limit, "no locker status yet, selecting without it");
        }
    }

    let session = match open(kiosk, flow, input, locker).await {
        Ok(OpenOutcome::Opened(session)) => session,
        Ok(OpenOutcome::Rejected(message)) => {
            kiosk.go_home().await;
            return Ok(TransactionResult::Refused(message));
        }
        Ok(OpenOutcome::Discarded) => bail!("open response arrived after leaving the flow"),
        Err(e) => {
            kiosk.go_home().await;
            return Ok(TransactionResult::Refused(e.user_message()));
        }
    };

    println!(
        "Locker {} is open (closet {}). Close the door, or press Enter to close it.",
        session.locker_id, session.closet_id
    );

    let completion = wait_for_completion(kiosk, flow, &mut events, enter).await?;
    wait_for_home(&mut events).await?;
    Ok(TransactionResult::Completed(completion))
}

async fn open<B: LockerBackend>(
    kiosk: &Kiosk<B>,
    flow: FlowKind,
    input: &str,
    locker: u32,
) -> Result<OpenOutcome, KioskError> {
    kiosk.set_input(flow, input)?;
    kiosk.select(flow, locker)?;
    kiosk.submit(flow).await
}

async fn wait_for_completion<B, R>(
    kiosk: &Kiosk<B>,
    flow: FlowKind,
    events: &mut broadcast::Receiver<KioskEvent>,
    enter: &mut Lines<R>,
) -> Result<Completion>
where
    B: LockerBackend,
    R: AsyncBufRead + Unpin,
{
    let mut listening = true;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(KioskEvent::Completed(completion)) if completion.flow == flow => {
                    return Ok(completion);
                }
                Ok(KioskEvent::CloseFailed { message, .. }) => {
                    eprintln!("Close failed: {message} Press Enter to retry.");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event receiver lagged");
                }
                Err(RecvError::Closed) => bail!("kiosk stopped before the transaction completed"),
            },
            line = enter.next_line(), if listening => match line? {
                Some(_) => match kiosk.close(flow).await {
                    Ok(CloseOutcome::Completed(completion)) => return Ok(completion),
                    // Reported through the CloseFailed event.
                    Ok(CloseOutcome::Failed(_)) => {}
                    Ok(CloseOutcome::AlreadyClosing) => println!("Closing..."),
                    Ok(CloseOutcome::Discarded) => {
                        bail!("close response arrived after leaving the flow")
                    }
                    // The detector completed the session first; its event follows.
                    Err(e) => tracing::debug!(error = %e, "manual close ignored"),
                },
                None => listening = false,
            },
        }
    }
}

async fn wait_for_status(events: &mut broadcast::Receiver<KioskEvent>) {
    loop {
        match events.recv().await {
            Ok(KioskEvent::StatusUpdated) | Err(RecvError::Closed) => return,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
        }
    }
}

async fn wait_for_home(events: &mut broadcast::Receiver<KioskEvent>) -> Result<()> {
    loop {
        match events.recv().await {
            Ok(KioskEvent::ScreenChanged(Screen::Home)) => return Ok(()),
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => bail!("kiosk stopped before returning home"),
        }
    }
}
