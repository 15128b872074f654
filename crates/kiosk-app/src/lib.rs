//! # kiosk-app — Parcel-Locker Kiosk Runtime
//!
//! Runs the kiosk on tokio: the [`Kiosk`] controller drives the session
//! machines from `kiosk-state` against a [`kiosk_client::LockerBackend`],
//! the [`Poller`] refreshes locker status while a flow screen is shown, and
//! timers switch screens and return home after a completed transaction.
//!
//! ## Failure Handling
//!
//! Nothing here is fatal to the process. Open and close failures become
//! notices on the flow and roll the flow back; poll failures are logged at
//! `warn` and the poller keeps its schedule. Going home always restores a
//! clean state.

pub mod config;
pub mod kiosk;
pub mod poller;

pub use config::KioskConfig;
pub use kiosk::{CloseOutcome, FlowView, Kiosk, KioskEvent, OpenOutcome};
pub use poller::Poller;

use kiosk_client::LockerApiError;
use kiosk_state::FlowError;

/// Errors surfaced by [`Kiosk`] operations.
#[derive(Debug, thiserror::Error)]
pub enum KioskError {
    /// Rejected by the session state (validation or wrong phase).
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// Backend call failed where the caller asked for the error.
    #[error(transparent)]
    Backend(#[from] LockerApiError),
}

impl KioskError {
    /// Text to show on the kiosk screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::Flow(FlowError::Validation { reason, .. }) => reason.user_message(),
            Self::Flow(_) => "Please wait for the current operation to finish.".to_string(),
            Self::Backend(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::{FlowKind, ValidationError};
    use kiosk_state::{SessionPhase, TransitionError};

    #[test]
    fn validation_shows_reason() {
        let err = KioskError::from(FlowError::Validation {
            flow: FlowKind::Withdrawal,
            reason: ValidationError::MissingPassword,
        });
        assert_eq!(err.user_message(), "Please enter your password.");
    }

    #[test]
    fn wrong_phase_asks_to_wait() {
        let err = KioskError::from(FlowError::from(TransitionError {
            flow: FlowKind::Deposit,
            phase: SessionPhase::Opening,
            action: "submit",
        }));
        assert_eq!(err.user_message(), "Please wait for the current operation to finish.");
    }

    #[test]
    fn backend_rejection_shows_server_message() {
        let err = KioskError::from(LockerApiError::Api {
            endpoint: "POST /api/withdraw/open".into(),
            status: 400,
            message: Some("Invalid password".into()),
            body: String::new(),
        });
        assert_eq!(err.user_message(), "Invalid password");
        assert_eq!(err.to_string(), "backend POST /api/withdraw/open returned 400: ");
    }
}
